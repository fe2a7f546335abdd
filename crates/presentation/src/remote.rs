use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use shared::{domain::WinnerId, protocol::ServerEvent};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::store::Roster;

/// `http(s)://host[:port][/...]` to the server's `ws(s)://.../ws` endpoint.
pub fn events_url(server_url: &str) -> Result<Url> {
    let mut url = Url::parse(server_url).with_context(|| format!("invalid server url '{server_url}'"))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(anyhow!("server url must be http or https, got '{other}'")),
    };
    url.set_scheme(scheme)
        .map_err(|()| anyhow!("cannot switch '{server_url}' to {scheme}"))?;
    url.set_path("/ws");
    url.set_query(None);
    Ok(url)
}

/// Applies one server event to the in-memory roster. Returns the winner whose
/// photo changed, if any.
pub fn apply_server_event(roster: &Roster, event: &ServerEvent) -> Option<WinnerId> {
    match event {
        ServerEvent::PhotoUpdated {
            winner_id,
            photo_url,
        } => match roster.update_photo(*winner_id, photo_url) {
            Ok(()) => Some(*winner_id),
            Err(err) => {
                warn!(winner_id = winner_id.0, error = %err, "ignoring photo update");
                None
            }
        },
        ServerEvent::PhotoDeleted { filename } => {
            debug!(%filename, "stored photo deleted");
            None
        }
    }
}

/// Connects to the server's event socket and keeps `roster` photos current.
/// Each applied update is reported on `updates` so the host can redraw.
pub async fn follow_photo_updates(
    server_url: &str,
    roster: Arc<Roster>,
    updates: mpsc::UnboundedSender<WinnerId>,
) -> Result<JoinHandle<()>> {
    let ws_url = events_url(server_url)?;
    let (ws_stream, _) = connect_async(ws_url.as_str())
        .await
        .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
    info!(%ws_url, "following photo updates");
    let (_, mut ws_reader) = ws_stream.split();

    Ok(tokio::spawn(async move {
        while let Some(msg) = ws_reader.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        if let Some(winner_id) = apply_server_event(&roster, &event) {
                            if updates.send(winner_id).is_err() {
                                break;
                            }
                        }
                    }
                    Err(err) => warn!(error = %err, "invalid server event"),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "websocket receive failed");
                    break;
                }
            }
        }
        debug!("photo update feed closed");
    }))
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;
