use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::Parser;
use presentation::{
    remote::follow_photo_updates, AwardSource, HostAction, HttpAwardSource, KeyEffect, LoadState,
    Presentation, PresentationSession, ProgramTemplate, WinnerStore,
};
use shared::domain::WinnerId;
use storage::AwardFile;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};

mod input;
mod render;

use input::{parse_line, Input};

#[derive(Parser, Debug)]
#[command(about = "Step through the awards ceremony slides from a terminal")]
struct Args {
    /// Award data document to present.
    #[arg(long, default_value = "./data/awards.json")]
    awards: PathBuf,
    /// Load awards from a running server instead, and follow its photo updates.
    #[arg(long)]
    server_url: Option<String>,
}

/// Host-level view flags the keyboard toggles.
#[derive(Debug, Default)]
struct HostView {
    fullscreen: bool,
    photo_panel: bool,
}

impl HostView {
    fn apply(&mut self, action: HostAction) -> &'static str {
        match action {
            HostAction::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                if self.fullscreen {
                    "[fullscreen on]"
                } else {
                    "[fullscreen off]"
                }
            }
            HostAction::OpenPhotoPanel => {
                self.photo_panel = true;
                "[photo panel open]"
            }
            HostAction::Dismiss => {
                if self.photo_panel {
                    self.photo_panel = false;
                    "[photo panel closed]"
                } else if self.fullscreen {
                    self.fullscreen = false;
                    "[fullscreen off]"
                } else {
                    "[nothing to dismiss]"
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let source: Arc<dyn AwardSource> = match &args.server_url {
        Some(url) => Arc::new(HttpAwardSource::new(url.clone())),
        None => Arc::new(AwardFile::new(&args.awards)),
    };
    info!(source = %source.describe(), "loading award data");
    let store = Arc::new(WinnerStore::new(source));

    let session = PresentationSession::new(ProgramTemplate::ceremony_2025());
    println!("載入中 Loading award data...");
    session.spawn_load(store).await?;

    if let LoadState::Failed(err) = &*session.state().await {
        println!("無法載入得獎資料 Cannot load award data: {err}");
        return Err(anyhow!("award data unavailable"));
    }

    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel::<WinnerId>();
    if let Some(url) = &args.server_url {
        let roster = session
            .with_presentation(|p| p.roster().clone())
            .await
            .ok_or_else(|| anyhow!("presentation not ready"))?;
        if let Err(error) = follow_photo_updates(url, roster, updates_tx).await {
            warn!(%error, "live photo updates unavailable");
        }
    }

    print_help();
    session.with_presentation(|p| print_current(p)).await;

    let mut view = HostView::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let keep_going = session
                    .with_presentation(|p| handle_input(p, &mut view, parse_line(&line)))
                    .await
                    .unwrap_or(false);
                if !keep_going {
                    break;
                }
            }
            Some(winner_id) = updates_rx.recv() => {
                session
                    .with_presentation(|p| {
                        let on_screen = p
                            .current()
                            .and_then(|slide| slide.descriptor.winner_id())
                            == Some(winner_id);
                        if on_screen {
                            println!("[photo updated]");
                            print_current(p);
                        }
                    })
                    .await;
            }
        }
    }

    Ok(())
}

fn handle_input(p: &mut Presentation, view: &mut HostView, input: Input) -> bool {
    match input {
        Input::Quit => return false,
        Input::Unknown => {}
        Input::Goto(index) => {
            if p.go_to_slide(index) {
                print_current(p);
            }
        }
        Input::Category(category) => {
            if p.jump_to_category(category) {
                print_current(p);
            }
        }
        Input::Key(key) => match p.handle_key(key) {
            KeyEffect::Moved { .. } => print_current(p),
            KeyEffect::Unchanged => {}
            KeyEffect::Host(action) => {
                println!("{}", view.apply(action));
                if action == HostAction::OpenPhotoPanel {
                    print_photo_panel(p);
                }
            }
        },
    }
    true
}

fn print_current(p: &Presentation) {
    if let Some(slide) = p.current() {
        println!("{}", render::render(&slide));
    } else {
        println!("(no slides)");
    }
}

fn print_photo_panel(p: &Presentation) {
    let winners = p.roster().winners();
    let missing: Vec<_> = winners.iter().filter(|w| w.photo().is_none()).collect();
    println!(
        "{} of {} winners have photos",
        winners.len() - missing.len(),
        winners.len()
    );
    for winner in missing {
        println!("  #{} {} ({})", winner.id, winner.recipient_name, winner.award_type);
    }
}

fn print_help() {
    println!("keys: right/space next, left previous, home start, 1-7 shortcuts,");
    println!("      :service :rock :excellence, goto N, f fullscreen, p photos, esc, q quit");
}
