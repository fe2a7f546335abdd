use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State, WebSocketUpgrade},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use presentation::{ProgramTemplate, WinnerStore};
use server_api::{ApiContext, PhotoUpload};
use shared::{
    domain::{AwardData, WinnerId, WinnerRecord},
    error::{ApiError, ErrorCode},
    protocol::{
        DeleteFileResponse, FileUrlResponse, SlideDeckResponse, UpdateAwardRequest,
        UpdateAwardResponse, UploadPhotoResponse,
    },
};
use storage::{AwardFile, Storage};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

type HttpError = (StatusCode, Json<ApiError>);

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let award_file = AwardFile::new(&settings.awards_path);
    let winners = Arc::new(WinnerStore::from_source(award_file.clone()));
    if let Err(error) = winners.load().await {
        warn!(
            awards_path = %settings.awards_path.display(),
            %error,
            "award data not loaded yet; requests will retry"
        );
    }

    let api = ApiContext {
        storage,
        winners,
        award_file,
        public_url: settings.public_url.clone(),
        max_upload_bytes: settings.max_upload_bytes,
        events: broadcast::channel(256).0,
    };
    let state = AppState::new(api, ProgramTemplate::ceremony_2025());
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, public_url = %settings.public_url, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.api.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/awards", get(http_award_data))
        .route("/api/awards/:winner_id", get(http_winner))
        .route("/api/slides", get(http_slides))
        .route("/api/upload", post(http_upload))
        .route("/api/update-award", post(http_update_award))
        .route(
            "/api/files/:filename",
            get(http_file_url).delete(http_delete_file),
        )
        .route("/files/:filename", get(download_file))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorCode::DataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::UploadFailed | ErrorCode::PatchFailed | ErrorCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn http_error(err: ApiError) -> HttpError {
    (status_for(err.code), Json(err))
}

fn multipart_error(err: MultipartError) -> HttpError {
    let code = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorCode::PayloadTooLarge
    } else {
        ErrorCode::Validation
    };
    http_error(ApiError::new(code, err.body_text()))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_award_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AwardData>, HttpError> {
    let data = server_api::award_data(&state.api).await.map_err(http_error)?;
    Ok(Json(data))
}

async fn http_winner(
    State(state): State<Arc<AppState>>,
    Path(winner_id): Path<i64>,
) -> Result<Json<WinnerRecord>, HttpError> {
    let winner = server_api::winner(&state.api, WinnerId(winner_id))
        .await
        .map_err(http_error)?;
    Ok(Json(winner))
}

async fn http_slides(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SlideDeckResponse>, HttpError> {
    let deck = server_api::slide_deck(&state.api, &state.template)
        .await
        .map_err(http_error)?;
    Ok(Json(deck))
}

async fn http_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadPhotoResponse>, HttpError> {
    let mut winner_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("winnerId") => {
                let raw = field.text().await.map_err(multipart_error)?;
                let parsed = raw.trim().parse::<i64>().map_err(|_| {
                    http_error(ApiError::new(
                        ErrorCode::Validation,
                        format!("invalid winnerId '{raw}'"),
                    ))
                })?;
                winner_id = Some(WinnerId(parsed));
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);
                let content_type = field
                    .content_type()
                    .filter(|mime| !mime.trim().is_empty() && *mime != "application/octet-stream")
                    .map(str::to_string)
                    .or_else(|| {
                        file_name
                            .as_deref()
                            .and_then(|name| mime_guess::from_path(name).first_raw())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err(http_error(ApiError::new(
            ErrorCode::Validation,
            "no file provided",
        )));
    };
    let Some(winner_id) = winner_id else {
        return Err(http_error(ApiError::new(
            ErrorCode::Validation,
            "no winnerId provided",
        )));
    };

    let (response, _) = server_api::upload_photo(
        &state.api,
        PhotoUpload {
            winner_id,
            file_name,
            content_type,
            bytes,
        },
    )
    .await
    .map_err(http_error)?;
    Ok(Json(response))
}

async fn http_update_award(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateAwardRequest>,
) -> Result<Json<UpdateAwardResponse>, HttpError> {
    let (response, _) = server_api::apply_photo(&state.api, req.winner_id, &req.photo_url)
        .await
        .map_err(http_error)?;
    info!(winner_id = req.winner_id.0, "award photo updated");
    Ok(Json(response))
}

async fn http_file_url(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<FileUrlResponse>, HttpError> {
    let response = server_api::file_url(&state.api, &filename)
        .await
        .map_err(http_error)?;
    Ok(Json(response))
}

async fn http_delete_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteFileResponse>, HttpError> {
    let (response, _) = server_api::delete_file(&state.api, &filename)
        .await
        .map_err(http_error)?;
    Ok(Json(response))
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let photo = server_api::stored_photo(&state.api, &filename)
        .await
        .map_err(http_error)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&photo.meta.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    Ok((StatusCode::OK, headers, photo.content))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.api.events.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "ws client lagging; dropped photo events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
