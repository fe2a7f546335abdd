use std::sync::Arc;

use presentation::{build_slide_deck, ProgramTemplate, StoreError, WinnerStore};
use shared::{
    domain::{AwardData, WinnerId, WinnerRecord},
    error::{ApiError, ErrorCode},
    protocol::{
        DeleteFileResponse, FileUrlResponse, ServerEvent, SlideDeckResponse, UpdateAwardResponse,
        UploadPhotoResponse,
    },
};
use storage::{AwardFile, AwardFileError, NewPhoto, Storage, StoredPhoto};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub winners: Arc<WinnerStore>,
    pub award_file: AwardFile,
    /// Base for photo references handed back to clients, without a trailing slash.
    pub public_url: String,
    pub max_upload_bytes: usize,
    /// Photo changes for live clients. Sends with no subscribers are dropped.
    pub events: broadcast::Sender<ServerEvent>,
}

/// One photo as received from a client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub winner_id: WinnerId,
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ApiContext {
    fn publish(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }

    pub fn photo_url(&self, object_name: &str) -> String {
        format!("{}/files/{object_name}", self.public_url.trim_end_matches('/'))
    }
}

pub async fn award_data(ctx: &ApiContext) -> Result<AwardData, ApiError> {
    let roster = ctx.winners.load().await.map_err(store_error)?;
    Ok(roster.snapshot())
}

pub async fn winner(ctx: &ApiContext, winner_id: WinnerId) -> Result<WinnerRecord, ApiError> {
    ctx.winners.get_by_id(winner_id).await.map_err(store_error)
}

pub async fn slide_deck(
    ctx: &ApiContext,
    template: &ProgramTemplate,
) -> Result<SlideDeckResponse, ApiError> {
    let roster = ctx.winners.load().await.map_err(store_error)?;
    let deck = build_slide_deck(template, roster.header(), &roster.winners());
    Ok(SlideDeckResponse {
        total_slides: deck.total_slides(),
        slides: deck.into_slides(),
    })
}

/// Stores the photo, writes its reference into the award document and the
/// in-memory roster, and publishes the update. A failed write-back removes
/// the stored object again.
pub async fn upload_photo(
    ctx: &ApiContext,
    upload: PhotoUpload,
) -> Result<(UploadPhotoResponse, ServerEvent), ApiError> {
    validate_upload(ctx, &upload)?;
    winner(ctx, upload.winner_id).await?;

    let meta = ctx
        .storage
        .store_photo(NewPhoto {
            winner_id: upload.winner_id,
            original_name: upload.file_name.as_deref(),
            content_type: &upload.content_type,
            content: &upload.bytes,
        })
        .await
        .map_err(|err| {
            warn!(winner_id = upload.winner_id.0, error = %err, "photo store failed");
            ApiError::new(ErrorCode::UploadFailed, format!("photo upload failed: {err}"))
        })?;
    let url = ctx.photo_url(&meta.object_name);

    let event = match apply_photo(ctx, upload.winner_id, &url).await {
        Ok((_, event)) => event,
        Err(err) => {
            if let Err(cleanup) = ctx.storage.delete_photo(&meta.object_name).await {
                warn!(object_name = %meta.object_name, error = %cleanup, "orphaned photo not removed");
            }
            return Err(err);
        }
    };

    info!(
        winner_id = upload.winner_id.0,
        object_name = %meta.object_name,
        size = meta.size_bytes,
        "photo uploaded"
    );
    Ok((
        UploadPhotoResponse {
            success: true,
            file_name: meta.object_name,
            original_name: meta.original_name,
            url,
            size: meta.size_bytes,
            content_type: meta.content_type,
            winner_id: meta.winner_id,
            uploaded_at: meta.created_at,
        },
        event,
    ))
}

/// Points a winner's photo at `photo_url` in the award document, then in
/// the loaded roster, and publishes the change. The roster write and the
/// event happen under the document's write lock, so concurrent updates for
/// one winner land in the same order everywhere.
pub async fn apply_photo(
    ctx: &ApiContext,
    winner_id: WinnerId,
    photo_url: &str,
) -> Result<(UpdateAwardResponse, ServerEvent), ApiError> {
    if winner_id.0 <= 0 {
        return Err(ApiError::new(ErrorCode::Validation, "winnerId must be positive"));
    }
    let photo_url = photo_url.trim();
    if photo_url.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "photoUrl must not be empty"));
    }

    let event = ServerEvent::PhotoUpdated {
        winner_id,
        photo_url: photo_url.to_string(),
    };
    let outcome = ctx
        .award_file
        .patch_photo_and(winner_id, photo_url, |_| {
            // Not loaded yet: the first load reads the patched document.
            if let Some(roster) = ctx.winners.loaded() {
                if let Err(err) = roster.update_photo(winner_id, photo_url) {
                    warn!(winner_id = winner_id.0, error = %err, "roster photo not updated");
                }
            }
            ctx.publish(event.clone());
        })
        .await
        .map_err(patch_error)?;

    Ok((
        UpdateAwardResponse {
            success: true,
            winner: outcome.winner,
        },
        event,
    ))
}

pub async fn file_url(ctx: &ApiContext, filename: &str) -> Result<FileUrlResponse, ApiError> {
    let photo = stored_photo(ctx, filename).await?;
    Ok(FileUrlResponse {
        success: true,
        url: ctx.photo_url(&photo.meta.object_name),
        filename: photo.meta.object_name,
    })
}

pub async fn stored_photo(ctx: &ApiContext, filename: &str) -> Result<StoredPhoto, ApiError> {
    validate_filename(filename)?;
    ctx.storage
        .load_photo(filename)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("file '{filename}' not found")))
}

pub async fn delete_file(
    ctx: &ApiContext,
    filename: &str,
) -> Result<(DeleteFileResponse, ServerEvent), ApiError> {
    validate_filename(filename)?;
    let removed = ctx.storage.delete_photo(filename).await.map_err(internal)?;
    if !removed {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("file '{filename}' not found"),
        ));
    }
    info!(%filename, "stored photo deleted");
    let event = ServerEvent::PhotoDeleted {
        filename: filename.to_string(),
    };
    ctx.publish(event.clone());
    Ok((
        DeleteFileResponse {
            success: true,
            message: "file deleted".to_string(),
            filename: filename.to_string(),
        },
        event,
    ))
}

fn validate_upload(ctx: &ApiContext, upload: &PhotoUpload) -> Result<(), ApiError> {
    if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
        return Err(ApiError::new(
            ErrorCode::UnsupportedMediaType,
            format!(
                "unsupported file type '{}', expected JPG, PNG, GIF or WebP",
                upload.content_type
            ),
        ));
    }
    if upload.bytes.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "uploaded file is empty"));
    }
    if upload.bytes.len() > ctx.max_upload_bytes {
        return Err(ApiError::new(
            ErrorCode::PayloadTooLarge,
            format!(
                "file is {} bytes, the limit is {} bytes",
                upload.bytes.len(),
                ctx.max_upload_bytes
            ),
        ));
    }
    Ok(())
}

fn validate_filename(filename: &str) -> Result<(), ApiError> {
    if filename.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "filename must not be empty"));
    }
    if filename.contains(['/', '\\']) || filename.starts_with('.') {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("invalid filename '{filename}'"),
        ));
    }
    Ok(())
}

fn store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(id) => {
            ApiError::new(ErrorCode::NotFound, format!("winner {id} not found"))
        }
        StoreError::DataUnavailable(reason) => ApiError::new(ErrorCode::DataUnavailable, reason),
    }
}

fn patch_error(err: AwardFileError) -> ApiError {
    match err {
        AwardFileError::NotFound(id) => {
            ApiError::new(ErrorCode::NotFound, format!("winner {id} not found"))
        }
        other => {
            warn!(error = %other, "award data patch failed");
            ApiError::new(ErrorCode::PatchFailed, other.to_string())
        }
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
