use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{SlideDescriptor, WinnerId, WinnerRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoResponse {
    pub success: bool,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub url: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub winner_id: WinnerId,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAwardRequest {
    pub winner_id: WinnerId,
    pub photo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAwardResponse {
    pub success: bool,
    pub winner: WinnerRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUrlResponse {
    pub success: bool,
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    PhotoUpdated {
        winner_id: WinnerId,
        photo_url: String,
    },
    PhotoDeleted {
        filename: String,
    },
}

/// Body of `GET /api/slides`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDeckResponse {
    pub total_slides: usize,
    pub slides: Vec<SlideDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
}
