//! The award data document on disk and its photo patcher.
//!
//! Patching is a structured read-modify-write of the whole document: the JSON
//! is parsed, the record with the matching `id` gets its `photoUrl` replaced
//! (or appended as the record's last field), and the document is written to a
//! sibling temp file and renamed over the original. Field order and unknown
//! fields survive the round trip.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde_json::Value;
use shared::domain::{AwardData, WinnerId, WinnerRecord};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

const PHOTO_FIELD: &str = "photoUrl";

#[derive(Debug, Error)]
pub enum AwardFileError {
    #[error("winner {0} not found in award data")]
    NotFound(WinnerId),
    #[error("award data '{path}' is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("award data '{path}' could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub winner: WinnerRecord,
    /// The photo reference that was overwritten, if the record had one.
    pub replaced: Option<String>,
}

#[derive(Clone)]
pub struct AwardFile {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl AwardFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<AwardData, AwardFileError> {
        let raw = self.read_raw().await?;
        serde_json::from_str(&raw).map_err(|err| self.malformed(err.to_string()))
    }

    /// Replaces the whole document, e.g. after importing a fresh winner list.
    pub async fn write(&self, data: &AwardData) -> Result<(), AwardFileError> {
        let _guard = self.write_lock.lock().await;
        let value = serde_json::to_value(data).map_err(|err| self.malformed(err.to_string()))?;
        self.replace_contents(&value).await
    }

    pub async fn patch_photo(
        &self,
        winner_id: WinnerId,
        photo_url: &str,
    ) -> Result<PatchOutcome, AwardFileError> {
        self.patch_photo_and(winner_id, photo_url, |_| {}).await
    }

    /// Like [`AwardFile::patch_photo`], but runs `then` after the document is
    /// replaced and before the write lock is released, so follow-up writes
    /// happen in the same order as the file writes.
    pub async fn patch_photo_and(
        &self,
        winner_id: WinnerId,
        photo_url: &str,
        then: impl FnOnce(&PatchOutcome),
    ) -> Result<PatchOutcome, AwardFileError> {
        let _guard = self.write_lock.lock().await;

        let raw = self.read_raw().await?;
        let mut document: Value =
            serde_json::from_str(&raw).map_err(|err| self.malformed(err.to_string()))?;
        let winners = document
            .get_mut("winners")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| self.malformed("missing `winners` array"))?;

        let record = winners
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|record| record.get("id").and_then(Value::as_i64) == Some(winner_id.0))
            .ok_or(AwardFileError::NotFound(winner_id))?;

        let replaced = record
            .insert(PHOTO_FIELD.to_string(), Value::String(photo_url.to_string()))
            .and_then(|previous| previous.as_str().map(str::to_string));
        let winner: WinnerRecord = serde_json::from_value(Value::Object(record.clone()))
            .map_err(|err| self.malformed(format!("winner {winner_id}: {err}")))?;

        self.replace_contents(&document).await?;
        info!(
            %winner_id,
            path = %self.path.display(),
            replaced = replaced.is_some(),
            "patched winner photo"
        );

        let outcome = PatchOutcome { winner, replaced };
        then(&outcome);
        Ok(outcome)
    }

    async fn read_raw(&self) -> Result<String, AwardFileError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| AwardFileError::Io {
                path: self.path.clone(),
                source,
            })
    }

    async fn replace_contents(&self, document: &Value) -> Result<(), AwardFileError> {
        let mut encoded =
            serde_json::to_string_pretty(document).map_err(|err| self.malformed(err.to_string()))?;
        encoded.push('\n');

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "awards.json".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        let io_err = |source| AwardFileError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&temp_path, encoded).await.map_err(io_err)?;
        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_err(source));
        }
        debug!(path = %self.path.display(), "award data replaced");
        Ok(())
    }

    fn malformed(&self, reason: impl Into<String>) -> AwardFileError {
        AwardFileError::Malformed {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "tests/award_file_tests.rs"]
mod tests;
