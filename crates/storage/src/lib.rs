use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{PhotoId, WinnerId};

pub mod award_file;

pub use award_file::{AwardFile, AwardFileError, PatchOutcome};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto<'a> {
    pub winner_id: WinnerId,
    pub original_name: Option<&'a str>,
    pub content_type: &'a str,
    pub content: &'a [u8],
}

#[derive(Debug, Clone)]
pub struct StoredPhotoMeta {
    pub photo_id: PhotoId,
    pub object_name: String,
    pub winner_id: WinnerId,
    pub original_name: Option<String>,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub meta: StoredPhotoMeta,
    pub content: Vec<u8>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores a photo under a freshly generated object name.
    pub async fn store_photo(&self, photo: NewPhoto<'_>) -> Result<StoredPhotoMeta> {
        let object_name = object_name_for(photo.original_name, photo.content_type);
        let size_bytes = i64::try_from(photo.content.len()).unwrap_or(i64::MAX);
        let created_at = Utc::now();
        let rec = sqlx::query(
            "INSERT INTO photos (object_name, winner_id, original_name, content_type, size_bytes, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&object_name)
        .bind(photo.winner_id.0)
        .bind(photo.original_name)
        .bind(photo.content_type)
        .bind(size_bytes)
        .bind(photo.content)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to store photo '{object_name}'"))?;

        Ok(StoredPhotoMeta {
            photo_id: PhotoId(rec.get::<i64, _>(0)),
            object_name,
            winner_id: photo.winner_id,
            original_name: photo.original_name.map(str::to_string),
            content_type: photo.content_type.to_string(),
            size_bytes: photo.content.len() as u64,
            created_at,
        })
    }

    pub async fn load_photo(&self, object_name: &str) -> Result<Option<StoredPhoto>> {
        let row = sqlx::query(
            "SELECT id, object_name, winner_id, original_name, content_type, size_bytes, created_at, content
             FROM photos WHERE object_name = ?",
        )
        .bind(object_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredPhoto {
            meta: meta_from_row(&r),
            content: r.get::<Vec<u8>, _>(7),
        }))
    }

    pub async fn delete_photo(&self, object_name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE object_name = ?")
            .bind(object_name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete photo '{object_name}'"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Newest first.
    pub async fn list_photos_for_winner(&self, winner_id: WinnerId) -> Result<Vec<StoredPhotoMeta>> {
        let rows = sqlx::query(
            "SELECT id, object_name, winner_id, original_name, content_type, size_bytes, created_at
             FROM photos WHERE winner_id = ? ORDER BY id DESC",
        )
        .bind(winner_id.0)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(meta_from_row).collect())
    }
}

fn meta_from_row(r: &sqlx::sqlite::SqliteRow) -> StoredPhotoMeta {
    StoredPhotoMeta {
        photo_id: PhotoId(r.get::<i64, _>(0)),
        object_name: r.get::<String, _>(1),
        winner_id: WinnerId(r.get::<i64, _>(2)),
        original_name: r.get::<Option<String>, _>(3),
        content_type: r.get::<String, _>(4),
        size_bytes: r.get::<i64, _>(5).max(0) as u64,
        created_at: r.get::<DateTime<Utc>, _>(6),
    }
}

/// `<uuid>.<ext>`, keeping the uploaded extension when it is usable.
pub fn object_name_for(original_name: Option<&str>, content_type: &str) -> String {
    let from_name = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    let ext = from_name.unwrap_or_else(|| extension_for_content_type(content_type).to_string());
    format!("{}.{ext}", Uuid::new_v4())
}

fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
