use super::*;

fn jpeg_photo(winner_id: i64, content: &[u8]) -> NewPhoto<'_> {
    NewPhoto {
        winner_id: WinnerId(winner_id),
        original_name: Some("portrait.JPG"),
        content_type: "image/jpeg",
        content,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("photos.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn stores_and_loads_photo_bytes() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let meta = storage
        .store_photo(jpeg_photo(3, b"\xff\xd8\xffjpeg"))
        .await
        .expect("store");

    assert!(meta.object_name.ends_with(".jpg"));
    assert_eq!(meta.size_bytes, 7);
    assert_eq!(meta.winner_id, WinnerId(3));

    let loaded = storage
        .load_photo(&meta.object_name)
        .await
        .expect("load")
        .expect("photo exists");
    assert_eq!(loaded.content, b"\xff\xd8\xffjpeg");
    assert_eq!(loaded.meta.content_type, "image/jpeg");
    assert_eq!(loaded.meta.original_name.as_deref(), Some("portrait.JPG"));
    assert_eq!(loaded.meta.photo_id, meta.photo_id);
}

#[tokio::test]
async fn missing_photo_loads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage
        .load_photo("does-not-exist.png")
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_photo_was_removed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let meta = storage
        .store_photo(jpeg_photo(9, b"bytes"))
        .await
        .expect("store");

    assert!(storage.delete_photo(&meta.object_name).await.expect("delete"));
    assert!(!storage.delete_photo(&meta.object_name).await.expect("delete again"));
    assert!(storage
        .load_photo(&meta.object_name)
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn lists_photos_for_winner_newest_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = storage.store_photo(jpeg_photo(5, b"one")).await.expect("first");
    let _other = storage.store_photo(jpeg_photo(6, b"other")).await.expect("other");
    let second = storage.store_photo(jpeg_photo(5, b"two")).await.expect("second");

    let photos = storage
        .list_photos_for_winner(WinnerId(5))
        .await
        .expect("list");
    let names: Vec<_> = photos.iter().map(|p| p.object_name.as_str()).collect();
    assert_eq!(names, vec![second.object_name.as_str(), first.object_name.as_str()]);
}

#[test]
fn object_name_falls_back_to_content_type_extension() {
    assert!(object_name_for(None, "image/webp").ends_with(".webp"));
    assert!(object_name_for(Some("no-extension"), "image/png").ends_with(".png"));
    assert!(object_name_for(Some("weird.e x t"), "image/gif").ends_with(".gif"));
    assert!(object_name_for(Some("photo.JPEG"), "image/jpeg").ends_with(".jpeg"));
    assert!(object_name_for(None, "application/pdf").ends_with(".bin"));
}

#[test]
fn in_memory_url_has_no_parent_directory() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/photos.db?mode=rwc"),
        Some(PathBuf::from("./data/photos.db"))
    );
}
