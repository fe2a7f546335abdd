use super::*;

const DOCUMENT: &str = r#"{
  "title": "2025感恩迎新餐會",
  "subtitle": "2025 Appreciation & Welcome Banquet",
  "winners": [
    {
      "id": 1,
      "photoUrl": "https://photos.example/old.jpg",
      "department": "招生辦公室",
      "awardType": "25年資獎",
      "recipientName": "俞聖陶",
      "achievements": ""
    },
    {
      "id": 2,
      "department": "中學教務處",
      "awardType": "15年資獎",
      "recipientName": "羅幸基",
      "achievements": "",
      "note": "kept"
    }
  ]
}
"#;

fn fixture(contents: &str) -> (tempfile::TempDir, AwardFile) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("awards.json");
    std::fs::write(&path, contents).expect("write fixture");
    (dir, AwardFile::new(path))
}

#[tokio::test]
async fn reads_award_data_document() {
    let (_dir, file) = fixture(DOCUMENT);
    let data = file.read().await.expect("read");
    assert_eq!(data.winners.len(), 2);
    assert_eq!(data.winners[0].photo(), Some("https://photos.example/old.jpg"));
    assert_eq!(data.winners[1].recipient_name, "羅幸基");
}

#[tokio::test]
async fn replaces_existing_photo_in_place() {
    let (_dir, file) = fixture(DOCUMENT);
    let outcome = file
        .patch_photo(WinnerId(1), "https://photos.example/new.jpg")
        .await
        .expect("patch");

    assert_eq!(outcome.replaced.as_deref(), Some("https://photos.example/old.jpg"));
    assert_eq!(outcome.winner.photo(), Some("https://photos.example/new.jpg"));

    let raw = std::fs::read_to_string(file.path()).expect("read back");
    let document: Value = serde_json::from_str(&raw).expect("json");
    let keys: Vec<_> = document["winners"][0]
        .as_object()
        .expect("object")
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys[1], "photoUrl", "existing field keeps its position");
}

#[tokio::test]
async fn appends_photo_as_last_field_when_missing() {
    let (_dir, file) = fixture(DOCUMENT);
    let outcome = file
        .patch_photo(WinnerId(2), "https://photos.example/two.jpg")
        .await
        .expect("patch");
    assert_eq!(outcome.replaced, None);

    let raw = std::fs::read_to_string(file.path()).expect("read back");
    let document: Value = serde_json::from_str(&raw).expect("json");
    let record = document["winners"][1].as_object().expect("object");
    assert_eq!(record.keys().last().map(String::as_str), Some("photoUrl"));
    assert_eq!(record["note"], "kept");

    let data = file.read().await.expect("read");
    assert_eq!(data.winners[1].photo(), Some("https://photos.example/two.jpg"));
    assert_eq!(data.winners[0].photo(), Some("https://photos.example/old.jpg"));
}

#[tokio::test]
async fn unknown_winner_is_reported_and_file_is_untouched() {
    let (_dir, file) = fixture(DOCUMENT);
    let err = file
        .patch_photo(WinnerId(99), "https://photos.example/x.jpg")
        .await
        .expect_err("missing winner");
    assert!(matches!(err, AwardFileError::NotFound(WinnerId(99))));

    let raw = std::fs::read_to_string(file.path()).expect("read back");
    assert_eq!(raw, DOCUMENT);
}

#[tokio::test]
async fn malformed_document_is_not_rewritten() {
    let broken = "{ \"title\": \"x\", \"winners\": [ { \"id\": 1, ";
    let (_dir, file) = fixture(broken);
    let err = file
        .patch_photo(WinnerId(1), "https://photos.example/x.jpg")
        .await
        .expect_err("malformed");
    assert!(matches!(err, AwardFileError::Malformed { .. }));
    assert_eq!(std::fs::read_to_string(file.path()).expect("read"), broken);
}

#[tokio::test]
async fn document_without_winners_array_is_malformed() {
    let (_dir, file) = fixture(r#"{ "title": "x", "subtitle": "y" }"#);
    let err = file
        .patch_photo(WinnerId(1), "https://photos.example/x.jpg")
        .await
        .expect_err("malformed");
    assert!(matches!(err, AwardFileError::Malformed { .. }));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = AwardFile::new(dir.path().join("absent.json"));
    assert!(matches!(
        file.read().await,
        Err(AwardFileError::Io { .. })
    ));
}

#[tokio::test]
async fn concurrent_patches_are_serialized() {
    let (_dir, file) = fixture(DOCUMENT);
    let a = file.clone();
    let b = file.clone();
    let (first, second) = tokio::join!(
        a.patch_photo(WinnerId(1), "https://photos.example/a.jpg"),
        b.patch_photo(WinnerId(2), "https://photos.example/b.jpg"),
    );
    first.expect("first");
    second.expect("second");

    let data = file.read().await.expect("read");
    assert_eq!(data.winners[0].photo(), Some("https://photos.example/a.jpg"));
    assert_eq!(data.winners[1].photo(), Some("https://photos.example/b.jpg"));
}

#[tokio::test]
async fn follow_up_runs_after_the_document_is_replaced() {
    let (_dir, file) = fixture(DOCUMENT);
    let reader = file.clone();
    let mut seen = None;
    let outcome = file
        .patch_photo_and(WinnerId(2), "https://photos.example/new.jpg", |outcome| {
            seen = Some(outcome.winner.id);
        })
        .await
        .expect("patch");
    assert_eq!(seen, Some(WinnerId(2)));
    assert_eq!(outcome.replaced, None);
    let data = reader.read().await.expect("read");
    assert_eq!(data.winners[1].photo(), Some("https://photos.example/new.jpg"));
}

#[tokio::test]
async fn follow_up_is_skipped_when_the_winner_is_missing() {
    let (_dir, file) = fixture(DOCUMENT);
    let mut ran = false;
    let err = file
        .patch_photo_and(WinnerId(9), "x", |_| ran = true)
        .await
        .expect_err("missing");
    assert!(matches!(err, AwardFileError::NotFound(WinnerId(9))));
    assert!(!ran);
}

#[tokio::test]
async fn write_replaces_the_whole_document() {
    let (dir, file) = fixture(DOCUMENT);
    let mut data = file.read().await.expect("read");
    data.winners.truncate(1);
    data.date = Some("2025-01-17".to_string());
    file.write(&data).await.expect("write");

    let reread = file.read().await.expect("reread");
    assert_eq!(reread, data);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
