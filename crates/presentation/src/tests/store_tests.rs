use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use super::*;
use crate::test_support::{ceremony_data, winner};

struct CountingSource {
    data: AwardData,
    calls: AtomicUsize,
}

#[async_trait]
impl AwardSource for CountingSource {
    async fn load(&self) -> anyhow::Result<AwardData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

struct FailingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl AwardSource for FailingSource {
    async fn load(&self) -> anyhow::Result<AwardData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("connection refused")
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

fn counting_store() -> (Arc<CountingSource>, WinnerStore) {
    let source = Arc::new(CountingSource {
        data: ceremony_data(),
        calls: AtomicUsize::new(0),
    });
    let store = WinnerStore::new(source.clone());
    (source, store)
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
    let (source, store) = counting_store();
    let (a, b, c) = tokio::join!(store.load(), store.load(), store.load());
    let a = a.expect("a");
    assert!(Arc::ptr_eq(&a, &b.expect("b")));
    assert!(Arc::ptr_eq(&a, &c.expect("c")));

    store.load().await.expect("again");
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.len(), 50);
}

#[tokio::test]
async fn failed_load_is_data_unavailable_and_not_cached() {
    let source = Arc::new(FailingSource {
        calls: AtomicUsize::new(0),
    });
    let store = WinnerStore::new(source.clone());

    let err = store.load().await.expect_err("load should fail");
    assert!(matches!(err, StoreError::DataUnavailable(ref msg) if msg.contains("connection refused")));
    assert!(store.loaded().is_none());

    assert!(store.get_by_id(WinnerId(1)).await.is_err());
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let mut data = ceremony_data();
    data.winners.push(winner(3, "優質獎"));
    let store = WinnerStore::from_source(crate::source::StaticAwardSource::new(data));
    assert!(matches!(
        store.load().await,
        Err(StoreError::DataUnavailable(_))
    ));
}

#[tokio::test]
async fn lookups_by_id_and_range() {
    let (_, store) = counting_store();

    let record = store.get_by_id(WinnerId(8)).await.expect("winner 8");
    assert_eq!(record.award_type, "磐石獎");
    assert_eq!(
        store.get_by_id(WinnerId(51)).await,
        Err(StoreError::NotFound(WinnerId(51)))
    );

    let range = store
        .filter_by_id_range(WinnerId(5), WinnerId(7))
        .await
        .expect("range");
    let ids: Vec<_> = range.iter().map(|w| w.id.0).collect();
    assert_eq!(ids, vec![5, 6, 7]);

    let inverted = store
        .filter_by_id_range(WinnerId(7), WinnerId(5))
        .await
        .expect("inverted");
    assert!(inverted.is_empty());
}

#[tokio::test]
async fn award_type_and_batches() {
    let (_, store) = counting_store();

    assert_eq!(store.len().await.expect("len"), 50);
    assert_eq!(
        store
            .winners_by_award_type("15年資獎")
            .await
            .expect("by type")
            .len(),
        3
    );

    let first = store.batch(0, None).await.expect("batch");
    assert_eq!(first.len(), DEFAULT_BATCH_SIZE);
    assert_eq!(first[0].id, WinnerId(1));

    let tail = store.batch(45, None).await.expect("tail");
    assert_eq!(tail.len(), 5);
    assert!(store.batch(60, None).await.expect("past end").is_empty());
    assert_eq!(store.batch(2, Some(4)).await.expect("explicit").len(), 2);
}

#[tokio::test]
async fn update_photo_writes_only_the_photo() {
    let (_, store) = counting_store();
    let before = store.load().await.expect("load").winners();

    store
        .update_photo(WinnerId(20), "http://127.0.0.1:3005/files/a.jpg")
        .await
        .expect("update");

    let after = store.load().await.expect("load").winners();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.id, new.id);
        assert_eq!(old.recipient_name, new.recipient_name);
    }
    assert_eq!(after[19].photo(), Some("http://127.0.0.1:3005/files/a.jpg"));
}

#[tokio::test]
async fn update_photo_for_unknown_id_leaves_list_unchanged() {
    let (_, store) = counting_store();
    let before = store.load().await.expect("load").winners();

    assert_eq!(
        store.update_photo(WinnerId(999), "x").await,
        Err(StoreError::NotFound(WinnerId(999)))
    );
    assert_eq!(store.load().await.expect("load").winners(), before);
}

#[test]
fn category_lookup_classifies_labels() {
    let roster = Roster::new(ceremony_data()).expect("roster");
    assert_eq!(roster.category_of(WinnerId(1)), Some(AwardCategory::Service));
    assert_eq!(roster.category_of(WinnerId(9)), Some(AwardCategory::Rock));
    assert_eq!(roster.category_of(WinnerId(30)), Some(AwardCategory::Excellence));
    assert_eq!(roster.category_of(WinnerId(77)), None);
}

#[test]
fn snapshot_round_trips_header() {
    let data = ceremony_data();
    let roster = Roster::new(data.clone()).expect("roster");
    assert_eq!(roster.snapshot(), data);
}
