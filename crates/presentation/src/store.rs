use std::{
    collections::HashSet,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use shared::domain::{AwardCategory, AwardData, WinnerId, WinnerRecord};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{category::classify, program::DeckHeader};

/// Winners handed out per page by [`Roster::batch`] when no end is given.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Where the award document comes from.
#[async_trait]
pub trait AwardSource: Send + Sync {
    async fn load(&self) -> anyhow::Result<AwardData>;

    /// Human readable origin, used in logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("award data unavailable: {0}")]
    DataUnavailable(String),
    #[error("winner {0} not found")]
    NotFound(WinnerId),
}

/// The loaded award document. Record order is load order and never changes;
/// only `photo_url` is ever written after load.
#[derive(Debug)]
pub struct Roster {
    header: DeckHeader,
    winners: RwLock<Vec<WinnerRecord>>,
}

impl Roster {
    pub fn new(data: AwardData) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(data.winners.len());
        for winner in &data.winners {
            if winner.id.0 <= 0 {
                return Err(StoreError::DataUnavailable(format!(
                    "winner id {} is not positive",
                    winner.id
                )));
            }
            if !seen.insert(winner.id) {
                return Err(StoreError::DataUnavailable(format!(
                    "winner id {} appears more than once",
                    winner.id
                )));
            }
        }

        Ok(Self {
            header: DeckHeader::from(&data),
            winners: RwLock::new(data.winners),
        })
    }

    pub fn header(&self) -> &DeckHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// A consistent copy of every record in load order.
    pub fn winners(&self) -> Vec<WinnerRecord> {
        self.read().clone()
    }

    pub fn snapshot(&self) -> AwardData {
        AwardData {
            title: self.header.title.clone(),
            subtitle: self.header.subtitle.clone(),
            date: self.header.date.clone(),
            winners: self.winners(),
        }
    }

    pub fn get_by_id(&self, id: WinnerId) -> Result<WinnerRecord, StoreError> {
        self.read()
            .iter()
            .find(|winner| winner.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    pub fn category_of(&self, id: WinnerId) -> Option<AwardCategory> {
        self.read()
            .iter()
            .find(|winner| winner.id == id)
            .map(|winner| classify(&winner.award_type))
    }

    /// Inclusive on both ends; an inverted range is empty.
    pub fn filter_by_id_range(&self, low: WinnerId, high: WinnerId) -> Vec<WinnerRecord> {
        self.read()
            .iter()
            .filter(|winner| (low..=high).contains(&winner.id))
            .cloned()
            .collect()
    }

    /// Exact label match, load order preserved.
    pub fn winners_by_award_type(&self, award_type: &str) -> Vec<WinnerRecord> {
        self.read()
            .iter()
            .filter(|winner| winner.award_type == award_type)
            .cloned()
            .collect()
    }

    /// Positional slice `[start, end)`, clamped to the list. `end` defaults to
    /// `start + DEFAULT_BATCH_SIZE`.
    pub fn batch(&self, start: usize, end: Option<usize>) -> Vec<WinnerRecord> {
        let winners = self.read();
        let end = end
            .unwrap_or(start.saturating_add(DEFAULT_BATCH_SIZE))
            .min(winners.len());
        if start >= end {
            return Vec::new();
        }
        winners[start..end].to_vec()
    }

    pub fn update_photo(&self, id: WinnerId, photo_url: &str) -> Result<(), StoreError> {
        let mut winners = self.write();
        let winner = winners
            .iter_mut()
            .find(|winner| winner.id == id)
            .ok_or(StoreError::NotFound(id))?;
        winner.photo_url = Some(photo_url.to_string());
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<WinnerRecord>> {
        self.winners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<WinnerRecord>> {
        self.winners.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Loads the award document once and hands out the shared [`Roster`].
///
/// Concurrent callers of [`WinnerStore::load`] wait on the same in-flight
/// fetch. A failed fetch leaves the store empty so a later call can try
/// again; nothing retries on its own.
pub struct WinnerStore {
    source: Arc<dyn AwardSource>,
    roster: OnceCell<Arc<Roster>>,
}

impl WinnerStore {
    pub fn new(source: Arc<dyn AwardSource>) -> Self {
        Self {
            source,
            roster: OnceCell::new(),
        }
    }

    pub fn from_source(source: impl AwardSource + 'static) -> Self {
        Self::new(Arc::new(source))
    }

    pub async fn load(&self) -> Result<Arc<Roster>, StoreError> {
        self.roster
            .get_or_try_init(|| async {
                let origin = self.source.describe();
                let data = self.source.load().await.map_err(|err| {
                    warn!(%origin, error = %format!("{err:#}"), "award data load failed");
                    StoreError::DataUnavailable(format!("{err:#}"))
                })?;
                let roster = Roster::new(data).inspect_err(|err| {
                    warn!(%origin, error = %err, "award data rejected");
                })?;
                info!(%origin, winners = roster.len(), "award data loaded");
                Ok(Arc::new(roster))
            })
            .await
            .cloned()
    }

    /// The roster if a load already succeeded.
    pub fn loaded(&self) -> Option<Arc<Roster>> {
        self.roster.get().cloned()
    }

    pub async fn get_by_id(&self, id: WinnerId) -> Result<WinnerRecord, StoreError> {
        self.load().await?.get_by_id(id)
    }

    pub async fn filter_by_id_range(
        &self,
        low: WinnerId,
        high: WinnerId,
    ) -> Result<Vec<WinnerRecord>, StoreError> {
        Ok(self.load().await?.filter_by_id_range(low, high))
    }

    pub async fn winners_by_award_type(
        &self,
        award_type: &str,
    ) -> Result<Vec<WinnerRecord>, StoreError> {
        Ok(self.load().await?.winners_by_award_type(award_type))
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.load().await?.len())
    }

    pub async fn batch(
        &self,
        start: usize,
        end: Option<usize>,
    ) -> Result<Vec<WinnerRecord>, StoreError> {
        Ok(self.load().await?.batch(start, end))
    }

    pub async fn update_photo(&self, id: WinnerId, photo_url: &str) -> Result<(), StoreError> {
        self.load().await?.update_photo(id, photo_url)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
