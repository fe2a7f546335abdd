//! Presentation core for the awards ceremony: the winner store, the
//! category classifier, the slide program and the navigation controller.

use std::sync::{Arc, Weak};

use shared::domain::{AwardCategory, SlideDescriptor, WinnerRecord};
use tokio::{
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod category;
pub mod navigation;
pub mod program;
pub mod remote;
pub mod source;
pub mod store;

pub use category::classify;
pub use navigation::{HostAction, Key, KeyEffect, NavigationController, QuickJumps};
pub use program::{build_slide_deck, DeckHeader, ProgramTemplate, SlideDeck};
pub use source::{HttpAwardSource, StaticAwardSource};
pub use store::{AwardSource, Roster, StoreError, WinnerStore};

/// What the host draws for the cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSlide {
    pub index: usize,
    pub total: usize,
    pub descriptor: SlideDescriptor,
    /// Present for award cards; read at call time so photo updates show up.
    pub winner: Option<WinnerRecord>,
}

/// A built deck plus its cursor over a loaded roster.
pub struct Presentation {
    roster: Arc<Roster>,
    deck: SlideDeck,
    jumps: QuickJumps,
    nav: NavigationController,
}

impl Presentation {
    pub fn new(roster: Arc<Roster>, template: &ProgramTemplate) -> Self {
        let deck = build_slide_deck(template, roster.header(), &roster.winners());
        let jumps = QuickJumps::resolve(&deck);
        let nav = NavigationController::new(deck.total_slides());
        Self {
            roster,
            deck,
            jumps,
            nav,
        }
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn cursor(&self) -> usize {
        self.nav.cursor()
    }

    pub fn total_slides(&self) -> usize {
        self.nav.total_slides()
    }

    pub fn current(&self) -> Option<CurrentSlide> {
        let index = self.nav.cursor();
        let descriptor = self.deck.get(index)?.clone();
        let winner = descriptor
            .winner_id()
            .and_then(|id| self.roster.get_by_id(id).ok());
        Some(CurrentSlide {
            index,
            total: self.deck.total_slides(),
            descriptor,
            winner,
        })
    }

    pub fn next(&mut self) {
        self.nav.next();
    }

    pub fn previous(&mut self) {
        self.nav.previous();
    }

    pub fn go_to_start(&mut self) {
        self.nav.go_to_start();
    }

    pub fn go_to_slide(&mut self, index: usize) -> bool {
        self.nav.go_to_slide(index)
    }

    pub fn jump_to_category(&mut self, category: AwardCategory) -> bool {
        let roster = &self.roster;
        self.nav
            .jump_to_category(&self.deck, category, |id| roster.category_of(id))
    }

    pub fn handle_key(&mut self, key: Key) -> KeyEffect {
        self.nav.apply_key(key, &self.jumps)
    }

    /// Rebuilds the deck from the roster's current contents, keeping the
    /// cursor on the same slide where that slide still exists.
    pub fn rebuild(&mut self, template: &ProgramTemplate) {
        let current = self.deck.get(self.nav.cursor()).cloned();
        let occurrence = current.as_ref().map(|slide| {
            self.deck.slides()[..self.nav.cursor()]
                .iter()
                .filter(|other| *other == slide)
                .count()
        });

        let rebuilt = Presentation::new(self.roster.clone(), template);
        let mut nav = rebuilt.nav;
        if let (Some(slide), Some(occurrence)) = (current, occurrence) {
            let same = rebuilt
                .deck
                .iter()
                .enumerate()
                .filter(|(_, other)| **other == slide)
                .nth(occurrence)
                .map(|(index, _)| index);
            let target = same.unwrap_or(self.nav.cursor());
            nav.go_to_slide(target.min(nav.total_slides().saturating_sub(1)));
        }

        self.deck = rebuilt.deck;
        self.jumps = rebuilt.jumps;
        self.nav = nav;
    }
}

pub enum LoadState {
    Loading,
    Ready(Presentation),
    Failed(StoreError),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }
}

/// Owns the presentation for one host surface while the roster loads.
pub struct PresentationSession {
    template: ProgramTemplate,
    state: Mutex<LoadState>,
}

impl PresentationSession {
    pub fn new(template: ProgramTemplate) -> Arc<Self> {
        Arc::new(Self {
            template,
            state: Mutex::new(LoadState::Loading),
        })
    }

    /// Loads in the background. The task only keeps a weak handle, so a
    /// session dropped before the load resolves simply discards the result.
    pub fn spawn_load(self: &Arc<Self>, store: Arc<WinnerStore>) -> JoinHandle<()> {
        let session = Arc::downgrade(self);
        tokio::spawn(async move {
            let result = store.load().await;
            Self::finish_load(session, result).await;
        })
    }

    async fn finish_load(session: Weak<Self>, result: Result<Arc<Roster>, StoreError>) {
        let Some(session) = session.upgrade() else {
            debug!("presentation session dropped before load finished");
            return;
        };

        let next = match result {
            Ok(roster) => {
                let presentation = Presentation::new(roster, &session.template);
                info!(slides = presentation.total_slides(), "presentation ready");
                LoadState::Ready(presentation)
            }
            Err(err) => {
                warn!(error = %err, "presentation cannot load");
                LoadState::Failed(err)
            }
        };
        *session.state.lock().await = next;
    }

    pub async fn state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().await
    }

    /// Runs `f` against the ready presentation; `None` while loading or failed.
    pub async fn with_presentation<R>(&self, f: impl FnOnce(&mut Presentation) -> R) -> Option<R> {
        match &mut *self.state.lock().await {
            LoadState::Ready(presentation) => Some(f(presentation)),
            LoadState::Loading | LoadState::Failed(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
