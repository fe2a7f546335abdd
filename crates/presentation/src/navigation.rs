use std::str::FromStr;

use shared::domain::{AwardCategory, PerformanceKind, SectionKind, SlideDescriptor, WinnerId};
use thiserror::Error;

use crate::program::SlideDeck;

/// Keys the presenter reacts to. Anything else never reaches the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Space,
    Home,
    Escape,
    Fullscreen,
    PhotoPanel,
    Digit(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unmapped key '{0}'")]
pub struct UnmappedKey(pub String);

impl FromStr for Key {
    type Err = UnmappedKey;

    /// Accepts DOM `KeyboardEvent.key` names and the short aliases the
    /// terminal presenter reads from stdin.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name == " " {
            return Ok(Key::Space);
        }
        let key = match name.trim().to_ascii_lowercase().as_str() {
            "arrowright" | "right" => Key::ArrowRight,
            "arrowleft" | "left" => Key::ArrowLeft,
            "space" | "spacebar" => Key::Space,
            "home" => Key::Home,
            "escape" | "esc" => Key::Escape,
            "f" => Key::Fullscreen,
            "p" => Key::PhotoPanel,
            digit @ ("1" | "2" | "3" | "4" | "5" | "6" | "7") => {
                Key::Digit(digit.as_bytes()[0] - b'0')
            }
            _ => return Err(UnmappedKey(name.to_string())),
        };
        Ok(key)
    }
}

/// Actions the host surface performs itself; the cursor never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    ToggleFullscreen,
    OpenPhotoPanel,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEffect {
    Moved { from: usize, to: usize },
    Unchanged,
    Host(HostAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    Slide(usize),
    FirstPerformance(PerformanceKind),
    FirstSection(SectionKind),
}

/// Digits 1 through 7, in order.
pub const DIGIT_SHORTCUTS: [JumpTarget; 7] = [
    JumpTarget::Slide(0),
    JumpTarget::Slide(1),
    JumpTarget::Slide(2),
    JumpTarget::Slide(4),
    JumpTarget::FirstPerformance(PerformanceKind::Choir),
    JumpTarget::FirstSection(SectionKind::SecondHalf),
    JumpTarget::FirstPerformance(PerformanceKind::Dance),
];

/// Digit shortcuts resolved against one built deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuickJumps {
    targets: [Option<usize>; 7],
}

impl QuickJumps {
    pub fn resolve(deck: &SlideDeck) -> Self {
        let targets = DIGIT_SHORTCUTS.map(|target| match target {
            JumpTarget::Slide(index) => (index < deck.total_slides()).then_some(index),
            JumpTarget::FirstPerformance(kind) => deck.position(|s| s.is_performance(kind)),
            JumpTarget::FirstSection(section) => deck.position(|s| s.is_section(section)),
        });
        Self { targets }
    }

    /// `digit` is 1-based as printed on the keyboard.
    pub fn target(&self, digit: u8) -> Option<usize> {
        let slot = usize::from(digit).checked_sub(1)?;
        self.targets.get(slot).copied().flatten()
    }
}

/// Cursor over a deck of `total` slides. Every operation is total: an empty
/// deck keeps the cursor at 0 and out-of-range requests are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationController {
    cursor: usize,
    total: usize,
}

impl NavigationController {
    pub fn new(total_slides: usize) -> Self {
        Self {
            cursor: 0,
            total: total_slides,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_slides(&self) -> usize {
        self.total
    }

    pub fn next(&mut self) {
        if self.total > 0 {
            self.cursor = (self.cursor + 1) % self.total;
        }
    }

    pub fn previous(&mut self) {
        if self.total > 0 {
            self.cursor = (self.cursor + self.total - 1) % self.total;
        }
    }

    pub fn go_to_start(&mut self) {
        self.cursor = 0;
    }

    /// Returns whether `index` was in range.
    pub fn go_to_slide(&mut self, index: usize) -> bool {
        if index < self.total {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    /// Moves to the first award card whose winner falls in `category`.
    pub fn jump_to_category(
        &mut self,
        deck: &SlideDeck,
        category: AwardCategory,
        category_of: impl Fn(WinnerId) -> Option<AwardCategory>,
    ) -> bool {
        let target = deck.position(|slide| match slide {
            SlideDescriptor::AwardCard { winner_id } => category_of(*winner_id) == Some(category),
            _ => false,
        });
        target.is_some_and(|index| self.go_to_slide(index))
    }

    pub fn apply_key(&mut self, key: Key, jumps: &QuickJumps) -> KeyEffect {
        let from = self.cursor;
        match key {
            Key::ArrowRight | Key::Space => self.next(),
            Key::ArrowLeft => self.previous(),
            Key::Home => self.go_to_start(),
            Key::Digit(digit) => {
                if let Some(index) = jumps.target(digit) {
                    self.go_to_slide(index);
                }
            }
            Key::Fullscreen => return KeyEffect::Host(HostAction::ToggleFullscreen),
            Key::PhotoPanel => return KeyEffect::Host(HostAction::OpenPhotoPanel),
            Key::Escape => return KeyEffect::Host(HostAction::Dismiss),
        }

        if self.cursor == from {
            KeyEffect::Unchanged
        } else {
            KeyEffect::Moved {
                from,
                to: self.cursor,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
