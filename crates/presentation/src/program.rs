//! Ceremony program: the template describing the running order and the
//! builder that expands it over the ordered winner list.
//!
//! Section titles are placed by *position* in the loaded winner order, never
//! by award type. The 2025 template relies on the data file listing the 50
//! winners in stage order: 25-year, 15-year and 10-year service awards, then
//! the rock awards, then the excellence awards.

use shared::domain::{
    AwardData, MainVariant, PerformanceKind, SectionKind, SlideDescriptor, WinnerId, WinnerRecord,
};

/// Winners at positions `[0, 13)` are presented before the intermission.
pub const CEREMONY_FIRST_HALF_LEN: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Before,
    After,
}

/// Inserts a section title next to the award card at `position` (0-based,
/// relative to the half being walked). Rules pointing past the end of the
/// half never fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionRule {
    pub anchor: Anchor,
    pub position: usize,
    pub section: SectionKind,
}

impl InsertionRule {
    pub const fn before(position: usize, section: SectionKind) -> Self {
        Self {
            anchor: Anchor::Before,
            position,
            section,
        }
    }

    pub const fn after(position: usize, section: SectionKind) -> Self {
        Self {
            anchor: Anchor::After,
            position,
            section,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramStep {
    Main(MainVariant),
    Performance {
        kind: PerformanceKind,
        performers: Vec<String>,
    },
    ChairmanAddress,
    Section(SectionKind),
}

impl ProgramStep {
    pub fn performance(kind: PerformanceKind) -> Self {
        ProgramStep::Performance {
            kind,
            performers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramTemplate {
    pub first_half_len: usize,
    pub opening: Vec<ProgramStep>,
    pub first_half: Vec<InsertionRule>,
    pub intermission: Vec<ProgramStep>,
    pub second_half: Vec<InsertionRule>,
    pub closing: Vec<ProgramStep>,
}

impl ProgramTemplate {
    /// The 2025 appreciation banquet running order.
    pub fn ceremony_2025() -> Self {
        use SectionKind::*;

        Self {
            first_half_len: CEREMONY_FIRST_HALF_LEN,
            opening: vec![
                ProgramStep::Main(MainVariant::Opening),
                ProgramStep::performance(PerformanceKind::Violin),
                ProgramStep::ChairmanAddress,
                ProgramStep::Main(MainVariant::Toast),
                ProgramStep::Section(FirstHalf),
            ],
            first_half: vec![
                InsertionRule::before(0, Service25Year),
                InsertionRule::before(1, Service15Year),
                InsertionRule::before(4, Service10Year),
                InsertionRule::before(7, Rock),
                InsertionRule::after(12, Rock),
                // Unreachable with a 13 winner first half; kept so a longer
                // first half picks the excellence block up automatically.
                InsertionRule::after(13, Excellence),
            ],
            intermission: vec![
                ProgramStep::performance(PerformanceKind::Choir),
                ProgramStep::Main(MainVariant::Dining),
                ProgramStep::Section(SecondHalf),
            ],
            second_half: vec![
                InsertionRule::before(12, Excellence),
                InsertionRule::after(24, Excellence),
                InsertionRule::after(36, Excellence),
            ],
            closing: vec![
                ProgramStep::performance(PerformanceKind::Dance),
                ProgramStep::Main(MainVariant::Celebration),
            ],
        }
    }
}

impl Default for ProgramTemplate {
    fn default() -> Self {
        Self::ceremony_2025()
    }
}

/// Texts shown on the opening card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckHeader {
    pub title: String,
    pub subtitle: String,
    pub date: Option<String>,
}

impl From<&AwardData> for DeckHeader {
    fn from(data: &AwardData) -> Self {
        Self {
            title: data.title.clone(),
            subtitle: data.subtitle.clone(),
            date: data.date.clone(),
        }
    }
}

/// The built, ordered slide sequence. Award cards reference winners by id so
/// photo updates are picked up at render time without rebuilding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideDeck {
    slides: Vec<SlideDescriptor>,
}

impl SlideDeck {
    pub fn total_slides(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SlideDescriptor> {
        self.slides.get(index)
    }

    pub fn slides(&self) -> &[SlideDescriptor] {
        &self.slides
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlideDescriptor> {
        self.slides.iter()
    }

    pub fn position(&self, predicate: impl Fn(&SlideDescriptor) -> bool) -> Option<usize> {
        self.slides.iter().position(predicate)
    }

    pub fn position_of_winner(&self, winner_id: WinnerId) -> Option<usize> {
        self.position(|slide| slide.winner_id() == Some(winner_id))
    }

    pub fn section_positions(&self, section: SectionKind) -> Vec<usize> {
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, slide)| slide.is_section(section))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn into_slides(self) -> Vec<SlideDescriptor> {
        self.slides
    }
}

/// Expands `template` over `winners` (in load order). Pure and deterministic.
pub fn build_slide_deck(
    template: &ProgramTemplate,
    header: &DeckHeader,
    winners: &[WinnerRecord],
) -> SlideDeck {
    let split = template.first_half_len.min(winners.len());
    let (first_half, second_half) = winners.split_at(split);

    let fixed = template.opening.len() + template.intermission.len() + template.closing.len();
    let mut slides = Vec::with_capacity(
        fixed + winners.len() + template.first_half.len() + template.second_half.len(),
    );

    push_steps(&mut slides, &template.opening, header);
    walk_half(&mut slides, first_half, &template.first_half);
    push_steps(&mut slides, &template.intermission, header);
    walk_half(&mut slides, second_half, &template.second_half);
    push_steps(&mut slides, &template.closing, header);

    SlideDeck { slides }
}

fn walk_half(slides: &mut Vec<SlideDescriptor>, winners: &[WinnerRecord], rules: &[InsertionRule]) {
    let sections_at = |anchor: Anchor, index: usize| {
        rules
            .iter()
            .filter(move |rule| rule.anchor == anchor && rule.position == index)
            .map(|rule| SlideDescriptor::SectionTitle {
                section: rule.section,
            })
    };

    for (index, winner) in winners.iter().enumerate() {
        slides.extend(sections_at(Anchor::Before, index));
        slides.push(SlideDescriptor::AwardCard {
            winner_id: winner.id,
        });
        slides.extend(sections_at(Anchor::After, index));
    }
}

fn push_steps(slides: &mut Vec<SlideDescriptor>, steps: &[ProgramStep], header: &DeckHeader) {
    slides.extend(steps.iter().map(|step| match step {
        ProgramStep::Main(variant) => {
            let (title, subtitle) = match variant.headline() {
                Some((title, subtitle)) => (title.to_string(), subtitle.to_string()),
                None => (header.title.clone(), header.subtitle.clone()),
            };
            SlideDescriptor::Main {
                variant: *variant,
                title,
                subtitle,
                date: header.date.clone(),
            }
        }
        ProgramStep::Performance { kind, performers } => SlideDescriptor::Performance {
            kind: *kind,
            performers: performers.clone(),
        },
        ProgramStep::ChairmanAddress => SlideDescriptor::ChairmanAddress,
        ProgramStep::Section(section) => SlideDescriptor::SectionTitle { section: *section },
    }));
}

#[cfg(test)]
#[path = "tests/program_tests.rs"]
mod tests;
