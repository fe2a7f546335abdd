use std::fmt;

use presentation::CurrentSlide;
use shared::domain::{PerformanceKind, SectionKind, SlideDescriptor, WinnerRecord};

const RULE: &str = "────────────────────────────────────────";

fn performance_titles(kind: PerformanceKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        PerformanceKind::Violin => (
            "小提琴表演",
            "Violin Performance",
            "開場表演 / Opening Performance",
        ),
        PerformanceKind::Choir => (
            "小學國際處中外師合唱",
            "Elementary International Division Choir",
            "串場表演 / Intermission Performance",
        ),
        PerformanceKind::Dance => (
            "幼兒園中外師多元文化舞蹈表演",
            "Kindergarten Multicultural Dance Performance",
            "串場表演 / Intermission Performance",
        ),
    }
}

fn section_titles(section: SectionKind) -> (&'static str, &'static str) {
    match section {
        SectionKind::FirstHalf => ("上半場頒獎", "Service & Rock Awards"),
        SectionKind::SecondHalf => ("下半場頒獎", "Excellence Awards"),
        SectionKind::Service25Year => ("25年 年資獎", "25-Year Service Award"),
        SectionKind::Service15Year => ("15年 年資獎", "15-Year Service Award"),
        SectionKind::Service10Year => ("10年 年資獎", "10-Year Service Award"),
        SectionKind::Rock => ("磐石獎", "Rock Award"),
        SectionKind::Excellence => ("優質獎", "Outstanding Performance Award"),
    }
}

/// Plain-text rendering of one slide for the terminal.
pub fn render(slide: &CurrentSlide) -> String {
    SlideText(slide).to_string()
}

struct SlideText<'a>(&'a CurrentSlide);

impl fmt::Display for SlideText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slide = self.0;
        writeln!(f, "{RULE}")?;
        writeln!(f, "[{}/{}]", slide.index + 1, slide.total)?;

        match &slide.descriptor {
            SlideDescriptor::Main {
                title,
                subtitle,
                date,
                ..
            } => {
                writeln!(f, "{title}")?;
                writeln!(f, "{subtitle}")?;
                if let Some(date) = date {
                    writeln!(f, "{date}")?;
                }
            }
            SlideDescriptor::Performance { kind, performers } => {
                let (title, english, description) = performance_titles(*kind);
                writeln!(f, "{title}")?;
                writeln!(f, "{english}")?;
                writeln!(f, "{description}")?;
                if !performers.is_empty() {
                    writeln!(f, "演出: {}", performers.join("、"))?;
                }
            }
            SlideDescriptor::ChairmanAddress => {
                writeln!(f, "康橋董事長 致詞")?;
                writeln!(f, "Chairman's Address")?;
            }
            SlideDescriptor::SectionTitle { section } => {
                let (title, english) = section_titles(*section);
                writeln!(f, "== {title} ==")?;
                writeln!(f, "{english}")?;
            }
            SlideDescriptor::AwardCard { winner_id } => match &slide.winner {
                Some(winner) => write_winner(f, winner)?,
                None => writeln!(f, "(winner {winner_id} missing from award data)")?,
            },
        }

        write!(f, "{RULE}")
    }
}

fn write_winner(f: &mut fmt::Formatter<'_>, winner: &WinnerRecord) -> fmt::Result {
    writeln!(f, "{}", winner.award_type)?;
    writeln!(f, "{}  {}", winner.recipient_name, winner.department)?;
    if !winner.achievements.trim().is_empty() {
        writeln!(f, "{}", winner.achievements.trim())?;
    }
    writeln!(f, "photo: {}", winner.photo().unwrap_or("(none)"))
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
