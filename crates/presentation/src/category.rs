use shared::domain::AwardCategory;

const SERVICE_MARKERS: [&str; 3] = ["年資獎", "Years of Service", "Leadership Award"];
const ROCK_MARKERS: [&str; 1] = ["磐石獎"];

/// Classifies an award label by keyword. The checks run in order and the
/// first hit wins; anything unrecognized is an excellence award.
pub fn classify(award_type: &str) -> AwardCategory {
    if contains_any(award_type, &SERVICE_MARKERS) {
        AwardCategory::Service
    } else if contains_any(award_type, &ROCK_MARKERS) {
        AwardCategory::Rock
    } else {
        // "優質獎" / "Outstanding Performance" and unmatched labels alike.
        AwardCategory::Excellence
    }
}

fn contains_any(label: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| label.contains(marker))
}
