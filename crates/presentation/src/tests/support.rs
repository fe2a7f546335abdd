use shared::domain::{AwardData, WinnerId, WinnerRecord};

pub(crate) fn winner(id: i64, award_type: &str) -> WinnerRecord {
    WinnerRecord {
        id: WinnerId(id),
        department: format!("部門 {id}"),
        award_type: award_type.to_string(),
        recipient_name: format!("得獎者 {id}"),
        achievements: String::new(),
        photo_url: None,
    }
}

/// The 2025 line-up: 1 + 3 + 3 service awards, 6 rock awards, 37
/// excellence awards, listed in stage order.
pub(crate) fn ceremony_winners() -> Vec<WinnerRecord> {
    (1..=50)
        .map(|id| {
            let award_type = match id {
                1 => "25年資獎",
                2..=4 => "15年資獎",
                5..=7 => "10年資獎",
                8..=13 => "磐石獎",
                _ => "優質獎",
            };
            winner(id, award_type)
        })
        .collect()
}

pub(crate) fn ceremony_data() -> AwardData {
    AwardData {
        title: "2025感恩迎新餐會".to_string(),
        subtitle: "2025 Appreciation & Welcome Banquet".to_string(),
        date: Some("2025-09-26".to_string()),
        winners: ceremony_winners(),
    }
}
