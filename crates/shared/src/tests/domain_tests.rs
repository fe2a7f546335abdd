use super::*;

#[test]
fn winner_record_uses_camel_case_fields() {
    let raw = r#"{
        "id": 7,
        "department": "中學教務處",
        "awardType": "10年資獎",
        "recipientName": "Mitchell David James",
        "achievements": ""
    }"#;
    let winner: WinnerRecord = serde_json::from_str(raw).expect("json");
    assert_eq!(winner.id, WinnerId(7));
    assert_eq!(winner.award_type, "10年資獎");
    assert_eq!(winner.photo(), None);

    let encoded = serde_json::to_value(&winner).expect("encode");
    assert!(encoded.get("photoUrl").is_none());
    assert_eq!(encoded["recipientName"], "Mitchell David James");
}

#[test]
fn blank_photo_url_counts_as_no_photo() {
    let mut winner = WinnerRecord {
        id: WinnerId(1),
        department: "招生辦公室".into(),
        award_type: "25年資獎".into(),
        recipient_name: "俞聖陶".into(),
        achievements: String::new(),
        photo_url: Some("  ".into()),
    };
    assert_eq!(winner.photo(), None);

    winner.photo_url = Some("https://photos.example/a.jpg".into());
    assert_eq!(winner.photo(), Some("https://photos.example/a.jpg"));
}

#[test]
fn slide_descriptor_is_tagged_by_type() {
    let card = SlideDescriptor::AwardCard {
        winner_id: WinnerId(14),
    };
    let encoded = serde_json::to_value(&card).expect("encode");
    assert_eq!(encoded["type"], "award_card");
    assert_eq!(encoded["winner_id"], 14);

    let section: SlideDescriptor =
        serde_json::from_str(r#"{"type":"section_title","section":"service_25_year"}"#)
            .expect("decode");
    assert!(section.is_section(SectionKind::Service25Year));
    assert_eq!(section.winner_id(), None);
}
