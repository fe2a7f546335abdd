//! Award-list CSV import.
//!
//! Columns are department, award type, recipient name and achievements, after
//! a header row. Row order is stage order, so ids are assigned 1..=N in the
//! order rows appear. Rows missing any of the first three values are skipped.

use std::io;

use anyhow::{Context, Result};
use shared::domain::{WinnerId, WinnerRecord};

/// Winners read from a CSV, plus a note for every skipped row.
#[derive(Debug, Default)]
pub struct CsvImport {
    pub winners: Vec<WinnerRecord>,
    pub skipped: Vec<String>,
}

pub fn read_award_csv(input: impl io::Read) -> Result<CsvImport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut import = CsvImport::default();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("invalid CSV in record {}", index + 1))?;
        let line = row.position().map_or(index as u64 + 2, |pos| pos.line());
        if row.iter().all(str::is_empty) {
            continue;
        }
        if row.len() < 4 {
            import
                .skipped
                .push(format!("row {line}: {} of 4 columns", row.len()));
            continue;
        }

        let department = &row[0];
        let award_type = &row[1];
        let recipient_name = &row[2];
        if department.is_empty() || award_type.is_empty() || recipient_name.is_empty() {
            import.skipped.push(format!(
                "row {line}: incomplete (department '{department}', award '{award_type}', name '{recipient_name}')"
            ));
            continue;
        }

        import.winners.push(WinnerRecord {
            id: WinnerId(import.winners.len() as i64 + 1),
            department: department.to_string(),
            award_type: award_type.to_string(),
            recipient_name: recipient_name.to_string(),
            achievements: row[3].replace("\\n", "\n"),
            photo_url: None,
        });
    }
    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
部門,獎項,姓名,具體事蹟
招生辦公室,25年資獎,俞聖陶,
中學教務處,15年資獎,羅幸基,\"負責排課, 協調教師\\n並支援招生\"

資訊處,磐石獎,,
  總務處 , 優質獎 , 黃于庭 , 維護校園
";

    #[test]
    fn keeps_row_order_and_quoted_commas() {
        let import = read_award_csv(SHEET.as_bytes()).expect("csv");
        let names: Vec<_> = import
            .winners
            .iter()
            .map(|w| (w.id, w.recipient_name.as_str()))
            .collect();
        assert_eq!(
            names,
            [
                (WinnerId(1), "俞聖陶"),
                (WinnerId(2), "羅幸基"),
                (WinnerId(3), "黃于庭"),
            ]
        );
        assert_eq!(import.winners[1].achievements, "負責排課, 協調教師\n並支援招生");
        assert_eq!(import.winners[2].department, "總務處");
        assert_eq!(import.winners[2].achievements, "維護校園");
        assert!(import.winners.iter().all(|w| w.photo_url.is_none()));
    }

    #[test]
    fn incomplete_rows_are_reported() {
        let import = read_award_csv(SHEET.as_bytes()).expect("csv");
        assert_eq!(import.skipped.len(), 1);
        assert!(import.skipped[0].starts_with("row 5: incomplete"));

        let short = read_award_csv("a,b,c,d\n資訊處,磐石獎\n".as_bytes()).expect("csv");
        assert!(short.winners.is_empty());
        assert_eq!(short.skipped, ["row 2: 2 of 4 columns"]);
    }
}
