//! Markdown export of a record store.
//!
//! A pure function of the store contents; rendering never mutates it.

use crate::records::RecordStore;
use crate::types::Timestamp;
use chrono::NaiveDate;

/// Default document heading.
pub const DEFAULT_TITLE: &str = "Dall-E 2 Images";

/// Render valid records captured at or after `since`, newest first and
/// grouped under one header per calendar day.
///
/// Entries on the newest day carry an image thumbnail.
pub fn render_markdown(store: &RecordStore, since: Timestamp, title: &str) -> String {
    let mut lines = vec![format!("# {title}")];
    let mut current_day: Option<NaiveDate> = None;
    let mut first_day: Option<NaiveDate> = None;

    for record in store.newest_first() {
        if !record.valid || record.captured_at < since {
            continue;
        }

        let day = record.captured_at.date();
        if current_day != Some(day) {
            current_day = Some(day);
            lines.push(format!("### {day}"));
            first_day.get_or_insert(day);
        }

        let thumbnail = if first_day == Some(day) {
            format!("[<img src=\"{0}\" width=\"200\"/>]({0})", record.image_url)
        } else {
            String::new()
        };

        lines.push(format!(
            "* {thumbnail} [{}]({})",
            escape_description(&record.description),
            record.url
        ));
    }

    lines.join("\n")
}

/// Neutralise characters that would be read as markdown structure.
fn escape_description(description: &str) -> String {
    description
        .replace('\n', " ! ")
        .replace('#', ".")
        .replace('>', ".")
        .replace('-', "!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PageMeta, Record};

    fn at(d: u32, h: u32) -> Timestamp {
        Timestamp::from_ymd_hms(2022, 6, d, h, 0, 0).unwrap()
    }

    fn store_with(records: Vec<Record>) -> RecordStore {
        let mut store = RecordStore::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    #[test]
    fn test_empty_store_renders_title_only() {
        let doc = render_markdown(&RecordStore::new(), at(1, 0), "Images");
        assert_eq!(doc, "# Images");
    }

    #[test]
    fn test_grouped_newest_first_with_thumbnails_on_first_day() {
        let store = store_with(vec![
            Record::new("https://x/s/1", PageMeta::new("older", "https://i/1.png"), at(1, 9)),
            Record::new("https://x/s/2", PageMeta::new("newer", "https://i/2.png"), at(2, 8)),
            Record::new("https://x/s/3", PageMeta::new("newest", "https://i/3.png"), at(2, 20)),
        ]);

        let doc = render_markdown(&store, at(1, 0), DEFAULT_TITLE);

        let expected = [
            "# Dall-E 2 Images",
            "### 2022-06-02",
            "* [<img src=\"https://i/3.png\" width=\"200\"/>](https://i/3.png) [newest](https://x/s/3)",
            "* [<img src=\"https://i/2.png\" width=\"200\"/>](https://i/2.png) [newer](https://x/s/2)",
            "### 2022-06-01",
            "*  [older](https://x/s/1)",
        ]
        .join("\n");
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_filters_invalid_and_old_records() {
        let store = store_with(vec![
            Record::new("https://x/s/gone", PageMeta::new("", ""), at(3, 0)),
            Record::new("https://x/s/old", PageMeta::new("old", ""), at(1, 0)),
            Record::new("https://x/s/kept", PageMeta::new("kept", "i"), at(2, 0)),
        ]);

        let doc = render_markdown(&store, at(2, 0), "T");

        assert!(doc.contains("[kept](https://x/s/kept)"));
        assert!(!doc.contains("gone"));
        assert!(!doc.contains("[old]"));
        assert!(!doc.contains("2022-06-03"));
    }

    #[test]
    fn test_same_day_of_month_in_different_months_are_separate() {
        let store = store_with(vec![
            Record::new(
                "https://x/s/may",
                PageMeta::new("may", ""),
                Timestamp::from_ymd_hms(2022, 5, 2, 0, 0, 0).unwrap(),
            ),
            Record::new("https://x/s/june", PageMeta::new("june", ""), at(2, 0)),
        ]);

        let since = Timestamp::from_ymd_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let doc = render_markdown(&store, since, "T");

        assert!(doc.contains("### 2022-06-02"));
        assert!(doc.contains("### 2022-05-02\n*  [may](https://x/s/may)"));
    }

    #[test]
    fn test_escape_description() {
        assert_eq!(
            escape_description("# title\n> quote - dash"),
            ". title ! . quote ! dash"
        );
    }
}
