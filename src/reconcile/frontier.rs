use std::collections::HashSet;

use crate::ledger::{FeedItem, RecordKey, TargetRecord};

/// Keys of ledger rows that were appended automatically by earlier syncs.
pub fn auto_added_keys<'a>(records: impl IntoIterator<Item = &'a TargetRecord>) -> HashSet<RecordKey> {
    records
        .into_iter()
        .filter(|record| record.is_auto_added())
        .map(TargetRecord::key)
        .collect()
}

/// Feed items (oldest first) whose (title, artist) is not yet in the ledger.
///
/// Membership-based: the result depends only on what the ledger contains, not on
/// where. Running it again after appending the result yields nothing, and manual
/// edits or reordering of ledger rows do not shift the frontier.
pub fn new_feed_items(feed: &[FeedItem], existing: &HashSet<RecordKey>) -> Vec<FeedItem> {
    feed.iter()
        .filter(|item| !existing.contains(&RecordKey::new(&item.title, &item.artist)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerSnapshot;
    use crate::test_utils::{auto_added_row, feed_item, ledger_rows, row};

    fn keys(rows: &[Vec<String>]) -> HashSet<RecordKey> {
        let snapshot = LedgerSnapshot::from_rows(&ledger_rows(rows)).unwrap();
        auto_added_keys(&snapshot.records)
    }

    #[test]
    fn test_empty_feed() {
        assert!(new_feed_items(&[], &keys(&[auto_added_row("X", "A")])).is_empty());
    }

    #[test]
    fn test_empty_ledger_returns_whole_feed() {
        let feed = vec![feed_item("X", "A"), feed_item("Y", "B")];
        assert_eq!(new_feed_items(&feed, &keys(&[])), feed);
    }

    #[test]
    fn test_existing_item_is_skipped() {
        let feed = vec![feed_item("X", "A"), feed_item("Y", "B")];
        let new = new_feed_items(&feed, &keys(&[auto_added_row("X", "A")]));
        assert_eq!(new, vec![feed_item("Y", "B")]);
    }

    #[test]
    fn test_all_present() {
        let feed = vec![feed_item("X", "A"), feed_item("Y", "B")];
        let existing = keys(&[auto_added_row("Y", "B"), auto_added_row("X", "A")]);
        assert!(new_feed_items(&feed, &existing).is_empty());
    }

    #[test]
    fn test_idempotent_after_append() {
        let feed = vec![feed_item("X", "A"), feed_item("Y", "B"), feed_item("Z", "C")];
        let mut ledger = vec![auto_added_row("Y", "B")];

        let first = new_feed_items(&feed, &keys(&ledger));
        assert_eq!(first, vec![feed_item("X", "A"), feed_item("Z", "C")]);

        ledger.extend(first.iter().map(|item| item.to_ledger_row("now")));
        assert!(new_feed_items(&feed, &keys(&ledger)).is_empty());
    }

    #[test]
    fn test_preserves_feed_order() {
        let feed: Vec<FeedItem> = (0..20)
            .map(|i| feed_item(&format!("Song {}", i), "Artist"))
            .collect();
        let ledger: Vec<Vec<String>> = (0..20)
            .filter(|i| i % 3 == 0)
            .map(|i| auto_added_row(&format!("Song {}", i), "Artist"))
            .collect();

        let new = new_feed_items(&feed, &keys(&ledger));
        let expected: Vec<FeedItem> = feed
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != 0)
            .map(|(_, item)| item.clone())
            .collect();
        assert_eq!(new, expected);
    }

    #[test]
    fn test_same_title_different_artist_is_new() {
        let feed = vec![feed_item("Creep", "TLC")];
        let new = new_feed_items(&feed, &keys(&[auto_added_row("Creep", "Radiohead")]));
        assert_eq!(new, feed);
    }

    #[test]
    fn test_padded_feed_title_matches_its_appended_row() {
        let feed = vec![feed_item("Creep ", " Radiohead")];
        let ledger: Vec<Vec<String>> = feed.iter().map(|item| item.to_ledger_row("now")).collect();
        assert!(new_feed_items(&feed, &keys(&ledger)).is_empty());
    }

    #[test]
    fn test_manual_rows_do_not_count() {
        let feed = vec![feed_item("X", "A")];
        let manual = row(&["", "X", "A"]);
        assert_eq!(new_feed_items(&feed, &keys(&[manual])), feed);
    }
}
