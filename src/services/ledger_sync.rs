use crate::error::ReconcileError;
use crate::ledger::{FeedItem, HEADER_ROW, LedgerSnapshot, format_date_added};
use crate::ports::feed::LikedTracksFeed;
use crate::ports::ledger::RemoteLedger;
use crate::ports::mirror::LocalMirror;
use crate::reconcile::frontier::{auto_added_keys, new_feed_items};

/// Keeps the remote ledger (and its local mirror) in step with the liked-tracks feed.
pub struct LedgerSyncService<'a, F: ?Sized, L: ?Sized, M: ?Sized> {
    feed: &'a F,
    ledger: &'a L,
    mirror: &'a M,
}

impl<'a, F, L, M> LedgerSyncService<'a, F, L, M>
where
    F: LikedTracksFeed + ?Sized,
    L: RemoteLedger + ?Sized,
    M: LocalMirror + ?Sized,
{
    pub fn new(feed: &'a F, ledger: &'a L, mirror: &'a M) -> Self {
        Self {
            feed,
            ledger,
            mirror,
        }
    }

    /// Append the `limit` most recent liked tracks that are not in the ledger yet,
    /// oldest first. Returns the appended items.
    #[tracing::instrument(skip(self))]
    pub async fn sync_liked_tracks(&self, limit: u32) -> Result<Vec<FeedItem>, ReconcileError> {
        let mut feed = self.feed.recent_liked_tracks(limit).await?;
        feed.reverse();
        tracing::info!("Fetched {} liked tracks", feed.len());

        let rows = self.ledger.get_all_rows().await?;
        let snapshot = LedgerSnapshot::from_rows(&rows)?;
        snapshot.layout.require_method_added()?;

        let existing = auto_added_keys(&snapshot.records);
        let new_items = new_feed_items(&feed, &existing);
        if new_items.is_empty() {
            println!("No new liked tracks to add.");
            return Ok(new_items);
        }

        for item in &new_items {
            let row = item.to_ledger_row(&format_date_added(&chrono::Local::now()));
            self.ledger.append_row(row.clone()).await?;
            self.mirror.append_row(&row);
            tracing::info!("Added '{}' by '{}'", item.title, item.artist);
        }
        println!("Added {} new tracks to the ledger.", new_items.len());

        Ok(new_items)
    }
}

/// Overwrite the local mirror with the ledger's header row and data rows.
#[tracing::instrument(skip_all)]
pub async fn reset_mirror<L, M>(ledger: &L, mirror: &M) -> Result<usize, ReconcileError>
where
    L: RemoteLedger + ?Sized,
    M: LocalMirror + ?Sized,
{
    let rows = ledger.get_all_rows().await?;
    let snapshot = LedgerSnapshot::from_rows(&rows)?;
    mirror.reset(snapshot.layout.headers(), &snapshot.rows)?;
    println!(
        "Mirror reset from the ledger: header row {} and {} data rows.",
        HEADER_ROW,
        snapshot.rows.len()
    );
    Ok(snapshot.rows.len())
}
