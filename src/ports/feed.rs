use crate::error::ReconcileError;
use crate::ledger::FeedItem;

/// Source of the user's liked tracks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LikedTracksFeed: Send + Sync {
    /// The `limit` most recently liked tracks, newest first.
    async fn recent_liked_tracks(&self, limit: u32) -> Result<Vec<FeedItem>, ReconcileError>;
}
