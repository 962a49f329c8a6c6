use std::path::Path;

use crate::error::ReconcileError;
use crate::ports::feed::LikedTracksFeed;
use crate::ports::ledger::RemoteLedger;
use crate::ports::metadata::MetadataResolver;
use crate::ports::mirror::LocalMirror;
use crate::reconcile::executor::RunMode;
use crate::services::ledger_sync::LedgerSyncService;
use crate::services::library_scan::{LibraryScanService, ScanOutcome};

/// Fatal errors are passed on; anything else is logged and only aborts `operation`.
pub fn absorb<T>(
    operation: &str,
    result: Result<T, ReconcileError>,
) -> Result<Option<T>, ReconcileError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::error!("{} aborted: {}", operation, e);
            Ok(None)
        }
    }
}

/// Sync the liked tracks into the ledger, then scan `root` for unresolved records.
///
/// A sync that fails with a non-fatal error still lets the scan run.
#[tracing::instrument(skip(sync, scan), fields(root = %root.display()))]
pub async fn sync_then_scan<F, L, M, R>(
    sync: &LedgerSyncService<'_, F, L, M>,
    scan: &LibraryScanService<'_, L, M, R>,
    top: u32,
    root: &Path,
    mode: RunMode,
) -> Result<Option<ScanOutcome>, ReconcileError>
where
    F: LikedTracksFeed + ?Sized,
    L: RemoteLedger + ?Sized,
    M: LocalMirror + ?Sized,
    R: MetadataResolver + ?Sized,
{
    absorb("Sync", sync.sync_liked_tracks(top).await)?;
    absorb("Scan", scan.scan(root, mode).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::feed::MockLikedTracksFeed;
    use crate::ports::ledger::MockRemoteLedger;
    use crate::ports::metadata::{MockMetadataResolver, TrackTags};
    use crate::ports::mirror::MockLocalMirror;
    use crate::reconcile::MatchConfig;
    use crate::test_utils::{feed_item, row};

    fn library(files: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for file in files {
            let path = root.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"").unwrap();
        }
        root
    }

    #[test]
    fn test_absorb_keeps_fatal_errors() {
        let fatal: Result<(), _> = Err(ReconcileError::configuration("missing client id"));
        assert!(absorb("Sync", fatal).is_err());

        let local: Result<(), _> = Err(ReconcileError::schema("no Method Added column"));
        assert_eq!(absorb("Sync", local).unwrap(), None);

        assert_eq!(absorb("Scan", Ok::<_, ReconcileError>(3)).unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_scan_runs_after_sync_schema_error() {
        let root = library(&["Radiohead/Radiohead - Creep.mp3"]);
        let mut feed = MockLikedTracksFeed::new();
        feed.expect_recent_liked_tracks()
            .returning(|_| Ok(vec![feed_item("Airbag", "Radiohead")]));
        // No Method Added column: sync stops with a schema error, scan still works.
        let mut ledger = MockRemoteLedger::new();
        ledger.expect_get_all_rows().returning(|| {
            Ok(vec![
                row(&["Music Saved Tracks"]),
                row(&[]),
                row(&[]),
                row(&[
                    "",
                    "Title",
                    "Artist",
                    "Album",
                    "Art",
                    "Link",
                    "Acquirement Status",
                    "Quality",
                    "",
                    "Triaged",
                ]),
                row(&["", "Creep", "Radiohead"]),
            ])
        });
        let mirror = MockLocalMirror::new();
        let mut resolver = MockMetadataResolver::new();
        resolver.expect_read().returning(|_| TrackTags::default());
        let config = MatchConfig::default();

        let sync = LedgerSyncService::new(&feed, &ledger, &mirror);
        let scan = LibraryScanService::new(&ledger, &mirror, &resolver, &config);
        let outcome = sync_then_scan(&sync, &scan, 10, root.path(), RunMode::Report)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].record.title, "Creep");
    }

    #[tokio::test]
    async fn test_fatal_sync_error_skips_scan() {
        let root = library(&["Radiohead/Radiohead - Creep.mp3"]);
        let mut feed = MockLikedTracksFeed::new();
        feed.expect_recent_liked_tracks().returning(|_| {
            Err(ReconcileError::RemoteAuth {
                service: "Spotify".into(),
                reason: "refresh token revoked".into(),
            })
        });
        // Any ledger read or metadata read would panic.
        let ledger = MockRemoteLedger::new();
        let mirror = MockLocalMirror::new();
        let resolver = MockMetadataResolver::new();
        let config = MatchConfig::default();

        let sync = LedgerSyncService::new(&feed, &ledger, &mirror);
        let scan = LibraryScanService::new(&ledger, &mirror, &resolver, &config);
        let err = sync_then_scan(&sync, &scan, 10, root.path(), RunMode::Commit)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::RemoteAuth { .. }));
    }
}
