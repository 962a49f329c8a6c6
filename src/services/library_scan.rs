use std::path::Path;

use crate::error::ReconcileError;
use crate::ledger::LedgerSnapshot;
use crate::ports::ledger::RemoteLedger;
use crate::ports::metadata::MetadataResolver;
use crate::ports::mirror::LocalMirror;
use crate::reconcile::MatchConfig;
use crate::reconcile::assigner::{GreedyAssigner, MatchResult, count_audio_files, target_artists};
use crate::reconcile::candidates::{find_candidate_folders, top_level_directories};
use crate::reconcile::executor::{CommitSummary, ModeExecutor, RunMode};

/// Outcome of one scan of the local library.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub matches: Vec<MatchResult>,
    pub commit: CommitSummary,
}

/// Finds unresolved ledger records in a local library and reports or commits them.
pub struct LibraryScanService<'a, L: ?Sized, M: ?Sized, R: ?Sized> {
    ledger: &'a L,
    mirror: &'a M,
    resolver: &'a R,
    config: &'a MatchConfig,
}

impl<'a, L, M, R> LibraryScanService<'a, L, M, R>
where
    L: RemoteLedger + ?Sized,
    M: LocalMirror + ?Sized,
    R: MetadataResolver + ?Sized,
{
    pub fn new(ledger: &'a L, mirror: &'a M, resolver: &'a R, config: &'a MatchConfig) -> Self {
        Self {
            ledger,
            mirror,
            resolver,
            config,
        }
    }

    #[tracing::instrument(skip(self), fields(root = %root.display()))]
    pub async fn scan(&self, root: &Path, mode: RunMode) -> Result<ScanOutcome, ReconcileError> {
        if !root.is_dir() {
            return Err(ReconcileError::Filesystem {
                operation: "scan".to_string(),
                path: root.display().to_string(),
                error_message: "directory does not exist".to_string(),
            });
        }

        let rows = self.ledger.get_all_rows().await?;
        let snapshot = LedgerSnapshot::from_rows(&rows)?;
        let status_columns = snapshot.layout.status_columns()?;

        let mut unresolved = snapshot.unresolved();
        if unresolved.is_empty() {
            println!("Every ledger record is already acquired or triaged.");
            return Ok(ScanOutcome {
                matches: Vec::new(),
                commit: CommitSummary::default(),
            });
        }
        let artists = target_artists(&unresolved);
        tracing::info!(
            "Found {} unresolved records across {} artists",
            unresolved.len(),
            artists.len()
        );

        let directories = top_level_directories(root)?;
        let folders = find_candidate_folders(&directories, &artists, self.config.folder_threshold);
        tracing::info!(
            "{} of {} folders match a target artist",
            folders.len(),
            directories.len()
        );
        for folder in &folders {
            tracing::debug!(
                "Candidate folder {} -> '{}' ({:.0}%)",
                folder.path.display(),
                folder.matched_artist,
                folder.similarity_score
            );
        }
        tracing::info!(
            "Scanning {} audio files in candidate folders",
            count_audio_files(&folders, self.config)
        );

        let matches =
            GreedyAssigner::new(self.resolver, self.config).assign(&folders, &mut unresolved);
        tracing::info!("{} records remain unresolved", unresolved.len());

        let commit = ModeExecutor::new(self.ledger, self.mirror, status_columns)
            .execute(&matches, mode)
            .await;

        Ok(ScanOutcome { matches, commit })
    }
}
