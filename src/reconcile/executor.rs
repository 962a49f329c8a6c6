use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::error::ReconcileError;
use crate::ledger::{ACQUIRED, ACQUIREMENT_STATUS_HEADER, TRIAGED, TRIAGED_HEADER};
use crate::ports::ledger::RemoteLedger;
use crate::ports::mirror::LocalMirror;

use super::assigner::MatchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// List the changes that would be made without touching the ledger or mirror
    Report,
    /// Mark matched records as acquired and triaged in the ledger and mirror
    Commit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub updated: usize,
    pub failed: usize,
}

/// Reports or commits accepted matches, in the order they were produced.
pub struct ModeExecutor<'a, L: RemoteLedger + ?Sized, M: LocalMirror + ?Sized> {
    ledger: &'a L,
    mirror: &'a M,
    /// 1-based (Acquirement Status, Triaged) columns of the ledger.
    status_columns: (usize, usize),
}

impl<'a, L: RemoteLedger + ?Sized, M: LocalMirror + ?Sized> ModeExecutor<'a, L, M> {
    pub fn new(ledger: &'a L, mirror: &'a M, status_columns: (usize, usize)) -> Self {
        Self {
            ledger,
            mirror,
            status_columns,
        }
    }

    pub async fn execute(&self, matches: &[MatchResult], mode: RunMode) -> CommitSummary {
        if matches.is_empty() {
            println!("No new matches found in the local library.");
            return CommitSummary::default();
        }
        println!(
            "-- Scan Complete ---\nFound {} new songs to update.",
            matches.len()
        );

        match mode {
            RunMode::Report => {
                println!("[Scan Mode] The following changes would be made in 'commit' mode:");
                for (line, m) in report_lines(matches).iter().zip(matches) {
                    println!("  - {}", line);
                    tracing::debug!("  matched by {} ({:.1}%)", m.file.path.display(), m.score);
                }
                CommitSummary::default()
            }
            RunMode::Commit => {
                println!("[Update Mode] Applying changes to the ledger and local mirror...");
                let summary = self.commit(matches).await;
                println!(
                    "Update process complete: {} updated, {} failed.",
                    summary.updated, summary.failed
                );
                summary
            }
        }
    }

    async fn commit(&self, matches: &[MatchResult]) -> CommitSummary {
        let mut summary = CommitSummary::default();
        for result in matches {
            match self.commit_one(result).await {
                Ok(()) => {
                    summary.updated += 1;
                    println!("  - Updated '{}'", result.record.title);
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("{}", e);
                    println!("  - Failed to update '{}'. Reason: {}", result.record.title, e);
                }
            }
        }
        summary
    }

    #[tracing::instrument(skip(self, result), fields(title = %result.record.title))]
    async fn commit_one(&self, result: &MatchResult) -> Result<(), ReconcileError> {
        let row = result.positioned().sheet_row();
        let (acquirement_column, triaged_column) = self.status_columns;
        let wrap = |e: ReconcileError| ReconcileError::Commit {
            title: result.record.title.clone(),
            reason: e.to_string(),
        };

        self.ledger
            .update_cell(row, acquirement_column, ACQUIRED)
            .await
            .map_err(wrap)?;
        self.ledger
            .update_cell(row, triaged_column, TRIAGED)
            .await
            .map_err(wrap)?;

        let updates = BTreeMap::from([
            (ACQUIREMENT_STATUS_HEADER.to_string(), ACQUIRED.to_string()),
            (TRIAGED_HEADER.to_string(), TRIAGED.to_string()),
        ]);
        self.mirror.update_row(&result.record.key(), &updates);

        Ok(())
    }
}

/// Human-readable description of what committing `matches` would change.
pub fn report_lines(matches: &[MatchResult]) -> Vec<String> {
    matches
        .iter()
        .map(|m| {
            format!(
                "Mark '{}' by '{}' as acquired and triaged.",
                m.record.title, m.record.artist
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{RecordKey, TargetRecord};
    use crate::ports::ledger::MockRemoteLedger;
    use crate::ports::mirror::MockLocalMirror;
    use crate::reconcile::assigner::LocalFile;
    use std::path::PathBuf;

    fn match_result(position: usize, title: &str, artist: &str) -> MatchResult {
        MatchResult {
            record: TargetRecord::new(title, artist),
            file: LocalFile {
                path: PathBuf::from(format!("/library/{artist}/{artist} - {title}.mp3")),
                resolved_artist: Some(artist.to_string()),
                resolved_title: title.to_string(),
            },
            score: 100.0,
            record_position: position,
        }
    }

    #[tokio::test]
    async fn test_report_mode_never_mutates() {
        // Mocks without expectations panic on any call.
        let ledger = MockRemoteLedger::new();
        let mirror = MockLocalMirror::new();
        let matches = vec![match_result(0, "Creep", "Radiohead"), match_result(4, "Joga", "Björk")];

        let summary = ModeExecutor::new(&ledger, &mirror, (7, 10))
            .execute(&matches, RunMode::Report)
            .await;

        assert_eq!(summary, CommitSummary::default());
    }

    #[test]
    fn test_report_lines() {
        let lines = report_lines(&[match_result(0, "Creep", "Radiohead")]);
        assert_eq!(lines, vec!["Mark 'Creep' by 'Radiohead' as acquired and triaged."]);
    }

    #[tokio::test]
    async fn test_commit_marks_only_matched_record() {
        let mut ledger = MockRemoteLedger::new();
        ledger
            .expect_update_cell()
            .withf(|row, column, value| *row == 8 && *column == 7 && value == "acquired")
            .times(1)
            .returning(|_, _, _| Ok(()));
        ledger
            .expect_update_cell()
            .withf(|row, column, value| *row == 8 && *column == 10 && value == "triaged")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut mirror = MockLocalMirror::new();
        mirror
            .expect_update_row()
            .withf(|key, updates| {
                *key == RecordKey::new("Creep", "Radiohead")
                    && updates.get("Acquirement Status").map(String::as_str) == Some("acquired")
                    && updates.get("Triaged").map(String::as_str) == Some("triaged")
            })
            .times(1)
            .return_const(());

        let summary = ModeExecutor::new(&ledger, &mirror, (7, 10))
            .execute(&[match_result(3, "Creep", "Radiohead")], RunMode::Commit)
            .await;

        assert_eq!(summary, CommitSummary { updated: 1, failed: 0 });
    }

    #[tokio::test]
    async fn test_commit_continues_after_failure() {
        let mut ledger = MockRemoteLedger::new();
        ledger
            .expect_update_cell()
            .withf(|row, _, _| *row == 5)
            .times(1)
            .returning(|_, _, _| {
                Err(ReconcileError::Remote {
                    service: "Google Sheets".into(),
                    operation: "update cell".into(),
                    error_message: "quota exceeded".into(),
                })
            });
        ledger
            .expect_update_cell()
            .withf(|row, _, _| *row == 6)
            .times(2)
            .returning(|_, _, _| Ok(()));
        let mut mirror = MockLocalMirror::new();
        mirror
            .expect_update_row()
            .withf(|key, _| key.title == "Joga")
            .times(1)
            .return_const(());

        let summary = ModeExecutor::new(&ledger, &mirror, (7, 10))
            .execute(
                &[match_result(0, "Creep", "Radiohead"), match_result(1, "Joga", "Björk")],
                RunMode::Commit,
            )
            .await;

        assert_eq!(summary, CommitSummary { updated: 1, failed: 1 });
    }

    #[tokio::test]
    async fn test_no_matches() {
        let ledger = MockRemoteLedger::new();
        let mirror = MockLocalMirror::new();
        let summary = ModeExecutor::new(&ledger, &mirror, (7, 10))
            .execute(&[], RunMode::Commit)
            .await;
        assert_eq!(summary, CommitSummary::default());
    }
}
