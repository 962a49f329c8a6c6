use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ledger::{PositionedRecord, TargetRecord};
use crate::ports::metadata::MetadataResolver;

use super::MatchConfig;
use super::candidates::CandidateFolder;
use super::filename::parse_file_name;
use super::similarity::fold_to_ascii;
use super::matcher::{LocalTrack, best_match, is_accepted};

/// An audio file seen during a scan, with whatever identity could be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub resolved_artist: Option<String>,
    pub resolved_title: String,
}

/// A ledger record paired with the local file that satisfies it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub record: TargetRecord,
    pub file: LocalFile,
    pub score: f64,
    /// Offset of the record among the ledger's data rows.
    pub record_position: usize,
}

impl MatchResult {
    pub fn positioned(&self) -> PositionedRecord {
        PositionedRecord {
            position: self.record_position,
            record: self.record.clone(),
        }
    }
}

/// Distinct, non-empty artists of the given records in first-seen order.
pub fn target_artists(records: &[PositionedRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.record.artist.trim().to_string())
        .filter(|artist| !artist.is_empty() && seen.insert(artist.clone()))
        .collect()
}

fn audio_files<'a>(folder: &Path, config: &'a MatchConfig) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && config.is_audio_file(e.path()))
        .map(|e| e.into_path())
}

/// Number of audio files below the candidate folders.
pub fn count_audio_files(folders: &[CandidateFolder], config: &MatchConfig) -> usize {
    folders
        .iter()
        .map(|folder| audio_files(&folder.path, config).count())
        .sum()
}

/// Greedy one-to-one assignment of local files to unresolved ledger records.
///
/// Folders are walked in order and files in name order. Each file is only scored
/// against the records of its folder's artist, the first acceptable match is
/// committed, and the record leaves every pool so it cannot match twice.
pub struct GreedyAssigner<'a, R: MetadataResolver + ?Sized> {
    resolver: &'a R,
    config: &'a MatchConfig,
}

impl<'a, R: MetadataResolver + ?Sized> GreedyAssigner<'a, R> {
    pub fn new(resolver: &'a R, config: &'a MatchConfig) -> Self {
        Self { resolver, config }
    }

    /// Match files in `folders` against `unresolved`, removing every matched record
    /// from `unresolved`.
    pub fn assign(
        &self,
        folders: &[CandidateFolder],
        unresolved: &mut Vec<PositionedRecord>,
    ) -> Vec<MatchResult> {
        // Keyed like `CandidateFolder::artist_key`, so "Björk" and "Bjork" share a pool.
        let mut pools: HashMap<String, Vec<PositionedRecord>> = HashMap::new();
        for record in unresolved.iter() {
            let artist_key = fold_to_ascii(record.record.artist.trim());
            if !artist_key.is_empty() {
                pools.entry(artist_key).or_default().push(record.clone());
            }
        }

        let mut matches = Vec::new();
        for folder in folders {
            let Some(pool) = pools.get_mut(&folder.artist_key) else {
                continue;
            };
            if pool.is_empty() {
                tracing::debug!(
                    "Skipping {}: every record for '{}' is already matched",
                    folder.path.display(),
                    folder.matched_artist
                );
                continue;
            }

            for result in self.assign_folder(folder, pool) {
                unresolved.retain(|r| r.position != result.record_position);
                matches.push(result);
            }
        }

        matches
    }

    fn assign_folder(
        &self,
        folder: &CandidateFolder,
        pool: &mut Vec<PositionedRecord>,
    ) -> Vec<MatchResult> {
        let mut matches = Vec::new();
        let mut consumed_titles: HashSet<String> = HashSet::new();

        for path in audio_files(&folder.path, self.config) {
            let Some(file) = self.resolve(&path, folder) else {
                continue;
            };
            if consumed_titles.contains(&file.resolved_title) {
                tracing::debug!("Skipping duplicate copy: {}", path.display());
                continue;
            }

            let local = LocalTrack {
                artist: file.resolved_artist.clone(),
                title: file.resolved_title.clone(),
            };
            let Some((index, score)) =
                best_match(&local, pool.iter().map(|r| &r.record), self.config)
            else {
                continue;
            };
            if !is_accepted(score, self.config) {
                continue;
            }

            let matched = pool.remove(index);
            tracing::info!(
                "Match found! (Score: {}%) - File: '{}' matched to '{}' by '{}'",
                score as i64,
                path.display(),
                matched.record.title,
                matched.record.artist
            );
            consumed_titles.insert(file.resolved_title.clone());
            matches.push(MatchResult {
                record: matched.record,
                file,
                score,
                record_position: matched.position,
            });

            if pool.is_empty() {
                break;
            }
        }

        matches
    }

    /// Tags first, then the file name. `None` when no title can be found.
    fn resolve(&self, path: &Path, folder: &CandidateFolder) -> Option<LocalFile> {
        let tags = self.resolver.read(path);
        let (mut artist, title) = match tags.title.filter(|t| !t.trim().is_empty()) {
            Some(title) => (tags.artist, title.trim().to_string()),
            None => parse_file_name(path),
        };
        if artist.is_none() && self.config.infer_artist_from_folder {
            artist = Some(folder.matched_artist.clone());
        }
        if title.is_empty() {
            return None;
        }

        Some(LocalFile {
            path: path.to_path_buf(),
            resolved_artist: artist,
            resolved_title: title,
        })
    }
}
