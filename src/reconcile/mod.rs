//! The reconciliation engine.
//!
//! Two independent halves live here:
//! - [`frontier`] decides which freshly fetched liked tracks are missing from the ledger.
//! - [`candidates`], [`matcher`], [`assigner`] and [`executor`] match unresolved ledger
//!   records against files in a local library and then report or commit the results.

pub mod assigner;
pub mod candidates;
pub mod executor;
pub mod filename;
pub mod frontier;
pub mod matcher;
pub mod similarity;

use serde::{Deserialize, Serialize};

/// Tunables for the local-match engine. Loaded from the `[matching]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Extensions (without the dot) considered audio files.
    pub audio_extensions: Vec<String>,
    /// A folder is a candidate for an artist when their ratio is strictly above this.
    pub folder_threshold: f64,
    /// A file matches a record when its weighted score is strictly above this.
    pub match_threshold: f64,
    pub title_weight: f64,
    pub artist_weight: f64,
    /// Artist similarity used when the local artist could not be resolved.
    pub missing_artist_score: f64,
    /// Use the candidate folder's artist when neither tags nor filename provide one.
    pub infer_artist_from_folder: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            audio_extensions: ["mp3", "flac", "m4a", "ogg", "wav"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            folder_threshold: 80.0,
            match_threshold: 85.0,
            title_weight: 0.7,
            artist_weight: 0.3,
            missing_artist_score: 50.0,
            infer_artist_from_folder: false,
        }
    }
}

impl MatchConfig {
    pub fn is_audio_file(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.audio_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }
}
