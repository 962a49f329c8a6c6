use std::path::{Path, PathBuf};

use crate::error::ReconcileError;

use super::similarity::{fold_to_ascii, ratio};

/// A top-level library folder that plausibly belongs to one target artist.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFolder {
    pub path: PathBuf,
    /// The artist as first written in the ledger.
    pub matched_artist: String,
    /// Folded form of the artist; every ledger spelling that folds to it shares one pool.
    pub artist_key: String,
    pub similarity_score: f64,
}

/// Immediate subdirectories of `root`, sorted by name.
pub fn top_level_directories(root: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
    let filesystem_error = |operation: &str, e: std::io::Error| ReconcileError::Filesystem {
        operation: operation.to_string(),
        path: root.display().to_string(),
        error_message: e.to_string(),
    };

    let mut directories = Vec::new();
    for entry in std::fs::read_dir(root).map_err(|e| filesystem_error("list scan root", e))? {
        let entry = entry.map_err(|e| filesystem_error("read directory entry", e))?;
        if entry.path().is_dir() {
            directories.push(entry.path());
        }
    }
    directories.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(directories)
}

/// Keep only the directories whose name is close to a target artist.
///
/// Folder names and artists are compared after ASCII folding and lowercasing; a
/// folder is kept when its best artist scores strictly above `threshold`. Ties go
/// to the artist listed first, and spellings that fold together count as one artist.
/// Several folders may resolve to the same artist.
/// Anything filed under a folder that clears no artist is never looked at.
pub fn find_candidate_folders(
    directories: &[PathBuf],
    target_artists: &[String],
    threshold: f64,
) -> Vec<CandidateFolder> {
    let mut normalized: Vec<(String, &String)> = Vec::new();
    for artist in target_artists {
        let folded = fold_to_ascii(artist.trim());
        if !folded.is_empty() && !normalized.iter().any(|(n, _)| *n == folded) {
            normalized.push((folded, artist));
        }
    }

    directories
        .iter()
        .filter_map(|directory| {
            let folder_name = directory
                .file_name()
                .map(|name| fold_to_ascii(&name.to_string_lossy()))?;

            let mut best: Option<(f64, &str, &str)> = None;
            for (norm_artist, artist) in &normalized {
                let score = ratio(&folder_name, norm_artist);
                if score > threshold && best.is_none_or(|(best_score, _, _)| score > best_score) {
                    best = Some((score, norm_artist.as_str(), artist.as_str()));
                }
            }

            best.map(|(similarity_score, artist_key, artist)| CandidateFolder {
                path: directory.clone(),
                matched_artist: artist.to_string(),
                artist_key: artist_key.to_string(),
                similarity_score,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/library").join(n)).collect()
    }

    fn artists(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_exact_and_close_folder_names() {
        let candidates = find_candidate_folders(
            &dirs(&["Radiohead", "radiohed", "Muse"]),
            &artists(&["Radiohead"]),
            80.0,
        );
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].similarity_score, 100.0);
        assert_eq!(candidates[1].path, PathBuf::from("/library/radiohed"));
        assert_eq!(candidates[1].matched_artist, "Radiohead");
        assert_eq!(candidates[1].similarity_score, 94.0);
    }

    #[test]
    fn test_transliterated_folder() {
        let candidates =
            find_candidate_folders(&dirs(&["Bjork", "Sigur Ros"]), &artists(&["Björk", "Sigur Rós"]), 80.0);
        let matched: Vec<&str> = candidates.iter().map(|c| c.matched_artist.as_str()).collect();
        assert_eq!(matched, vec!["Björk", "Sigur Rós"]);
    }

    #[test]
    fn test_threshold_is_strict() {
        // "abcd" vs "abce": LCS 3 of 8 -> 75
        let candidates = find_candidate_folders(&dirs(&["abcd"]), &artists(&["abce"]), 75.0);
        assert!(candidates.is_empty());
        let candidates = find_candidate_folders(&dirs(&["abcd"]), &artists(&["abce"]), 74.0);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_best_artist_wins() {
        let candidates = find_candidate_folders(
            &dirs(&["The Nationals"]),
            &artists(&["The National", "The Nationals"]),
            80.0,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].matched_artist, "The Nationals");
    }

    #[test]
    fn test_unrelated_folders_pruned() {
        let candidates = find_candidate_folders(
            &dirs(&["Misc", "Compilations", "Downloads"]),
            &artists(&["Radiohead", "Portishead"]),
            80.0,
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_top_level_directories_sorted() {
        let root = tempfile::tempdir().unwrap();
        for name in ["b", "a", "c"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        std::fs::write(root.path().join("loose.mp3"), b"").unwrap();

        let directories = top_level_directories(root.path()).unwrap();
        let names: Vec<String> = directories
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert!(matches!(
            top_level_directories(&missing),
            Err(ReconcileError::Filesystem { .. })
        ));
    }
}
