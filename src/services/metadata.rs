use std::path::Path;

use audiotags::Tag;

use crate::ports::metadata::{MetadataResolver, TrackTags};

/// Reads artist and title from embedded tags (ID3, FLAC, MP4, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioTagResolver;

impl MetadataResolver for AudioTagResolver {
    fn read(&self, path: &Path) -> TrackTags {
        let tag = match Tag::new().read_from_path(path) {
            Ok(tag) => tag,
            Err(e) => {
                tracing::trace!("No readable tags in {}: {}", path.display(), e);
                return TrackTags::default();
            }
        };

        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        TrackTags {
            artist: non_empty(tag.artist()),
            title: non_empty(tag.title()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_file_has_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Radiohead - Creep.mp3");
        std::fs::write(&path, b"not really an mp3").unwrap();

        assert_eq!(AudioTagResolver.read(&path), TrackTags::default());
    }

    #[test]
    fn test_missing_file_has_no_tags() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            AudioTagResolver.read(&dir.path().join("gone.flac")),
            TrackTags::default()
        );
    }
}
