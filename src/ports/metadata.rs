use std::path::Path;

/// Artist and title as found in a file's embedded tags, when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: Option<String>,
    pub title: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait MetadataResolver {
    /// Never fails: unreadable or untagged files yield empty tags.
    fn read(&self, path: &Path) -> TrackTags;
}
