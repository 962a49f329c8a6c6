use std::path::Path;

/// Separators between artist and title in file names, tried in order.
const SEPARATORS: &[&str] = &[" - ", " – ", " _ "];

/// Guess (artist, title) from a file name.
///
/// The extension is dropped and the stem transliterated to ASCII. The first
/// separator found splits artist from title; without one the whole stem is the
/// title.
pub fn parse_file_name(path: &Path) -> (Option<String>, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = any_ascii::any_ascii(&stem);

    for separator in SEPARATORS {
        if let Some((artist, title)) = name.split_once(separator) {
            let artist = artist.trim();
            return (
                (!artist.is_empty()).then(|| artist.to_string()),
                title.trim().to_string(),
            );
        }
    }

    (None, name.trim().to_string())
}
