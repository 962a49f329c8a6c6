//! String similarity used by both folder pruning and record matching.

use any_ascii::any_ascii;
use rapidfuzz::distance::indel;

/// Transliterate to plain ASCII and lowercase, e.g. "Björk" -> "bjork", "Сплин" -> "splin".
pub fn fold_to_ascii(s: &str) -> String {
    any_ascii(s).to_lowercase()
}

/// Symmetric similarity on a 0-100 scale.
///
/// Indel-normalised: `100 * (|a| + |b| - indel(a, b)) / (|a| + |b|)`, which is
/// `200 * LCS / (|a| + |b|)`, rounded half to even. Compares exactly what it is
/// given; callers lowercase or fold first. An empty side scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let total = (a.chars().count() + b.chars().count()) as f64;
    let distance = indel::distance(a.chars(), b.chars()) as f64;

    (100.0 * (total - distance) / total).round_ties_even()
}

/// Case-insensitive [`ratio`].
pub fn ratio_ignore_case(a: &str, b: &str) -> f64 {
    ratio(&a.to_lowercase(), &b.to_lowercase())
}
