use crate::ledger::TargetRecord;

use super::MatchConfig;
use super::similarity::ratio_ignore_case;

/// What was learned about a local file: an optional artist and a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub artist: Option<String>,
    pub title: String,
}

/// Weighted title/artist similarity of a local track against a ledger record.
pub fn score(local: &LocalTrack, record: &TargetRecord, config: &MatchConfig) -> f64 {
    let title_score = ratio_ignore_case(&local.title, &record.title);
    let artist_score = match &local.artist {
        Some(artist) => ratio_ignore_case(artist, &record.artist),
        None => config.missing_artist_score,
    };
    title_score * config.title_weight + artist_score * config.artist_weight
}

/// Index and score of the best-scoring record, ignoring records without a title or
/// artist. The earliest record wins ties. `None` when nothing was scored.
pub fn best_match<'a, I>(local: &LocalTrack, records: I, config: &MatchConfig) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a TargetRecord>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, record) in records.into_iter().enumerate() {
        if record.title.is_empty() || record.artist.is_empty() {
            continue;
        }
        let score = score(local, record, config);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best
}

pub fn is_accepted(score: f64, config: &MatchConfig) -> bool {
    score > config.match_threshold
}
