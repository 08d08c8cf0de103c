//! Filename matching and peer ranking.
//!
//! Matching is deliberately loose: a remote file matches a track when the
//! normalized track name occurs anywhere in the normalized filename. This
//! tolerates bitrate suffixes, track numbers and bracketed tags at the cost
//! of the occasional false positive, e.g. "Intro" matching "Intro (Reprise)".

use crate::{catalog::Track, types::PeerResult, utils};

/// Strips filesystem-unsafe characters and lowercases. Underscores count as
/// spaces, since shared filenames often use them as word separators.
pub fn normalize(text: &str) -> String {
    utils::sanitize(text).replace('_', " ").to_lowercase()
}

/// Whether `remote_filename` looks like a copy of `track`.
///
/// Only the track name takes part; the artist is already part of the query
/// that produced the filename.
pub fn matches_track(remote_filename: &str, track: &Track) -> bool {
    let needle = normalize(&track.name);
    if needle.is_empty() {
        return false;
    }
    normalize(remote_filename).contains(&needle)
}

/// Case-insensitive check of the `.ext` suffix. `ext` may carry its own dot.
pub fn has_extension(filename: &str, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        return false;
    }
    filename
        .to_lowercase()
        .ends_with(&format!(".{}", ext.to_lowercase()))
}

/// Orders peers by descending average speed.
///
/// A missing speed ranks as zero. The sort is stable, so peers with equal
/// speed keep their arrival order.
pub fn rank_peers(mut results: Vec<PeerResult>) -> Vec<PeerResult> {
    results.sort_by(|a, b| b.avg_speed.unwrap_or(0).cmp(&a.avg_speed.unwrap_or(0)));
    results
}

/// Finds the first of `candidates` whose name matches `remote_filename`.
///
/// First match wins, not best match: with two similarly named tracks the
/// one listed earlier is chosen.
pub fn first_match<'a, T>(remote_filename: &str, candidates: &'a [T]) -> Option<&'a T>
where
    T: AsRef<Track>,
{
    candidates
        .iter()
        .find(|c| matches_track(remote_filename, c.as_ref()))
}
