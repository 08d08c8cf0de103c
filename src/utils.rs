use std::{
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::time::{sleep, timeout};

const REMOTE_SEPARATORS: &[char] = &['\\', '/'];

/// Characters that are not allowed in filenames on at least one platform.
pub const UNSAFE_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Removes filesystem-unsafe characters, keeping everything else verbatim.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !UNSAFE_FILENAME_CHARS.contains(c))
        .collect()
}

/// Builds a search query from its parts, e.g. track name and artist.
pub fn search_query(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<&str>>()
        .join(" ");
    sanitize(&joined)
}

/// Location of a track on disk: `<output_dir>/<track_id>.<extension>`.
pub fn destination_path(output_dir: &Path, track_id: &str, extension: &str) -> PathBuf {
    output_dir.join(format!(
        "{id}.{ext}",
        id = track_id,
        ext = extension.trim_start_matches('.')
    ))
}

/// Last component of a remote path. Peers mostly use backslashes.
pub fn remote_file_name(remote_path: &str) -> &str {
    remote_path
        .rsplit(REMOTE_SEPARATORS)
        .next()
        .unwrap_or(remote_path)
}

/// Parent directory name of a remote path, if it has one.
pub fn remote_parent_name(remote_path: &str) -> Option<&str> {
    let mut parts = remote_path
        .rsplit(REMOTE_SEPARATORS)
        .filter(|p| !p.is_empty());
    parts.next()?;
    parts.next()
}

pub async fn file_size(path: &Path) -> Option<u64> {
    async_fs::metadata(path)
        .await
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

/// The completion oracle: a track is done when its file exists at a size of
/// at least `min_size` bytes.
pub async fn is_valid_file(path: &Path, min_size: u64) -> bool {
    matches!(file_size(path).await, Some(size) if size >= min_size)
}

/// Deletes `path` if it exists but is smaller than `min_size`.
///
/// Returns true when a stale partial file was removed.
pub async fn remove_undersized(path: &Path, min_size: u64) -> bool {
    match file_size(path).await {
        Some(size) if size < min_size => async_fs::remove_file(path).await.is_ok(),
        _ => false,
    }
}

/// Runs `probe` every `interval` until it yields a value or `limit` elapses.
///
/// The probe runs once immediately. Returns `None` on timeout.
pub async fn poll_until<T, F, Fut>(limit: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    timeout(limit, async {
        loop {
            if let Some(value) = probe().await {
                return value;
            }
            sleep(interval).await;
        }
    })
    .await
    .ok()
}
