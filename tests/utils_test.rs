use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use spotseek::utils::*;

#[test]
fn test_sanitize() {
    assert_eq!(sanitize(r#"a\b/c:d*e?f"g<h>i|j"#), "abcdefghij");
    assert_eq!(sanitize("Plain Name (Live)"), "Plain Name (Live)");
    assert_eq!(sanitize(""), "");
}

#[test]
fn test_search_query() {
    assert_eq!(search_query(&["Song", "Artist"]), "Song Artist");
    assert_eq!(search_query(&["  Song ", "", "Artist"]), "Song Artist");
    assert_eq!(search_query(&["What?", "AC/DC"]), "What ACDC");
}

#[test]
fn test_destination_path() {
    let dir = Path::new("output");

    assert_eq!(
        destination_path(dir, "4uLU6hMCjMI75M1A2tKUQC", "mp3"),
        PathBuf::from("output/4uLU6hMCjMI75M1A2tKUQC.mp3")
    );
    assert_eq!(
        destination_path(dir, "abc", ".flac"),
        PathBuf::from("output/abc.flac")
    );
}

#[test]
fn test_remote_file_name() {
    assert_eq!(remote_file_name("@@music\\Artist\\Album\\01 Song.mp3"), "01 Song.mp3");
    assert_eq!(remote_file_name("music/Album/02 Song.mp3"), "02 Song.mp3");
    assert_eq!(remote_file_name("Song.mp3"), "Song.mp3");
}

#[test]
fn test_remote_parent_name() {
    assert_eq!(
        remote_parent_name("@@music\\Artist\\Album\\01 Song.mp3"),
        Some("Album")
    );
    assert_eq!(remote_parent_name("Song.mp3"), None);
}

#[tokio::test]
async fn test_is_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let small = dir.path().join("small.mp3");
    let large = dir.path().join("large.mp3");
    std::fs::write(&small, vec![0u8; 10]).unwrap();
    std::fs::write(&large, vec![0u8; 2000]).unwrap();

    assert!(!is_valid_file(&small, 1000).await);
    assert!(is_valid_file(&large, 1000).await);
    assert!(!is_valid_file(&dir.path().join("missing.mp3"), 1000).await);

    // A directory never counts as an acquired file
    assert!(!is_valid_file(dir.path(), 0).await);
}

#[tokio::test]
async fn test_remove_undersized() {
    let dir = tempfile::tempdir().unwrap();
    let small = dir.path().join("small.mp3");
    let large = dir.path().join("large.mp3");
    std::fs::write(&small, vec![0u8; 10]).unwrap();
    std::fs::write(&large, vec![0u8; 2000]).unwrap();

    assert!(remove_undersized(&small, 1000).await);
    assert!(!small.exists());

    assert!(!remove_undersized(&large, 1000).await);
    assert!(large.exists());

    assert!(!remove_undersized(&dir.path().join("missing.mp3"), 1000).await);
}

#[tokio::test]
async fn test_poll_until_returns_first_value() {
    let calls = Arc::new(AtomicU32::new(0));

    let value = poll_until(Duration::from_secs(1), Duration::from_millis(1), || {
        let calls = Arc::clone(&calls);
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            (n >= 3).then_some(n)
        }
    })
    .await;

    assert_eq!(value, Some(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_poll_until_times_out() {
    let limit = Duration::from_millis(20);
    let value: Option<()> = poll_until(limit, Duration::from_millis(5), || async { None }).await;

    assert!(value.is_none());
}
