use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One entry of the catalog JSON, keyed by track id in the enclosing object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    Album { album_title: String },
    Playlist { playlist_name: String },
}

/// A file offered by a peer. `remote_path` is the full path on the peer,
/// usually backslash separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFile {
    pub remote_path: String,
    pub size: Option<u64>,
}

/// A peer's answer to a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerResult {
    pub username: String,
    /// Average upload speed in bytes per second, when the peer reports one.
    pub avg_speed: Option<u64>,
    pub shared_files: Vec<SharedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// Downloaded during this run.
    Completed(PathBuf),
    /// Already present on disk at a valid size.
    CompletedCached(PathBuf),
    Failed(String),
}

impl AcquisitionOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, AcquisitionOutcome::Failed(_))
    }

    /// Preference when two units report on the same track: a download made
    /// in this run beats a cache hit, which beats a failure.
    pub fn rank(&self) -> u8 {
        match self {
            AcquisitionOutcome::Completed(_) => 2,
            AcquisitionOutcome::CompletedCached(_) => 1,
            AcquisitionOutcome::Failed(_) => 0,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            AcquisitionOutcome::Completed(path) | AcquisitionOutcome::CompletedCached(path) => {
                Some(path)
            }
            AcquisitionOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Searching,
    Downloading,
    Cached,
    Done,
    Retrying,
    Failed,
    /// An album pass ended with tracks still missing.
    Incomplete,
}

impl ProgressStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            ProgressStatus::Searching => "🔍",
            ProgressStatus::Downloading => "⬇",
            ProgressStatus::Cached | ProgressStatus::Done => "✓",
            ProgressStatus::Retrying => "↻",
            ProgressStatus::Failed => "✖",
            ProgressStatus::Incomplete => "…",
        }
    }

    /// Whether a track with this status has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressStatus::Cached | ProgressStatus::Done | ProgressStatus::Failed
        )
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressStatus::Searching => "searching",
            ProgressStatus::Downloading => "downloading",
            ProgressStatus::Cached => "cached",
            ProgressStatus::Done => "done",
            ProgressStatus::Retrying => "retrying",
            ProgressStatus::Failed => "failed",
            ProgressStatus::Incomplete => "incomplete",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Track id, or album title for album-level events.
    pub id: String,
    pub label: String,
    pub status: ProgressStatus,
    pub attempt: Option<u32>,
    pub peer: Option<String>,
}

impl ProgressEvent {
    pub fn new(id: impl Into<String>, label: impl Into<String>, status: ProgressStatus) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status,
            attempt: None,
            peer: None,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }
}

#[derive(Tabled)]
pub struct FailedTrackRow {
    pub track: String,
    pub reason: String,
}

#[derive(Tabled)]
pub struct CollectionStatusRow {
    pub kind: String,
    pub name: String,
    pub present: String,
}
