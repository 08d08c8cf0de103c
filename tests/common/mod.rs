#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use spotseek::{
    acquire::ProgressObserver,
    catalog::{Membership, Track},
    config::AcquireSettings,
    network::{NetworkError, PeerNetwork, SearchHandle, TransferHandle, TransferState},
    types::{PeerResult, ProgressEvent, ProgressStatus, SharedFile},
};

/// What a mocked transfer does once requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Writes a file of the given size and completes.
    Succeed(u64),
    /// Reports a transfer failure without writing anything.
    Fail,
    /// Writes a file of the given size and never completes.
    Stall(u64),
    /// Stays queued forever.
    NeverStart,
    /// The download request itself fails.
    Unreachable,
    /// The transfer starts but its state can never be read.
    Broken,
    /// Writes a file of the given size, never completes and refuses to be
    /// cancelled.
    Unstoppable(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCall {
    pub username: String,
    pub remote_path: String,
    pub destination: PathBuf,
}

pub struct MockNetwork {
    results: Mutex<HashMap<String, Vec<PeerResult>>>,
    failing_searches: Mutex<HashSet<String>>,
    transfers: Mutex<HashMap<String, Transfer>>,
    default_transfer: Transfer,
    search_delay: Duration,
    searches_in_flight: AtomicUsize,
    peak_searches: AtomicUsize,
    search_calls: Mutex<Vec<String>>,
    download_calls: Mutex<Vec<DownloadCall>>,
    cancelled: Arc<Mutex<Vec<String>>>,
}

impl MockNetwork {
    pub fn new(default_transfer: Transfer) -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            failing_searches: Mutex::new(HashSet::new()),
            transfers: Mutex::new(HashMap::new()),
            default_transfer,
            search_delay: Duration::ZERO,
            searches_in_flight: AtomicUsize::new(0),
            peak_searches: AtomicUsize::new(0),
            search_calls: Mutex::new(Vec::new()),
            download_calls: Mutex::new(Vec::new()),
            cancelled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Makes every search for `query` fail at the transport level.
    pub fn with_search_error(self, query: &str) -> Self {
        self.failing_searches
            .lock()
            .unwrap()
            .insert(query.to_string());
        self
    }

    /// Holds every search request open for `delay`.
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    /// Highest number of search requests seen open at the same time.
    pub fn peak_searches(&self) -> usize {
        self.peak_searches.load(Ordering::SeqCst)
    }

    /// Peers returned for an exact query string.
    pub fn with_results(self, query: &str, peers: Vec<PeerResult>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), peers);
        self
    }

    /// Overrides the transfer behavior for one remote path.
    pub fn with_transfer(self, remote_path: &str, transfer: Transfer) -> Self {
        self.transfers
            .lock()
            .unwrap()
            .insert(remote_path.to_string(), transfer);
        self
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn searches_for(&self, query: &str) -> usize {
        self.search_calls().iter().filter(|q| *q == query).count()
    }

    pub fn download_calls(&self) -> Vec<DownloadCall> {
        self.download_calls.lock().unwrap().clone()
    }

    pub fn downloads_to(&self, destination: &Path) -> usize {
        self.download_calls()
            .iter()
            .filter(|c| c.destination == destination)
            .count()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl PeerNetwork for MockNetwork {
    async fn start(&self) -> Result<(), NetworkError> {
        Ok(())
    }

    async fn login(&self) -> Result<(), NetworkError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), NetworkError> {
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Box<dyn SearchHandle>, NetworkError> {
        self.search_calls.lock().unwrap().push(query.to_string());

        let open = self.searches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_searches.fetch_max(open, Ordering::SeqCst);
        tokio::time::sleep(self.search_delay).await;
        self.searches_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_searches.lock().unwrap().contains(query) {
            return Err(NetworkError::Unavailable("search refused".to_string()));
        }

        let results = self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MockSearch { results }))
    }

    async fn download(
        &self,
        username: &str,
        remote_path: &str,
        destination: &Path,
    ) -> Result<Box<dyn TransferHandle>, NetworkError> {
        self.download_calls.lock().unwrap().push(DownloadCall {
            username: username.to_string(),
            remote_path: remote_path.to_string(),
            destination: destination.to_path_buf(),
        });

        let behavior = self
            .transfers
            .lock()
            .unwrap()
            .get(remote_path)
            .copied()
            .unwrap_or(self.default_transfer);

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let state = match behavior {
            Transfer::Succeed(size) => {
                std::fs::write(destination, vec![0u8; size as usize])?;
                Some(TransferState::Completed)
            }
            Transfer::Fail => Some(TransferState::Failed("peer refused".to_string())),
            Transfer::Stall(size) | Transfer::Unstoppable(size) => {
                std::fs::write(destination, vec![0u8; size as usize])?;
                Some(TransferState::InProgress)
            }
            Transfer::NeverStart => Some(TransferState::Queued),
            Transfer::Unreachable => {
                return Err(NetworkError::Unavailable("peer offline".to_string()));
            }
            Transfer::Broken => None,
        };

        Ok(Box::new(MockTransfer {
            remote_path: remote_path.to_string(),
            state,
            cancellable: !matches!(behavior, Transfer::Unstoppable(_)),
            cancelled: Arc::clone(&self.cancelled),
        }))
    }
}

struct MockSearch {
    results: Vec<PeerResult>,
}

#[async_trait]
impl SearchHandle for MockSearch {
    async fn results(&self) -> Result<Vec<PeerResult>, NetworkError> {
        Ok(self.results.clone())
    }
}

struct MockTransfer {
    remote_path: String,
    /// `None` makes every state query fail.
    state: Option<TransferState>,
    cancellable: bool,
    cancelled: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TransferHandle for MockTransfer {
    async fn state(&self) -> Result<TransferState, NetworkError> {
        self.state
            .clone()
            .ok_or_else(|| NetworkError::Unavailable("transfer lost".to_string()))
    }

    async fn cancel(&self) -> Result<(), NetworkError> {
        if !self.cancellable {
            return Err(NetworkError::Unavailable("cancel rejected".to_string()));
        }
        self.cancelled.lock().unwrap().push(self.remote_path.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, label: &str, status: ProgressStatus) -> usize {
        self.events()
            .iter()
            .filter(|e| e.label == label && e.status == status)
            .count()
    }
}

impl ProgressObserver for RecordingObserver {
    fn notify(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Settings with millisecond waits so failure paths finish quickly.
pub fn fast_settings(output_dir: &Path) -> AcquireSettings {
    AcquireSettings {
        output_dir: output_dir.to_path_buf(),
        extension: "mp3".to_string(),
        search_timeout: Duration::from_millis(50),
        download_timeout: Duration::from_millis(100),
        appear_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        retry_backoff: Duration::from_millis(5),
        min_file_size: 1000,
        max_attempts: 3,
        concurrency: 2,
    }
}

pub fn peer(username: &str, speed: Option<u64>, files: &[&str]) -> PeerResult {
    PeerResult {
        username: username.to_string(),
        avg_speed: speed,
        shared_files: files
            .iter()
            .map(|f| SharedFile {
                remote_path: f.to_string(),
                size: None,
            })
            .collect(),
    }
}

pub fn track(id: &str, name: &str, artist: &str) -> Track {
    Track::new(id, name, artist, None, Vec::new())
}

pub fn album_track(id: &str, name: &str, artist: &str, album: &str) -> Track {
    Track::new(
        id,
        name,
        artist,
        Some(album.to_string()),
        vec![Membership::Album(album.to_string())],
    )
}
