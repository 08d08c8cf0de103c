use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::AcquisitionOutcome;

/// Async mutexes created on demand, one per key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Waits for exclusive access to `key`. Released when the guard drops.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Mutable state shared by every unit of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub(crate) track_locks: KeyedLocks,
    pub(crate) album_locks: KeyedLocks,
    handled_albums: Mutex<HashSet<String>>,
    album_results: Mutex<HashMap<String, HashMap<String, AcquisitionOutcome>>>,
    handled_playlists: Mutex<HashSet<String>>,
    resolved: Mutex<HashMap<String, AcquisitionOutcome>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_album_handled(&self, title: &str) -> bool {
        self.handled_albums.lock().await.contains(title)
    }

    /// Returns true if the album was not handled before.
    pub async fn mark_album_handled(&self, title: &str) -> bool {
        self.handled_albums.lock().await.insert(title.to_string())
    }

    pub async fn store_album_results(
        &self,
        title: &str,
        results: HashMap<String, AcquisitionOutcome>,
    ) {
        self.album_results
            .lock()
            .await
            .insert(title.to_string(), results);
    }

    pub async fn album_results(&self, title: &str) -> HashMap<String, AcquisitionOutcome> {
        self.album_results
            .lock()
            .await
            .get(title)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if the playlist was not handled before.
    pub async fn mark_playlist_handled(&self, name: &str) -> bool {
        self.handled_playlists.lock().await.insert(name.to_string())
    }

    /// Terminal outcome of a track already settled in this run.
    pub async fn resolved(&self, track_id: &str) -> Option<AcquisitionOutcome> {
        self.resolved.lock().await.get(track_id).cloned()
    }

    /// Records a terminal outcome, keeping the better one if the track was
    /// already settled.
    pub async fn resolve(&self, track_id: &str, outcome: AcquisitionOutcome) {
        let mut resolved = self.resolved.lock().await;
        merge_outcome(&mut resolved, track_id, outcome);
    }
}

/// Inserts `outcome` unless a better-ranked one is already present.
pub fn merge_outcome(
    outcomes: &mut HashMap<String, AcquisitionOutcome>,
    track_id: &str,
    outcome: AcquisitionOutcome,
) {
    match outcomes.get(track_id) {
        Some(existing) if existing.rank() >= outcome.rank() => {}
        _ => {
            outcomes.insert(track_id.to_string(), outcome);
        }
    }
}
