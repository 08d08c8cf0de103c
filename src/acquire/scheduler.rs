use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::{
    catalog::{Catalog, Track},
    config::AcquireSettings,
    network::PeerNetwork,
    types::{AcquisitionOutcome, ProgressStatus},
};

use super::{Acquirer, ProgressObserver, RunState, engine::track_event, state::merge_outcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTrack {
    pub id: String,
    pub label: String,
    pub reason: String,
}

/// Result of a full run. Every catalog track appears at most once.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Tracks downloaded or found on disk.
    pub completed: usize,
    pub downloaded: usize,
    pub cached: usize,
    /// Failed tracks in catalog order.
    pub failed: Vec<FailedTrack>,
    pub outcomes: HashMap<String, AcquisitionOutcome>,
}

/// Drives the whole catalog through the [`Acquirer`].
///
/// Albums are processed first, then playlists, then tracks that belong to
/// neither. Within each phase units run concurrently, bounded by the
/// configured concurrency limit.
pub struct Scheduler {
    acquirer: Acquirer,
    state: Arc<RunState>,
    admission: Semaphore,
}

impl Scheduler {
    pub fn new(
        network: Arc<dyn PeerNetwork>,
        settings: AcquireSettings,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        let state = Arc::new(RunState::new());
        let permits = settings.concurrency.max(1);
        let acquirer = Acquirer::with_state(network, settings, observer, Arc::clone(&state));

        Self {
            acquirer,
            state,
            admission: Semaphore::new(permits),
        }
    }

    pub async fn run(&self, catalog: &Catalog) -> RunSummary {
        let mut outcomes: HashMap<String, AcquisitionOutcome> = HashMap::new();

        let album_units = catalog.albums().iter().map(|album| async move {
            let Ok(_permit) = self.admission.acquire().await else {
                return HashMap::new();
            };
            self.acquirer.acquire_album(album).await
        });
        for album_outcomes in join_all(album_units).await {
            for (id, outcome) in album_outcomes {
                merge_outcome(&mut outcomes, &id, outcome);
            }
        }

        let mut playlist_tracks: Vec<&Arc<Track>> = Vec::new();
        let mut queued: HashSet<&str> = HashSet::new();
        for playlist in catalog.playlists() {
            if !self.state.mark_playlist_handled(&playlist.name).await {
                continue;
            }
            for track in &playlist.tracks {
                if queued.insert(track.id.as_str()) {
                    playlist_tracks.push(track);
                }
            }
        }
        for (id, outcome) in self.run_tracks(playlist_tracks).await {
            merge_outcome(&mut outcomes, &id, outcome);
        }

        let standalone: Vec<&Arc<Track>> = catalog.standalone_tracks().collect();
        for (id, outcome) in self.run_tracks(standalone).await {
            merge_outcome(&mut outcomes, &id, outcome);
        }

        summarize(catalog, outcomes)
    }

    async fn run_tracks(&self, tracks: Vec<&Arc<Track>>) -> Vec<(String, AcquisitionOutcome)> {
        let units = tracks.into_iter().map(|track| async move {
            let outcome = self.run_track(track).await;
            (track.id.clone(), outcome)
        });
        join_all(units).await
    }

    /// Acquires one track unless an earlier unit already settled it.
    async fn run_track(&self, track: &Track) -> AcquisitionOutcome {
        if let Some(prior) = self.state.resolved(&track.id).await {
            if prior.is_success() {
                self.acquirer.emit(track_event(track, ProgressStatus::Cached));
            }
            return prior;
        }

        let Ok(_permit) = self.admission.acquire().await else {
            return AcquisitionOutcome::Failed("scheduler closed".to_string());
        };

        // Settled while this unit waited for admission.
        if let Some(prior) = self.state.resolved(&track.id).await {
            return prior;
        }

        self.acquirer.acquire_track(track).await
    }
}

fn summarize(catalog: &Catalog, outcomes: HashMap<String, AcquisitionOutcome>) -> RunSummary {
    let mut summary = RunSummary::default();

    for track in catalog.tracks() {
        match outcomes.get(&track.id) {
            Some(AcquisitionOutcome::Completed(_)) => summary.downloaded += 1,
            Some(AcquisitionOutcome::CompletedCached(_)) => summary.cached += 1,
            Some(AcquisitionOutcome::Failed(reason)) => summary.failed.push(FailedTrack {
                id: track.id.clone(),
                label: track.label(),
                reason: reason.clone(),
            }),
            None => {}
        }
    }

    summary.completed = summary.downloaded + summary.cached;
    summary.outcomes = outcomes;
    summary
}
