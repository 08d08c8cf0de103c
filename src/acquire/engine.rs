use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::time::sleep;

use crate::{
    catalog::Track,
    config::AcquireSettings,
    matcher,
    network::{PeerNetwork, TransferHandle, TransferState},
    types::{AcquisitionOutcome, PeerResult, ProgressEvent, ProgressStatus},
    utils,
};

use super::{AcquireError, ProgressObserver, RunState};

/// Progress event about a single track.
pub(super) fn track_event(track: &Track, status: ProgressStatus) -> ProgressEvent {
    ProgressEvent::new(&track.id, track.label(), status)
}

/// Acquires single tracks and whole albums through a [`PeerNetwork`].
///
/// One `Acquirer` serves a whole run; every unit of work shares its
/// [`RunState`].
pub struct Acquirer {
    pub(super) network: Arc<dyn PeerNetwork>,
    pub(super) settings: AcquireSettings,
    pub(super) observer: Arc<dyn ProgressObserver>,
    pub(super) state: Arc<RunState>,
}

impl Acquirer {
    pub fn new(
        network: Arc<dyn PeerNetwork>,
        settings: AcquireSettings,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self::with_state(network, settings, observer, Arc::new(RunState::new()))
    }

    pub fn with_state(
        network: Arc<dyn PeerNetwork>,
        settings: AcquireSettings,
        observer: Arc<dyn ProgressObserver>,
        state: Arc<RunState>,
    ) -> Self {
        Self {
            network,
            settings,
            observer,
            state,
        }
    }

    pub fn destination(&self, track: &Track) -> PathBuf {
        utils::destination_path(
            &self.settings.output_dir,
            &track.id,
            &self.settings.normalized_extension(),
        )
    }

    pub(super) async fn is_cached(&self, destination: &Path) -> bool {
        utils::is_valid_file(destination, self.settings.min_file_size).await
    }

    pub(super) fn emit(&self, event: ProgressEvent) {
        self.observer.notify(&event);
    }

    /// Records the terminal outcome of `track` for the rest of the run.
    pub(super) async fn settle(
        &self,
        track: &Track,
        outcome: AcquisitionOutcome,
    ) -> AcquisitionOutcome {
        self.state.resolve(&track.id, outcome.clone()).await;
        outcome
    }

    /// Runs the full single-track state machine: cache check, album-context
    /// search when the track has an album, then individual search with
    /// retries.
    pub async fn acquire_track(&self, track: &Track) -> AcquisitionOutcome {
        let destination = self.destination(track);
        let _guard = self.state.track_locks.lock(&track.id).await;

        if let Some(prior) = self.state.resolved(&track.id).await {
            return prior;
        }

        if self.is_cached(&destination).await {
            self.emit(track_event(track, ProgressStatus::Cached));
            return self
                .settle(track, AcquisitionOutcome::CompletedCached(destination))
                .await;
        }

        if let Some(album) = track.album.as_deref() {
            // An album pass already searched this album; skip straight to
            // the individual search.
            if !self.state.is_album_handled(album).await {
                match self.album_attempt(track, album, &destination).await {
                    Ok(true) => {
                        self.emit(track_event(track, ProgressStatus::Done));
                        return self
                            .settle(track, AcquisitionOutcome::Completed(destination))
                            .await;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.emit(track_event(track, ProgressStatus::Failed));
                        return self
                            .settle(track, AcquisitionOutcome::Failed(e.to_string()))
                            .await;
                    }
                }
            }
        }

        let outcome = self.individual_search(track, &destination).await;
        self.settle(track, outcome).await
    }

    /// Cache check followed by the individual search, skipping any album
    /// context. Used for tracks an album pass could not satisfy.
    pub async fn acquire_individually(&self, track: &Track) -> AcquisitionOutcome {
        let destination = self.destination(track);
        let _guard = self.state.track_locks.lock(&track.id).await;

        if let Some(prior) = self.state.resolved(&track.id).await {
            return prior;
        }

        if self.is_cached(&destination).await {
            self.emit(track_event(track, ProgressStatus::Cached));
            return self
                .settle(track, AcquisitionOutcome::CompletedCached(destination))
                .await;
        }

        let outcome = self.individual_search(track, &destination).await;
        self.settle(track, outcome).await
    }

    /// One album-query search, trying only the files that match `track`.
    /// The caller holds the track lock. Fails only when a transfer could not
    /// be cancelled.
    async fn album_attempt(
        &self,
        track: &Track,
        album: &str,
        destination: &Path,
    ) -> Result<bool, AcquireError> {
        let query = utils::search_query(&[album, &track.artist]);
        self.emit(track_event(track, ProgressStatus::Searching));

        let peers = match self.collect_results(&query).await {
            Ok(peers) => peers,
            Err(_) => return Ok(false),
        };

        for peer in &peers {
            for file in &peer.shared_files {
                if !self.is_target_file(&file.remote_path)
                    || !matcher::matches_track(utils::remote_file_name(&file.remote_path), track)
                {
                    continue;
                }

                self.emit(
                    track_event(track, ProgressStatus::Downloading)
                        .with_peer(&peer.username),
                );
                match self
                    .try_candidate(&peer.username, &file.remote_path, destination)
                    .await
                {
                    Ok(()) => return Ok(true),
                    Err(e) if e.blocks_destination() => return Err(e),
                    Err(_) => {}
                }
            }
        }

        Ok(false)
    }

    /// Searches for the track by name and artist, up to `max_attempts`
    /// times. The caller holds the track lock.
    pub(super) async fn individual_search(
        &self,
        track: &Track,
        destination: &Path,
    ) -> AcquisitionOutcome {
        let query = utils::search_query(&[&track.name, &track.artist]);
        let max_attempts = self.settings.max_attempts.max(1);
        let mut last_error: Option<AcquireError> = None;

        for attempt in 1..=max_attempts {
            self.emit(
                track_event(track, ProgressStatus::Searching).with_attempt(attempt),
            );

            match self.collect_results(&query).await {
                Ok(peers) => {
                    for peer in &peers {
                        for file in &peer.shared_files {
                            if !self.is_target_file(&file.remote_path) {
                                continue;
                            }

                            self.emit(
                                track_event(track, ProgressStatus::Downloading)
                                    .with_attempt(attempt)
                                    .with_peer(&peer.username),
                            );
                            match self
                                .try_candidate(&peer.username, &file.remote_path, destination)
                                .await
                            {
                                Ok(()) => {
                                    self.emit(
                                        track_event(track, ProgressStatus::Done)
                                            .with_attempt(attempt)
                                            .with_peer(&peer.username),
                                    );
                                    return AcquisitionOutcome::Completed(
                                        destination.to_path_buf(),
                                    );
                                }
                                Err(e) if e.blocks_destination() => {
                                    self.emit(
                                        track_event(track, ProgressStatus::Failed)
                                            .with_attempt(attempt),
                                    );
                                    return AcquisitionOutcome::Failed(e.to_string());
                                }
                                Err(e) => last_error = Some(e),
                            }
                        }
                    }
                }
                Err(e) => last_error = Some(e),
            }

            if attempt < max_attempts {
                self.emit(
                    track_event(track, ProgressStatus::Retrying)
                        .with_attempt(attempt),
                );
                sleep(self.settings.retry_backoff).await;
            }
        }

        self.emit(
            track_event(track, ProgressStatus::Failed).with_attempt(max_attempts),
        );

        let exhausted = AcquireError::AllCandidatesExhausted {
            attempts: max_attempts,
        };
        let reason = match last_error {
            Some(e) => format!("{} (last error: {})", exhausted, e),
            None => format!("{} (no matching files)", exhausted),
        };
        AcquisitionOutcome::Failed(reason)
    }

    pub(super) fn is_target_file(&self, remote_path: &str) -> bool {
        matcher::has_extension(remote_path, &self.settings.extension)
    }

    /// Runs a search and waits for its first results, ranked by peer speed.
    ///
    /// A search that yields nothing before the timeout is an empty result,
    /// not an error.
    pub(super) async fn collect_results(
        &self,
        query: &str,
    ) -> Result<Vec<PeerResult>, AcquireError> {
        let search = self
            .network
            .search(query)
            .await
            .map_err(|e| AcquireError::SearchTransport(e.to_string()))?;
        let search = search.as_ref();

        let polled = utils::poll_until(
            self.settings.search_timeout,
            self.settings.poll_interval,
            move || async move {
                match search.results().await {
                    Ok(results) if results.is_empty() => None,
                    other => Some(other),
                }
            },
        )
        .await;

        match polled {
            None => Ok(Vec::new()),
            Some(Ok(results)) => Ok(matcher::rank_peers(
                results
                    .into_iter()
                    .filter(|r| !r.shared_files.is_empty())
                    .collect(),
            )),
            Some(Err(e)) => Err(AcquireError::SearchTransport(e.to_string())),
        }
    }

    /// Downloads one remote file to `destination` and verifies it.
    ///
    /// Any stale undersized file is removed first. On failure the transfer
    /// is cancelled and the partial file deleted, so the next candidate
    /// starts from a clean destination. A failed cancel is reported as
    /// [`AcquireError::CancelFailed`].
    pub(super) async fn try_candidate(
        &self,
        username: &str,
        remote_path: &str,
        destination: &Path,
    ) -> Result<(), AcquireError> {
        let min_size = self.settings.min_file_size;
        utils::remove_undersized(destination, min_size).await;

        let transfer = self
            .network
            .download(username, remote_path, destination)
            .await
            .map_err(|e| AcquireError::TransferTransport(e.to_string()))?;

        let Err(error) = self.await_transfer(transfer.as_ref(), destination).await else {
            return Ok(());
        };

        let cancelled = transfer.cancel().await;
        // Whatever is there now came from the abandoned transfer.
        let _ = async_fs::remove_file(destination).await;

        match cancelled {
            Ok(()) => Err(error),
            Err(e) => Err(AcquireError::CancelFailed(format!("{} (after: {})", e, error))),
        }
    }

    async fn await_transfer(
        &self,
        transfer: &dyn TransferHandle,
        destination: &Path,
    ) -> Result<(), AcquireError> {
        let appeared = utils::poll_until(
            self.settings.appear_timeout,
            self.settings.poll_interval,
            move || async move {
                if utils::file_size(destination).await.is_some() {
                    return Some(Ok(()));
                }
                match transfer.state().await {
                    Ok(state) if state.has_started() => Some(Ok(())),
                    Ok(_) => None,
                    Err(e) => Some(Err(AcquireError::TransferTransport(e.to_string()))),
                }
            },
        )
        .await;

        match appeared {
            None => return Err(AcquireError::FileNeverAppeared),
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => {}
        }

        let finished = utils::poll_until(
            self.settings.download_timeout,
            self.settings.poll_interval,
            move || async move {
                match transfer.state().await {
                    Ok(TransferState::Completed) => Some(Ok(())),
                    Ok(TransferState::Failed(reason)) => {
                        Some(Err(AcquireError::TransferTransport(reason)))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(AcquireError::TransferTransport(e.to_string()))),
                }
            },
        )
        .await;

        match finished {
            None => return Err(AcquireError::TransferStalled(self.settings.download_timeout)),
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => {}
        }

        let size = utils::file_size(destination).await.unwrap_or(0);
        if size < self.settings.min_file_size {
            return Err(AcquireError::FileTooSmall {
                size,
                min: self.settings.min_file_size,
            });
        }

        Ok(())
    }
}
