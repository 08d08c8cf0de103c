use std::{collections::HashMap, sync::Arc};

use crate::{
    catalog::{Album, Track},
    matcher,
    types::{AcquisitionOutcome, ProgressEvent, ProgressStatus},
    utils,
};

use super::{Acquirer, engine::track_event};

impl Acquirer {
    /// Acquires as much of `album` as possible from album-level search
    /// results, then falls back to individual searches for the rest.
    ///
    /// Runs at most once per album title. Later calls wait for the first one
    /// and return its outcomes without touching the network.
    pub async fn acquire_album(&self, album: &Album) -> HashMap<String, AcquisitionOutcome> {
        let _album_guard = self.state.album_locks.lock(&album.title).await;
        if !self.state.mark_album_handled(&album.title).await {
            return self.state.album_results(&album.title).await;
        }

        let mut outcomes: HashMap<String, AcquisitionOutcome> = HashMap::new();
        let mut missing: Vec<Arc<Track>> = Vec::new();

        for track in &album.tracks {
            if outcomes.contains_key(&track.id) {
                continue;
            }

            // Another unit may be writing this destination right now.
            let _guard = self.state.track_locks.lock(&track.id).await;

            if let Some(prior) = self.state.resolved(&track.id).await {
                outcomes.insert(track.id.clone(), prior);
                continue;
            }

            let destination = self.destination(track);
            if self.is_cached(&destination).await {
                self.emit(track_event(track, ProgressStatus::Cached));
                let outcome = self
                    .settle(track, AcquisitionOutcome::CompletedCached(destination))
                    .await;
                outcomes.insert(track.id.clone(), outcome);
            } else if !missing.iter().any(|m| m.id == track.id) {
                missing.push(Arc::clone(track));
            }
        }

        if !missing.is_empty() {
            self.album_pass(album, &mut missing, &mut outcomes).await;
        }

        if !missing.is_empty() {
            self.emit(ProgressEvent::new(
                &album.title,
                album.label(),
                ProgressStatus::Incomplete,
            ));
            for track in &missing {
                let outcome = self.acquire_individually(track).await;
                outcomes.insert(track.id.clone(), outcome);
            }
        }

        self.state
            .store_album_results(&album.title, outcomes.clone())
            .await;
        outcomes
    }

    /// One album search; each matching file goes to the first still-missing
    /// track whose name it contains. Satisfied tracks leave `missing`.
    async fn album_pass(
        &self,
        album: &Album,
        missing: &mut Vec<Arc<Track>>,
        outcomes: &mut HashMap<String, AcquisitionOutcome>,
    ) {
        let query = utils::search_query(&[&album.title, &album.artist]);
        self.emit(ProgressEvent::new(
            &album.title,
            album.label(),
            ProgressStatus::Searching,
        ));

        let peers = match self.collect_results(&query).await {
            Ok(peers) => peers,
            Err(_) => return,
        };

        'peers: for peer in &peers {
            for file in &peer.shared_files {
                if missing.is_empty() {
                    break 'peers;
                }
                if !self.is_target_file(&file.remote_path) {
                    continue;
                }

                let file_name = utils::remote_file_name(&file.remote_path);
                let Some(track) = matcher::first_match(file_name, missing).cloned() else {
                    continue;
                };

                let destination = self.destination(&track);
                let _guard = self.state.track_locks.lock(&track.id).await;

                let outcome = if let Some(prior) = self.state.resolved(&track.id).await {
                    prior
                } else if self.is_cached(&destination).await {
                    self.emit(track_event(&track, ProgressStatus::Cached));
                    AcquisitionOutcome::CompletedCached(destination)
                } else {
                    self.emit(
                        track_event(&track, ProgressStatus::Downloading).with_peer(&peer.username),
                    );
                    match self
                        .try_candidate(&peer.username, &file.remote_path, &destination)
                        .await
                    {
                        Ok(()) => {
                            self.emit(
                                track_event(&track, ProgressStatus::Done).with_peer(&peer.username),
                            );
                            AcquisitionOutcome::Completed(destination)
                        }
                        Err(e) if e.blocks_destination() => {
                            self.emit(track_event(&track, ProgressStatus::Failed));
                            AcquisitionOutcome::Failed(e.to_string())
                        }
                        Err(_) => continue,
                    }
                };

                let outcome = self.settle(&track, outcome).await;
                outcomes.insert(track.id.clone(), outcome);
                missing.retain(|m| m.id != track.id);
            }
        }
    }
}
