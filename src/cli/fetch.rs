use std::{path::PathBuf, sync::Arc};

use tabled::Table;

use crate::{
    acquire::{RunSummary, Scheduler},
    config::AcquireSettings,
    error, info,
    network::{PeerNetwork, SlskdClient},
    success,
    types::FailedTrackRow,
    warning,
};

use super::{TerminalObserver, load_or_exit};

/// Acquires every track of the catalog into `settings.output_dir`.
///
/// Exits with an error only when the catalog, the configuration or the
/// network session cannot be set up. Tracks that could not be acquired are
/// listed at the end.
pub async fn fetch(catalog_paths: Vec<PathBuf>, settings: AcquireSettings) {
    let catalog = load_or_exit(&catalog_paths).await;
    if catalog.is_empty() {
        warning!("Catalog is empty, nothing to fetch.");
        return;
    }

    if let Err(e) = async_fs::create_dir_all(&settings.output_dir).await {
        error!(
            "Cannot create output directory {}. Err: {}",
            settings.output_dir.display(),
            e
        );
    }

    let client = match SlskdClient::from_env() {
        Ok(client) => client,
        Err(e) => error!("Cannot configure slskd client. Err: {}", e),
    };
    let network: Arc<dyn PeerNetwork> = Arc::new(client);

    if let Err(e) = network.start().await {
        error!("Cannot reach slskd. Err: {}", e);
    }
    if let Err(e) = network.login().await {
        error!("Could not connect to Soulseek. Err: {}", e);
    }

    let album_tracks = catalog.tracks().iter().filter(|t| t.is_album_track()).count();
    info!(
        "Fetching {} tracks ({} from {} albums, {} playlists)...",
        catalog.len(),
        album_tracks,
        catalog.albums().len(),
        catalog.playlists().len()
    );

    let observer = Arc::new(TerminalObserver::new(catalog.len()));
    let scheduler = Scheduler::new(Arc::clone(&network), settings, observer.clone());
    let summary = scheduler.run(&catalog).await;
    observer.finish();

    if let Err(e) = network.stop().await {
        warning!("Could not stop the network session: {}", e);
    }

    report(catalog.len(), &summary);
}

fn report(total: usize, summary: &RunSummary) {
    success!(
        "{completed}/{total} tracks acquired ({downloaded} downloaded, {cached} cached).",
        completed = summary.completed,
        total = total,
        downloaded = summary.downloaded,
        cached = summary.cached
    );

    if summary.failed.is_empty() {
        return;
    }

    warning!("{} tracks failed:", summary.failed.len());
    let rows: Vec<FailedTrackRow> = summary
        .failed
        .iter()
        .map(|f| FailedTrackRow {
            track: f.label.clone(),
            reason: f.reason.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
