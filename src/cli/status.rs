use std::{path::PathBuf, sync::Arc};

use tabled::Table;

use crate::{
    catalog::Track,
    config::AcquireSettings,
    info,
    types::CollectionStatusRow,
    utils,
};

use super::load_or_exit;

/// Prints, per album and playlist, how many tracks are on disk at a valid
/// size.
pub async fn status(catalog_paths: Vec<PathBuf>, settings: AcquireSettings) {
    let catalog = load_or_exit(&catalog_paths).await;
    let extension = settings.normalized_extension();

    let mut rows: Vec<CollectionStatusRow> = Vec::new();
    for album in catalog.albums() {
        let present = count_present(&album.tracks, &settings, &extension).await;
        rows.push(CollectionStatusRow {
            kind: "album".to_string(),
            name: album.label(),
            present: format!("{}/{}", present, album.tracks.len()),
        });
    }
    for playlist in catalog.playlists() {
        let present = count_present(&playlist.tracks, &settings, &extension).await;
        rows.push(CollectionStatusRow {
            kind: "playlist".to_string(),
            name: playlist.name.clone(),
            present: format!("{}/{}", present, playlist.tracks.len()),
        });
    }

    let total = count_present(catalog.tracks(), &settings, &extension).await;

    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
    info!(
        "{present}/{total} tracks present in {dir}",
        present = total,
        total = catalog.len(),
        dir = settings.output_dir.display()
    );
}

async fn count_present(
    tracks: &[Arc<Track>],
    settings: &AcquireSettings,
    extension: &str,
) -> usize {
    let mut present = 0;
    for track in tracks {
        let path = utils::destination_path(&settings.output_dir, &track.id, extension);
        if utils::is_valid_file(&path, settings.min_file_size).await {
            present += 1;
        }
    }
    present
}
