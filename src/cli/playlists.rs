use std::path::PathBuf;

use crate::{
    catalog::{self, PlaylistLayout},
    error, success,
};

use super::load_or_exit;

pub async fn playlists(catalog_paths: Vec<PathBuf>, layout: PlaylistLayout) {
    let catalog = load_or_exit(&catalog_paths).await;

    match catalog::write_playlists(&catalog, &layout).await {
        Ok(written) => success!(
            "Wrote {} playlist files ({} playlists, {} albums).",
            written.len(),
            catalog.playlists().len(),
            catalog.albums().len()
        ),
        Err(e) => error!("Cannot write playlists. Err: {}", e),
    }
}
