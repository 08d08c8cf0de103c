use std::path::{Path, PathBuf};

use crate::utils;

use super::{Catalog, Track};

/// Where M3U files go and what their entries point at.
#[derive(Debug, Clone)]
pub struct PlaylistLayout {
    pub playlist_dir: PathBuf,
    pub album_dir: PathBuf,
    /// Directory holding the acquired `<track id>.<extension>` files.
    pub track_dir: PathBuf,
    pub extension: String,
}

/// Renders an extended M3U document listing the given tracks.
pub fn render_m3u<'a>(
    tracks: impl IntoIterator<Item = &'a Track>,
    track_dir: &Path,
    extension: &str,
) -> String {
    let mut out = String::from("#EXTM3U\n");
    for track in tracks {
        let path = utils::destination_path(track_dir, &track.id, extension);
        out.push_str(&path.to_string_lossy());
        out.push('\n');
    }
    out
}

/// Writes one M3U file per playlist and per album.
///
/// File names are the sanitized playlist name or album title. Returns the
/// written paths, playlists first.
pub async fn write_playlists(
    catalog: &Catalog,
    layout: &PlaylistLayout,
) -> Result<Vec<PathBuf>, std::io::Error> {
    async_fs::create_dir_all(&layout.playlist_dir).await?;
    async_fs::create_dir_all(&layout.album_dir).await?;

    let mut written = Vec::new();

    for playlist in catalog.playlists() {
        let path = m3u_path(&layout.playlist_dir, &playlist.name);
        let body = render_m3u(
            playlist.tracks.iter().map(|t| t.as_ref()),
            &layout.track_dir,
            &layout.extension,
        );
        async_fs::write(&path, body).await?;
        written.push(path);
    }

    for album in catalog.albums() {
        let path = m3u_path(&layout.album_dir, &album.title);
        let body = render_m3u(
            album.tracks.iter().map(|t| t.as_ref()),
            &layout.track_dir,
            &layout.extension,
        );
        async_fs::write(&path, body).await?;
        written.push(path);
    }

    Ok(written)
}

fn m3u_path(dir: &Path, name: &str) -> PathBuf {
    let stem = utils::sanitize(name);
    let stem = if stem.trim().is_empty() {
        "untitled".to_string()
    } else {
        stem
    };
    dir.join(format!("{}.m3u", stem))
}
