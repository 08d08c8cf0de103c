//! # Catalog Module
//!
//! In-memory representation of the wanted tracks and their album and
//! playlist memberships, plus the two file formats that surround it: the
//! catalog JSON consumed at startup and the M3U playlists produced after a
//! run.
//!
//! The catalog is built once and never mutated. Whether a track has been
//! acquired is not part of the model; it is observed on disk through
//! [`crate::utils::is_valid_file`].

mod loader;
mod model;
mod playlist;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::load_catalog;
pub use loader::parse_catalog;
pub use model::Album;
pub use model::Catalog;
pub use model::Membership;
pub use model::Playlist;
pub use model::Track;
pub use model::build_catalog;
pub use playlist::PlaylistLayout;
pub use playlist::render_m3u;
pub use playlist::write_playlists;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed catalog entry {id}: {reason}")]
    MalformedCatalogEntry { id: String, reason: String },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid catalog file: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
