//! # CLI Module
//!
//! User-facing commands of spotseek. Each command loads the catalog, calls
//! into the library and presents the result; startup problems (unreadable
//! catalog, missing configuration, unreachable slskd) terminate the process
//! through [`crate::error!`], while partial acquisition failures are only
//! reported.
//!
//! ## Commands
//!
//! - [`fetch`] - Acquire every catalog track from the Soulseek network
//! - [`playlists`] - Write M3U files for the catalog's playlists and albums
//! - [`status`] - Show how much of each album and playlist is on disk
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotseek fetch track_index.json -o music --concurrent 4
//! spotseek status track_index.json -o music
//! spotseek playlists track_index.json --tracks-dir music
//! ```

mod fetch;
mod playlists;
mod progress;
mod status;

use std::path::PathBuf;

use crate::{
    catalog::{self, Catalog},
    error,
};

pub use fetch::fetch;
pub use playlists::playlists;
pub use progress::TerminalObserver;
pub use status::status;

/// Loads the catalog or terminates with a startup error.
async fn load_or_exit(paths: &[PathBuf]) -> Catalog {
    match catalog::load_catalog(paths).await {
        Ok(catalog) => catalog,
        Err(e) => error!("Cannot load catalog. Err: {}", e),
    }
}
