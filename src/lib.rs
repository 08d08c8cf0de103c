//! Soulseek acquisition library for exported Spotify catalogs
//!
//! This library takes a catalog of wanted tracks, grouped by album and by
//! playlist, and acquires each track from the Soulseek network. Whole albums
//! are fetched from album-level search results first, and whatever is still
//! missing is searched for track by track.
//!
//! # Modules
//!
//! - `acquire` - Acquisition engine, album coordinator and scheduler
//! - `catalog` - Catalog model, JSON loader and M3U playlist writer
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `matcher` - Filename matching and peer ranking
//! - `network` - Peer network collaborator traits and the slskd adapter
//! - `types` - Data structures and type definitions
//! - `utils` - Path and filesystem helpers
//!
//! # Example
//!
//! ```
//! use spotseek::{catalog, config};
//!
//! #[tokio::main]
//! async fn main() -> spotseek::Res<()> {
//!     config::load_env().await?;
//!     let catalog = catalog::load_catalog(&["track_index.json".into()]).await?;
//!     Ok(())
//! }
//! ```

pub mod acquire;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod matcher;
pub mod network;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the top-level flows (startup, CLI commands) where the concrete
/// error only needs to be reported. Module seams use their own error enums.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Loaded {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Wrote {} playlists", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used for startup failures: missing configuration, an unreadable
/// catalog or an unreachable network session. Acquisition failures are
/// reported as outcomes and never reach this macro.
///
/// # Example
///
/// ```
/// error!("Cannot load catalog. Err: {}", e);
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Could not stop the network session: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
