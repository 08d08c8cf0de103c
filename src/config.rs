//! Configuration management for spotseek.
//!
//! Connection settings for the slskd daemon come from environment variables,
//! optionally provided through `.env` files. Acquisition tuning (timeouts,
//! attempts, concurrency) is carried by [`AcquireSettings`], which the CLI
//! fills from its flags.
//!
//! Lookup order for environment values:
//! 1. Process environment (highest priority)
//! 2. `.env` in the current working directory
//! 3. `.env` in the local data directory (`spotseek/.env`)

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

pub const ENV_SLSKD_URL: &str = "SLSKD_URL";
pub const ENV_SLSKD_API_KEY: &str = "SLSKD_API_KEY";
pub const ENV_SLSKD_DOWNLOADS_DIR: &str = "SLSKD_DOWNLOADS_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },
}

/// Loads environment variables from `.env` files.
///
/// The working directory `.env` is read first so it takes precedence over the
/// one in the local data directory; dotenv never overrides variables that are
/// already set. Missing files are not an error, malformed ones are.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotseek/.env`
/// - macOS: `~/Library/Application Support/spotseek/.env`
/// - Windows: `%LOCALAPPDATA%/spotseek/.env`
pub async fn load_env() -> Result<(), ConfigError> {
    let local = PathBuf::from(".env");
    load_env_file(&local)?;

    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|source| ConfigError::DataDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    load_env_file(&path)
}

fn load_env_file(path: &PathBuf) -> Result<(), ConfigError> {
    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(path)
        .map(|_| ())
        .map_err(|source| ConfigError::EnvFile {
            path: path.clone(),
            source,
        })
}

/// Returns the platform-specific data directory of the application.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotseek");
    path
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(key)),
    }
}

/// Returns the base URL of the slskd web API, e.g. `http://127.0.0.1:5030`.
pub fn slskd_url() -> Result<String, ConfigError> {
    require(ENV_SLSKD_URL).map(|url| url.trim_end_matches('/').to_string())
}

/// Returns the slskd API key sent as `X-API-Key`.
pub fn slskd_api_key() -> Result<String, ConfigError> {
    require(ENV_SLSKD_API_KEY)
}

/// Returns the directory slskd stores completed downloads in.
///
/// Completed transfers are moved from here to the track's destination path.
pub fn slskd_downloads_dir() -> Result<PathBuf, ConfigError> {
    require(ENV_SLSKD_DOWNLOADS_DIR).map(PathBuf::from)
}

/// Tuning for a single acquisition run.
///
/// Every wait in the engine is expressed through one of these values, so the
/// poll cadence is a setting rather than a hidden constant.
#[derive(Debug, Clone)]
pub struct AcquireSettings {
    /// Directory holding `<track id>.<extension>` files.
    pub output_dir: PathBuf,
    /// Target file extension, without the leading dot.
    pub extension: String,
    /// How long to wait for the first search results.
    pub search_timeout: Duration,
    /// How long a started transfer may take to complete.
    pub download_timeout: Duration,
    /// How long to wait for a transfer to materialize after requesting it.
    pub appear_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause between two top-level attempts of the same track.
    pub retry_backoff: Duration,
    /// Files smaller than this are treated as truncated.
    pub min_file_size: u64,
    pub max_attempts: u32,
    /// Maximum number of acquisition units in flight.
    pub concurrency: usize,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            extension: "mp3".to_string(),
            search_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(60),
            appear_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(1),
            min_file_size: 1000,
            max_attempts: 3,
            concurrency: 2,
        }
    }
}

impl AcquireSettings {
    /// Extension without a leading dot, lowercased.
    pub fn normalized_extension(&self) -> String {
        self.extension.trim_start_matches('.').to_lowercase()
    }
}
