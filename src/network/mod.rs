//! # Peer Network Module
//!
//! The narrow interface the acquisition core needs from the peer-to-peer
//! network: a session that can be started and logged into, searches whose
//! results accumulate over time, and transfers whose state can be polled.
//!
//! ```text
//! acquire (engine, album coordinator, scheduler)
//!          ↓
//! PeerNetwork / SearchHandle / TransferHandle   (this module)
//!          ↓
//! slskd REST API  (network::slskd)
//!          ↓
//! Soulseek
//! ```
//!
//! The core never inspects transport details; every [`NetworkError`] that
//! reaches it during acquisition is treated as "this candidate failed".
//! Implementations must be `Send + Sync` so that many acquisition units can
//! share one session.

pub mod slskd;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::PeerResult;

pub use slskd::SlskdClient;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network unavailable: {0}")]
    Unavailable(String),

    #[error("Not logged in to the network")]
    NotLoggedIn,

    #[error("Cannot move downloaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle state of a single transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    /// Requested but not started, e.g. waiting in the peer's upload queue.
    Queued,
    InProgress,
    /// The file is complete at its destination.
    Completed,
    Failed(String),
}

impl TransferState {
    pub fn has_started(&self) -> bool {
        !matches!(self, TransferState::Queued)
    }
}

#[async_trait]
pub trait PeerNetwork: Send + Sync {
    async fn start(&self) -> Result<(), NetworkError>;

    async fn login(&self) -> Result<(), NetworkError>;

    async fn stop(&self) -> Result<(), NetworkError>;

    /// Starts a search. Results arrive asynchronously on the returned handle.
    async fn search(&self, query: &str) -> Result<Box<dyn SearchHandle>, NetworkError>;

    /// Requests `remote_path` from `username`, to be stored at `destination`.
    async fn download(
        &self,
        username: &str,
        remote_path: &str,
        destination: &Path,
    ) -> Result<Box<dyn TransferHandle>, NetworkError>;
}

#[async_trait]
pub trait SearchHandle: Send + Sync {
    /// Snapshot of the results collected so far.
    async fn results(&self) -> Result<Vec<PeerResult>, NetworkError>;
}

#[async_trait]
pub trait TransferHandle: Send + Sync {
    async fn state(&self) -> Result<TransferState, NetworkError>;

    /// Abandons the transfer so it can no longer write to its destination.
    async fn cancel(&self) -> Result<(), NetworkError> {
        Ok(())
    }
}
