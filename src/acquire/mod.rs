//! # Acquisition Module
//!
//! Orchestrates search → match → transfer → verify for the whole catalog.
//!
//! ```text
//! Scheduler                    (albums, then playlists, then standalone tracks)
//!     ↓            ↓
//! Album Coordinator  →  Acquisition Engine   (single track state machine)
//!     ↓                        ↓
//! matcher (pure)  +  network::PeerNetwork
//!     ↓
//! <output_dir>/<track id>.<ext>   (existence + size is the completion oracle)
//! ```
//!
//! ## Failure handling
//!
//! Every per-candidate failure (search transport, transfer transport, a file
//! that never appears, a stalled transfer, a truncated file) is handled the
//! same way: the candidate is abandoned and the next one is tried. Only the
//! exhaustion of all peers over all attempts produces a failure, and even
//! that is returned as [`crate::types::AcquisitionOutcome::Failed`] rather than an error,
//! so sibling work is never aborted.
//!
//! ## Concurrency
//!
//! Units of work are admitted through a counting semaphore. Shared state
//! lives in [`RunState`]: per-track and per-album async locks make the
//! check-then-download sequence atomic, and the run-wide sets make sure a
//! track is acquired at most once even when several albums or playlists
//! reference it.

mod album;
mod engine;
mod scheduler;
mod state;

use thiserror::Error;

pub use engine::Acquirer;
pub use scheduler::FailedTrack;
pub use scheduler::RunSummary;
pub use scheduler::Scheduler;
pub use state::KeyedLocks;
pub use state::RunState;

use crate::types::ProgressEvent;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("search failed: {0}")]
    SearchTransport(String),

    #[error("transfer failed: {0}")]
    TransferTransport(String),

    #[error("destination file never appeared")]
    FileNeverAppeared,

    #[error("transfer stalled after {0:?}")]
    TransferStalled(std::time::Duration),

    #[error("file too small ({size} < {min} bytes)")]
    FileTooSmall { size: u64, min: u64 },

    #[error("all candidates exhausted after {attempts} attempt(s)")]
    AllCandidatesExhausted { attempts: u32 },

    /// An abandoned transfer may still be writing the destination.
    #[error("transfer could not be cancelled: {0}")]
    CancelFailed(String),
}

impl AcquireError {
    /// Whether no further candidate may target the same destination.
    pub fn blocks_destination(&self) -> bool {
        matches!(self, AcquireError::CancelFailed(_))
    }
}

/// Sink for progress events. Never used to steer acquisition.
pub trait ProgressObserver: Send + Sync {
    fn notify(&self, event: &ProgressEvent);
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn notify(&self, _event: &ProgressEvent) {}
}
