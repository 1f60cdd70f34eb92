//! Error taxonomy for orchestration
//!
//! Policy validation failures, provider failures, and wait timeouts
//! are distinct so the caller can report them differently. Provider
//! errors pass through untouched; nothing here retries them.

use std::time::Duration;

use thiserror::Error;

use crate::eni::EniState;
use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum Error {
    /// The retry policy is malformed. Raised before any provider call.
    #[error("invalid retry policy: {0}")]
    Policy(String),

    /// A describe/attach/detach call failed. Never retried here.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// No network interface with this id exists.
    #[error("network interface {0} not found")]
    NotFound(String),

    /// The awaited transition did not happen within the policy bounds.
    #[error(
        "timed out waiting for {eni_id}: {attempts} attempts over {:.1}s",
        .elapsed.as_secs_f64()
    )]
    TimedOut {
        eni_id: String,
        attempts: u32,
        elapsed: Duration,
        /// The snapshot from the final poll, for diagnostics.
        last_seen: Option<Box<EniState>>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
