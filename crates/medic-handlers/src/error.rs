//! Error types for handler construction and remediation.

use medic_core::types::{DiskId, InstanceId, ProblemType};
use medic_store::StoreError;
use thiserror::Error;

/// Errors raised while building a handler from a problem record.
///
/// These mean the problem could not be acted on at all, so the resolver
/// leaves the record open.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    #[error("instance {0} not found")]
    MissingInstance(InstanceId),

    #[error("disk {0} not found")]
    MissingDisk(DiskId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while applying a resolution.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unknown resolution '{name}' for {ptype} problem")]
    UnknownResolution { name: String, ptype: ProblemType },

    #[error("cloud error: {0}")]
    Cloud(String),

    #[error("agent error: {0}")]
    Agent(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("cannot apply resolution: {0}")]
    Blocked(String),
}

impl From<StoreError> for HandlerError {
    fn from(e: StoreError) -> Self {
        HandlerError::Store(e.to_string())
    }
}
