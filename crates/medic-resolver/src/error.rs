//! Error types for the resolver.

use medic_store::StoreError;
use thiserror::Error;

/// Result type alias for resolver operations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors that abort a resolution pass before any problem is dispatched.
///
/// Failures inside the pass never surface here; they are captured in the
/// pass outcome instead.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
