//! medic-handlers — per-problem-type remediation for FleetMedic.
//!
//! Each problem type gets a handler that knows how to describe the fault,
//! enumerate its resolutions, and apply one against the fleet through the
//! infrastructure interfaces in [`infra`]. The resolver never touches a
//! concrete handler type; it goes through [`HandlerFactory`], which builds
//! a [`Handler`] from a stored problem record.

pub mod error;
pub mod factory;
pub mod handler;
pub mod infra;

pub use error::{HandlerBuildError, HandlerError};
pub use factory::{HandlerFactory, ModelHandlerFactory};
pub use handler::Handler;
pub use infra::{AgentOps, BoxFuture, CloudOps};
