//! medic-core — shared domain model for FleetMedic.
//!
//! Holds the types every other crate speaks: problem records and their
//! lifecycle states, the backing instance/disk records, the read-only
//! deployment-plan view (instance groups and their update policies), the
//! engine configuration, and the operator event-log contract.

pub mod config;
pub mod events;
pub mod types;

pub use config::ResolverConfig;
pub use events::{EventLog, TracingEventLog};
pub use types::*;
