//! medic-resolver — the FleetMedic resolution engine.
//!
//! Takes recorded fleet problems and applies operator-chosen (or automatic)
//! resolutions across a deployment, respecting each instance group's update
//! policy: serial groups repair one problem at a time, parallel groups run
//! concurrently up to `max_threads` with per-group `max_in_flight` budgets.
//! Worker pools are only materialized when they would actually hold more
//! than one task; [`PassStats`] records every pool a pass created.

pub mod error;
pub mod group_index;
pub mod pool;
pub mod resolver;

pub use error::{ResolverError, ResolverResult};
pub use group_index::{GroupIndex, GroupSlot};
pub use pool::{PassStats, PoolSpawn, PoolTier};
pub use resolver::{ProblemResolver, ResolutionOutcome};
