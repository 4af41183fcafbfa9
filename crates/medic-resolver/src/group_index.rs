//! Resolves problems to their instance group's update policy.
//!
//! Concurrency budgets come from the deployment plan, but problems only
//! carry a resource id. This index walks the ownership edges in the store
//! (disk → instance → group name) and looks the group up in the plan.

use std::sync::Arc;

use medic_core::types::{DeploymentPlan, Problem};
use medic_store::{FleetStore, StoreResult};

/// The scheduling slot a problem resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSlot {
    /// Instance group name from the plan.
    pub group: String,
    /// Whether the group updates serially.
    pub serial: bool,
    /// Per-group concurrency budget, at least 1.
    pub max_in_flight: u32,
}

/// Read-only mapping from problems to group slots.
pub struct GroupIndex {
    store: FleetStore,
    plan: Arc<DeploymentPlan>,
}

impl GroupIndex {
    pub fn new(store: FleetStore, plan: Arc<DeploymentPlan>) -> Self {
        Self { store, plan }
    }

    /// Find the update policy governing a problem.
    ///
    /// Returns `None` when the backing instance or disk record is gone, or
    /// when the instance names a group the plan does not know. Such problems
    /// are scheduled as serial singletons.
    pub fn policy_for(&self, problem: &Problem) -> StoreResult<Option<GroupSlot>> {
        let instance_id = if problem.ptype.is_disk_scoped() {
            match self.store.get_disk(problem.resource_id)? {
                Some(disk) => disk.instance_id,
                None => return Ok(None),
            }
        } else {
            problem.resource_id
        };
        let Some(instance) = self.store.get_instance(instance_id)? else {
            return Ok(None);
        };
        let Some(group) = self.plan.group(&instance.group) else {
            return Ok(None);
        };
        Ok(Some(GroupSlot {
            group: group.name.clone(),
            serial: group.update.serial,
            max_in_flight: group.update.max_in_flight.max(1),
        }))
    }
}
