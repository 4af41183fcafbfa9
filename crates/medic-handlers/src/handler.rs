//! Remediation handlers, one per problem type.
//!
//! A handler is bound to one problem record plus the fleet records it acts
//! on. It can describe the fault for an operator, map resolution names to
//! human summaries, name the default resolution for automatic repair, and
//! apply a resolution against the fleet. Every type accepts `ignore`, which
//! closes the problem without touching infrastructure.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use medic_core::types::{Disk, Instance, ProblemId, ProblemType};
use medic_store::FleetStore;

use crate::error::HandlerError;
use crate::infra::{AgentOps, CloudOps};

/// A remediation handler bound to one problem record.
///
/// Closed set of variants, one per problem type; dispatch is a plain match.
pub enum Handler {
    MissingVm(MissingVmHandler),
    UnresponsiveAgent(UnresponsiveAgentHandler),
    InactiveDisk(InactiveDiskHandler),
    MissingDisk(MissingDiskHandler),
}

// Manual impl: the inner handlers hold non-Debug trait objects, so only the
// variant name is printed.
impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::MissingVm(_) => f.write_str("Handler::MissingVm"),
            Handler::UnresponsiveAgent(_) => f.write_str("Handler::UnresponsiveAgent"),
            Handler::InactiveDisk(_) => f.write_str("Handler::InactiveDisk"),
            Handler::MissingDisk(_) => f.write_str("Handler::MissingDisk"),
        }
    }
}

impl Handler {
    /// Operator-facing summary of the fault.
    pub fn description(&self) -> String {
        match self {
            Handler::MissingVm(h) => h.description(),
            Handler::UnresponsiveAgent(h) => h.description(),
            Handler::InactiveDisk(h) => h.description(),
            Handler::MissingDisk(h) => h.description(),
        }
    }

    /// Human summary of what the named resolution will do, `None` if the
    /// name is not a resolution of this problem type.
    pub fn resolution_plan(&self, name: &str) -> Option<&'static str> {
        match self {
            Handler::MissingVm(h) => h.resolution_plan(name),
            Handler::UnresponsiveAgent(h) => h.resolution_plan(name),
            Handler::InactiveDisk(h) => h.resolution_plan(name),
            Handler::MissingDisk(h) => h.resolution_plan(name),
        }
    }

    /// The resolution applied when a request names none.
    pub fn auto_resolution(&self) -> &'static str {
        match self {
            Handler::MissingVm(_) => "recreate_vm",
            Handler::UnresponsiveAgent(_) => "reboot_vm",
            Handler::InactiveDisk(_) => "activate_disk",
            Handler::MissingDisk(_) => "delete_disk_reference",
        }
    }

    /// Apply the named resolution against the fleet.
    pub async fn apply(&self, name: &str) -> Result<(), HandlerError> {
        match self {
            Handler::MissingVm(h) => h.apply(name).await,
            Handler::UnresponsiveAgent(h) => h.apply(name).await,
            Handler::InactiveDisk(h) => h.apply(name).await,
            Handler::MissingDisk(h) => h.apply(name).await,
        }
    }
}

// ── missing_vm ─────────────────────────────────────────────────────

/// The instance's VM is gone from the IaaS but the record still points at it.
pub struct MissingVmHandler {
    problem_id: ProblemId,
    instance: Instance,
    store: FleetStore,
    cloud: Arc<dyn CloudOps>,
}

impl MissingVmHandler {
    pub(crate) fn new(
        problem_id: ProblemId,
        instance: Instance,
        store: FleetStore,
        cloud: Arc<dyn CloudOps>,
    ) -> Self {
        Self {
            problem_id,
            instance,
            store,
            cloud,
        }
    }

    fn description(&self) -> String {
        format!("VM for instance '{}' is missing", self.instance.label())
    }

    fn resolution_plan(&self, name: &str) -> Option<&'static str> {
        match name {
            "recreate_vm" => Some("Recreate VM"),
            "delete_vm_reference" => Some("Delete VM reference"),
            "ignore" => Some("Skip for now"),
            _ => None,
        }
    }

    async fn apply(&self, name: &str) -> Result<(), HandlerError> {
        match name {
            "recreate_vm" => recreate_vm(&self.store, self.cloud.as_ref(), &self.instance).await,
            "delete_vm_reference" => delete_vm_reference(&self.store, &self.instance),
            "ignore" => ignore(&self.store, self.problem_id),
            _ => Err(unknown(name, ProblemType::MissingVm)),
        }
    }
}

// ── unresponsive_agent ─────────────────────────────────────────────

/// The instance's agent has stopped answering, VM state unknown.
pub struct UnresponsiveAgentHandler {
    problem_id: ProblemId,
    instance: Instance,
    store: FleetStore,
    cloud: Arc<dyn CloudOps>,
}

impl UnresponsiveAgentHandler {
    pub(crate) fn new(
        problem_id: ProblemId,
        instance: Instance,
        store: FleetStore,
        cloud: Arc<dyn CloudOps>,
    ) -> Self {
        Self {
            problem_id,
            instance,
            store,
            cloud,
        }
    }

    fn description(&self) -> String {
        format!("Agent for instance '{}' is not responding", self.instance.label())
    }

    fn resolution_plan(&self, name: &str) -> Option<&'static str> {
        match name {
            "reboot_vm" => Some("Reboot VM"),
            "recreate_vm" => Some("Recreate VM"),
            "delete_vm_reference" => Some("Delete VM reference"),
            "ignore" => Some("Skip for now"),
            _ => None,
        }
    }

    async fn apply(&self, name: &str) -> Result<(), HandlerError> {
        match name {
            "reboot_vm" => self.reboot_vm().await,
            "recreate_vm" => recreate_vm(&self.store, self.cloud.as_ref(), &self.instance).await,
            "delete_vm_reference" => delete_vm_reference(&self.store, &self.instance),
            "ignore" => ignore(&self.store, self.problem_id),
            _ => Err(unknown(name, ProblemType::UnresponsiveAgent)),
        }
    }

    async fn reboot_vm(&self) -> Result<(), HandlerError> {
        let vm_cid = self
            .instance
            .vm_cid
            .as_deref()
            .ok_or_else(|| blocked_no_vm(&self.instance))?;
        self.cloud
            .reboot_vm(vm_cid)
            .await
            .map_err(HandlerError::Cloud)?;
        info!(instance = %self.instance.label(), %vm_cid, "vm rebooted");
        Ok(())
    }
}

// ── inactive_disk ──────────────────────────────────────────────────

/// A persistent disk exists but is not marked active on its instance.
pub struct InactiveDiskHandler {
    problem_id: ProblemId,
    disk: Disk,
    instance: Instance,
    store: FleetStore,
    cloud: Arc<dyn CloudOps>,
    agent: Arc<dyn AgentOps>,
}

impl InactiveDiskHandler {
    pub(crate) fn new(
        problem_id: ProblemId,
        disk: Disk,
        instance: Instance,
        store: FleetStore,
        cloud: Arc<dyn CloudOps>,
        agent: Arc<dyn AgentOps>,
    ) -> Self {
        Self {
            problem_id,
            disk,
            instance,
            store,
            cloud,
            agent,
        }
    }

    fn description(&self) -> String {
        format!(
            "Disk '{}' ({}M) for instance '{}' is inactive",
            self.disk.disk_cid,
            self.disk.size_mb,
            self.instance.label()
        )
    }

    fn resolution_plan(&self, name: &str) -> Option<&'static str> {
        match name {
            "activate_disk" => Some("Activate disk"),
            "detach_disk" => Some("Detach disk"),
            "delete_disk" => Some("Delete disk"),
            "ignore" => Some("Skip for now"),
            _ => None,
        }
    }

    async fn apply(&self, name: &str) -> Result<(), HandlerError> {
        match name {
            "activate_disk" => self.activate_disk().await,
            "detach_disk" => self.detach_disk().await,
            "delete_disk" => self.delete_disk().await,
            "ignore" => ignore(&self.store, self.problem_id),
            _ => Err(unknown(name, ProblemType::InactiveDisk)),
        }
    }

    /// Mark the disk active after confirming the agent actually has it
    /// mounted.
    async fn activate_disk(&self) -> Result<(), HandlerError> {
        let agent_id = self
            .instance
            .agent_id
            .as_deref()
            .ok_or_else(|| blocked_no_agent(&self.instance))?;
        let mounted = self
            .agent
            .list_disks(agent_id)
            .await
            .map_err(HandlerError::Agent)?;
        if !mounted.iter().any(|cid| cid == &self.disk.disk_cid) {
            return Err(HandlerError::Blocked(format!(
                "disk '{}' is not mounted on instance '{}'",
                self.disk.disk_cid,
                self.instance.label()
            )));
        }
        let mut updated = self.disk.clone();
        updated.active = true;
        self.store.put_disk(&updated)?;
        info!(disk = %self.disk.disk_cid, "disk activated");
        Ok(())
    }

    async fn detach_disk(&self) -> Result<(), HandlerError> {
        let vm_cid = self
            .instance
            .vm_cid
            .as_deref()
            .ok_or_else(|| blocked_no_vm(&self.instance))?;
        self.cloud
            .detach_disk(vm_cid, &self.disk.disk_cid)
            .await
            .map_err(HandlerError::Cloud)?;
        info!(disk = %self.disk.disk_cid, %vm_cid, "disk detached");
        Ok(())
    }

    /// Detach the disk, delete it in the cloud, and drop the record.
    /// Refuses while the agent still reports the disk mounted.
    async fn delete_disk(&self) -> Result<(), HandlerError> {
        if let Some(agent_id) = self.instance.agent_id.as_deref() {
            let mounted = self
                .agent
                .list_disks(agent_id)
                .await
                .map_err(HandlerError::Agent)?;
            if mounted.iter().any(|cid| cid == &self.disk.disk_cid) {
                return Err(HandlerError::Blocked(format!(
                    "disk '{}' is still mounted on instance '{}'",
                    self.disk.disk_cid,
                    self.instance.label()
                )));
            }
        }
        if let Some(vm_cid) = self.instance.vm_cid.as_deref() {
            self.cloud
                .detach_disk(vm_cid, &self.disk.disk_cid)
                .await
                .map_err(HandlerError::Cloud)?;
        }
        self.cloud
            .delete_disk(&self.disk.disk_cid)
            .await
            .map_err(HandlerError::Cloud)?;
        self.store.delete_disk(self.disk.id)?;
        info!(disk = %self.disk.disk_cid, "disk deleted");
        Ok(())
    }
}

// ── missing_disk ───────────────────────────────────────────────────

/// The cloud no longer has the disk; only the record remains.
pub struct MissingDiskHandler {
    problem_id: ProblemId,
    disk: Disk,
    instance: Instance,
    store: FleetStore,
}

impl MissingDiskHandler {
    pub(crate) fn new(
        problem_id: ProblemId,
        disk: Disk,
        instance: Instance,
        store: FleetStore,
    ) -> Self {
        Self {
            problem_id,
            disk,
            instance,
            store,
        }
    }

    fn description(&self) -> String {
        format!(
            "Disk '{}' for instance '{}' is missing",
            self.disk.disk_cid,
            self.instance.label()
        )
    }

    fn resolution_plan(&self, name: &str) -> Option<&'static str> {
        match name {
            "delete_disk_reference" => Some("Delete disk reference"),
            "ignore" => Some("Skip for now"),
            _ => None,
        }
    }

    async fn apply(&self, name: &str) -> Result<(), HandlerError> {
        match name {
            "delete_disk_reference" => {
                self.store.delete_disk(self.disk.id)?;
                info!(disk = %self.disk.disk_cid, "disk reference deleted");
                Ok(())
            }
            "ignore" => ignore(&self.store, self.problem_id),
            _ => Err(unknown(name, ProblemType::MissingDisk)),
        }
    }
}

// ── Shared flows ───────────────────────────────────────────────────

/// Tear down the recorded VM (when one is recorded) and create a fresh one,
/// then point the instance record at the new cid.
async fn recreate_vm(
    store: &FleetStore,
    cloud: &dyn CloudOps,
    instance: &Instance,
) -> Result<(), HandlerError> {
    if let Some(vm_cid) = instance.vm_cid.as_deref() {
        cloud.delete_vm(vm_cid).await.map_err(HandlerError::Cloud)?;
    }
    let new_cid = cloud.create_vm(instance).await.map_err(HandlerError::Cloud)?;
    let mut updated = instance.clone();
    updated.vm_cid = Some(new_cid.clone());
    store.put_instance(&updated)?;
    info!(instance = %instance.label(), %new_cid, "vm recreated");
    Ok(())
}

fn delete_vm_reference(store: &FleetStore, instance: &Instance) -> Result<(), HandlerError> {
    let mut updated = instance.clone();
    updated.vm_cid = None;
    updated.agent_id = None;
    store.put_instance(&updated)?;
    info!(instance = %instance.label(), "vm reference deleted");
    Ok(())
}

fn ignore(store: &FleetStore, problem_id: ProblemId) -> Result<(), HandlerError> {
    store.mark_problem_ignored(problem_id)?;
    debug!(%problem_id, "problem ignored");
    Ok(())
}

fn unknown(name: &str, ptype: ProblemType) -> HandlerError {
    HandlerError::UnknownResolution {
        name: name.to_string(),
        ptype,
    }
}

fn blocked_no_vm(instance: &Instance) -> HandlerError {
    HandlerError::Blocked(format!("instance '{}' has no vm", instance.label()))
}

fn blocked_no_agent(instance: &Instance) -> HandlerError {
    HandlerError::Blocked(format!("instance '{}' has no agent", instance.label()))
}
