//! Domain types for the FleetMedic resolution engine.
//!
//! These types represent the persisted problem/instance/disk records and
//! the in-memory view of the deployment plan the resolver schedules
//! against. Persisted types are serializable to/from JSON for storage.

use serde::{Deserialize, Serialize};

/// Store-assigned identity of a problem record.
pub type ProblemId = u32;

/// Store-assigned identity of an instance record.
pub type InstanceId = u32;

/// Store-assigned identity of a persistent disk record.
pub type DiskId = u32;

// ── Problem ───────────────────────────────────────────────────────

/// A detected fault in a deployed resource awaiting operator-chosen
/// remediation.
///
/// Problems are created by the scanning side of the orchestrator and only
/// ever transition state here: the resolver moves `Open` records to
/// `Resolved` (or `Ignored`) and touches nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
    pub id: ProblemId,
    pub deployment_id: String,
    /// Instance id for VM/agent problems, disk id for disk problems.
    pub resource_id: u32,
    pub ptype: ProblemType,
    pub state: ProblemState,
    /// Unix timestamp (seconds) when the problem was first recorded.
    pub created_at: u64,
}

/// The kind of fault a problem record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    MissingVm,
    UnresponsiveAgent,
    InactiveDisk,
    MissingDisk,
}

impl ProblemType {
    /// Canonical snake_case name, as stored and as shown to operators.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingVm => "missing_vm",
            Self::UnresponsiveAgent => "unresponsive_agent",
            Self::InactiveDisk => "inactive_disk",
            Self::MissingDisk => "missing_disk",
        }
    }

    /// Whether the problem's `resource_id` names a disk rather than an
    /// instance.
    pub fn is_disk_scoped(self) -> bool {
        matches!(self, Self::InactiveDisk | Self::MissingDisk)
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a problem record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemState {
    Open,
    Resolved,
    Ignored,
}

impl ProblemState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for ProblemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Instance / Disk ───────────────────────────────────────────────

/// Backing record of a deployed instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub id: InstanceId,
    pub deployment_id: String,
    /// Declared instance-group (job) name, the unit of update policy.
    pub group: String,
    pub uuid: String,
    pub index: u32,
    /// Cloud id of the backing VM, absent while the VM is gone.
    pub vm_cid: Option<String>,
    /// Agent identity, absent when no agent has ever run on the VM.
    pub agent_id: Option<String>,
}

impl Instance {
    /// Operator-facing `group/uuid (index)` label.
    pub fn label(&self) -> String {
        format!("{}/{} ({})", self.group, self.uuid, self.index)
    }
}

/// Backing record of a persistent disk, owned by an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Disk {
    pub id: DiskId,
    pub instance_id: InstanceId,
    pub disk_cid: String,
    pub size_mb: u64,
    /// Whether the deployment currently considers the disk attached/in use.
    pub active: bool,
}

// ── Deployment plan view ──────────────────────────────────────────

/// Read-only snapshot of the deployment plan's instance groups.
///
/// Supplied by the caller for one resolution pass; the resolver never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub name: String,
    pub instance_groups: Vec<InstanceGroup>,
}

impl DeploymentPlan {
    /// Look up an instance group by name.
    pub fn group(&self, name: &str) -> Option<&InstanceGroup> {
        self.instance_groups.iter().find(|ig| ig.name == name)
    }
}

/// A named set of instances sharing an update/concurrency policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceGroup {
    pub name: String,
    pub update: UpdatePolicy,
}

/// Per-group concurrency policy, mirrored from the deployment's update
/// settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdatePolicy {
    /// Serial groups never run more than one remediation at a time.
    pub serial: bool,
    /// Cap on concurrently active remediations within the group.
    pub max_in_flight: u32,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            serial: false,
            max_in_flight: 1,
        }
    }
}
