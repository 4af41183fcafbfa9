//! Infrastructure collaborator interfaces.
//!
//! Remediation handlers act on the fleet through these two traits. Concrete
//! implementations live with the orchestrator's IaaS and agent plumbing;
//! this crate only defines the seam, and tests inject mocks with call
//! counters.

use medic_core::types::Instance;

/// Boxed future returned by the trait-object-safe async methods below.
pub type BoxFuture<T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send>>;

/// IaaS-facing operations.
pub trait CloudOps: Send + Sync {
    /// Create a replacement VM for the instance. Returns the new VM cid.
    fn create_vm(&self, instance: &Instance) -> BoxFuture<Result<String, String>>;

    /// Tear down the VM with the given cid.
    fn delete_vm(&self, vm_cid: &str) -> BoxFuture<Result<(), String>>;

    /// Reboot the VM with the given cid.
    fn reboot_vm(&self, vm_cid: &str) -> BoxFuture<Result<(), String>>;

    /// Detach a persistent disk from a VM.
    fn detach_disk(&self, vm_cid: &str, disk_cid: &str) -> BoxFuture<Result<(), String>>;

    /// Delete a persistent disk.
    fn delete_disk(&self, disk_cid: &str) -> BoxFuture<Result<(), String>>;
}

/// Agent-facing operations.
pub trait AgentOps: Send + Sync {
    /// List the persistent disk cids the agent currently has mounted.
    fn list_disks(&self, agent_id: &str) -> BoxFuture<Result<Vec<String>, String>>;
}
