//! Handler construction from stored problem records.

use std::sync::Arc;

use medic_core::types::{Disk, DiskId, Instance, InstanceId, Problem, ProblemType};
use medic_store::FleetStore;

use crate::error::HandlerBuildError;
use crate::handler::{
    Handler, InactiveDiskHandler, MissingDiskHandler, MissingVmHandler, UnresponsiveAgentHandler,
};
use crate::infra::{AgentOps, CloudOps};

/// Builds a handler for a problem record.
///
/// The resolver depends on this trait rather than on concrete handlers, so
/// tests can stub construction failures directly.
pub trait HandlerFactory: Send + Sync {
    fn create(&self, problem: &Problem) -> Result<Handler, HandlerBuildError>;
}

/// Production factory: loads the backing instance and disk records from the
/// store and fails when one has vanished.
pub struct ModelHandlerFactory {
    store: FleetStore,
    cloud: Arc<dyn CloudOps>,
    agent: Arc<dyn AgentOps>,
}

impl ModelHandlerFactory {
    pub fn new(store: FleetStore, cloud: Arc<dyn CloudOps>, agent: Arc<dyn AgentOps>) -> Self {
        Self { store, cloud, agent }
    }

    fn load_instance(&self, id: InstanceId) -> Result<Instance, HandlerBuildError> {
        self.store
            .get_instance(id)?
            .ok_or(HandlerBuildError::MissingInstance(id))
    }

    fn load_disk(&self, id: DiskId) -> Result<Disk, HandlerBuildError> {
        self.store
            .get_disk(id)?
            .ok_or(HandlerBuildError::MissingDisk(id))
    }
}

impl HandlerFactory for ModelHandlerFactory {
    fn create(&self, problem: &Problem) -> Result<Handler, HandlerBuildError> {
        match problem.ptype {
            ProblemType::MissingVm => {
                let instance = self.load_instance(problem.resource_id)?;
                Ok(Handler::MissingVm(MissingVmHandler::new(
                    problem.id,
                    instance,
                    self.store.clone(),
                    self.cloud.clone(),
                )))
            }
            ProblemType::UnresponsiveAgent => {
                let instance = self.load_instance(problem.resource_id)?;
                Ok(Handler::UnresponsiveAgent(UnresponsiveAgentHandler::new(
                    problem.id,
                    instance,
                    self.store.clone(),
                    self.cloud.clone(),
                )))
            }
            ProblemType::InactiveDisk => {
                let disk = self.load_disk(problem.resource_id)?;
                let instance = self.load_instance(disk.instance_id)?;
                Ok(Handler::InactiveDisk(InactiveDiskHandler::new(
                    problem.id,
                    disk,
                    instance,
                    self.store.clone(),
                    self.cloud.clone(),
                    self.agent.clone(),
                )))
            }
            ProblemType::MissingDisk => {
                let disk = self.load_disk(problem.resource_id)?;
                let instance = self.load_instance(disk.instance_id)?;
                Ok(Handler::MissingDisk(MissingDiskHandler::new(
                    problem.id,
                    disk,
                    instance,
                    self.store.clone(),
                )))
            }
        }
    }
}
