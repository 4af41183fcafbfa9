//! FleetStore — redb-backed state persistence for FleetMedic.
//!
//! Provides typed CRUD operations over problems, instances, and persistent
//! disks. All values are JSON-serialized into redb's `&[u8]` value columns.
//! The store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use medic_core::types::{Disk, DiskId, Instance, InstanceId, Problem, ProblemId, ProblemState};

use crate::error::{StoreError, StoreResult};
use crate::tables::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe fleet state store backed by redb.
#[derive(Clone)]
pub struct FleetStore {
    db: Arc<Database>,
}

impl FleetStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "fleet store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory fleet store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PROBLEMS).map_err(map_err!(Table))?;
        txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        txn.open_table(DISKS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Problems ───────────────────────────────────────────────────

    /// Insert or update a problem record.
    pub fn put_problem(&self, problem: &Problem) -> StoreResult<()> {
        let key = problem.id.to_string();
        let value = serde_json::to_vec(problem).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PROBLEMS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, "problem stored");
        Ok(())
    }

    /// Get a problem by id.
    pub fn get_problem(&self, id: ProblemId) -> StoreResult<Option<Problem>> {
        let key = id.to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROBLEMS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let problem: Problem =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(problem))
            }
            None => Ok(None),
        }
    }

    /// List all open problems for a deployment, ordered by ascending id.
    ///
    /// Keys are decimal strings, so table iteration order is lexicographic;
    /// the numeric sort here restores record-creation order.
    pub fn open_problems(&self, deployment_id: &str) -> StoreResult<Vec<Problem>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROBLEMS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let problem: Problem =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if problem.state == ProblemState::Open && problem.deployment_id == deployment_id {
                results.push(problem);
            }
        }
        results.sort_by_key(|p| p.id);
        Ok(results)
    }

    /// Transition a problem out of the open state. Returns true if the
    /// record existed and was open; a missing or already-closed record is
    /// left untouched.
    pub fn transition_problem(&self, id: ProblemId, to: ProblemState) -> StoreResult<bool> {
        let key = id.to_string();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let changed;
        {
            let mut table = txn.open_table(PROBLEMS).map_err(map_err!(Table))?;
            let current: Option<Problem> = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    Some(serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?)
                }
                None => None,
            };
            changed = match current {
                Some(mut problem) if problem.state == ProblemState::Open => {
                    problem.state = to;
                    let value = serde_json::to_vec(&problem).map_err(map_err!(Serialize))?;
                    table
                        .insert(key.as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                    true
                }
                _ => false,
            };
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, to = %to, changed, "problem transition");
        Ok(changed)
    }

    /// Mark an open problem as resolved.
    pub fn mark_problem_resolved(&self, id: ProblemId) -> StoreResult<bool> {
        self.transition_problem(id, ProblemState::Resolved)
    }

    /// Mark an open problem as ignored.
    pub fn mark_problem_ignored(&self, id: ProblemId) -> StoreResult<bool> {
        self.transition_problem(id, ProblemState::Ignored)
    }

    // ── Instances ──────────────────────────────────────────────────

    /// Insert or update an instance record.
    pub fn put_instance(&self, instance: &Instance) -> StoreResult<()> {
        let key = instance.id.to_string();
        let value = serde_json::to_vec(instance).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get an instance by id.
    pub fn get_instance(&self, id: InstanceId) -> StoreResult<Option<Instance>> {
        let key = id.to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(INSTANCES).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let instance: Instance =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(instance))
            }
            None => Ok(None),
        }
    }

    // ── Disks ──────────────────────────────────────────────────────

    /// Insert or update a persistent disk record.
    pub fn put_disk(&self, disk: &Disk) -> StoreResult<()> {
        let key = disk.id.to_string();
        let value = serde_json::to_vec(disk).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DISKS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a disk by id.
    pub fn get_disk(&self, id: DiskId) -> StoreResult<Option<Disk>> {
        let key = id.to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DISKS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let disk: Disk =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(disk))
            }
            None => Ok(None),
        }
    }

    /// Delete a disk record by id. Returns true if it existed.
    pub fn delete_disk(&self, id: DiskId) -> StoreResult<bool> {
        let key = id.to_string();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(DISKS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "disk deleted");
        Ok(existed)
    }
}
