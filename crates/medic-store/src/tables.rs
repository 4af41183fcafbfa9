//! redb table definitions for the FleetMedic state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).
//! Keys are decimal record ids.

use redb::TableDefinition;

/// Problem records keyed by `{problem_id}`.
pub const PROBLEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("problems");

/// Instance records keyed by `{instance_id}`.
pub const INSTANCES: TableDefinition<&str, &[u8]> = TableDefinition::new("instances");

/// Persistent disk records keyed by `{disk_id}`.
pub const DISKS: TableDefinition<&str, &[u8]> = TableDefinition::new("disks");
