//! medic-store — embedded state store for FleetMedic.
//!
//! Backed by [redb](https://docs.rs/redb), holds the problem records the
//! resolver works through along with the instance and persistent-disk
//! records that back them.
//!
//! # Architecture
//!
//! All record types are JSON-serialized into redb's `&[u8]` value columns
//! under decimal-id string keys. The `FleetStore` is `Clone` + `Send` +
//! `Sync` (backed by `Arc<Database>`) and can be shared across async tasks;
//! concurrent resolution workers each touch only their own problem id.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StoreError, StoreResult};
pub use store::FleetStore;
