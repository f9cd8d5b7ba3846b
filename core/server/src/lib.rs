//! DevTasks Remote Reconciliation Service
//!
//! Authoritative task store plus the HTTP surface clients sync against:
//! - `GET /api/tasks` returns the full current snapshot
//! - `POST /api/sync` applies a batch of operations and returns the
//!   post-apply snapshot
//!
//! The store is in-memory; durability is a deployment choice made by
//! constructing it over a key/value backend.

pub mod routes;
pub mod store;

pub use routes::{build_router, serve};
pub use store::ReconcileStore;
