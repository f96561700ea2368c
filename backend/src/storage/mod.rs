//! # Storage Module
//!
//! Persistence abstraction for the settlement ledger.
//!
//! The ledger consumes a simple document-store capability: CRUD on records
//! keyed by opaque string IDs plus full-snapshot change subscriptions. The
//! domain layer only sees the traits defined here; the concrete backend
//! (the managed document store in production, the in-memory store in tests
//! and local runs) is wired in by the composition root.

pub mod memory;
pub mod traits;

pub use memory::{MemoryConnection, MemorySettlementRepository};
pub use traits::{Connection, SettlementStore, SnapshotCallback, Subscription};
