//! In-memory document store.
//!
//! Stand-in for the managed document store with the same observable
//! behavior: whole-document writes, field-merge updates, and a full
//! collection snapshot delivered to every subscriber after each change.
//! Used by tests and local runs.

pub mod connection;
pub mod settlement_repository;

pub use connection::MemoryConnection;
pub use settlement_repository::MemorySettlementRepository;
