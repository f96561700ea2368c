//! # Storage Traits
//!
//! Interface to the settlement record store. Mirrors the capability the
//! managed document store actually provides: whole-document reads/writes,
//! field-merge updates, and collection snapshots pushed on every change.

use anyhow::Result;
use async_trait::async_trait;
use shared::{Settlement, SettlementPatch};
use std::sync::Arc;

/// Callback invoked with the full collection snapshot after every change.
/// Consumers replace their local state with the snapshot wholesale; there is
/// no incremental merge.
pub type SnapshotCallback = Arc<dyn Fn(&[Settlement]) + Send + Sync>;

/// Handle for an active snapshot subscription.
///
/// The subscription ends when this is dropped or explicitly unsubscribed.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Trait defining the interface for settlement record storage operations
///
/// This abstracts the store backend so the domain layer can run against the
/// managed document store or the in-memory implementation without change.
#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// All records currently in the collection
    async fn get_all(&self) -> Result<Vec<Settlement>>;

    /// Store a record under a store-generated ID; returns that ID
    async fn add(&self, data: &Settlement) -> Result<String>;

    /// Store or fully replace the record at the given ID
    async fn set_with_id(&self, id: &str, data: &Settlement) -> Result<()>;

    /// Merge the patch's set fields into an existing record. Unset fields
    /// are never transmitted (omission, not explicit null) and stay as they
    /// are. Fails when the record does not exist.
    async fn update(&self, id: &str, patch: &SettlementPatch) -> Result<()>;

    /// Delete a record by ID. Returns true when the record existed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Register a snapshot callback. The callback fires once immediately
    /// with the current snapshot and again after every subsequent change.
    async fn subscribe(&self, callback: SnapshotCallback) -> Result<Subscription>;
}

/// Trait defining the interface for storage connections
///
/// Factory for repositories, so services can be constructed generically over
/// whichever backend the composition root chose.
pub trait Connection: Send + Sync + Clone {
    /// The type of SettlementStore this connection creates
    type SettlementRepository: SettlementStore;

    /// Create a new settlement repository for this connection
    fn create_settlement_repository(&self) -> Self::SettlementRepository;
}
