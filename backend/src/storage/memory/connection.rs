use crate::storage::memory::settlement_repository::MemorySettlementRepository;
use crate::storage::traits::Connection;

/// Connection to the in-memory store. Clones share the same underlying
/// collection, mirroring how connections to the managed store all see one
/// collection.
#[derive(Clone)]
pub struct MemoryConnection {
    settlements: MemorySettlementRepository,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self {
            settlements: MemorySettlementRepository::new(),
        }
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection for MemoryConnection {
    type SettlementRepository = MemorySettlementRepository;

    fn create_settlement_repository(&self) -> Self::SettlementRepository {
        self.settlements.clone()
    }
}
