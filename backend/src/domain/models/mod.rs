//! Domain models for the settlement ledger

pub mod settlement;
