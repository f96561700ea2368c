//! # Domain Module
//!
//! Contains all business logic for the settlement ledger.
//!
//! ## Module Organization
//!
//! - **models**: domain settlement record as a tagged union over the three
//!   settlement categories
//! - **settlement_math**: the pure calculation core (classification,
//!   computed amounts, withholding recomputation, numeric coercion)
//! - **fee_confirmation**: instructor-fee confirmation documents, which use
//!   their own tax-rate table and must never be merged with the ledger path
//! - **settlement_service**: CRUD orchestration over the record store
//! - **import_service**: bulk import parsing and validation (two-phase:
//!   parse-and-preview, then confirm-and-persist)
//! - **export_service**: workbook, sample-template, and CSV export
//!
//! ## Business Rules
//!
//! - A record's category decides which monetary fields are meaningful;
//!   switching category resets the previous category's fields
//! - Activity withholding tax is derived from fee and income type, never
//!   edited directly
//! - All amounts are whole non-negative currency units
//! - Import never persists anything until the user confirms the preview

pub mod export_service;
pub mod fee_confirmation;
pub mod import_service;
pub mod models;
pub mod settlement_math;
pub mod settlement_service;

pub use export_service::*;
pub use fee_confirmation::*;
pub use import_service::*;
pub use settlement_math::*;
pub use settlement_service::*;
