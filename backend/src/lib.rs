//! Settlement ledger backend.
//!
//! Business logic for the organization's settlement ledger: classifying
//! settlement records, deriving payment/deduction/net-pay amounts, bulk
//! import from spreadsheet workbooks, and export back out. Persistence is
//! consumed through the storage traits; the calculation core itself is pure
//! functions over plain data.

pub mod domain;
pub mod storage;
