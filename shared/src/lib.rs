use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement category discriminant, serialized with its Korean ledger label.
///
/// `강사비` is a legacy label for the activity category that still appears in
/// older documents and import files; it is accepted on input but never
/// written back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SettlementCategory {
    #[default]
    #[serde(rename = "직원")]
    Employee,
    #[serde(rename = "거래처")]
    Client,
    #[serde(rename = "활동비", alias = "강사비")]
    Activity,
}

impl SettlementCategory {
    /// Korean label as it appears in the ledger and export sheets
    pub fn label(&self) -> &'static str {
        match self {
            SettlementCategory::Employee => "직원",
            SettlementCategory::Client => "거래처",
            SettlementCategory::Activity => "활동비",
        }
    }

    /// ASCII slug used inside composite record IDs
    pub fn slug(&self) -> &'static str {
        match self {
            SettlementCategory::Employee => "employee",
            SettlementCategory::Client => "client",
            SettlementCategory::Activity => "activity",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "employee" => Some(SettlementCategory::Employee),
            "client" => Some(SettlementCategory::Client),
            "activity" => Some(SettlementCategory::Activity),
            _ => None,
        }
    }
}

/// Statutory withholding classification for activity / instructor-fee records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IncomeType {
    #[default]
    #[serde(rename = "사업소득")]
    Business,
    #[serde(rename = "기타소득")]
    Other,
}

impl IncomeType {
    pub fn label(&self) -> &'static str {
        match self {
            IncomeType::Business => "사업소득",
            IncomeType::Other => "기타소득",
        }
    }
}

/// Label used for grouping and filtering settlements by income classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementType {
    /// Employee payroll (근로소득)
    #[serde(rename = "근로소득")]
    EarnedIncome,
    /// Client / vendor transaction with VAT surcharge (부가세)
    #[serde(rename = "부가세")]
    Vat,
    #[serde(rename = "사업소득")]
    BusinessIncome,
    #[serde(rename = "기타소득")]
    OtherIncome,
}

impl SettlementType {
    pub fn label(&self) -> &'static str {
        match self {
            SettlementType::EarnedIncome => "근로소득",
            SettlementType::Vat => "부가세",
            SettlementType::BusinessIncome => "사업소득",
            SettlementType::OtherIncome => "기타소득",
        }
    }
}

/// Settlement record as stored in the document collection.
///
/// ID format: "settlement::<employee|client|activity>::epoch_millis".
///
/// This is the flat wire shape: every monetary field is present and defaults
/// to zero, with `category` deciding which fields are meaningful. The backend
/// converts this into a tagged domain model before computing anything. All
/// amounts are whole currency units (the currency has no fractional subunit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settlement {
    pub id: String,
    /// Calendar date in ISO format (YYYY-MM-DD)
    pub date: String,
    /// Person or counterparty name, non-empty
    pub name: String,
    /// RFC 3339 creation timestamp, immutable once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub category: SettlementCategory,

    // Employee fields
    pub salary: i64,
    pub bonus: i64,
    pub overtime_pay: i64,
    pub national_pension: i64,
    pub health_insurance: i64,
    pub employment_insurance: i64,
    pub long_term_care_insurance: i64,
    pub pension_support: i64,
    pub employment_support: i64,

    // Client fields
    pub transaction_amount: i64,

    // Activity / instructor-fee fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_type: Option<IncomeType>,
    pub fee: i64,

    // Shared by employee (manual) and activity (derived) records
    pub income_tax: i64,
    pub local_tax: i64,
}

impl Default for Settlement {
    fn default() -> Self {
        Self {
            id: String::new(),
            date: String::new(),
            name: String::new(),
            created_at: None,
            category: SettlementCategory::Employee,
            salary: 0,
            bonus: 0,
            overtime_pay: 0,
            national_pension: 0,
            health_insurance: 0,
            employment_insurance: 0,
            long_term_care_insurance: 0,
            pension_support: 0,
            employment_support: 0,
            transaction_amount: 0,
            income_type: None,
            fee: 0,
            income_tax: 0,
            local_tax: 0,
        }
    }
}

impl Settlement {
    /// Generate a settlement ID from the category and a millisecond timestamp
    pub fn generate_id(category: SettlementCategory, epoch_millis: u64) -> String {
        format!("settlement::{}::{}", category.slug(), epoch_millis)
    }

    /// Parse a settlement ID into its category and timestamp components
    pub fn parse_id(id: &str) -> Result<(SettlementCategory, u64), SettlementIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 3 || parts[0] != "settlement" {
            return Err(SettlementIdError::InvalidFormat);
        }

        let category = SettlementCategory::from_slug(parts[1])
            .ok_or(SettlementIdError::InvalidCategory)?;

        let epoch_millis = parts[2]
            .parse::<u64>()
            .map_err(|_| SettlementIdError::InvalidTimestamp)?;

        Ok((category, epoch_millis))
    }

    /// Extract the epoch timestamp from this record's ID for sorting
    pub fn extract_timestamp(&self) -> Result<u64, SettlementIdError> {
        Self::parse_id(&self.id).map(|(_, timestamp)| timestamp)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementIdError {
    InvalidFormat,
    InvalidCategory,
    InvalidTimestamp,
}

impl fmt::Display for SettlementIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementIdError::InvalidFormat => write!(f, "Invalid settlement ID format"),
            SettlementIdError::InvalidCategory => write!(f, "Invalid category in settlement ID"),
            SettlementIdError::InvalidTimestamp => write!(f, "Invalid timestamp in settlement ID"),
        }
    }
}

impl std::error::Error for SettlementIdError {}

/// Partial update for a settlement record.
///
/// `None` fields are omitted from the serialized payload entirely; the store
/// rejects explicit nulls, so omission is the only way to leave a field
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SettlementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_pay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_pension: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_insurance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_insurance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_care_insurance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pension_support: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_support: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_type: Option<IncomeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_tax: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_tax: Option<i64>,
}

/// Unified computed view over any settlement record.
///
/// Fields that do not apply to a record's category are zero, never absent,
/// so aggregation and export code can treat all records uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComputedAmounts {
    pub payment: i64,
    pub deduction: i64,
    pub net_pay: i64,
    pub post_deduction_pay: i64,
    pub total_support: i64,
}

/// Derived withholding amounts for an activity / instructor-fee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WithholdingTax {
    pub income_tax: i64,
    pub local_tax: i64,
}

/// Request for creating a new settlement record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSettlementRequest {
    pub name: String,
    /// ISO date (YYYY-MM-DD); today when not provided
    pub date: Option<String>,
    /// Defaults to the employee category when not provided
    pub category: Option<SettlementCategory>,
}

/// Request for replacing an existing settlement record's fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateSettlementRequest {
    pub settlement: Settlement,
}

/// Result of parsing an import workbook, shown to the user before anything
/// is persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportPreviewResponse {
    pub settlements: Vec<Settlement>,
    pub employee_count: usize,
    pub client_count: usize,
    pub activity_count: usize,
}

/// CSV export payload: content plus a date-stamped filename
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDataResponse {
    pub csv_content: String,
    pub filename: String,
    pub record_count: usize,
}

/// Workbook export payload (xlsx bytes plus filename)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkbookExportResponse {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub record_count: usize,
}

/// Printable instructor-fee confirmation for one event, using the
/// confirmation-document rate table (3.3% / 8.8%, rounded to the nearest
/// whole unit). This is a different computation from the settlement ledger's
/// withholding and the two are never merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfirmationDocument {
    pub event_name: String,
    pub event_date: String,
    pub instructor_name: String,
    pub income_type: IncomeType,
    pub fee: i64,
    /// Applied combined rate in tenths of a percent (33 = 3.3%, 88 = 8.8%)
    pub rate_per_mille: i64,
    pub income_deduction_amount: i64,
    pub local_deduction_amount: i64,
    pub net_amount: i64,
}
