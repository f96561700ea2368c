//! Domain settlement record.
//!
//! The wire shape (`shared::Settlement`) is a flat bag of fields with a
//! category discriminant, because that is what the document store and the
//! import/export sheets carry. Inside the domain the record is a proper
//! tagged union so that classification and amount computation match
//! exhaustively: adding a fourth category is a compile error everywhere it
//! matters, not a silent default-zero fallthrough.

use shared::{IncomeType, Settlement as SettlementDto, SettlementCategory};

/// A settlement ledger record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub id: String,
    /// ISO calendar date (YYYY-MM-DD)
    pub date: String,
    pub name: String,
    /// RFC 3339 creation timestamp, immutable once set
    pub created_at: Option<String>,
    pub details: SettlementDetails,
}

/// Category-specific fields of a settlement record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementDetails {
    Employee(EmployeeDetails),
    Client(ClientDetails),
    Activity(ActivityDetails),
}

/// Payroll-style entry: salary components, social-insurance deductions, and
/// employer support offsets. Tax fields here are entered manually, never
/// derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmployeeDetails {
    pub salary: i64,
    pub bonus: i64,
    pub overtime_pay: i64,
    pub national_pension: i64,
    pub health_insurance: i64,
    pub employment_insurance: i64,
    pub long_term_care_insurance: i64,
    pub pension_support: i64,
    pub employment_support: i64,
    pub income_tax: i64,
    pub local_tax: i64,
}

/// Vendor / counterparty transaction with a VAT-style surcharge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientDetails {
    pub transaction_amount: i64,
}

/// Honorarium entry subject to withholding. `income_tax` and `local_tax`
/// are derived from `fee` and `income_type` and are recomputed whenever
/// either changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityDetails {
    pub income_type: IncomeType,
    pub fee: i64,
    pub income_tax: i64,
    pub local_tax: i64,
}

impl SettlementDetails {
    pub fn category(&self) -> SettlementCategory {
        match self {
            SettlementDetails::Employee(_) => SettlementCategory::Employee,
            SettlementDetails::Client(_) => SettlementCategory::Client,
            SettlementDetails::Activity(_) => SettlementCategory::Activity,
        }
    }

    /// Zeroed field shape for a category. Used when a record is created and
    /// whenever its category is switched, so no stale cross-category field
    /// survives.
    pub fn empty_for(category: SettlementCategory) -> Self {
        match category {
            SettlementCategory::Employee => {
                SettlementDetails::Employee(EmployeeDetails::default())
            }
            SettlementCategory::Client => SettlementDetails::Client(ClientDetails::default()),
            SettlementCategory::Activity => {
                SettlementDetails::Activity(ActivityDetails::default())
            }
        }
    }
}

impl Settlement {
    /// Switch this record to a different category, wiping the previous
    /// category's fields. A no-op when the category is unchanged.
    pub fn switch_category(&mut self, category: SettlementCategory) {
        if self.details.category() != category {
            self.details = SettlementDetails::empty_for(category);
        }
    }

    /// Build the domain record from its wire shape. Only the fields that
    /// belong to the record's category are read; stale values left over in
    /// other fields are dropped here.
    pub fn from_dto(dto: &SettlementDto) -> Self {
        let details = match dto.category {
            SettlementCategory::Employee => SettlementDetails::Employee(EmployeeDetails {
                salary: dto.salary,
                bonus: dto.bonus,
                overtime_pay: dto.overtime_pay,
                national_pension: dto.national_pension,
                health_insurance: dto.health_insurance,
                employment_insurance: dto.employment_insurance,
                long_term_care_insurance: dto.long_term_care_insurance,
                pension_support: dto.pension_support,
                employment_support: dto.employment_support,
                income_tax: dto.income_tax,
                local_tax: dto.local_tax,
            }),
            SettlementCategory::Client => SettlementDetails::Client(ClientDetails {
                transaction_amount: dto.transaction_amount,
            }),
            SettlementCategory::Activity => SettlementDetails::Activity(ActivityDetails {
                income_type: dto.income_type.unwrap_or_default(),
                fee: dto.fee,
                income_tax: dto.income_tax,
                local_tax: dto.local_tax,
            }),
        };

        Self {
            id: dto.id.clone(),
            date: dto.date.clone(),
            name: dto.name.clone(),
            created_at: dto.created_at.clone(),
            details,
        }
    }

    /// Convert back to the wire shape. Fields outside the record's category
    /// serialize as their zero defaults.
    pub fn to_dto(&self) -> SettlementDto {
        let mut dto = SettlementDto {
            id: self.id.clone(),
            date: self.date.clone(),
            name: self.name.clone(),
            created_at: self.created_at.clone(),
            category: self.details.category(),
            ..SettlementDto::default()
        };

        match &self.details {
            SettlementDetails::Employee(e) => {
                dto.salary = e.salary;
                dto.bonus = e.bonus;
                dto.overtime_pay = e.overtime_pay;
                dto.national_pension = e.national_pension;
                dto.health_insurance = e.health_insurance;
                dto.employment_insurance = e.employment_insurance;
                dto.long_term_care_insurance = e.long_term_care_insurance;
                dto.pension_support = e.pension_support;
                dto.employment_support = e.employment_support;
                dto.income_tax = e.income_tax;
                dto.local_tax = e.local_tax;
            }
            SettlementDetails::Client(c) => {
                dto.transaction_amount = c.transaction_amount;
            }
            SettlementDetails::Activity(a) => {
                dto.income_type = Some(a.income_type);
                dto.fee = a.fee;
                dto.income_tax = a.income_tax;
                dto.local_tax = a.local_tax;
            }
        }

        dto
    }
}
