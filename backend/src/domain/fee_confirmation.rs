//! Instructor-fee confirmation documents.
//!
//! A confirmation document is a read-only, human-facing summary of one
//! instructor's fee for one event. It uses its own statutory rate table:
//! 3.3% / 8.8% including the combined local portion, with every amount
//! rounded to the nearest whole unit. This is deliberately a different
//! computation path from the settlement ledger's 3% / 8% truncate-to-10s
//! withholding in [`crate::domain::settlement_math`]; the two tables
//! evolved separately and are kept separate.

use shared::{FeeConfirmationDocument, IncomeType};

/// Round `amount * per_mille / 1000` to the nearest whole unit (half up)
fn round_per_mille(amount: i64, per_mille: i64) -> i64 {
    (amount * per_mille + 500) / 1000
}

/// Build the confirmation document for one event / instructor / fee.
///
/// ```text
/// rate             = business ? 3.3% : 8.8%
/// income_deduction = round(fee * rate)
/// local_deduction  = round(fee * 1%)
/// net              = fee - income_deduction - local_deduction
/// ```
pub fn build_fee_confirmation(
    event_name: &str,
    event_date: &str,
    instructor_name: &str,
    fee: i64,
    income_type: IncomeType,
) -> FeeConfirmationDocument {
    let rate_per_mille = match income_type {
        IncomeType::Business => 33,
        IncomeType::Other => 88,
    };

    let income_deduction_amount = round_per_mille(fee, rate_per_mille);
    let local_deduction_amount = round_per_mille(fee, 10);

    FeeConfirmationDocument {
        event_name: event_name.to_string(),
        event_date: event_date.to_string(),
        instructor_name: instructor_name.to_string(),
        income_type,
        fee,
        rate_per_mille,
        income_deduction_amount,
        local_deduction_amount,
        net_amount: fee - income_deduction_amount - local_deduction_amount,
    }
}
