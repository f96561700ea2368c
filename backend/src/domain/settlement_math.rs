//! The settlement calculation core.
//!
//! Pure functions over domain records: classification, the unified computed
//! amounts view, withholding-tax derivation for activity records, and the
//! single numeric-coercion helper used by the importer.
//!
//! All arithmetic is exact `i64` math: the currency has no fractional
//! subunit, and every truncation in the withholding formulas is an integer
//! division, not a float round.

use crate::domain::models::settlement::{Settlement, SettlementDetails};
use shared::{ComputedAmounts, IncomeType, SettlementType, WithholdingTax};

/// Classify a record for grouping and filtering.
///
/// Employees are earned income, clients are VAT entries, and activity
/// records carry their own income-type label.
pub fn classify(settlement: &Settlement) -> SettlementType {
    match &settlement.details {
        SettlementDetails::Employee(_) => SettlementType::EarnedIncome,
        SettlementDetails::Client(_) => SettlementType::Vat,
        SettlementDetails::Activity(a) => match a.income_type {
            IncomeType::Business => SettlementType::BusinessIncome,
            IncomeType::Other => SettlementType::OtherIncome,
        },
    }
}

/// Truncate down to the nearest 10 currency units
fn truncate_to_tens(amount: i64) -> i64 {
    amount / 10 * 10
}

/// Derive withholding tax for an activity / instructor-fee record.
///
/// ```text
/// rate       = business ? 3% : 8%
/// income_tax = fee > 0 ? floor(fee * rate / 10) * 10 : 0
/// local_tax  = fee > 0 ? floor(income_tax * 0.1 / 10) * 10 : 0
/// ```
///
/// The two truncations are separate steps: the local surtax is 10% of the
/// already-truncated income tax. Collapsing them into one combined rate
/// gives different results for edge values, so the ordering is load-bearing.
///
/// This is the settlement-ledger rate table. The instructor-fee confirmation
/// document uses a different one (3.3% / 8.8%, rounded); see
/// [`crate::domain::fee_confirmation`].
pub fn recompute_tax(fee: i64, income_type: IncomeType) -> WithholdingTax {
    if fee <= 0 {
        return WithholdingTax::default();
    }

    let rate_percent = match income_type {
        IncomeType::Business => 3,
        IncomeType::Other => 8,
    };

    let income_tax = truncate_to_tens(fee * rate_percent / 100);
    let local_tax = truncate_to_tens(income_tax / 10);

    WithholdingTax {
        income_tax,
        local_tax,
    }
}

/// Compute the unified displayable amounts for any settlement record.
///
/// Fields that do not apply to the record's category come back as zero, so
/// downstream aggregation and export code can treat all records uniformly.
pub fn compute_amounts(settlement: &Settlement) -> ComputedAmounts {
    match &settlement.details {
        SettlementDetails::Employee(e) => {
            let payment = e.salary + e.bonus + e.overtime_pay;
            let total_social_insurance = e.national_pension
                + e.health_insurance
                + e.employment_insurance
                + e.long_term_care_insurance;
            let total_taxes = e.income_tax + e.local_tax;
            let deduction = total_social_insurance + total_taxes;
            let post_deduction_pay = payment - deduction;
            // Support amounts are employer-side subsidy reimbursed to the
            // employee; they are added back after deduction, not a reduction
            // of withholding.
            let total_support = e.pension_support + e.employment_support;

            ComputedAmounts {
                payment,
                deduction,
                net_pay: post_deduction_pay + total_support,
                post_deduction_pay,
                total_support,
            }
        }
        SettlementDetails::Client(c) => {
            let payment = c.transaction_amount;
            // 10% VAT, truncated down to the nearest 10 units
            let deduction = truncate_to_tens(c.transaction_amount / 10);

            ComputedAmounts {
                payment,
                deduction,
                // VAT here is invoiced on top of the transaction amount, not
                // withheld from it, so it adds to the payable total.
                net_pay: payment + deduction,
                post_deduction_pay: 0,
                total_support: 0,
            }
        }
        SettlementDetails::Activity(a) => {
            let payment = a.fee;
            let deduction = a.income_tax + a.local_tax;

            ComputedAmounts {
                payment,
                deduction,
                net_pay: payment - deduction,
                post_deduction_pay: 0,
                total_support: 0,
            }
        }
    }
}

/// The one place spreadsheet numbers are coerced: anything that is not a
/// finite positive number becomes zero. Bulk import stays resilient to messy
/// files by design; a bad cell degrades to a zero amount, never an error.
pub fn coerce_amount(raw: Option<f64>) -> i64 {
    match raw {
        Some(value) if value.is_finite() && value > 0.0 => value.floor() as i64,
        _ => 0,
    }
}

/// Text form of [`coerce_amount`]: tolerates thousands separators and
/// surrounding whitespace
pub fn coerce_amount_text(raw: &str) -> i64 {
    let cleaned = raw.trim().replace(',', "");
    coerce_amount(cleaned.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::settlement::{
        ActivityDetails, ClientDetails, EmployeeDetails,
    };

    fn settlement_with(details: SettlementDetails) -> Settlement {
        Settlement {
            id: "settlement::employee::1".to_string(),
            date: "2026-01-05".to_string(),
            name: "테스트".to_string(),
            created_at: None,
            details,
        }
    }

    #[test]
    fn test_classify_is_total_over_all_categories() {
        let employee = settlement_with(SettlementDetails::Employee(EmployeeDetails::default()));
        assert_eq!(classify(&employee), SettlementType::EarnedIncome);
        assert_eq!(classify(&employee).label(), "근로소득");

        let client = settlement_with(SettlementDetails::Client(ClientDetails::default()));
        assert_eq!(classify(&client), SettlementType::Vat);
        assert_eq!(classify(&client).label(), "부가세");

        let business = settlement_with(SettlementDetails::Activity(ActivityDetails {
            income_type: IncomeType::Business,
            ..ActivityDetails::default()
        }));
        assert_eq!(classify(&business), SettlementType::BusinessIncome);

        let other = settlement_with(SettlementDetails::Activity(ActivityDetails {
            income_type: IncomeType::Other,
            ..ActivityDetails::default()
        }));
        assert_eq!(classify(&other), SettlementType::OtherIncome);
    }

    #[test]
    fn test_employee_net_pay_identity() {
        let details = EmployeeDetails {
            salary: 2_500_000,
            bonus: 200_000,
            overtime_pay: 100_000,
            national_pension: 112_500,
            health_insurance: 88_620,
            employment_insurance: 22_500,
            long_term_care_insurance: 11_470,
            pension_support: 50_000,
            employment_support: 20_000,
            income_tax: 84_850,
            local_tax: 8_480,
        };
        let amounts =
            compute_amounts(&settlement_with(SettlementDetails::Employee(details)));

        assert_eq!(amounts.payment, 2_800_000);
        assert_eq!(amounts.deduction, 112_500 + 88_620 + 22_500 + 11_470 + 84_850 + 8_480);
        assert_eq!(amounts.post_deduction_pay, amounts.payment - amounts.deduction);
        assert_eq!(amounts.total_support, 70_000);
        assert_eq!(
            amounts.net_pay,
            amounts.payment - amounts.deduction + amounts.total_support
        );
    }

    #[test]
    fn test_client_vat_truncates_to_tens() {
        let amounts = compute_amounts(&settlement_with(SettlementDetails::Client(
            ClientDetails {
                transaction_amount: 1234,
            },
        )));

        // 10% of 1234 is 123.4; truncated to the nearest 10 units -> 120
        assert_eq!(amounts.payment, 1234);
        assert_eq!(amounts.deduction, 120);
        // VAT on top: payable is amount plus the surcharge
        assert_eq!(amounts.net_pay, 1354);
        assert_eq!(amounts.post_deduction_pay, 0);
        assert_eq!(amounts.total_support, 0);
    }

    #[test]
    fn test_business_income_withholding() {
        let tax = recompute_tax(1_000_000, IncomeType::Business);
        assert_eq!(tax.income_tax, 30_000);
        assert_eq!(tax.local_tax, 3_000);

        let amounts = compute_amounts(&settlement_with(SettlementDetails::Activity(
            ActivityDetails {
                income_type: IncomeType::Business,
                fee: 1_000_000,
                income_tax: tax.income_tax,
                local_tax: tax.local_tax,
            },
        )));
        assert_eq!(amounts.net_pay, 967_000);
    }

    #[test]
    fn test_other_income_withholding() {
        let tax = recompute_tax(500_000, IncomeType::Other);
        assert_eq!(tax.income_tax, 40_000);
        assert_eq!(tax.local_tax, 4_000);

        let amounts = compute_amounts(&settlement_with(SettlementDetails::Activity(
            ActivityDetails {
                income_type: IncomeType::Other,
                fee: 500_000,
                income_tax: tax.income_tax,
                local_tax: tax.local_tax,
            },
        )));
        assert_eq!(amounts.net_pay, 456_000);
    }

    #[test]
    fn test_withholding_truncates_each_step() {
        // 123,456 at 3% is 3,703.68 -> 3,703 -> truncated to 3,700;
        // the surtax then starts from the truncated figure: 370 -> 370.
        let tax = recompute_tax(123_456, IncomeType::Business);
        assert_eq!(tax.income_tax, 3_700);
        assert_eq!(tax.local_tax, 370);

        // 9,999 at 8% is 799.92 -> 790; surtax 79 -> 70.
        let tax = recompute_tax(9_999, IncomeType::Other);
        assert_eq!(tax.income_tax, 790);
        assert_eq!(tax.local_tax, 70);
    }

    #[test]
    fn test_zero_fee_yields_zero_tax() {
        for income_type in [IncomeType::Business, IncomeType::Other] {
            let tax = recompute_tax(0, income_type);
            assert_eq!(tax.income_tax, 0);
            assert_eq!(tax.local_tax, 0);
        }
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(Some(1234.0)), 1234);
        assert_eq!(coerce_amount(Some(1234.9)), 1234);
        assert_eq!(coerce_amount(Some(0.0)), 0);
        assert_eq!(coerce_amount(Some(-500.0)), 0);
        assert_eq!(coerce_amount(Some(f64::NAN)), 0);
        assert_eq!(coerce_amount(None), 0);
    }

    #[test]
    fn test_coerce_amount_text() {
        assert_eq!(coerce_amount_text("1,000,000"), 1_000_000);
        assert_eq!(coerce_amount_text("  2500 "), 2500);
        assert_eq!(coerce_amount_text("삼만원"), 0);
        assert_eq!(coerce_amount_text(""), 0);
    }
}
