//! Export service domain logic for the settlement ledger.
//!
//! Produces the three outward-facing tabular artifacts: the full workbook
//! (one sheet per settlement category, Korean header labels), the sample
//! import template (same shape, pre-filled example rows, round-trip
//! compatible with the importer), and the CSV export of selected columns.

use crate::domain::import_service::{
    ACTIVITY_HEADERS, ACTIVITY_SHEET, CLIENT_HEADERS, CLIENT_SHEET, EMPLOYEE_HEADERS,
    EMPLOYEE_SHEET,
};
use crate::domain::models::settlement::Settlement as DomainSettlement;
use crate::domain::settlement_math::{classify, compute_amounts, recompute_tax};
use anyhow::Result;
use chrono::Local;
use log::info;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use shared::{
    ExportDataResponse, IncomeType, Settlement, SettlementCategory, WorkbookExportResponse,
};

/// Columns available for CSV export; the caller passes the subset that is
/// visible in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvColumn {
    Date,
    Name,
    Category,
    SettlementType,
    Payment,
    Deduction,
    NetPay,
}

impl CsvColumn {
    pub const ALL: [CsvColumn; 7] = [
        CsvColumn::Date,
        CsvColumn::Name,
        CsvColumn::Category,
        CsvColumn::SettlementType,
        CsvColumn::Payment,
        CsvColumn::Deduction,
        CsvColumn::NetPay,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            CsvColumn::Date => "날짜",
            CsvColumn::Name => "이름",
            CsvColumn::Category => "구분",
            CsvColumn::SettlementType => "소득유형",
            CsvColumn::Payment => "지급액",
            CsvColumn::Deduction => "공제액",
            CsvColumn::NetPay => "실지급액",
        }
    }
}

/// Export service that handles workbook and CSV generation
#[derive(Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Export all settlements as a workbook, one sheet per category. Sheets
    /// are always present, so an export with no records of some category
    /// still round-trips through the importer.
    pub fn export_workbook(&self, settlements: &[Settlement]) -> Result<WorkbookExportResponse> {
        let mut workbook = Workbook::new();

        let employee_rows: Vec<&Settlement> = settlements
            .iter()
            .filter(|s| s.category == SettlementCategory::Employee)
            .collect();
        let client_rows: Vec<&Settlement> = settlements
            .iter()
            .filter(|s| s.category == SettlementCategory::Client)
            .collect();
        let activity_rows: Vec<&Settlement> = settlements
            .iter()
            .filter(|s| s.category == SettlementCategory::Activity)
            .collect();

        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(EMPLOYEE_SHEET)?;
            write_headers(worksheet, &EMPLOYEE_HEADERS)?;
            for (i, settlement) in employee_rows.iter().enumerate() {
                write_employee_row(worksheet, i as u32 + 1, settlement)?;
            }
        }
        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(CLIENT_SHEET)?;
            write_headers(worksheet, &CLIENT_HEADERS)?;
            for (i, settlement) in client_rows.iter().enumerate() {
                write_client_row(worksheet, i as u32 + 1, settlement)?;
            }
        }
        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(ACTIVITY_SHEET)?;
            write_headers(worksheet, &ACTIVITY_HEADERS)?;
            for (i, settlement) in activity_rows.iter().enumerate() {
                write_activity_row(worksheet, i as u32 + 1, settlement)?;
            }
        }

        let bytes = workbook.save_to_buffer()?;
        let filename = format!("정산내역_{}.xlsx", Local::now().format("%Y%m%d"));

        info!(
            "Exported workbook {} with {} settlements",
            filename,
            settlements.len()
        );

        Ok(WorkbookExportResponse {
            bytes,
            filename,
            record_count: settlements.len(),
        })
    }

    /// Sample import template: the same sheet shape as the real export,
    /// pre-filled with one example row per category
    pub fn export_sample_template(&self) -> Result<WorkbookExportResponse> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let sample_tax = recompute_tax(300_000, IncomeType::Business);

        let samples = vec![
            Settlement {
                id: String::new(),
                date: today.clone(),
                name: "홍길동".to_string(),
                category: SettlementCategory::Employee,
                salary: 2_500_000,
                overtime_pay: 100_000,
                national_pension: 112_500,
                health_insurance: 88_620,
                employment_insurance: 22_500,
                long_term_care_insurance: 11_470,
                income_tax: 84_850,
                local_tax: 8_480,
                ..Settlement::default()
            },
            Settlement {
                id: String::new(),
                date: today.clone(),
                name: "한올출판사".to_string(),
                category: SettlementCategory::Client,
                transaction_amount: 1_000_000,
                ..Settlement::default()
            },
            Settlement {
                id: String::new(),
                date: today,
                name: "김강사".to_string(),
                category: SettlementCategory::Activity,
                income_type: Some(IncomeType::Business),
                fee: 300_000,
                income_tax: sample_tax.income_tax,
                local_tax: sample_tax.local_tax,
                ..Settlement::default()
            },
        ];

        let mut response = self.export_workbook(&samples)?;
        response.filename = "정산_가져오기_양식.xlsx".to_string();
        Ok(response)
    }

    /// Export the selected columns as CSV: UTF-8 with BOM (so spreadsheet
    /// applications detect the encoding), values quoted as needed, filename
    /// stamped with the export date
    pub fn export_csv(
        &self,
        settlements: &[Settlement],
        columns: &[CsvColumn],
    ) -> Result<ExportDataResponse> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let headers: Vec<&str> = columns.iter().map(|c| c.header()).collect();
        writer.write_record(&headers)?;

        for settlement in settlements {
            let domain = DomainSettlement::from_dto(settlement);
            let amounts = compute_amounts(&domain);
            let settlement_type = classify(&domain);

            let row: Vec<String> = columns
                .iter()
                .map(|column| match column {
                    CsvColumn::Date => settlement.date.clone(),
                    CsvColumn::Name => settlement.name.clone(),
                    CsvColumn::Category => settlement.category.label().to_string(),
                    CsvColumn::SettlementType => settlement_type.label().to_string(),
                    CsvColumn::Payment => amounts.payment.to_string(),
                    CsvColumn::Deduction => amounts.deduction.to_string(),
                    CsvColumn::NetPay => amounts.net_pay.to_string(),
                })
                .collect();
            writer.write_record(&row)?;
        }

        let body = String::from_utf8(writer.into_inner()?)?;
        let csv_content = format!("\u{feff}{}", body);
        let filename = format!("정산내역_{}.csv", Local::now().format("%Y%m%d"));

        info!(
            "Exported CSV {} with {} settlements",
            filename,
            settlements.len()
        );

        Ok(ExportDataResponse {
            csv_content,
            filename,
            record_count: settlements.len(),
        })
    }

    /// Export the workbook straight to a directory, creating it if needed.
    /// Returns the full path of the written file.
    pub fn export_workbook_to_path(
        &self,
        settlements: &[Settlement],
        directory: &std::path::Path,
    ) -> Result<std::path::PathBuf> {
        let response = self.export_workbook(settlements)?;

        std::fs::create_dir_all(directory)?;
        let file_path = directory.join(&response.filename);
        std::fs::write(&file_path, &response.bytes)?;

        info!("Wrote export file {}", file_path.display());
        Ok(file_path)
    }
}

fn write_headers(worksheet: &mut Worksheet, headers: &[&str]) -> Result<(), XlsxError> {
    for (i, header) in headers.iter().enumerate() {
        worksheet.write_string(0, i as u16, *header)?;
        // Name column a little wider than the amount columns
        worksheet.set_column_width(i as u16, if i == 1 { 16 } else { 13 })?;
    }
    Ok(())
}

fn write_employee_row(
    worksheet: &mut Worksheet,
    row: u32,
    settlement: &Settlement,
) -> Result<(), XlsxError> {
    worksheet.write_string(row, 0, settlement.date.as_str())?;
    worksheet.write_string(row, 1, settlement.name.as_str())?;
    let amounts = [
        settlement.salary,
        settlement.bonus,
        settlement.overtime_pay,
        settlement.national_pension,
        settlement.health_insurance,
        settlement.employment_insurance,
        settlement.long_term_care_insurance,
        settlement.pension_support,
        settlement.employment_support,
        settlement.income_tax,
        settlement.local_tax,
    ];
    for (i, amount) in amounts.iter().enumerate() {
        worksheet.write_number(row, i as u16 + 2, *amount as f64)?;
    }
    Ok(())
}

fn write_client_row(
    worksheet: &mut Worksheet,
    row: u32,
    settlement: &Settlement,
) -> Result<(), XlsxError> {
    worksheet.write_string(row, 0, settlement.date.as_str())?;
    worksheet.write_string(row, 1, settlement.name.as_str())?;
    worksheet.write_number(row, 2, settlement.transaction_amount as f64)?;
    Ok(())
}

fn write_activity_row(
    worksheet: &mut Worksheet,
    row: u32,
    settlement: &Settlement,
) -> Result<(), XlsxError> {
    worksheet.write_string(row, 0, settlement.date.as_str())?;
    worksheet.write_string(row, 1, settlement.name.as_str())?;
    worksheet.write_string(
        row,
        2,
        settlement.income_type.unwrap_or_default().label(),
    )?;
    worksheet.write_number(row, 3, settlement.fee as f64)?;
    worksheet.write_number(row, 4, settlement.income_tax as f64)?;
    worksheet.write_number(row, 5, settlement.local_tax as f64)?;
    Ok(())
}
