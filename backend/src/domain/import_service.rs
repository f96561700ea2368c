//! Bulk import parsing and validation.
//!
//! Transforms an uploaded workbook (up to three sheets, one per settlement
//! category) into a validated preview list of settlement records. This
//! module never writes to the store: the caller shows the preview and only
//! persists it through
//! [`SettlementService::persist_import`](crate::domain::settlement_service::SettlementService::persist_import)
//! after explicit confirmation.

use crate::domain::settlement_math::{coerce_amount, coerce_amount_text, recompute_tax};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::Local;
use log::info;
use shared::{ImportPreviewResponse, IncomeType, Settlement, SettlementCategory};
use std::io::Cursor;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Upload size ceiling: 10 MiB
pub const MAX_IMPORT_FILE_BYTES: usize = 10 * 1024 * 1024;

pub const EMPLOYEE_SHEET: &str = "직원";
pub const CLIENT_SHEET: &str = "거래처";
pub const ACTIVITY_SHEET: &str = "활동비_강사비";

pub const EMPLOYEE_HEADERS: [&str; 13] = [
    "날짜",
    "이름",
    "급여",
    "상여금",
    "초과근무수당",
    "국민연금",
    "건강보험",
    "고용보험",
    "장기요양보험",
    "연금지원금",
    "고용지원금",
    "소득세",
    "지방소득세",
];
pub const CLIENT_HEADERS: [&str; 3] = ["날짜", "거래처명", "거래금액"];
pub const ACTIVITY_HEADERS: [&str; 6] =
    ["날짜", "이름", "소득구분", "지급액", "소득세", "지방소득세"];

/// ID spacing between the three sheets within one import batch, so rows from
/// different sheets can never collide. Rows are offset from the batch
/// timestamp by their index inside this band.
const CATEGORY_BAND: u64 = 100_000;

/// Import validation failures, surfaced to the user before anything is
/// persisted
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("지원하지 않는 파일 형식입니다 ({0}). xlsx 또는 xls 파일만 가져올 수 있습니다")]
    UnsupportedExtension(String),

    #[error("파일 크기가 제한({max_bytes} 바이트)을 초과했습니다: {size_bytes} 바이트")]
    FileTooLarge { size_bytes: usize, max_bytes: usize },

    #[error("파일을 읽는 중 오류가 발생했습니다: {0}")]
    Parse(String),

    #[error("가져올 수 있는 유효한 데이터가 없습니다")]
    NoValidData,
}

/// Import parser and validator (stateless)
#[derive(Clone, Default)]
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    /// Parse an uploaded workbook into a preview of settlement records.
    ///
    /// Pre-checks (extension, size) run before any parsing. Each of the
    /// three sheets is optional and read independently; rows whose name is
    /// blank after trimming are template leftovers and are skipped silently.
    /// Activity withholding tax is always recomputed from fee and income
    /// type; tax cells in the file are ignored. A workbook that produces
    /// zero records fails with [`ImportError::NoValidData`] rather than
    /// succeeding emptily.
    pub fn parse_workbook(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ImportPreviewResponse, ImportError> {
        self.pre_check(file_name, bytes.len())?;

        let batch_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ImportError::Parse(e.to_string()))?
            .as_millis() as u64;
        let default_date = Local::now().format("%Y-%m-%d").to_string();

        self.parse_with_batch(bytes, batch_millis, &default_date)
    }

    fn pre_check(&self, file_name: &str, size_bytes: usize) -> Result<(), ImportError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if extension != "xlsx" && extension != "xls" {
            return Err(ImportError::UnsupportedExtension(file_name.to_string()));
        }

        if size_bytes > MAX_IMPORT_FILE_BYTES {
            return Err(ImportError::FileTooLarge {
                size_bytes,
                max_bytes: MAX_IMPORT_FILE_BYTES,
            });
        }

        Ok(())
    }

    /// Deterministic core of [`parse_workbook`]; the batch timestamp and
    /// fallback date are injected so the same bytes always map to the same
    /// preview.
    fn parse_with_batch(
        &self,
        bytes: &[u8],
        batch_millis: u64,
        default_date: &str,
    ) -> Result<ImportPreviewResponse, ImportError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ImportError::Parse(e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut settlements: Vec<Settlement> = Vec::new();
        let mut employee_count = 0;
        let mut client_count = 0;
        let mut activity_count = 0;

        if sheet_names.iter().any(|n| n == EMPLOYEE_SHEET) {
            let range = workbook
                .worksheet_range(EMPLOYEE_SHEET)
                .map_err(|e| ImportError::Parse(e.to_string()))?;

            for row in range.rows().skip(1) {
                let name = cell_text(row, 1);
                if name.is_empty() {
                    continue;
                }

                let id_millis = batch_millis + employee_count as u64;
                settlements.push(Settlement {
                    id: Settlement::generate_id(SettlementCategory::Employee, id_millis),
                    date: cell_date(row, 0, default_date),
                    name,
                    category: SettlementCategory::Employee,
                    salary: cell_amount(row, 2),
                    bonus: cell_amount(row, 3),
                    overtime_pay: cell_amount(row, 4),
                    national_pension: cell_amount(row, 5),
                    health_insurance: cell_amount(row, 6),
                    employment_insurance: cell_amount(row, 7),
                    long_term_care_insurance: cell_amount(row, 8),
                    pension_support: cell_amount(row, 9),
                    employment_support: cell_amount(row, 10),
                    income_tax: cell_amount(row, 11),
                    local_tax: cell_amount(row, 12),
                    ..Settlement::default()
                });
                employee_count += 1;
            }
        }

        if sheet_names.iter().any(|n| n == CLIENT_SHEET) {
            let range = workbook
                .worksheet_range(CLIENT_SHEET)
                .map_err(|e| ImportError::Parse(e.to_string()))?;

            for row in range.rows().skip(1) {
                let name = cell_text(row, 1);
                if name.is_empty() {
                    continue;
                }

                let id_millis = batch_millis + CATEGORY_BAND + client_count as u64;
                settlements.push(Settlement {
                    id: Settlement::generate_id(SettlementCategory::Client, id_millis),
                    date: cell_date(row, 0, default_date),
                    name,
                    category: SettlementCategory::Client,
                    transaction_amount: cell_amount(row, 2),
                    ..Settlement::default()
                });
                client_count += 1;
            }
        }

        if sheet_names.iter().any(|n| n == ACTIVITY_SHEET) {
            let range = workbook
                .worksheet_range(ACTIVITY_SHEET)
                .map_err(|e| ImportError::Parse(e.to_string()))?;

            for row in range.rows().skip(1) {
                let name = cell_text(row, 1);
                if name.is_empty() {
                    continue;
                }

                let income_type = parse_income_type(&cell_text(row, 2));
                let fee = cell_amount(row, 3);
                // Tax columns in the file are ignored: withholding is a
                // derived field, recomputed from fee and income type.
                let tax = recompute_tax(fee, income_type);

                let id_millis = batch_millis + 2 * CATEGORY_BAND + activity_count as u64;
                settlements.push(Settlement {
                    id: Settlement::generate_id(SettlementCategory::Activity, id_millis),
                    date: cell_date(row, 0, default_date),
                    name,
                    category: SettlementCategory::Activity,
                    income_type: Some(income_type),
                    fee,
                    income_tax: tax.income_tax,
                    local_tax: tax.local_tax,
                    ..Settlement::default()
                });
                activity_count += 1;
            }
        }

        if settlements.is_empty() {
            return Err(ImportError::NoValidData);
        }

        info!(
            "Parsed import preview: {} employee, {} client, {} activity rows",
            employee_count, client_count, activity_count
        );

        Ok(ImportPreviewResponse {
            settlements,
            employee_count,
            client_count,
            activity_count,
        })
    }
}

/// `기타소득` selects other income; anything else (including blank cells in
/// messy files) falls back to business income, the default selection.
fn parse_income_type(text: &str) -> IncomeType {
    if text == "기타소득" {
        IncomeType::Other
    } else {
        IncomeType::Business
    }
}

fn cell_text(row: &[Data], index: usize) -> String {
    match row.get(index) {
        None => String::new(),
        Some(cell) => {
            if let Some(s) = cell.get_string() {
                s.trim().to_string()
            } else if cell.is_datetime() {
                cell.as_date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            } else if let Some(v) = cell.as_f64() {
                if v.fract() == 0.0 {
                    format!("{}", v as i64)
                } else {
                    v.to_string()
                }
            } else {
                String::new()
            }
        }
    }
}

fn cell_amount(row: &[Data], index: usize) -> i64 {
    match row.get(index) {
        None => 0,
        Some(cell) => {
            if let Some(s) = cell.get_string() {
                coerce_amount_text(s)
            } else {
                coerce_amount(cell.as_f64())
            }
        }
    }
}

fn cell_date(row: &[Data], index: usize, default_date: &str) -> String {
    let text = cell_text(row, index);
    if text.is_empty() {
        default_date.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    const BATCH: u64 = 1_700_000_000_000;
    const DEFAULT_DATE: &str = "2026-01-05";

    fn workbook_bytes(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    worksheet
                        .write_string(r as u32, c as u16, *value)
                        .unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    fn employee_header() -> Vec<&'static str> {
        EMPLOYEE_HEADERS.to_vec()
    }

    #[test]
    fn test_parse_employee_and_client_sheets() {
        let bytes = workbook_bytes(&[
            (
                EMPLOYEE_SHEET,
                vec![
                    employee_header(),
                    vec![
                        "2026-01-05",
                        "김민수",
                        "2,500,000",
                        "0",
                        "100000",
                        "112500",
                        "88620",
                        "22500",
                        "11470",
                        "0",
                        "0",
                        "84850",
                        "8480",
                    ],
                ],
            ),
            (
                CLIENT_SHEET,
                vec![
                    CLIENT_HEADERS.to_vec(),
                    vec!["2026-01-07", "한올출판사", "1234"],
                ],
            ),
        ]);

        let preview = ImportService::new()
            .parse_with_batch(&bytes, BATCH, DEFAULT_DATE)
            .unwrap();

        assert_eq!(preview.employee_count, 1);
        assert_eq!(preview.client_count, 1);
        assert_eq!(preview.activity_count, 0);

        let employee = &preview.settlements[0];
        assert_eq!(employee.id, format!("settlement::employee::{}", BATCH));
        assert_eq!(employee.name, "김민수");
        assert_eq!(employee.salary, 2_500_000);
        assert_eq!(employee.overtime_pay, 100_000);
        assert_eq!(employee.income_tax, 84_850);

        let client = &preview.settlements[1];
        assert_eq!(
            client.id,
            format!("settlement::client::{}", BATCH + 100_000)
        );
        assert_eq!(client.date, "2026-01-07");
        assert_eq!(client.transaction_amount, 1234);
    }

    #[test]
    fn test_activity_tax_recomputed_ignoring_file_values() {
        let bytes = workbook_bytes(&[(
            ACTIVITY_SHEET,
            vec![
                ACTIVITY_HEADERS.to_vec(),
                // The file claims absurd tax amounts; they must be ignored.
                vec!["2026-02-01", "김강사", "사업소득", "1000000", "999999", "999999"],
                vec!["2026-02-02", "박강사", "기타소득", "500000", "1", "1"],
            ],
        )]);

        let preview = ImportService::new()
            .parse_with_batch(&bytes, BATCH, DEFAULT_DATE)
            .unwrap();

        assert_eq!(preview.activity_count, 2);

        let business = &preview.settlements[0];
        assert_eq!(business.income_type, Some(IncomeType::Business));
        assert_eq!(business.income_tax, 30_000);
        assert_eq!(business.local_tax, 3_000);

        let other = &preview.settlements[1];
        assert_eq!(other.income_type, Some(IncomeType::Other));
        assert_eq!(other.income_tax, 40_000);
        assert_eq!(other.local_tax, 4_000);
    }

    #[test]
    fn test_blank_name_rows_are_skipped() {
        let bytes = workbook_bytes(&[(
            CLIENT_SHEET,
            vec![
                CLIENT_HEADERS.to_vec(),
                vec!["2026-01-05", "한올출판사", "1000000"],
                vec!["2026-01-06", "   ", "500000"],
                vec!["2026-01-07", "", "300000"],
                vec!["2026-01-08", "문구상사", "200000"],
            ],
        )]);

        let preview = ImportService::new()
            .parse_with_batch(&bytes, BATCH, DEFAULT_DATE)
            .unwrap();

        assert_eq!(preview.client_count, 2);
        let names: Vec<&str> = preview.settlements.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["한올출판사", "문구상사"]);
    }

    #[test]
    fn test_non_numeric_amounts_coerce_to_zero() {
        let bytes = workbook_bytes(&[(
            CLIENT_SHEET,
            vec![
                CLIENT_HEADERS.to_vec(),
                vec!["2026-01-05", "한올출판사", "백만원"],
            ],
        )]);

        let preview = ImportService::new()
            .parse_with_batch(&bytes, BATCH, DEFAULT_DATE)
            .unwrap();
        assert_eq!(preview.settlements[0].transaction_amount, 0);
    }

    #[test]
    fn test_blank_date_defaults() {
        let bytes = workbook_bytes(&[(
            CLIENT_SHEET,
            vec![CLIENT_HEADERS.to_vec(), vec!["", "한올출판사", "1000"]],
        )]);

        let preview = ImportService::new()
            .parse_with_batch(&bytes, BATCH, DEFAULT_DATE)
            .unwrap();
        assert_eq!(preview.settlements[0].date, DEFAULT_DATE);
    }

    #[test]
    fn test_all_blank_names_fail_with_no_valid_data() {
        let bytes = workbook_bytes(&[(
            EMPLOYEE_SHEET,
            vec![
                employee_header(),
                vec!["2026-01-05", ""],
                vec!["2026-01-06", "  "],
            ],
        )]);

        let result = ImportService::new().parse_with_batch(&bytes, BATCH, DEFAULT_DATE);
        assert!(matches!(result, Err(ImportError::NoValidData)));
    }

    #[test]
    fn test_unrelated_sheets_fail_with_no_valid_data() {
        let bytes = workbook_bytes(&[("메모", vec![vec!["무관한", "내용"]])]);
        let result = ImportService::new().parse_with_batch(&bytes, BATCH, DEFAULT_DATE);
        assert!(matches!(result, Err(ImportError::NoValidData)));
    }

    #[test]
    fn test_extension_pre_check() {
        let service = ImportService::new();
        let result = service.parse_workbook("settlements.csv", &[0u8; 16]);
        assert!(matches!(result, Err(ImportError::UnsupportedExtension(_))));

        let result = service.parse_workbook("settlements", &[0u8; 16]);
        assert!(matches!(result, Err(ImportError::UnsupportedExtension(_))));
    }

    #[test]
    fn test_size_pre_check() {
        let service = ImportService::new();
        let oversized = vec![0u8; MAX_IMPORT_FILE_BYTES + 1];
        let result = service.parse_workbook("settlements.xlsx", &oversized);
        assert!(matches!(result, Err(ImportError::FileTooLarge { .. })));
    }

    #[test]
    fn test_distinct_batches_mint_distinct_ids() {
        let bytes = workbook_bytes(&[(
            CLIENT_SHEET,
            vec![
                CLIENT_HEADERS.to_vec(),
                vec!["2026-01-05", "한올출판사", "1000000"],
            ],
        )]);

        let service = ImportService::new();
        let first = service.parse_with_batch(&bytes, BATCH, DEFAULT_DATE).unwrap();
        let second = service
            .parse_with_batch(&bytes, BATCH + 1, DEFAULT_DATE)
            .unwrap();

        // Re-importing the same file never reuses IDs, so records are added
        // rather than silently overwritten.
        assert_ne!(first.settlements[0].id, second.settlements[0].id);
    }
}
