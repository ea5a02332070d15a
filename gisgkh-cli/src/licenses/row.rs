//! Normalization of raw spreadsheet rows into typed license records.
//!
//! Registry sheets carry a preamble above the column header; data starts
//! right after the row whose first cell reads "Номер лицензии". Cells are
//! free text in the registry's Russian locale: dates as day.month.year and
//! the publication status as a literal marker word.

use calamine::{Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::LicenseWorkbook;
use crate::api::error::{ApiError, ApiResult};

/// First cell of the header row, compared after trim and lowercase.
const HEADER_MARKER: &str = "номер лицензии";

/// Status text denoting an actively published record.
const IN_REGISTER_MARK: &str = "размещена";

const DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Trailing service columns in the remote sheet that carry no modeled
/// data. The field mapping below is positional, so a change in the remote
/// column count would shift every field after the drop point.
const TRAILING_SERVICE_COLUMNS: usize = 2;

/// One normalized row of a region's license registry sheet.
///
/// Textual cells are trimmed and lowercased. Date cells are parsed from
/// the registry's locale format; blank date cells map to the maximum
/// representable datetime so that open-ended management periods sort last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseRow {
    /// Physical (1-based) position of the row in the sheet.
    pub number_in_file: u32,
    /// Reserved for future population; never read from the sheet.
    pub house_fias_id: String,
    pub license_number: String,
    pub license_date: String,
    pub license_status: String,
    pub license_included_date: String,
    pub order_number: String,
    pub order_date: String,
    pub lisence_juristic_address: String,
    pub license_holder_uid: String,
    pub additional_info: String,
    pub license_holder_name: String,
    pub inn: String,
    pub ogrn: String,
    pub mkd_address: String,
    pub gos_uslugi_house_code: String,
    pub mkd_included_register_date: NaiveDateTime,
    pub mkd_begin_management_date: NaiveDateTime,
    pub mkd_end_management_date: NaiveDateTime,
    pub mkd_excluded_register_date: NaiveDateTime,
    pub mkd_excluded_reason: String,
    pub state_198_info: String,
    /// True iff the normalized `license_status` equals the register marker.
    pub is_information_in_register: bool,
}

impl LicenseRow {
    /// Build a record from the raw cells of one physical sheet row.
    fn from_cells(number_in_file: u32, cells: &[Data]) -> ApiResult<Self> {
        let mut values: Vec<String> = cells.iter().map(cell_text).collect();
        values.truncate(values.len().saturating_sub(TRAILING_SERVICE_COLUMNS));
        let mut fields = values.into_iter().map(|v| v.trim().to_lowercase());

        let license_number = fields.next().unwrap_or_default();
        let license_date = fields.next().unwrap_or_default();
        let license_status = fields.next().unwrap_or_default();
        let license_included_date = fields.next().unwrap_or_default();
        let order_number = fields.next().unwrap_or_default();
        let order_date = fields.next().unwrap_or_default();
        let lisence_juristic_address = fields.next().unwrap_or_default();
        let license_holder_uid = fields.next().unwrap_or_default();
        let additional_info = fields.next().unwrap_or_default();
        let license_holder_name = fields.next().unwrap_or_default();
        let inn = fields.next().unwrap_or_default();
        let ogrn = fields.next().unwrap_or_default();
        let mkd_address = fields.next().unwrap_or_default();
        let gos_uslugi_house_code = fields.next().unwrap_or_default();
        let mkd_included_register_date = parse_datetime_field(&fields.next().unwrap_or_default())?;
        let mkd_begin_management_date = parse_date_field(&fields.next().unwrap_or_default())?;
        let mkd_end_management_date = parse_date_field(&fields.next().unwrap_or_default())?;
        let mkd_excluded_register_date = parse_datetime_field(&fields.next().unwrap_or_default())?;
        let mkd_excluded_reason = fields.next().unwrap_or_default();
        let state_198_info = fields.next().unwrap_or_default();
        let is_information_in_register = license_status == IN_REGISTER_MARK;

        Ok(Self {
            number_in_file,
            house_fias_id: String::new(),
            license_number,
            license_date,
            license_status,
            license_included_date,
            order_number,
            order_date,
            lisence_juristic_address,
            license_holder_uid,
            additional_info,
            license_holder_name,
            inn,
            ogrn,
            mkd_address,
            gos_uslugi_house_code,
            mkd_included_register_date,
            mkd_begin_management_date,
            mkd_end_management_date,
            mkd_excluded_register_date,
            mkd_excluded_reason,
            state_198_info,
            is_information_in_register,
        })
    }
}

/// Lazy iterator of normalized rows for one workbook.
///
/// The worksheet is not touched until the first element is pulled. A row
/// whose date cells fail to parse ends the sequence with that error; an
/// exhausted sequence stays empty.
pub struct LicenseRows {
    state: RowsState,
}

enum RowsState {
    Unopened(Box<LicenseWorkbook>),
    Reading {
        rows: std::vec::IntoIter<(u32, Vec<Data>)>,
        header_seen: bool,
    },
    Finished,
}

impl LicenseRows {
    pub(crate) fn new(workbook: LicenseWorkbook) -> Self {
        Self {
            state: RowsState::Unopened(Box::new(workbook)),
        }
    }

    fn open(workbook: &mut LicenseWorkbook) -> ApiResult<std::vec::IntoIter<(u32, Vec<Data>)>> {
        let sheet_name = workbook
            .sheet_names()
            .first()
            .ok_or(ApiError::WorksheetAbsent)?
            .clone();
        let range = workbook.worksheet_range(&sheet_name)?;
        let first_row = range.start().map(|(row, _)| row).unwrap_or(0);
        let rows: Vec<(u32, Vec<Data>)> = range
            .rows()
            .enumerate()
            .map(|(i, row)| (first_row + i as u32 + 1, row.to_vec()))
            .collect();
        Ok(rows.into_iter())
    }
}

impl Iterator for LicenseRows {
    type Item = ApiResult<LicenseRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, RowsState::Finished) {
                RowsState::Unopened(mut workbook) => match Self::open(&mut workbook) {
                    Ok(rows) => {
                        self.state = RowsState::Reading {
                            rows,
                            header_seen: false,
                        };
                    }
                    Err(e) => return Some(Err(e)),
                },
                RowsState::Reading {
                    mut rows,
                    mut header_seen,
                } => {
                    while let Some((number, cells)) = rows.next() {
                        if !header_seen {
                            if is_header_row(&cells) {
                                header_seen = true;
                            }
                            continue;
                        }
                        let row = LicenseRow::from_cells(number, &cells);
                        if row.is_ok() {
                            self.state = RowsState::Reading { rows, header_seen };
                        }
                        return Some(row);
                    }
                    return None;
                }
                RowsState::Finished => return None,
            }
        }
    }
}

fn is_header_row(cells: &[Data]) -> bool {
    cells
        .first()
        .is_some_and(|cell| cell_text(cell).trim().to_lowercase() == HEADER_MARKER)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 => {
            (*f as i64).to_string()
        }
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{dt}"),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

fn parse_datetime_field(value: &str) -> ApiResult<NaiveDateTime> {
    if value.is_empty() {
        return Ok(NaiveDateTime::MAX);
    }
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map_err(|_| date_format_error(value, DATETIME_FORMAT))
}

fn parse_date_field(value: &str) -> ApiResult<NaiveDateTime> {
    if value.is_empty() {
        return Ok(NaiveDateTime::MAX);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| date_format_error(value, DATE_FORMAT))
}

fn date_format_error(value: &str, format: &'static str) -> ApiError {
    ApiError::DateFormat {
        value: value.to_string(),
        format,
    }
}
