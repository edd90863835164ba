//! Spreadsheet import of tier and margin-band tables.
//!
//! Imports are all-or-nothing: a table is fully parsed before any row is
//! handed back, and every failure leaves the caller's list untouched.

mod mapping;
mod normalizer;
mod parser;
mod workbook;

pub use mapping::TierField;
pub(crate) use normalizer::parse_locale_number;

use crate::commission::domain::{EnergyMarginBand, Tier};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Tabular spreadsheet content: one header row plus data rows of raw cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Parses CSV/TSV text.
    pub fn from_csv_str(text: &str) -> Result<Self, ImportError> {
        parser::parse_delimited(text).map_err(|err| ImportError::Unreadable(err.to_string()))
    }

    /// Parses delimited text bytes. Input that is not valid UTF-8 is decoded as
    /// Windows-1252, the encoding spreadsheet CSV exports use on Windows.
    pub fn from_delimited_bytes(bytes: &[u8]) -> Result<Self, ImportError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::from_csv_str(text),
            Err(_) => {
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                Self::from_csv_str(&text)
            }
        }
    }

    /// Reads the first worksheet of an `.xlsx`, `.xlsm`, `.xls` or `.ods` workbook.
    pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<Self, ImportError> {
        workbook::read_first_sheet(bytes)
    }

    /// Builds a table from an uploaded body. A `text/*` content type is read
    /// as delimited text; otherwise the body's signature picks workbook or text.
    pub fn from_upload(content_type: Option<&str>, bytes: &[u8]) -> Result<Self, ImportError> {
        let textual = content_type
            .map(|value| value.trim().to_ascii_lowercase().starts_with("text/"))
            .unwrap_or(false);

        if !textual && workbook::has_workbook_signature(bytes) {
            Self::from_workbook_bytes(bytes.to_vec())
        } else {
            Self::from_delimited_bytes(bytes)
        }
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ImportError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|err| ImportError::Unreadable(err.to_string()))?;
        Self::from_delimited_bytes(&bytes)
    }

    /// Opens a spreadsheet file: `.csv`, `.tsv` and `.txt` exports or
    /// `.xlsx`, `.xlsm`, `.xls` and `.ods` workbooks.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let workbook = match extension.as_str() {
            "csv" | "tsv" | "txt" => false,
            "xlsx" | "xlsm" | "xls" | "ods" => true,
            _ => return Err(ImportError::UnsupportedFormat(extension)),
        };

        let bytes = std::fs::read(path).map_err(|err| ImportError::Unreadable(err.to_string()))?;
        if workbook {
            Self::from_workbook_bytes(bytes)
        } else {
            Self::from_delimited_bytes(&bytes)
        }
    }

    fn cell(&self, row: &[String], column: usize) -> f64 {
        row.get(column)
            .map(|cell| normalizer::parse_locale_number(cell))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("could not read file: {0}")]
    Unreadable(String),
    #[error("unsupported spreadsheet format '{0}', expected .xlsx, .xls, .csv or .tsv")]
    UnsupportedFormat(String),
    #[error("no recognized columns; expected headers: {}", .expected.join(", "))]
    NoRecognizedColumns { expected: Vec<String> },
    #[error("columns '{first}' and '{second}' both map to {field}")]
    DuplicateColumn {
        field: &'static str,
        first: String,
        second: String,
    },
    #[error("file contains no data rows")]
    NoRows,
}

/// Parses tier rows, resolving headers through the alias table. Columns that
/// do not resolve are ignored; fields without a column stay at zero.
pub fn parse_tiers(table: &SheetTable) -> Result<Vec<Tier>, ImportError> {
    let mut resolved: Vec<(usize, TierField)> = Vec::new();
    let mut seen: HashMap<TierField, usize> = HashMap::new();

    for (column, header) in table.headers().iter().enumerate() {
        let Some(field) = mapping::tier_field_for_header(header) else {
            debug!(header = %header, "ignoring unrecognized tier column");
            continue;
        };

        if let Some(&previous) = seen.get(&field) {
            return Err(ImportError::DuplicateColumn {
                field: field.canonical_name(),
                first: table.headers()[previous].clone(),
                second: header.clone(),
            });
        }
        seen.insert(field, column);
        resolved.push((column, field));
    }

    if resolved.is_empty() {
        return Err(ImportError::NoRecognizedColumns {
            expected: mapping::expected_tier_headers(),
        });
    }
    if table.rows().is_empty() {
        return Err(ImportError::NoRows);
    }

    let tiers = table
        .rows()
        .iter()
        .map(|row| {
            let mut tier = Tier::default();
            for (column, field) in &resolved {
                field.assign(&mut tier, table.cell(row, *column));
            }
            tier
        })
        .collect::<Vec<_>>();

    debug!(
        columns = resolved.len(),
        rows = tiers.len(),
        "parsed tier import"
    );
    Ok(tiers)
}

/// Parses margin bands from the first three columns (margin minimum,
/// ponderador, valor) regardless of their header text.
pub fn parse_bands(table: &SheetTable) -> Result<Vec<EnergyMarginBand>, ImportError> {
    if table.headers().is_empty() {
        return Err(ImportError::NoRecognizedColumns {
            expected: expected_band_headers(),
        });
    }
    if table.rows().is_empty() {
        return Err(ImportError::NoRows);
    }

    let bands = table
        .rows()
        .iter()
        .map(|row| EnergyMarginBand {
            margin_min: table.cell(row, 0),
            ponderador: table.cell(row, 1),
            valor: table.cell(row, 2),
        })
        .collect::<Vec<_>>();

    debug!(rows = bands.len(), "parsed margin band import");
    Ok(bands)
}

/// Appends parsed tiers to `existing`; on error `existing` is unchanged.
pub fn import_tiers(table: &SheetTable, existing: &mut Vec<Tier>) -> Result<usize, ImportError> {
    let tiers = parse_tiers(table)?;
    let added = tiers.len();
    existing.extend(tiers);
    Ok(added)
}

pub fn import_bands(
    table: &SheetTable,
    existing: &mut Vec<EnergyMarginBand>,
) -> Result<usize, ImportError> {
    let bands = parse_bands(table)?;
    let added = bands.len();
    existing.extend(bands);
    Ok(added)
}

fn expected_band_headers() -> Vec<String> {
    ["Margen Min", "Ponderador", "Valor"]
        .iter()
        .map(|header| header.to_string())
        .collect()
}
