use super::{ImportError, SheetTable};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
const OLE_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// True for `.xlsx`/`.xlsm`/`.ods` (zip) and `.xls` (OLE) containers.
pub(crate) fn has_workbook_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_SIGNATURE) || bytes.starts_with(OLE_SIGNATURE)
}

/// Reads the first worksheet: the first non-blank row is the header row and
/// blank rows after it are skipped. Cells are rendered as text.
pub(crate) fn read_first_sheet(bytes: Vec<u8>) -> Result<SheetTable, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(unreadable)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Unreadable("workbook has no worksheets".to_string()))?
        .map_err(unreadable)?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()));

    let headers = rows.next().unwrap_or_default();
    Ok(SheetTable::new(headers, rows.collect()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        Data::Float(number) => number.to_string(),
        Data::Int(number) => number.to_string(),
        other => other.to_string(),
    }
}

fn unreadable(err: impl std::fmt::Display) -> ImportError {
    ImportError::Unreadable(err.to_string())
}
