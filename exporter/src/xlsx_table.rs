use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use topposts_core::{Cell, ExportError, Row, COLUMNS};

pub const SHEET_NAME: &str = "Top Posts";

/// Excel refuses strings longer than this in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Writes a single-sheet workbook with a bold header row.
pub fn write_xlsx(rows: &[Row], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.cells().iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(row_num, col, truncate_for_cell(value))?
                }
                Cell::Integer(value) => worksheet.write_number(row_num, col, *value as f64)?,
                Cell::Boolean(value) => worksheet.write_boolean(row_num, col, *value)?,
                Cell::Timestamp(_) => worksheet.write_string(row_num, col, cell.to_string())?,
            };
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn truncate_for_cell(value: &str) -> &str {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((byte_index, _)) => &value[..byte_index],
        None => value,
    }
}
