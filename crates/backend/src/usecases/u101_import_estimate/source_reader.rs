//! Чтение загруженного файла сметы в таблицу ячеек.

use calamine::{open_workbook_auto_from_rs, Reader};
use csv::{ReaderBuilder, StringRecord};
use std::borrow::Cow;
use std::io::Cursor;

use super::error::ImportError;
use super::grid::{CellGrid, SheetGrid};

/// Формат файла по расширению
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = file_name.rsplit_once('.')?.1.to_lowercase();
        match extension.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(SourceFormat::Spreadsheet),
            _ => None,
        }
    }
}

/// Прочитанный файл: строки CSV или лист книги
pub enum SourceGrid {
    Csv(Vec<StringRecord>),
    Sheet(SheetGrid),
}

impl SourceGrid {
    pub fn describe(&self) -> String {
        match self {
            SourceGrid::Csv(rows) => format!("CSV, {} rows", rows.len()),
            SourceGrid::Sheet(sheet) => {
                format!("sheet «{}», {} rows", sheet.sheet_name, sheet.row_count())
            }
        }
    }
}

impl CellGrid for SourceGrid {
    fn row_count(&self) -> usize {
        match self {
            SourceGrid::Csv(rows) => rows.as_slice().row_count(),
            SourceGrid::Sheet(sheet) => sheet.row_count(),
        }
    }

    fn row_len(&self, row: usize) -> usize {
        match self {
            SourceGrid::Csv(rows) => rows.as_slice().row_len(row),
            SourceGrid::Sheet(sheet) => sheet.row_len(row),
        }
    }

    fn cell(&self, row: usize, col: usize) -> Cow<'_, str> {
        match self {
            SourceGrid::Csv(rows) => rows.as_slice().cell(row, col),
            SourceGrid::Sheet(sheet) => sheet.cell(row, col),
        }
    }
}

/// Разобрать содержимое файла по его имени.
///
/// Пустой файл (или файл из одних пустых строк) даёт `EmptySheet`.
pub fn read_source(
    file_name: &str,
    bytes: &[u8],
    preferred_sheet: &str,
) -> Result<SourceGrid, ImportError> {
    let format = SourceFormat::from_file_name(file_name)
        .ok_or_else(|| ImportError::UnsupportedFormat(file_name.to_string()))?;

    let grid = match format {
        SourceFormat::Csv => SourceGrid::Csv(read_csv(bytes)?),
        SourceFormat::Spreadsheet => SourceGrid::Sheet(read_spreadsheet(bytes, preferred_sheet)?),
    };

    if (0..grid.row_count()).all(|row| grid.is_blank_row(row)) {
        return Err(ImportError::EmptySheet);
    }

    tracing::info!("Read {} from {}", grid.describe(), file_name);
    Ok(grid)
}

fn read_csv(bytes: &[u8]) -> Result<Vec<StringRecord>, ImportError> {
    let content = String::from_utf8_lossy(bytes);
    let text = content
        .strip_prefix('\u{feff}')
        .unwrap_or(content.as_ref());

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());

    reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ImportError::Unreadable(e.to_string()))
}

/// `;` если он встречается в тексте, иначе `,`
fn detect_delimiter(text: &str) -> u8 {
    if text.contains(';') {
        b';'
    } else {
        b','
    }
}

fn read_spreadsheet(bytes: &[u8], preferred_sheet: &str) -> Result<SheetGrid, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let preferred = preferred_sheet.trim().to_lowercase();
    let sheet_name = sheet_names
        .iter()
        .find(|name| name.trim().to_lowercase() == preferred)
        .or_else(|| sheet_names.first())
        .cloned()
        .ok_or(ImportError::EmptySheet)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    Ok(SheetGrid::new(sheet_name, range))
}
