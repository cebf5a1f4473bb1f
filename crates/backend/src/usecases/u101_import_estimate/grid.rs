//! Единый доступ к двумерной таблице ячеек для CSV и листов книги.

use calamine::{Data, Range};
use csv::StringRecord;
use std::borrow::Cow;

/// Двумерная таблица строковых ячеек.
///
/// Отсутствующие ячейки (за пределами строки) читаются как пустая строка.
pub trait CellGrid {
    fn row_count(&self) -> usize;

    fn row_len(&self, row: usize) -> usize;

    fn cell(&self, row: usize, col: usize) -> Cow<'_, str>;

    fn is_blank_row(&self, row: usize) -> bool {
        (0..self.row_len(row)).all(|col| self.cell(row, col).trim().is_empty())
    }

    /// Строка целиком (для заголовка)
    fn row_cells(&self, row: usize) -> Vec<String> {
        (0..self.row_len(row))
            .map(|col| self.cell(row, col).into_owned())
            .collect()
    }
}

impl CellGrid for [Vec<String>] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self.get(row).map(Vec::len).unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> Cow<'_, str> {
        self.get(row)
            .and_then(|r| r.get(col))
            .map(|s| Cow::Borrowed(s.as_str()))
            .unwrap_or(Cow::Borrowed(""))
    }
}

impl CellGrid for Vec<Vec<String>> {
    fn row_count(&self) -> usize {
        self.as_slice().row_count()
    }

    fn row_len(&self, row: usize) -> usize {
        self.as_slice().row_len(row)
    }

    fn cell(&self, row: usize, col: usize) -> Cow<'_, str> {
        self.as_slice().cell(row, col)
    }
}

impl CellGrid for [StringRecord] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_len(&self, row: usize) -> usize {
        self.get(row).map(StringRecord::len).unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> Cow<'_, str> {
        Cow::Borrowed(self.get(row).and_then(|r| r.get(col)).unwrap_or(""))
    }
}

/// Лист книги Excel, прочитанный calamine.
///
/// Диапазон calamine начинается с первой заполненной ячейки, поэтому
/// индексы здесь абсолютные: строка 0 и колонка 0 это A1.
pub struct SheetGrid {
    pub sheet_name: String,
    range: Range<Data>,
}

impl SheetGrid {
    pub fn new(sheet_name: String, range: Range<Data>) -> Self {
        Self { sheet_name, range }
    }
}

impl CellGrid for SheetGrid {
    fn row_count(&self) -> usize {
        self.range.end().map(|(row, _)| row as usize + 1).unwrap_or(0)
    }

    fn row_len(&self, _row: usize) -> usize {
        self.range.end().map(|(_, col)| col as usize + 1).unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> Cow<'_, str> {
        let (Ok(row), Ok(col)) = (u32::try_from(row), u32::try_from(col)) else {
            return Cow::Borrowed("");
        };
        match self.range.get_value((row, col)) {
            Some(data) => data_text(data),
            None => Cow::Borrowed(""),
        }
    }
}

fn data_text(data: &Data) -> Cow<'_, str> {
    match data {
        Data::Empty | Data::Error(_) => Cow::Borrowed(""),
        Data::String(s) => Cow::Borrowed(s.as_str()),
        // f64 Display: 50.0 -> "50", 12.5 -> "12.5"
        Data::Float(f) => Cow::Owned(f.to_string()),
        Data::Int(i) => Cow::Owned(i.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}
