//! Свёртка строк таблицы в позиции сметы с переносом контекста
//! (квартира / раздел / подраздел / категория) сверху вниз.

use contracts::domain::a002_estimate_item::EstimateRecord;

use super::cell_classifier::{
    apartment_label, classify, is_numbering, is_punctuation, strip_numbering_prefix, CellKind,
};
use super::column_locator::{locate_columns, ColumnMap};
use super::grid::CellGrid;
use crate::shared::config::ImportSettings;

/// Параметры нормализации
#[derive(Debug, Clone)]
pub struct ReduceOptions {
    /// Единица измерения по умолчанию
    pub default_unit: String,
    /// Префикс названия для «спасённых» позиций без наименования
    pub rescue_prefix: String,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self::from(&ImportSettings::default())
    }
}

impl From<&ImportSettings> for ReduceOptions {
    fn from(settings: &ImportSettings) -> Self {
        Self {
            default_unit: settings.default_unit.clone(),
            rescue_prefix: settings.rescue_prefix.clone(),
        }
    }
}

/// Диагностика одного прохода
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub rows_scanned: usize,
    pub blank_rows: usize,
    pub apartment_rows: usize,
    pub rescued: usize,
    /// Строки без позиции: нет наименования и нет количества
    pub skipped: usize,
    pub used_positional_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct ReduceOutcome {
    pub records: Vec<EstimateRecord>,
    pub columns: ColumnMap,
    pub stats: ReduceStats,
}

/// Текущий контекст, переносимый между строками
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RowContext {
    apartment: Option<String>,
    section: Option<String>,
    subsection: Option<String>,
    category: Option<String>,
}

impl RowContext {
    fn enter_apartment(&mut self, label: String) {
        self.apartment = Some(label);
        self.section = None;
        self.subsection = None;
        self.category = None;
    }
}

enum RowOutcome {
    Blank,
    ApartmentMarker,
    Record(EstimateRecord),
    Rescued(EstimateRecord),
    Skipped,
}

/// Определить колонки и свернуть таблицу в позиции.
///
/// Если заголовок распознан, но не дал ни одной позиции, таблица
/// разбирается повторно по позиционной раскладке, начиная с первой строки.
pub fn normalize_grid<G: CellGrid + ?Sized>(grid: &G, options: &ReduceOptions) -> ReduceOutcome {
    let columns = locate_columns(grid);
    let outcome = reduce_rows(grid, &columns, options);

    let has_data_rows = grid.row_count() > columns.first_data_row();
    if outcome.records.is_empty() && columns.has_header && !columns.positional && has_data_rows {
        tracing::info!(
            "Header-based pass produced no records ({} rows), retrying with positional columns",
            outcome.stats.rows_scanned
        );
        let mut fallback = reduce_rows(grid, &ColumnMap::positional(false), options);
        fallback.stats.used_positional_fallback = true;
        return fallback;
    }

    outcome
}

/// Один проход по строкам с заданной раскладкой колонок
pub fn reduce_rows<G: CellGrid + ?Sized>(
    grid: &G,
    columns: &ColumnMap,
    options: &ReduceOptions,
) -> ReduceOutcome {
    let mut reducer = RowReducer {
        grid,
        columns,
        options,
        context: RowContext::default(),
        next_sort_order: 0,
    };
    let mut records = Vec::new();
    let mut stats = ReduceStats::default();

    for row in columns.first_data_row()..grid.row_count() {
        stats.rows_scanned += 1;
        match reducer.reduce_row(row) {
            RowOutcome::Blank => stats.blank_rows += 1,
            RowOutcome::ApartmentMarker => stats.apartment_rows += 1,
            RowOutcome::Skipped => stats.skipped += 1,
            RowOutcome::Record(record) => records.push(record),
            RowOutcome::Rescued(record) => {
                stats.rescued += 1;
                records.push(record);
            }
        }
    }

    tracing::debug!(
        "Reduced {} rows into {} records (blank={}, apartments={}, rescued={}, skipped={})",
        stats.rows_scanned,
        records.len(),
        stats.blank_rows,
        stats.apartment_rows,
        stats.rescued,
        stats.skipped
    );

    ReduceOutcome {
        records,
        columns: columns.clone(),
        stats,
    }
}

struct RowReducer<'a, G: CellGrid + ?Sized> {
    grid: &'a G,
    columns: &'a ColumnMap,
    options: &'a ReduceOptions,
    context: RowContext,
    next_sort_order: i32,
}

impl<'a, G: CellGrid + ?Sized> RowReducer<'a, G> {
    fn text(&self, row: usize, col: Option<usize>) -> String {
        col.map(|c| self.grid.cell(row, c).trim().to_string())
            .unwrap_or_default()
    }

    fn reduce_row(&mut self, row: usize) -> RowOutcome {
        if self.grid.is_blank_row(row) {
            return RowOutcome::Blank;
        }

        // Маркер квартиры может оказаться в любой колонке; сначала проверяется
        // колонка раздела/квартиры, затем остальные
        if let Some(label) = self.find_apartment_marker(row) {
            tracing::debug!("Row {}: apartment marker {}", row + 1, label);
            self.context.enter_apartment(label);
            return RowOutcome::ApartmentMarker;
        }

        self.update_grouping(row);

        let quantity = parse_quantity(&self.text(row, self.columns.quantity));
        let unit = Some(self.text(row, self.columns.unit))
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.options.default_unit.clone());
        let variant = self.text(row, self.columns.variant);
        let raw_name = self.text(row, self.columns.name);

        if raw_name.is_empty() || is_numbering(&raw_name) {
            return self.rescue(row, &raw_name, &raw_name, &variant, quantity, unit);
        }

        let base_name = strip_numbering_prefix(&raw_name);
        if base_name.is_empty() {
            return self.rescue(row, &raw_name, base_name, &variant, quantity, unit);
        }

        let name = if variant.is_empty() {
            base_name.to_string()
        } else {
            format!("{} ({})", base_name, variant)
        };
        RowOutcome::Record(self.emit(name, quantity, unit))
    }

    fn find_apartment_marker(&self, row: usize) -> Option<String> {
        let primary = self.columns.section_or_apartment;
        std::iter::once(primary)
            .chain((0..self.grid.row_len(row)).filter(|&col| col != primary))
            .find_map(|col| apartment_label(&self.grid.cell(row, col)))
    }

    fn update_grouping(&mut self, row: usize) {
        let section = self.text(row, self.columns.section);
        if !section.is_empty() {
            self.context.section = Some(section);
        } else {
            let candidate_col = self.columns.section_or_apartment;
            if !self.columns.is_item_column(candidate_col) {
                let candidate = self.text(row, Some(candidate_col));
                if is_meaningful_section(&candidate) {
                    self.context.section = Some(candidate);
                }
            }
        }

        let subsection = self.text(row, self.columns.subsection);
        if !subsection.is_empty() {
            self.context.subsection = Some(subsection);
        }

        let category = self.text(row, self.columns.category);
        if !category.is_empty() {
            self.context.category = Some(category);
        }
    }

    /// Позиция без пригодного наименования. `label` это наименование после
    /// снятия нумерации; если оно пустое, в название идёт номер строки листа.
    fn rescue(
        &mut self,
        row: usize,
        raw_name: &str,
        label: &str,
        variant: &str,
        quantity: f64,
        unit: String,
    ) -> RowOutcome {
        if quantity <= 0.0 || (variant.is_empty() && raw_name.is_empty()) {
            return RowOutcome::Skipped;
        }

        let name = if !variant.is_empty() {
            variant.to_string()
        } else if !label.is_empty() {
            format!("{} {}", self.options.rescue_prefix, label)
        } else {
            format!("{} {}", self.options.rescue_prefix, row + 1)
        };
        RowOutcome::Rescued(self.emit(name, quantity, unit))
    }

    fn emit(&mut self, name: String, quantity: f64, unit: String) -> EstimateRecord {
        let record = EstimateRecord {
            name,
            unit,
            quantity,
            apartment_label: self.context.apartment.clone(),
            section: self.context.section.clone(),
            subsection: self.context.subsection.clone(),
            category: self.context.category.clone(),
            sort_order: self.next_sort_order,
        };
        self.next_sort_order += 1;
        record
    }
}

/// Текст в колонке раздела/квартиры годится как название раздела
fn is_meaningful_section(text: &str) -> bool {
    text.chars().count() >= 2
        && !is_numbering(text)
        && !is_punctuation(text)
        && matches!(classify(text), CellKind::SectionLike | CellKind::Plain)
}

/// Разобрать количество: запятая или точка как десятичный разделитель,
/// пробелы (в том числе неразрывные) как разделители разрядов.
/// Всё, что не разбирается или отрицательно, даёт 0.
pub fn parse_quantity(text: &str) -> f64 {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if let (Some(comma), Some(dot)) = (cleaned.rfind(','), cleaned.rfind('.')) {
        // Десятичный разделитель тот, что стоит последним: "1.250,5", "1,250.50"
        let thousands = if comma > dot { '.' } else { ',' };
        cleaned = cleaned.replace(thousands, "");
    }
    let normalized = cleaned.replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn names(outcome: &ReduceOutcome) -> Vec<&str> {
        outcome.records.iter().map(|r| r.name.as_str()).collect()
    }

    const HEADER: &[&str] = &[
        "№",
        "Раздел",
        "Подраздел",
        "Категория",
        "Наименование",
        "Тип",
        "Кол-во",
        "Ед",
    ];

    #[test]
    fn test_single_record_with_header() {
        let data = grid(&[HEADER, &["1", "Отделка", "", "", "Штукатурка стен", "", "50", "м2"]]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());

        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.name, "Штукатурка стен");
        assert_eq!(record.section.as_deref(), Some("Отделка"));
        assert_eq!(record.quantity, 50.0);
        assert_eq!(record.unit, "м2");
        assert_eq!(record.apartment_label, None);
        assert_eq!(record.sort_order, 0);
        assert!(!outcome.stats.used_positional_fallback);
    }

    #[test]
    fn test_apartment_marker_row_resets_grouping() {
        let data = grid(&[
            &["", "Демонтаж", "Стены", "Работы", "Демонтаж перегородок", "", "4", "м2"],
            &["", "Квартира ТВ-101", "", "", "", "", "", ""],
            &["", "", "", "", "Вывоз мусора", "", "1", "рейс"],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stats.apartment_rows, 1);
        let before = &outcome.records[0];
        assert_eq!(before.section.as_deref(), Some("Демонтаж"));
        assert_eq!(before.subsection.as_deref(), Some("Стены"));
        assert_eq!(before.apartment_label, None);

        let after = &outcome.records[1];
        assert_eq!(after.apartment_label.as_deref(), Some("Кв. ТВ-101"));
        assert_eq!(after.section, None);
        assert_eq!(after.subsection, None);
        assert_eq!(after.category, None);
    }

    #[test]
    fn test_apartment_marker_in_any_column() {
        let data = grid(&[
            &["", "", "", "", "", "", "", "", "Кв. 14"],
            &["", "Электрика", "", "", "Розетка", "", "6", ""],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].apartment_label.as_deref(), Some("Кв. 14"));
        assert_eq!(outcome.records[0].unit, "шт");
    }

    #[test]
    fn test_numbering_name_without_quantity_skipped() {
        let data = grid(&[HEADER, &["", "", "", "", "2.1.", "", "0", "м2"]]);
        let outcome = reduce_rows(&data, &locate_columns(&data), &ReduceOptions::default());
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.skipped, 1);
    }

    #[test]
    fn test_rescue_from_variant() {
        let data = grid(&[
            HEADER,
            &["", "Сантехника", "", "", "Смеситель", "", "1", "шт"],
            &["", "", "", "", "", "Труба ПВХ", "12", "м"],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());

        assert_eq!(names(&outcome), vec!["Смеситель", "Труба ПВХ"]);
        let rescued = &outcome.records[1];
        assert_eq!(rescued.quantity, 12.0);
        assert_eq!(rescued.section.as_deref(), Some("Сантехника"));
        assert_eq!(outcome.stats.rescued, 1);
    }

    #[test]
    fn test_rescue_from_numbering_name() {
        let data = grid(&[HEADER, &["", "", "", "", "3.2", "", "5", ""]]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());
        assert_eq!(names(&outcome), vec!["Item 3.2"]);
    }

    #[test]
    fn test_rescue_by_row_number_when_prefix_strips_everything() {
        let options = ReduceOptions {
            default_unit: "шт".into(),
            rescue_prefix: "Позиция".into(),
        };
        let data = grid(&[
            HEADER,
            &["", "", "", "", "Грунтовка", "", "1", ""],
            &["", "", "", "", "1.2)", "", "2", ""],
        ]);
        let outcome = normalize_grid(&data, &options);
        assert_eq!(names(&outcome), vec!["Грунтовка", "Позиция 3"]);
    }

    #[test]
    fn test_name_with_variant_and_numbering_prefix() {
        let data = grid(&[HEADER, &["", "Полы", "", "", "1.3. Ламинат", "33 класс", "18,5", "м2"]]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());
        assert_eq!(names(&outcome), vec!["Ламинат (33 класс)"]);
        assert_eq!(outcome.records[0].quantity, 18.5);
    }

    #[test]
    fn test_context_carry() {
        let data = grid(&[
            HEADER,
            &["", "Demolition", "", "", "Снос стены", "", "1", ""],
            &["", "", "", "", "Вынос мусора", "", "2", ""],
            &["", "", "", "", "Уборка", "", "3", ""],
            &["", "Отделка", "", "", "Грунтовка", "", "4", ""],
            &["", "", "", "", "Шпатлёвка", "", "5", ""],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());
        let sections: Vec<Option<&str>> = outcome
            .records
            .iter()
            .map(|r| r.section.as_deref())
            .collect();
        assert_eq!(
            sections,
            vec![
                Some("Demolition"),
                Some("Demolition"),
                Some("Demolition"),
                Some("Отделка"),
                Some("Отделка"),
            ]
        );
    }

    #[test]
    fn test_section_from_apartment_column_without_section_header() {
        let data = grid(&[
            &["Квартира", "Наименование", "Кол-во", "Ед. изм."],
            &["Кв. 3", "", "", ""],
            &["Санузел", "", "", ""],
            &["", "Плитка настенная", "12", "м2"],
            &["—", "Затирка", "2", "кг"],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());

        assert_eq!(names(&outcome), vec!["Плитка настенная", "Затирка"]);
        for record in &outcome.records {
            assert_eq!(record.apartment_label.as_deref(), Some("Кв. 3"));
            assert_eq!(record.section.as_deref(), Some("Санузел"));
        }
    }

    #[test]
    fn test_sort_order_unique_and_increasing() {
        let data = grid(&[
            HEADER,
            &["", "Отделка", "", "", "Грунтовка", "", "1", ""],
            &["", "", "", "", "", "", "", ""],
            &["", "", "", "", "2.1.", "", "0", ""],
            &["", "Квартира 2", "", "", "", "", "", ""],
            &["", "", "", "", "Шпатлёвка", "", "1", ""],
            &["", "", "", "", "", "Профиль", "3", ""],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());
        let orders: Vec<i32> = outcome.records.iter().map(|r| r.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(outcome.records.len() <= data.len());
        assert_eq!(outcome.stats.blank_rows, 1);
    }

    #[test]
    fn test_reduce_is_deterministic() {
        let data = grid(&[
            HEADER,
            &["", "Отделка", "Стены", "", "Грунтовка", "", "1", ""],
            &["", "Кв. 7", "", "", "", "", "", ""],
            &["", "", "", "", "", "Профиль", "3", ""],
        ]);
        let options = ReduceOptions::default();
        let first = normalize_grid(&data, &options);
        let second = normalize_grid(&data, &options);
        assert_eq!(first.records, second.records);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_positional_fallback_when_header_yields_nothing() {
        // Заголовок распознан, но данные лежат по позиционной раскладке
        let data = grid(&[
            &["Наименование", "Ед"],
            &["", "Отделка", "", "", "Штукатурка", "", "50", "м2"],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());
        let header_pass = reduce_rows(&data, &locate_columns(&data), &ReduceOptions::default());
        assert!(header_pass.records.is_empty());

        assert!(outcome.stats.used_positional_fallback);
        assert_eq!(names(&outcome), vec!["Штукатурка"]);
        assert_eq!(outcome.records[0].section.as_deref(), Some("Отделка"));
        assert_eq!(outcome.records[0].quantity, 50.0);
    }

    #[test]
    fn test_apartment_marker_in_first_row_keeps_label() {
        let data = grid(&[
            &["Квартира 1", "", "", "", "", "", "", ""],
            &["", "Отделка", "", "", "Штукатурка", "", "50", "м2"],
            &["", "", "", "", "Грунтовка", "", "2", "л"],
        ]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());

        assert_eq!(names(&outcome), vec!["Штукатурка", "Грунтовка"]);
        assert_eq!(outcome.stats.apartment_rows, 1);
        for record in &outcome.records {
            assert_eq!(record.apartment_label.as_deref(), Some("Кв. 1"));
            assert_eq!(record.section.as_deref(), Some("Отделка"));
        }
    }

    #[test]
    fn test_fallback_pass_reads_misdetected_header_row() {
        // Первая строка похожа на заголовок только из-за слова «Наименование» в данных
        let data = grid(&[
            &["", "Отделка", "", "", "Наименование по проекту", "", "3", "м2"],
            &["", "", "", "", "", "", "", ""],
        ]);
        let header_map = locate_columns(&data);
        assert!(header_map.has_header);
        assert!(!header_map.positional);

        let outcome = normalize_grid(&data, &ReduceOptions::default());
        assert!(outcome.stats.used_positional_fallback);
        assert_eq!(outcome.columns.first_data_row(), 0);
        assert_eq!(names(&outcome), vec!["Наименование по проекту"]);
        assert_eq!(outcome.records[0].section.as_deref(), Some("Отделка"));
    }

    #[test]
    fn test_no_header_reads_first_row() {
        let data = grid(&[&["", "Отделка", "", "", "Штукатурка", "", "50", "м2"]]);
        let outcome = normalize_grid(&data, &ReduceOptions::default());
        assert_eq!(names(&outcome), vec!["Штукатурка"]);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("50"), 50.0);
        assert_eq!(parse_quantity("12,5"), 12.5);
        assert_eq!(parse_quantity("12.5"), 12.5);
        assert_eq!(parse_quantity("1 250,75"), 1250.75);
        assert_eq!(parse_quantity("1\u{a0}250"), 1250.0);
        assert_eq!(parse_quantity("1.250,5"), 1250.5);
        assert_eq!(parse_quantity("1,250.50"), 1250.5);
        assert_eq!(parse_quantity("2,000,000.25"), 2000000.25);
        assert_eq!(parse_quantity(""), 0.0);
        assert_eq!(parse_quantity("около 5"), 0.0);
        assert_eq!(parse_quantity("-3"), 0.0);
        assert_eq!(parse_quantity("inf"), 0.0);
    }
}
