//! Сопоставление логических полей сметы с колонками файла.

use once_cell::sync::Lazy;
use regex::Regex;

use super::grid::CellGrid;

/// Логическое поле строки сметы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Unit,
    Quantity,
    Apartment,
    Section,
    Subsection,
    Category,
    /// Тип/марка/вариант позиции
    Variant,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::Unit,
        Field::Quantity,
        Field::Apartment,
        Field::Section,
        Field::Subsection,
        Field::Category,
        Field::Variant,
    ];

    /// Колонка поля при позиционной раскладке (без заголовка)
    pub fn positional_index(self) -> usize {
        match self {
            Field::Apartment => 0,
            Field::Section => 1,
            Field::Subsection => 2,
            Field::Category => 3,
            Field::Name => 4,
            Field::Variant => 5,
            Field::Quantity => 6,
            Field::Unit => 7,
        }
    }

    /// Канонические заголовки (в нижнем регистре, "ё" заменена на "е")
    fn canonical_labels(self) -> &'static [&'static str] {
        match self {
            Field::Name => &[
                "наименование",
                "наименование работ",
                "наименование работ и материалов",
                "название",
                "name",
            ],
            Field::Unit => &[
                "ед",
                "ед.",
                "ед. изм.",
                "ед.изм.",
                "ед. изм",
                "единица измерения",
                "unit",
            ],
            Field::Quantity => &["кол-во", "количество", "объем", "qty", "quantity"],
            Field::Apartment => &["квартира", "кв", "кв.", "apartment"],
            Field::Section => &["раздел", "section"],
            Field::Subsection => &["подраздел", "subsection"],
            Field::Category => &["категория", "category"],
            Field::Variant => &["тип", "вид", "марка", "type"],
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Field::Name => &*NAME_PATTERN,
            Field::Unit => &*UNIT_PATTERN,
            Field::Quantity => &*QUANTITY_PATTERN,
            Field::Apartment => &*APARTMENT_PATTERN,
            Field::Section => &*SECTION_PATTERN,
            Field::Subsection => &*SUBSECTION_PATTERN,
            Field::Category => &*CATEGORY_PATTERN,
            Field::Variant => &*VARIANT_PATTERN,
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid header pattern")
}

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"наименован|название|^описание|^name\b"));
static UNIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r"^ед(?:\.|\b)|единиц|измер|^units?\b|measure"));
static QUANTITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r"кол-?во|количеств|объем|^qty\b|quantity|amount|volume"));
static APARTMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r"квартир|^кв\.?$|apartment|^flat\b"));
static SECTION_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"^раздел|^section"));
static SUBSECTION_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"подраздел|subsection"));
static CATEGORY_PATTERN: Lazy<Regex> = Lazy::new(|| compile(r"категори|category"));
static VARIANT_PATTERN: Lazy<Regex> =
    Lazy::new(|| compile(r"^тип\b|^вид\b|^марка|вариант|^type\b|variant"));

/// Раскладка колонок для одного прохода по таблице
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: Option<usize>,
    pub unit: Option<usize>,
    pub quantity: Option<usize>,
    pub apartment: Option<usize>,
    pub section: Option<usize>,
    pub subsection: Option<usize>,
    pub category: Option<usize>,
    pub variant: Option<usize>,
    /// Колонка, где может оказаться как раздел, так и маркер квартиры
    pub section_or_apartment: usize,
    /// Первая строка таблицы является заголовком
    pub has_header: bool,
    /// Колонки взяты из позиционной раскладки
    pub positional: bool,
}

impl ColumnMap {
    /// Позиционная раскладка: квартира=0, раздел=1, подраздел=2, категория=3,
    /// наименование=4, тип=5, количество=6, ед. изм.=7
    pub fn positional(has_header: bool) -> Self {
        Self {
            name: Some(Field::Name.positional_index()),
            unit: Some(Field::Unit.positional_index()),
            quantity: Some(Field::Quantity.positional_index()),
            apartment: Some(Field::Apartment.positional_index()),
            section: Some(Field::Section.positional_index()),
            subsection: Some(Field::Subsection.positional_index()),
            category: Some(Field::Category.positional_index()),
            variant: Some(Field::Variant.positional_index()),
            section_or_apartment: Field::Section.positional_index(),
            has_header,
            positional: true,
        }
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::Name => self.name,
            Field::Unit => self.unit,
            Field::Quantity => self.quantity,
            Field::Apartment => self.apartment,
            Field::Section => self.section,
            Field::Subsection => self.subsection,
            Field::Category => self.category,
            Field::Variant => self.variant,
        }
    }

    fn set(&mut self, field: Field, col: usize) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Unit => &mut self.unit,
            Field::Quantity => &mut self.quantity,
            Field::Apartment => &mut self.apartment,
            Field::Section => &mut self.section,
            Field::Subsection => &mut self.subsection,
            Field::Category => &mut self.category,
            Field::Variant => &mut self.variant,
        };
        *slot = Some(col);
    }

    /// Индекс первой строки с данными
    pub fn first_data_row(&self) -> usize {
        if self.has_header {
            1
        } else {
            0
        }
    }

    /// Колонка занята полем, которое не является разделом или квартирой
    pub fn is_item_column(&self, col: usize) -> bool {
        [
            self.name,
            self.unit,
            self.quantity,
            self.variant,
            self.subsection,
            self.category,
        ]
        .contains(&Some(col))
    }

    fn empty_header() -> Self {
        Self {
            name: None,
            unit: None,
            quantity: None,
            apartment: None,
            section: None,
            subsection: None,
            category: None,
            variant: None,
            section_or_apartment: Field::Section.positional_index(),
            has_header: true,
            positional: false,
        }
    }
}

fn normalize_header(text: &str) -> String {
    text.trim().to_lowercase().replace('ё', "е")
}

/// Первая строка похожа на заголовок: хотя бы одна ячейка совпадает с шаблоном поля
pub fn is_header_row(cells: &[String]) -> bool {
    cells.iter().map(|c| normalize_header(c)).any(|cell| {
        !cell.is_empty() && Field::ALL.iter().any(|field| field.pattern().is_match(&cell))
    })
}

/// Разобрать строку заголовка: сначала точные совпадения, затем по ключевым словам
pub fn resolve_header(cells: &[String]) -> ColumnMap {
    let normalized: Vec<String> = cells.iter().map(|c| normalize_header(c)).collect();
    let mut map = ColumnMap::empty_header();
    let mut claimed = vec![false; normalized.len()];

    for field in Field::ALL {
        let found = normalized.iter().enumerate().find(|(idx, cell)| {
            !claimed[*idx] && field.canonical_labels().contains(&cell.as_str())
        });
        if let Some((idx, _)) = found {
            claimed[idx] = true;
            map.set(field, idx);
        }
    }

    for field in Field::ALL {
        if map.get(field).is_some() {
            continue;
        }
        let found = normalized
            .iter()
            .enumerate()
            .find(|(idx, cell)| !claimed[*idx] && !cell.is_empty() && field.pattern().is_match(cell));
        if let Some((idx, _)) = found {
            claimed[idx] = true;
            map.set(field, idx);
        }
    }

    map.section_or_apartment = map
        .section
        .or(map.apartment)
        .unwrap_or(Field::Section.positional_index());
    map
}

/// Определить раскладку колонок для таблицы
pub fn locate_columns<G: CellGrid + ?Sized>(grid: &G) -> ColumnMap {
    if grid.row_count() == 0 {
        return ColumnMap::positional(false);
    }

    let header = grid.row_cells(0);
    if !is_header_row(&header) {
        tracing::debug!("No header row detected, using positional columns");
        return ColumnMap::positional(false);
    }

    let map = resolve_header(&header);
    if map.name.is_none() {
        // Заголовок без колонки наименования равнозначен отсутствию заголовка:
        // первая строка разбирается как данные
        tracing::info!(
            "Header row detected but name column not found ({:?}), using positional columns",
            header
        );
        return ColumnMap::positional(false);
    }

    tracing::debug!("Resolved header columns: {:?}", map);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_header_match() {
        let header = cells(&[
            "№",
            "Раздел",
            "Подраздел",
            "Категория",
            "Наименование",
            "Тип",
            "Кол-во",
            "Ед",
        ]);
        let map = resolve_header(&header);
        assert_eq!(map.section, Some(1));
        assert_eq!(map.subsection, Some(2));
        assert_eq!(map.category, Some(3));
        assert_eq!(map.name, Some(4));
        assert_eq!(map.variant, Some(5));
        assert_eq!(map.quantity, Some(6));
        assert_eq!(map.unit, Some(7));
        assert_eq!(map.apartment, None);
        assert_eq!(map.section_or_apartment, 1);
        assert!(map.has_header);
        assert!(!map.positional);
    }

    #[test]
    fn test_loose_header_match() {
        let header = cells(&[
            "Квартира / помещение",
            "Наименование работ и материалов (по проекту)",
            "Единица измерения",
            "Объём работ",
        ]);
        let map = resolve_header(&header);
        assert_eq!(map.apartment, Some(0));
        assert_eq!(map.name, Some(1));
        assert_eq!(map.unit, Some(2));
        assert_eq!(map.quantity, Some(3));
        assert_eq!(map.section, None);
        assert_eq!(map.section_or_apartment, 0);
    }

    #[test]
    fn test_subsection_not_taken_as_section() {
        let map = resolve_header(&cells(&["Подраздел работ", "Наименование"]));
        assert_eq!(map.subsection, Some(0));
        assert_eq!(map.section, None);
        assert_eq!(map.section_or_apartment, 1);
    }

    #[test]
    fn test_exact_match_wins_over_loose() {
        let map = resolve_header(&cells(&["Количество материала", "Наименование", "Кол-во"]));
        assert_eq!(map.quantity, Some(2));
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header_row(&cells(&["", "Наименование", ""])));
        assert!(is_header_row(&cells(&["Ед. изм."])));
        assert!(!is_header_row(&cells(&["Кв. 5", "Отделка", "", "", "Штукатурка", "", "50", "м2"])));
        assert!(!is_header_row(&cells(&[])));
    }

    #[test]
    fn test_no_header_uses_positional() {
        let grid: Vec<Vec<String>> = vec![cells(&["", "Отделка", "", "", "Штукатурка", "", "50", "м2"])];
        let map = locate_columns(&grid);
        assert_eq!(map, ColumnMap::positional(false));
        assert_eq!(map.first_data_row(), 0);
    }

    #[test]
    fn test_header_without_name_falls_back_to_positional() {
        let grid: Vec<Vec<String>> = vec![cells(&["Раздел", "Кол-во", "Ед"])];
        let map = locate_columns(&grid);
        assert_eq!(map, ColumnMap::positional(false));
        assert_eq!(map.first_data_row(), 0);
    }

    #[test]
    fn test_apartment_marker_in_first_row_is_data() {
        let grid: Vec<Vec<String>> = vec![
            cells(&["Квартира 1", "", "", "", "", "", "", ""]),
            cells(&["", "Отделка", "", "", "Штукатурка", "", "50", "м2"]),
        ];
        assert!(is_header_row(&grid[0]));
        let map = locate_columns(&grid);
        assert!(map.positional);
        assert!(!map.has_header);
        assert_eq!(map.first_data_row(), 0);
    }

    #[test]
    fn test_positional_layout() {
        let map = ColumnMap::positional(false);
        assert_eq!(map.apartment, Some(0));
        assert_eq!(map.name, Some(4));
        assert_eq!(map.variant, Some(5));
        assert_eq!(map.quantity, Some(6));
        assert_eq!(map.unit, Some(7));
        assert_eq!(map.section_or_apartment, 1);
        assert!(!map.is_item_column(1));
        assert!(map.is_item_column(4));
    }
}
