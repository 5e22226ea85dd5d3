use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tracing::trace;

use crate::column::Column;
use crate::value::{NULL, Row, Value};

/// Fields the free-text search looks at unless configured otherwise.
pub const DEFAULT_SEARCH_FIELDS: [&str; 9] = [
    "fullName",
    "manager",
    "phoneNumber",
    "customerName",
    "productName",
    "firstName",
    "lastName",
    "address",
    "passportSeries",
];

/// Fields whose object values are matched and sorted by person name.
pub const DEFAULT_PERSON_FIELDS: [&str; 1] = ["manager"];

/// Column id -> substring filter.
pub type FilterValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub search_fields: Vec<String>,
    pub person_fields: Vec<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            search_fields: DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
            person_fields: DEFAULT_PERSON_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl QueryConfig {
    pub fn is_person_field(&self, key: &str) -> bool {
        self.person_fields.iter().any(|f| f == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Filter,
    Sort,
    Columns,
}

/// Where the filter, sort and column menus were opened from. An anchor is the position of
/// the header cell (in visible-column order) the menu hangs off.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuAnchors {
    filter: Option<usize>,
    sort: Option<usize>,
    columns: Option<usize>,
}

impl MenuAnchors {
    fn slot(&mut self, kind: MenuKind) -> &mut Option<usize> {
        match kind {
            MenuKind::Filter => &mut self.filter,
            MenuKind::Sort => &mut self.sort,
            MenuKind::Columns => &mut self.columns,
        }
    }

    pub fn get(&self, kind: MenuKind) -> Option<usize> {
        match kind {
            MenuKind::Filter => self.filter,
            MenuKind::Sort => self.sort,
            MenuKind::Columns => self.columns,
        }
    }
}

/// Per-view query state. Created when a table view is mounted and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct TableState {
    search_text: String,
    filter_values: FilterValues,
    sort: Option<SortConfig>,
    selected_columns: HashSet<String>,
    anchors: MenuAnchors,
}

impl TableState {
    /// Fresh state with every column of the schema selected.
    pub fn new(columns: &[Column]) -> Self {
        Self {
            selected_columns: columns.iter().map(|c| c.id.clone()).collect(),
            ..Self::default()
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn filter_values(&self) -> &FilterValues {
        &self.filter_values
    }

    pub fn sort(&self) -> Option<&SortConfig> {
        self.sort.as_ref()
    }

    pub fn is_selected(&self, column_id: &str) -> bool {
        self.selected_columns.contains(column_id)
    }

    pub fn anchors(&self) -> &MenuAnchors {
        &self.anchors
    }

    pub fn menu_anchor(&self, kind: MenuKind) -> Option<usize> {
        self.anchors.get(kind)
    }

    /// Replaces the search query. An empty query disables search.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Sets the filter of one column. An empty value removes it.
    pub fn set_filter_value(&mut self, column_id: impl Into<String>, value: impl Into<String>) {
        let column_id = column_id.into();
        let value = value.into();
        if value.is_empty() {
            self.filter_values.remove(&column_id);
        } else {
            self.filter_values.insert(column_id, value);
        }
    }

    pub fn clear_filter(&mut self, column_id: &str) {
        self.filter_values.remove(column_id);
    }

    pub fn clear_filters(&mut self) {
        self.filter_values.clear();
    }

    /// Requesting the active key again flips its direction, any other key starts ascending.
    pub fn set_sort(&mut self, column_id: &str) {
        let direction = match &self.sort {
            Some(active) if active.key == column_id => active.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortConfig {
            key: column_id.to_string(),
            direction,
        });
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn toggle_column(&mut self, column_id: &str) {
        if !self.selected_columns.remove(column_id) {
            self.selected_columns.insert(column_id.to_string());
        }
    }

    /// Selected columns in schema order.
    pub fn visible_columns<'a>(&self, columns: &'a [Column]) -> Vec<&'a Column> {
        columns.iter().filter(|c| self.is_selected(&c.id)).collect()
    }

    pub fn open_menu(&mut self, kind: MenuKind, anchor: usize) {
        *self.anchors.slot(kind) = Some(anchor);
    }

    pub fn close_menu(&mut self, kind: MenuKind) {
        *self.anchors.slot(kind) = None;
    }
}

/// Search, filter and sort over an in-memory row list.
#[derive(Debug, Clone, Default)]
pub struct TableQueryEngine {
    pub config: QueryConfig,
    pub state: TableState,
}

impl TableQueryEngine {
    pub fn new(config: QueryConfig, columns: &[Column]) -> Self {
        Self {
            config,
            state: TableState::new(columns),
        }
    }

    /// Positions of the derived view in `rows`.
    ///
    /// The view is always rebuilt from the full source list: search, then the column
    /// filters, then the sort. Reordering these steps changes the result.
    pub fn derive_indices(&self, rows: &[Row]) -> Vec<usize> {
        let start_time = Instant::now();
        let all: Vec<usize> = (0..rows.len()).collect();

        let searched = apply_search(rows, &all, &self.state.search_text, &self.config);
        let filtered = apply_filters(rows, &searched, &self.state.filter_values, &self.config);
        let derived = match &self.state.sort {
            Some(sort) => apply_sort(rows, &filtered, sort, &self.config),
            None => filtered,
        };

        trace!(
            "Derived {} of {} rows ({} after search, {} filters) in {}us",
            derived.len(),
            rows.len(),
            searched.len(),
            self.state.filter_values.len(),
            start_time.elapsed().as_micros()
        );
        derived
    }

    pub fn derive<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        self.derive_indices(rows)
            .into_iter()
            .map(|idx| &rows[idx])
            .collect()
    }
}

fn field<'a>(row: &'a Row, key: &str) -> &'a Value {
    row.get(key).unwrap_or(&NULL)
}

/// True if any candidate field of `row` contains `needle`. `needle` must be lowercase.
pub fn row_matches_search(row: &Row, needle: &str, config: &QueryConfig) -> bool {
    config.search_fields.iter().any(|key| {
        let value = field(row, key);
        if value.is_null() {
            return false;
        }
        let haystack = match value.person_name() {
            Some(name) if config.is_person_field(key) => name,
            _ => value.to_string(),
        };
        haystack.to_lowercase().contains(needle)
    })
}

/// Keeps the rows of `mask` that match `text` in any candidate field, in mask order.
pub fn apply_search(rows: &[Row], mask: &[usize], text: &str, config: &QueryConfig) -> Vec<usize> {
    if text.is_empty() {
        return mask.to_vec();
    }
    let needle = text.to_lowercase();
    mask.iter()
        .copied()
        .filter(|&idx| row_matches_search(&rows[idx], &needle, config))
        .collect()
}

/// Whether `row` passes the filter `value` on column `key`.
///
/// Object values only filter through the person name on person fields; every other object
/// value passes, as do nulls and booleans.
pub fn row_passes_filter(row: &Row, key: &str, value: &str, config: &QueryConfig) -> bool {
    if value.is_empty() {
        return true;
    }
    match field(row, key) {
        Value::Object(_) if config.is_person_field(key) => field(row, key)
            .person_name()
            .unwrap_or_default()
            .to_lowercase()
            .contains(&value.to_lowercase()),
        Value::Text(s) | Value::Date(s) => s.to_lowercase().contains(&value.to_lowercase()),
        number @ (Value::Int(_) | Value::Number(_)) => number.to_string().contains(value),
        _ => true,
    }
}

/// Keeps the rows of `mask` that pass every filter.
pub fn apply_filters(
    rows: &[Row],
    mask: &[usize],
    filters: &FilterValues,
    config: &QueryConfig,
) -> Vec<usize> {
    if filters.is_empty() {
        return mask.to_vec();
    }
    mask.iter()
        .copied()
        .filter(|&idx| {
            filters
                .iter()
                .all(|(key, value)| row_passes_filter(&rows[idx], key, value, config))
        })
        .collect()
}

fn sort_key<'a>(row: &'a Row, key: &str, config: &QueryConfig) -> Cow<'a, Value> {
    let value = field(row, key);
    match value.person_name() {
        Some(name) if config.is_person_field(key) => Cow::Owned(Value::Text(name)),
        _ => Cow::Borrowed(value),
    }
}

/// Orders the rows of `mask` by `sort.key`. The sort is stable: rows with equal keys keep
/// their order from `mask` in both directions.
pub fn apply_sort(rows: &[Row], mask: &[usize], sort: &SortConfig, config: &QueryConfig) -> Vec<usize> {
    let mut indexed_rows: Vec<(usize, Cow<Value>)> = mask
        .iter()
        .map(|&idx| (idx, sort_key(&rows[idx], &sort.key, config)))
        .collect();

    match sort.direction {
        SortDirection::Ascending => indexed_rows.sort_by(|(_, a), (_, b)| a.natural_cmp(b)),
        SortDirection::Descending => indexed_rows.sort_by(|(_, a), (_, b)| b.natural_cmp(a)),
    }

    indexed_rows.into_iter().map(|(idx, _)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{person, row};

    fn people() -> Vec<Row> {
        vec![
            row([("fullName", "Ali"), ("phoneNumber", "900000001")]),
            row([("fullName", "Vali"), ("phoneNumber", "900000002")]),
        ]
    }

    fn engine() -> TableQueryEngine {
        TableQueryEngine::default()
    }

    fn names(rows: &[&Row], key: &str) -> Vec<String> {
        rows.iter().map(|r| r[key].to_string()).collect()
    }

    #[test]
    fn empty_state_is_identity() {
        let rows = people();
        assert_eq!(engine().derive_indices(&rows), vec![0, 1]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let rows = people();
        let mut engine = engine();
        engine.state.set_search_text("ali");
        assert_eq!(names(&engine.derive(&rows), "fullName"), ["Ali", "Vali"]);

        engine.state.set_search_text("ALI");
        assert_eq!(engine.derive(&rows).len(), 2);

        engine.state.set_search_text("002");
        assert_eq!(names(&engine.derive(&rows), "fullName"), ["Vali"]);

        engine.state.set_search_text("zzz");
        assert!(engine.derive(&rows).is_empty());
    }

    #[test]
    fn search_skips_fields_outside_the_allow_list() {
        let rows = vec![row([("fullName", "Ali"), ("status", "active")])];
        let mut engine = engine();
        engine.state.set_search_text("active");
        assert!(engine.derive(&rows).is_empty());

        engine.config.search_fields.push("status".into());
        assert_eq!(engine.derive(&rows).len(), 1);
    }

    #[test]
    fn search_matches_manager_by_full_name() {
        let rows = vec![
            row([("manager", person("Ali", "Valiyev"))]),
            row([("manager", person("Bobur", "Karimov"))]),
        ];
        let mut engine = engine();
        engine.state.set_search_text("ali val");
        assert_eq!(engine.derive_indices(&rows), vec![0]);
    }

    #[test]
    fn search_ignores_null_fields() {
        let rows = vec![row([("fullName", Value::Null)])];
        let mut engine = engine();
        engine.state.set_search_text("n");
        assert!(engine.derive(&rows).is_empty());
    }

    #[test]
    fn filter_by_column_substring() {
        let rows = people();
        let mut engine = engine();
        engine.state.set_filter_value("fullName", "v");
        assert_eq!(names(&engine.derive(&rows), "fullName"), ["Vali"]);
    }

    #[test]
    fn filters_combine_with_and() {
        let rows = people();
        let mut engine = engine();
        engine.state.set_filter_value("fullName", "ali");
        engine.state.set_filter_value("phoneNumber", "001");
        assert_eq!(engine.derive_indices(&rows), vec![0]);
    }

    #[test]
    fn number_filters_match_the_stringified_number() {
        let rows = vec![row([("amount", 1500)]), row([("amount", 200)])];
        assert!(row_passes_filter(&rows[0], "amount", "50", &QueryConfig::default()));
        assert!(!row_passes_filter(&rows[1], "amount", "50", &QueryConfig::default()));
    }

    #[test]
    fn long_numeric_ids_filter_on_every_digit() {
        let rows = vec![row([("contractId", 9_007_199_254_740_993_i64)])];
        assert!(row_passes_filter(&rows[0], "contractId", "0993", &QueryConfig::default()));
        assert!(!row_passes_filter(&rows[0], "contractId", "0992", &QueryConfig::default()));
    }

    #[test]
    fn object_fields_other_than_manager_always_pass() {
        let config = QueryConfig::default();
        let r = row([("manager", person("Ali", "Valiyev")), ("customer", person("Bobur", "K"))]);
        assert!(row_passes_filter(&r, "customer", "nothing like it", &config));
        assert!(row_passes_filter(&r, "manager", "ali v", &config));
        assert!(!row_passes_filter(&r, "manager", "bobur", &config));
    }

    #[test]
    fn nulls_and_missing_fields_pass_filters() {
        let config = QueryConfig::default();
        let r = row([("paid", Value::Bool(true)), ("note", Value::Null)]);
        assert!(row_passes_filter(&r, "paid", "x", &config));
        assert!(row_passes_filter(&r, "note", "x", &config));
        assert!(row_passes_filter(&r, "absent", "x", &config));
    }

    #[test]
    fn empty_filter_value_removes_the_filter() {
        let mut state = TableState::default();
        state.set_filter_value("fullName", "v");
        state.set_filter_value("fullName", "");
        assert!(state.filter_values().is_empty());
    }

    #[test]
    fn clearing_filters_restores_the_row_count() {
        let rows = people();
        let mut engine = engine();
        engine.state.set_filter_value("fullName", "v");
        engine.state.set_filter_value("phoneNumber", "9");
        assert_eq!(engine.derive(&rows).len(), 1);
        engine.state.clear_filter("fullName");
        assert_eq!(engine.derive(&rows).len(), 2);
        engine.state.set_filter_value("fullName", "v");
        engine.state.clear_filters();
        assert_eq!(engine.derive(&rows).len(), 2);
    }

    #[test]
    fn sort_toggles_direction_on_the_same_key() {
        let rows = vec![row([("amount", 300)]), row([("amount", 100)]), row([("amount", 200)])];
        let mut engine = engine();
        engine.state.set_sort("amount");
        assert_eq!(names(&engine.derive(&rows), "amount"), ["100", "200", "300"]);
        engine.state.set_sort("amount");
        assert_eq!(names(&engine.derive(&rows), "amount"), ["300", "200", "100"]);
        engine.state.set_sort("amount");
        assert_eq!(engine.state.sort().map(|s| s.direction), Some(SortDirection::Ascending));
    }

    #[test]
    fn sort_on_a_new_key_starts_ascending() {
        let mut state = TableState::default();
        state.set_sort("amount");
        state.set_sort("amount");
        state.set_sort("fullName");
        assert_eq!(
            state.sort(),
            Some(&SortConfig {
                key: "fullName".into(),
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn sort_by_manager_uses_the_full_name() {
        let rows = vec![
            row([("manager", person("Vali", "Aliyev"))]),
            row([("manager", person("Ali", "Valiyev"))]),
            row([("manager", person("Ali", "Karimov"))]),
        ];
        let mut engine = engine();
        engine.state.set_sort("manager");
        assert_eq!(engine.derive_indices(&rows), vec![2, 1, 0]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let rows = vec![
            row([("status", "b"), ("id", "1")]),
            row([("status", "a"), ("id", "2")]),
            row([("status", "b"), ("id", "3")]),
        ];
        let mut engine = engine();
        engine.state.set_sort("status");
        assert_eq!(engine.derive_indices(&rows), vec![1, 0, 2]);
        engine.state.set_sort("status");
        assert_eq!(engine.derive_indices(&rows), vec![0, 2, 1]);
    }

    #[test]
    fn sort_applies_after_search_and_filter() {
        let rows = vec![
            row([("fullName", Value::from("Vali")), ("amount", Value::from(3))]),
            row([("fullName", Value::from("Bobur")), ("amount", Value::from(1))]),
            row([("fullName", Value::from("Ali")), ("amount", Value::from(2))]),
        ];
        let mut engine = engine();
        engine.state.set_search_text("ali");
        engine.state.set_sort("amount");
        assert_eq!(engine.derive_indices(&rows), vec![2, 0]);
    }

    #[test]
    fn toggle_column_flips_selection() {
        let columns = vec![Column::new("fullName", "Full Name"), Column::new("amount", "Amount")];
        let mut state = TableState::new(&columns);
        state.toggle_column("amount");
        let visible: Vec<&str> = state.visible_columns(&columns).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, ["fullName"]);
        state.toggle_column("amount");
        assert_eq!(state.visible_columns(&columns).len(), 2);
    }

    #[test]
    fn menus_keep_independent_anchors() {
        let mut state = TableState::default();
        state.open_menu(MenuKind::Filter, 2);
        state.open_menu(MenuKind::Columns, 0);
        assert_eq!(state.menu_anchor(MenuKind::Filter), Some(2));
        assert_eq!(state.menu_anchor(MenuKind::Sort), None);
        state.close_menu(MenuKind::Filter);
        assert_eq!(state.menu_anchor(MenuKind::Filter), None);
        assert_eq!(state.menu_anchor(MenuKind::Columns), Some(0));
    }
}
