use derive_setters::Setters;

use crate::value::{Row, Value};

/// Turns a cell value into the text shown in the table.
pub type Formatter = fn(&Value) -> String;

/// A schema entry describing one displayable field of a row.
///
/// Columns are static configuration: build them once per table and never mutate them
/// afterwards. The `id` is the row field the column reads and must be unique within a schema.
#[derive(Debug, Clone, Setters)]
pub struct Column {
    #[setters(skip)]
    pub id: String,
    #[setters(into)]
    pub label: String,
    pub sortable: bool,
    pub filterable: bool,
    #[setters(strip_option)]
    pub format: Option<Formatter>,
}

impl Column {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            sortable: true,
            filterable: true,
            format: None,
        }
    }

    pub fn display(&self, value: &Value) -> String {
        match self.format {
            Some(format) => format(value),
            None => value.to_string(),
        }
    }

    /// Text of this column for `row`, empty when the field is missing.
    pub fn cell(&self, row: &Row) -> String {
        row.get(&self.id)
            .map(|value| self.display(value))
            .unwrap_or_default()
    }
}

/// Cuts an ISO timestamp down to its date part.
pub fn format_date(value: &Value) -> String {
    match value {
        Value::Date(s) | Value::Text(s) => s.get(..10).unwrap_or(s).to_string(),
        other => other.to_string(),
    }
}

/// `customerName` -> `Customer Name`, `passport_series` -> `Passport Series`.
pub fn label_for(id: &str) -> String {
    let mut label = String::with_capacity(id.len() + 4);
    let mut upper_next = true;
    for chr in id.chars() {
        if chr == '_' || chr == '-' || chr == '.' {
            upper_next = true;
            continue;
        }
        if !label.is_empty() && (upper_next || chr.is_uppercase()) {
            label.push(' ');
        }
        if upper_next {
            label.extend(chr.to_uppercase());
        } else {
            label.push(chr);
        }
        upper_next = false;
    }
    label
}

/// Builds a column per field, in the given order. Fields whose first non-null value is a
/// date get the date formatter.
pub fn infer_columns(fields: &[String], rows: &[Row]) -> Vec<Column> {
    fields
        .iter()
        .map(|field| {
            let column = Column::new(field.clone(), label_for(field));
            let first = rows
                .iter()
                .filter_map(|row| row.get(field))
                .find(|value| !value.is_null());
            match first {
                Some(Value::Date(_)) => column.format(format_date as Formatter),
                _ => column,
            }
        })
        .collect()
}
