//! Search, filter and sort for dashboard tables.
//!
//! [`query::TableQueryEngine`] turns an in-memory row list plus the per-view
//! [`query::TableState`] into the derived view shown by a table: free-text search over a
//! configurable set of fields, per-column substring filters and a single-key sort, always
//! applied in that order. The remaining modules load rows from files and drive the engine
//! from a terminal ui.

pub mod column;
pub mod controller;
pub mod domain;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod pagination;
pub mod query;
pub mod ui;
pub mod value;

pub use column::{Column, infer_columns};
pub use domain::{TQConfig, TQError};
pub use loader::{Dataset, load_rows};
pub use pagination::Pagination;
pub use query::{
    FilterValues, MenuKind, QueryConfig, SortConfig, SortDirection, TableQueryEngine, TableState,
};
pub use value::{Row, Value};
