use std::fmt;
use std::io::Error;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::pagination::DEFAULT_ROWS_PER_PAGE;

#[derive(Debug)]
pub enum TQError {
    IoError(Error),
    PolarsError(PolarsError),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl fmt::Display for TQError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TQError::IoError(e) => write!(f, "io error: {e}"),
            TQError::PolarsError(e) => write!(f, "could not read table: {e}"),
            TQError::JsonError(e) => write!(f, "invalid json: {e}"),
            TQError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            TQError::FileNotFound => f.write_str("file not found"),
            TQError::PermissionDenied => f.write_str("permission denied"),
            TQError::UnknownFileType => {
                f.write_str("unknown file type (expected json, csv, parquet or arrow)")
            }
        }
    }
}

impl std::error::Error for TQError {}

impl From<Error> for TQError {
    fn from(err: Error) -> Self {
        TQError::IoError(err)
    }
}

impl From<PolarsError> for TQError {
    fn from(err: PolarsError) -> Self {
        TQError::PolarsError(err)
    }
}

impl From<serde_json::Error> for TQError {
    fn from(err: serde_json::Error) -> Self {
        TQError::JsonError(err)
    }
}

#[derive(Debug, Clone)]
pub struct TQConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub rows_per_page: usize,
}

impl Default for TQConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 30,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Search,
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    MoreRowsPerPage,
    FewerRowsPerPage,
    Search,
    Filter,
    ClearFilters,
    Sort,
    ClearSort,
    SortMenu,
    ColumnMenu,
    Toggle,
    Enter,
    Exit,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Navigation
  ←↓↑→       move the cursor
  PgUp PgDn  previous / next page
  + -        more / fewer rows per page

Query
  /          search
  f          filter the current column
  F          clear all filters
  s          sort by the current column (again to reverse)
  S          clear the sort
  o          sort menu
  c          column menu (space toggles a column)

  Esc        close a menu or prompt
  ?          this help
  q          quit";
