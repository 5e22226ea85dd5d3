use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::TQError;
use crate::value::{Row, Value};

#[derive(Debug, PartialEq)]
enum FileType {
    JSON,
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// Rows read from a file, with the field names in the order they first appeared.
#[derive(Debug, Default)]
pub struct Dataset {
    pub name: String,
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn load_rows(path: PathBuf) -> Result<Dataset, TQError> {
    let file_info = get_file_info(path)?;
    let start_time = Instant::now();
    debug!(
        "Loading {:?} file {:?} ({} bytes)",
        file_info.file_type, file_info.path, file_info.file_size
    );

    let (fields, rows) = match file_info.file_type {
        FileType::JSON => load_json(&file_info.path)?,
        FileType::CSV => load_frame(load_csv(&file_info.path)?)?,
        FileType::PARQUET => load_frame(load_parquet(&file_info.path)?)?,
        FileType::ARROW => load_frame(load_arrow(&file_info.path)?)?,
    };

    info!(
        "Loaded {} rows with {} fields in {}ms",
        rows.len(),
        fields.len(),
        start_time.elapsed().as_millis()
    );

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();
    Ok(Dataset { name, fields, rows })
}

fn detect_file_type(path: &Path) -> Result<FileType, TQError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("JSON") => Ok(FileType::JSON),
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TQError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TQError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TQError::FileNotFound,
        ErrorKind::PermissionDenied => TQError::PermissionDenied,
        _ => TQError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TQError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

// -------------------------------- JSON -------------------------------- //

/// Accepts a bare array of objects or the backend's `{"data": [...]}` envelope.
fn load_json(path: &Path) -> Result<(Vec<String>, Vec<Row>), TQError> {
    let reader = BufReader::new(File::open(path)?);
    let document: serde_json::Value = serde_json::from_reader(reader)?;
    rows_from_json(document)
}

pub fn rows_from_json(document: serde_json::Value) -> Result<(Vec<String>, Vec<Row>), TQError> {
    let items = match document {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut envelope) => match envelope.remove("data") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(TQError::LoadingFailed(
                    "expected an array of rows or a \"data\" array".into(),
                ));
            }
        },
        _ => return Err(TQError::LoadingFailed("expected an array of rows".into())),
    };

    let mut fields: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(object) = item else {
            return Err(TQError::LoadingFailed(format!("row {idx} is not an object")));
        };
        let mut row = Row::with_capacity(object.len());
        for (key, value) in object {
            if !fields.contains(&key) {
                fields.push(key.clone());
            }
            row.insert(key, Value::from(value));
        }
        rows.push(row);
    }
    Ok((fields, rows))
}

// ----------------------------- Tabular files ---------------------------- //

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
    )
}

fn is_temporal_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Date | DataType::Datetime(..) | DataType::Time | DataType::Duration(..)
    )
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Value>, PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();

    if dtype == DataType::Boolean {
        let series = column.as_materialized_series().bool()?;
        return Ok(series.into_iter().map(Value::from).collect());
    }
    if dtype == DataType::UInt64 {
        let series = column.as_materialized_series().u64()?;
        return Ok(series.into_iter().map(Value::from).collect());
    }
    if is_integer_type(&dtype) {
        let cast = column.cast(&DataType::Int64)?;
        let series = cast.as_materialized_series().i64()?;
        return Ok(series.into_iter().map(Value::from).collect());
    }
    if dtype.is_float() {
        let cast = column.cast(&DataType::Float64)?;
        let series = cast.as_materialized_series().f64()?;
        return Ok(series.into_iter().map(Value::from).collect());
    }

    let cast = column.cast(&DataType::String)?;
    let series = cast.str()?;
    let temporal = is_temporal_type(&dtype);
    Ok(series
        .into_iter()
        .map(|value| match value {
            Some(s) if temporal => Value::Date(s.to_string()),
            Some(s) => Value::Text(s.to_string()),
            None => Value::Null,
        })
        .collect())
}

/// Collects the frame and turns it into rows. Each column is converted in its own rayon task.
fn load_frame(frame: LazyFrame) -> Result<(Vec<String>, Vec<Row>), TQError> {
    let df = frame.collect()?;
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let c_: Result<Vec<Vec<Value>>, _> = names
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let columns: Vec<(String, Vec<Value>)> = names.into_iter().zip(c_?).collect();

    Ok(rows_from_columns(columns, df.height()))
}

/// Zips columns into rows. A dotted column name such as `manager.firstName` is folded into
/// an object under `manager`; null parts are left out of that object.
///
/// Field names stay unique: when a plain column and a folded object claim the same name,
/// the one seen first wins and the other column is skipped.
pub fn rows_from_columns(columns: Vec<(String, Vec<Value>)>, height: usize) -> (Vec<String>, Vec<Row>) {
    let mut fields: Vec<String> = Vec::new();
    let mut folded: HashSet<String> = HashSet::new();
    let mut rows: Vec<Row> = vec![Row::new(); height];

    for (name, values) in columns {
        match name.split_once('.') {
            Some((parent, child)) if !parent.is_empty() && !child.is_empty() => {
                if !folded.contains(parent) {
                    if fields.iter().any(|f| f == parent) {
                        warn!("Skipping column {name}, {parent} is already a plain column");
                        continue;
                    }
                    fields.push(parent.to_string());
                    folded.insert(parent.to_string());
                }
                for (row, value) in rows.iter_mut().zip(values) {
                    if value.is_null() {
                        continue;
                    }
                    if let Value::Object(object) = row
                        .entry(parent.to_string())
                        .or_insert_with(|| Value::Object(BTreeMap::new()))
                    {
                        object.insert(child.to_string(), value);
                    }
                }
            }
            _ => {
                if fields.contains(&name) {
                    warn!("Skipping column {name}, the field already exists");
                    continue;
                }
                for (row, value) in rows.iter_mut().zip(values) {
                    row.insert(name.clone(), value);
                }
                fields.push(name.clone());
            }
        }
    }
    (fields, rows)
}
