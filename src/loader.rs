use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::GridError;
use crate::table::{CellValue, TableData};

// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

pub fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(GridError::UnknownFileType),
    }
}

pub fn get_file_info(path: &Path) -> Result<FileInfo, GridError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound,
        ErrorKind::PermissionDenied => GridError::PermissionDenied,
        _ => GridError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(GridError::LoadingFailed(format!(
            "{} is not a file",
            path.display()
        )));
    }

    Ok(FileInfo {
        path: path.to_path_buf(),
        file_size: metadata.len(),
        file_type: detect_file_type(path)?,
    })
}

fn scan_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn scan_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn scan_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

/// Reads a CSV, Parquet or Arrow IPC file into a table, converting every
/// column on its own rayon worker.
pub fn load_table(path: &Path) -> Result<TableData, GridError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?}", file_info);
    let frame = match file_info.file_type {
        FileType::Csv => scan_csv(&file_info.path)?,
        FileType::Parquet => scan_parquet(&file_info.path)?,
        FileType::Arrow => scan_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;
    let table = dataframe_to_table(&df)?;
    info!(
        "Loading {} ({} bytes, {} rows) took {}ms",
        file_info.path.display(),
        file_info.file_size,
        table.num_rows(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}

pub fn dataframe_to_table(df: &DataFrame) -> Result<TableData, GridError> {
    let columns: Result<Vec<(String, Vec<CellValue>)>, PolarsError> = df
        .get_column_names()
        .par_iter()
        .map(|name| convert_column(df, name.as_str()).map(|values| (name.to_string(), values)))
        .collect();
    TableData::new(columns?)
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
            | DataType::UInt64
    )
}

fn timestamp(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let datetime = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    };
    datetime.map(|d| d.naive_utc())
}

fn date(days: i32) -> Option<NaiveDateTime> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn convert_column(df: &DataFrame, name: &str) -> Result<Vec<CellValue>, PolarsError> {
    let column = df.column(name)?;
    let dtype = column.dtype().clone();

    let values = match &dtype {
        DataType::Boolean => column
            .as_materialized_series()
            .bool()?
            .into_iter()
            .map(CellValue::from)
            .collect(),
        dt if is_integer_type(dt) => column
            .cast(&DataType::Int64)?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .map(CellValue::from)
            .collect(),
        DataType::Float32 | DataType::Float64 => column
            .cast(&DataType::Float64)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .map(CellValue::from)
            .collect(),
        DataType::Datetime(unit, _) => column
            .cast(&DataType::Int64)?
            .as_materialized_series()
            .i64()?
            .into_iter()
            .map(|v| CellValue::from(v.and_then(|v| timestamp(v, *unit))))
            .collect(),
        DataType::Date => column
            .cast(&DataType::Int32)?
            .as_materialized_series()
            .i32()?
            .into_iter()
            .map(|v| CellValue::from(v.and_then(date)))
            .collect(),
        _ => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| CellValue::from(v.map(str::to_string)))
            .collect(),
    };
    debug!("Column \"{name}\" of type {dtype} converted");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn detects_file_types_by_extension() {
        assert_eq!(detect_file_type(Path::new("a.csv")).unwrap(), FileType::Csv);
        assert_eq!(detect_file_type(Path::new("a.PQ")).unwrap(), FileType::Parquet);
        assert_eq!(detect_file_type(Path::new("a.feather")).unwrap(), FileType::Arrow);
        assert!(matches!(
            detect_file_type(Path::new("a.xlsx")),
            Err(GridError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            load_table(&fixture("does_not_exist.csv")),
            Err(GridError::FileNotFound)
        ));
        assert!(matches!(
            get_file_info(&fixture("")),
            Err(GridError::LoadingFailed(_))
        ));
    }

    #[test]
    fn csv_columns_become_typed_cells() {
        let table = load_table(&fixture("catalog.csv")).unwrap();
        assert_eq!(table.column_names(), vec!["id", "title", "synopsis", "poster"]);
        assert!(table.num_rows() > 0);
        assert!(matches!(table.value(0, 0), Some(CellValue::Number(_))));
        assert!(matches!(table.value(0, 1), Some(CellValue::Text(_))));
    }

    #[test]
    fn dataframe_types_map_to_cell_values() {
        let df = df!(
            "flag" => [Some(true), None],
            "count" => [1i32, 2],
            "price" => [1.5f64, 2.25],
            "name" => ["a", "b"],
        )
        .unwrap();
        let table = dataframe_to_table(&df).unwrap();
        assert_eq!(table.value(0, 0), Some(&CellValue::Bool(true)));
        assert_eq!(table.value(1, 0), Some(&CellValue::Null));
        assert_eq!(table.value(1, 1), Some(&CellValue::Number(2.0)));
        assert_eq!(table.value(1, 2), Some(&CellValue::Number(2.25)));
        assert_eq!(table.value(0, 3), Some(&CellValue::from("a")));
    }

    #[test]
    fn epoch_conversions() {
        let ts = timestamp(86_400_000, TimeUnit::Milliseconds).unwrap();
        assert_eq!(ts.to_string(), "1970-01-02 00:00:00");
        assert_eq!(date(1).unwrap(), ts);
        assert_eq!(date(i32::MAX), None);
        assert_eq!(date(i32::MIN), None);
    }
}
