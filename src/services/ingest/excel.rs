use std::collections::HashSet;
use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;

use super::unique_header;
use crate::error::IngestError;

/// Days between the spreadsheet epoch (1899-12-30) and 1970-01-01.
const EXCEL_UNIX_EPOCH_DAYS: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Numeric,
    Boolean,
    DateTime,
    String,
}

/// Numeric, boolean or date only when every non-empty cell agrees.
pub fn detect_column_type(values: &[Data]) -> CellType {
    let mut filled = values.iter().filter(|v| !matches!(v, Data::Empty)).peekable();
    if filled.peek().is_none() {
        return CellType::String;
    }

    let mut numeric = true;
    let mut boolean = true;
    let mut datetime = true;
    for value in filled {
        numeric &= matches!(value, Data::Float(_) | Data::Int(_));
        boolean &= matches!(value, Data::Bool(_));
        datetime &= matches!(value, Data::DateTime(_));
    }

    match () {
        _ if numeric => CellType::Numeric,
        _ if boolean => CellType::Boolean,
        _ if datetime => CellType::DateTime,
        _ => CellType::String,
    }
}

fn column_series(header: &str, values: &[Data]) -> Result<Series, IngestError> {
    let series = match detect_column_type(values) {
        CellType::Numeric => {
            let nums: Vec<Option<f64>> = values
                .iter()
                .map(|v| match v {
                    Data::Float(f) => Some(*f),
                    Data::Int(i) => Some(*i as f64),
                    _ => None,
                })
                .collect();
            Series::new(header, nums)
        }
        CellType::Boolean => {
            let flags: Vec<Option<bool>> = values
                .iter()
                .map(|v| match v {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(header, flags)
        }
        CellType::DateTime => {
            let millis: Vec<Option<i64>> = values
                .iter()
                .map(|v| match v {
                    Data::DateTime(d) => {
                        Some(((d.as_f64() - EXCEL_UNIX_EPOCH_DAYS) * MILLIS_PER_DAY).round() as i64)
                    }
                    _ => None,
                })
                .collect();
            Series::new(header, millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .map_err(|e| IngestError::Excel(format!("Failed to convert dates in {}: {}", header, e)))?
        }
        CellType::String => {
            let strings: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    Data::Empty => None,
                    Data::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Series::new(header, strings)
        }
    };
    Ok(series)
}

/// Builds a dataframe from sheet rows; the first row holds the headers.
pub fn create_dataframe(rows: &[Vec<Data>]) -> Result<DataFrame, IngestError> {
    let Some(header_row) = rows.first() else {
        return Err(IngestError::EmptyDataset);
    };

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| unique_header(&cell.to_string(), idx, &mut existing_names))
        .collect();

    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let values: Vec<Data> = rows
            .iter()
            .skip(1)
            .map(|row| row.get(col_idx).cloned().unwrap_or(Data::Empty))
            .collect();
        columns.push(column_series(header, &values)?);
    }

    DataFrame::new(columns).map_err(|e| IngestError::Excel(format!("Failed to create DataFrame: {}", e)))
}

/// Reads the first worksheet of an xls or xlsx workbook.
pub fn read_workbook(data: Bytes) -> Result<DataFrame, IngestError> {
    let cursor = Cursor::new(data.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| IngestError::Excel(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names();
    let Some(sheet_name) = sheet_names.first() else {
        return Err(IngestError::EmptyDataset);
    };
    tracing::debug!("Reading sheet {} of {}", sheet_name, sheet_names.len());

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| IngestError::Excel(format!("Failed to read worksheet {}: {}", sheet_name, e)))?;

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    if rows.is_empty() {
        tracing::warn!("Sheet {} is empty", sheet_name);
        return Err(IngestError::EmptyDataset);
    }
    create_dataframe(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn column_types_require_agreement() {
        assert_eq!(detect_column_type(&[Data::Float(1.0), Data::Empty, Data::Int(2)]), CellType::Numeric);
        assert_eq!(detect_column_type(&[Data::Bool(true), Data::Bool(false)]), CellType::Boolean);
        assert_eq!(detect_column_type(&[Data::Float(1.0), text("n/a")]), CellType::String);
        assert_eq!(detect_column_type(&[Data::Empty, Data::Empty]), CellType::String);
    }

    #[test]
    fn rows_become_typed_columns() {
        let rows = vec![
            vec![text("score"), text("group"), text("score")],
            vec![Data::Float(1.5), text("a"), Data::Int(3)],
            vec![Data::Empty, text("b"), Data::Int(4)],
            vec![Data::Int(7), Data::Empty],
        ];
        let df = create_dataframe(&rows).unwrap();

        assert_eq!(df.get_column_names(), vec!["score", "group", "score.1"]);
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("score").unwrap().null_count(), 1);
        assert_eq!(df.column("group").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("group").unwrap().null_count(), 1);
        assert_eq!(df.column("score.1").unwrap().null_count(), 1);
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let df = create_dataframe(&[vec![text("a"), text("b")]]).unwrap();
        assert_eq!(df.shape(), (0, 2));
    }

    #[test]
    fn garbage_bytes_are_an_excel_error() {
        let result = read_workbook(Bytes::from_static(b"definitely not a workbook"));
        assert!(matches!(result, Err(IngestError::Excel(_))));
    }
}
