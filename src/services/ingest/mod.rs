pub mod csv;
pub mod excel;

use std::collections::HashSet;
use std::path::Path;

use bytes::Bytes;
use polars::prelude::DataFrame;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Result<Self, IngestError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xls" | "xlsx" => Ok(FileKind::Excel),
            _ => Err(IngestError::UnsupportedFileType(file_name.to_string())),
        }
    }
}

/// Parses an uploaded file into a dataframe, dispatching on its extension.
pub fn load_dataset(file_name: &str, data: Bytes) -> Result<DataFrame, IngestError> {
    let kind = FileKind::from_file_name(file_name)?;
    tracing::info!("Loading {} ({:?}, {} bytes)", file_name, kind, data.len());

    let df = match kind {
        FileKind::Csv => csv::read_csv(&data)?,
        FileKind::Excel => excel::read_workbook(data)?,
    };

    if df.width() == 0 {
        return Err(IngestError::EmptyDataset);
    }
    tracing::info!("Loaded {} rows x {} columns from {}", df.height(), df.width(), file_name);
    Ok(df)
}

/// Makes a header unique among those already taken: `name`, `name.1`, `name.2`...
/// Empty headers become `Unnamed: <idx>`.
pub fn unique_header(raw: &str, idx: usize, existing_names: &mut HashSet<String>) -> String {
    let trimmed = raw.trim();
    let base = if trimmed.is_empty() {
        format!("Unnamed: {}", idx)
    } else {
        trimmed.to_string()
    };

    let mut name = base.clone();
    let mut counter = 1;
    while !existing_names.insert(name.clone()) {
        name = format!("{}.{}", base, counter);
        counter += 1;
    }
    name
}
