use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;

use polars::prelude::*;

use super::unique_header;
use crate::error::IngestError;

const CANDIDATE_SEPARATORS: [u8; 4] = [b',', b';', b'\t', b'|'];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Cell spellings read as missing, the usual spreadsheet and dataframe markers.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA",
    "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// UTF-8 with the BOM removed, or Latin-1 when the bytes are not valid UTF-8.
pub fn decode(data: &[u8]) -> Cow<'_, str> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            tracing::debug!("CSV is not valid UTF-8, decoding as Latin-1");
            Cow::Owned(data.iter().map(|&b| b as char).collect())
        }
    }
}

/// The candidate occurring most often in the header line; `,` wins ties.
pub fn sniff_separator(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let mut best = b',';
    let mut best_count = header.bytes().filter(|&b| b == b',').count();
    for &candidate in &CANDIDATE_SEPARATORS[1..] {
        let count = header.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn missing_markers() -> NullValues {
    NullValues::AllColumns(MISSING_MARKERS.iter().map(|m| m.to_string()).collect())
}

pub fn read_csv(data: &[u8]) -> Result<DataFrame, IngestError> {
    let text = decode(data);
    if text.trim().is_empty() {
        return Err(IngestError::EmptyDataset);
    }
    let separator = sniff_separator(&text);
    tracing::debug!("CSV separator {:?}", separator as char);

    let mut df = CsvReader::new(Cursor::new(text.as_bytes()))
        .has_header(true)
        .with_separator(separator)
        // full scan: a late non-numeric value must not fail the read
        .infer_schema(None)
        .with_null_values(Some(missing_markers()))
        .finish()
        .map_err(|e| IngestError::Csv(e.to_string()))?;

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .enumerate()
        .map(|(idx, name)| unique_header(name, idx, &mut existing_names))
        .collect();
    df.set_column_names(&headers)
        .map_err(|e| IngestError::Csv(e.to_string()))?;

    Ok(df)
}
