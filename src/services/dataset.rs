//! Read-only column accessors over an ingested dataframe.
//!
//! Every pipeline operation goes through these helpers instead of touching
//! polars directly, so that missing-value handling is decided in one place:
//! nulls and float NaNs are both "missing".

use polars::prelude::*;

use crate::error::AnalysisError;

pub fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, AnalysisError> {
    df.column(name)
        .map_err(|_| AnalysisError::UnknownColumn(name.to_string()))
}

pub fn is_numeric(series: &Series) -> bool {
    series.dtype().is_numeric()
}

/// Values of a numeric column as floats, `None` where missing.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
    let series = column(df, name)?;
    if !is_numeric(series) {
        return Err(AnalysisError::NotNumeric(name.to_string()));
    }
    let floats = series
        .cast(&DataType::Float64)
        .map_err(|_| AnalysisError::NotNumeric(name.to_string()))?;
    let ca = floats
        .f64()
        .map_err(|_| AnalysisError::NotNumeric(name.to_string()))?;

    Ok(ca
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Values of any column rendered as strings, `None` where missing.
pub fn label_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, AnalysisError> {
    let series = column(df, name)?;
    if is_numeric(series) {
        let numbers = numeric_values(df, name)?;
        return Ok(numbers.into_iter().map(|v| v.map(format_number)).collect());
    }
    let strings = series
        .cast(&DataType::String)
        .map_err(|_| AnalysisError::UnknownColumn(name.to_string()))?;
    let ca = strings
        .str()
        .map_err(|_| AnalysisError::UnknownColumn(name.to_string()))?;

    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Integral floats print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Pairs of values where both columns are present.
pub fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "score" => &[Some(1.0), None, Some(f64::NAN), Some(4.5)],
            "group" => &[Some("a"), Some("b"), None, Some("a")]
        )
        .unwrap()
    }

    #[test]
    fn nan_and_null_are_both_missing() {
        let values = numeric_values(&sample(), "score").unwrap();
        assert_eq!(values, vec![Some(1.0), None, None, Some(4.5)]);
    }

    #[test]
    fn text_column_is_not_numeric() {
        assert_eq!(
            numeric_values(&sample(), "group"),
            Err(AnalysisError::NotNumeric("group".into()))
        );
    }

    #[test]
    fn labels_render_integral_floats_plainly() {
        let labels = label_values(&sample(), "score").unwrap();
        assert_eq!(labels, vec![Some("1".into()), None, None, Some("4.5".into())]);
    }

    #[test]
    fn unknown_column_is_reported() {
        assert_eq!(
            label_values(&sample(), "missing"),
            Err(AnalysisError::UnknownColumn("missing".into()))
        );
    }

    #[test]
    fn complete_pairs_drop_partial_rows() {
        let (x, y) = complete_pairs(&[Some(1.0), None, Some(3.0)], &[Some(2.0), Some(5.0), None]);
        assert_eq!(x, vec![1.0]);
        assert_eq!(y, vec![2.0]);
    }
}
