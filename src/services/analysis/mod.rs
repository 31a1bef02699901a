//! The statistical pipeline. Every operation is a pure function of the
//! dataframe and its arguments.

pub mod bivariate;
pub mod classifier;
pub mod descriptive;
pub mod frequency;
pub mod text;
pub mod types;

use polars::prelude::DataFrame;

use crate::error::AnalysisError;
use crate::services::dataset;

pub use bivariate::{chi_square_test, correlation_analysis, correlation_matrix};
pub use classifier::{classify_columns, dataset_overview};
pub use descriptive::descriptive_stats;
pub use frequency::frequency_table;
pub use text::tokenize_text;
pub use types::*;

pub fn describe_column(df: &DataFrame, column: &str) -> Result<DescriptiveSummary, AnalysisError> {
    let values = dataset::numeric_values(df, column)?;
    descriptive_stats(column, &values)
}

pub fn column_frequencies(df: &DataFrame, column: &str) -> Result<FrequencyTable, AnalysisError> {
    let values = dataset::label_values(df, column)?;
    Ok(frequency_table(column, &values))
}

pub fn column_tokens(df: &DataFrame, column: &str) -> Result<TokenFrequency, AnalysisError> {
    let values = dataset::label_values(df, column)?;
    Ok(tokenize_text(&values))
}
