use std::collections::HashSet;

use polars::prelude::*;
use smallvec::SmallVec;

use super::types::*;
use crate::services::dataset;

fn is_label_like(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Boolean)
}

fn distinct_non_missing(series: &Series) -> usize {
    series
        .cast(&DataType::String)
        .ok()
        .and_then(|s| s.str().ok().map(|ca| ca.into_iter().flatten().map(str::to_string).collect::<HashSet<_>>()))
        .map_or(0, |seen| seen.len())
}

fn kind_of(series: &Series) -> ColumnKind {
    if dataset::is_numeric(series) {
        ColumnKind::Numeric
    } else if is_label_like(series.dtype()) {
        if distinct_non_missing(series) <= CATEGORICAL_MAX_DISTINCT {
            ColumnKind::Categorical
        } else {
            ColumnKind::Text
        }
    } else {
        // dates and other exotic dtypes fall through every bucket
        ColumnKind::Unclassified
    }
}

/// Partitions the dataset's columns into numeric, categorical and text buckets,
/// preserving column order within each bucket.
pub fn classify_columns(df: &DataFrame) -> ColumnClassification {
    let mut classification = ColumnClassification::default();

    for series in df.get_columns() {
        let name = series.name().to_string();
        match kind_of(series) {
            ColumnKind::Numeric => classification.numeric.push(name),
            ColumnKind::Categorical => classification.categorical.push(name),
            ColumnKind::Text => classification.text.push(name),
            ColumnKind::Unclassified => {
                tracing::debug!("Column {} ({}) matches no bucket, skipping", name, series.dtype());
            }
        }
    }

    classification
}

fn profile_column(df: &DataFrame, series: &Series) -> ColumnProfile {
    let name = series.name();
    let labels = dataset::label_values(df, name).unwrap_or_default();

    let null_count = labels.iter().filter(|v| v.is_none()).count();
    let unique_count = labels.iter().flatten().collect::<HashSet<_>>().len();
    let sample_values = labels
        .iter()
        .take(SAMPLE_SIZE)
        .map(|v| v.clone().unwrap_or_default())
        .collect::<SmallVec<[String; SAMPLE_SIZE]>>();

    ColumnProfile {
        name: name.to_string(),
        data_type: series.dtype().to_string(),
        kind: kind_of(series),
        sample_values,
        null_count,
        unique_count,
    }
}

/// Sum of every non-missing value across numeric columns whose name starts with `prefix`.
fn prefix_total(df: &DataFrame, numeric: &[String], prefix: char) -> Option<f64> {
    let matching: Vec<&String> = numeric.iter().filter(|name| name.starts_with(prefix)).collect();
    if matching.is_empty() {
        return None;
    }
    Some(
        matching
            .into_iter()
            .filter_map(|name| dataset::numeric_values(df, name).ok())
            .flatten()
            .flatten()
            .sum(),
    )
}

pub fn dataset_overview(df: &DataFrame, classification: &ColumnClassification, preview_rows: usize) -> DatasetOverview {
    let columns: Vec<ColumnProfile> = df
        .get_columns()
        .iter()
        .map(|series| profile_column(df, series))
        .collect();

    let rendered: Vec<Vec<Option<String>>> = df
        .get_column_names()
        .iter()
        .map(|name| dataset::label_values(df, name).unwrap_or_default())
        .collect();
    let preview = (0..df.height().min(preview_rows))
        .map(|row| {
            rendered
                .iter()
                .map(|col| col.get(row).cloned().flatten().unwrap_or_default())
                .collect()
        })
        .collect();

    DatasetOverview {
        row_count: df.height(),
        column_count: df.width(),
        numeric_count: classification.numeric.len(),
        categorical_count: classification.categorical.len(),
        text_count: classification.text.len(),
        classification: classification.clone(),
        columns,
        preview,
        x_total: prefix_total(df, &classification.numeric, 'X'),
        y_total: prefix_total(df, &classification.numeric, 'Y'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> DataFrame {
        let comments: Vec<String> = (0..40).map(|i| format!("comment number {}", i)).collect();
        let groups: Vec<&str> = (0..40).map(|i| if i % 2 == 0 { "yes" } else { "no" }).collect();
        let ages: Vec<i64> = (0..40).map(|i| 20 + i).collect();
        let flags: Vec<bool> = (0..40).map(|i| i % 3 == 0).collect();
        df!(
            "X1" => &ages,
            "answer" => &groups,
            "comment" => &comments,
            "flag" => &flags
        )
        .unwrap()
    }

    #[test]
    fn columns_land_in_their_buckets() {
        let classification = classify_columns(&survey());
        assert_eq!(classification.numeric, vec!["X1"]);
        assert_eq!(classification.categorical, vec!["answer", "flag"]);
        assert_eq!(classification.text, vec!["comment"]);
    }

    #[test]
    fn thirty_distinct_values_are_still_categorical() {
        let values: Vec<String> = (0..60).map(|i| format!("v{}", i % 30)).collect();
        let df = df!("c" => &values).unwrap();
        assert_eq!(classify_columns(&df).categorical, vec!["c"]);

        let values: Vec<String> = (0..60).map(|i| format!("v{}", i % 31)).collect();
        let df = df!("c" => &values).unwrap();
        assert_eq!(classify_columns(&df).text, vec!["c"]);
    }

    #[test]
    fn missing_values_do_not_count_as_distinct() {
        let mut values: Vec<Option<String>> = (0..30).map(|i| Some(format!("v{}", i))).collect();
        values.push(None);
        let df = df!("c" => &values).unwrap();
        assert_eq!(classify_columns(&df).categorical, vec!["c"]);
    }

    #[test]
    fn empty_dataset_yields_empty_buckets() {
        assert_eq!(classify_columns(&DataFrame::empty()), ColumnClassification::default());
    }

    #[test]
    fn overview_counts_and_prefix_totals() {
        let df = survey();
        let classification = classify_columns(&df);
        let overview = dataset_overview(&df, &classification, 5);

        assert_eq!(overview.row_count, 40);
        assert_eq!(overview.column_count, 4);
        assert_eq!(overview.categorical_count, 2);
        assert_eq!(overview.preview.len(), 5);
        assert_eq!(overview.preview[0][0], "20");
        // 20 + 21 + ... + 59
        assert_eq!(overview.x_total, Some(1580.0));
        assert_eq!(overview.y_total, None);
        assert_eq!(overview.columns[1].unique_count, 2);
        assert_eq!(overview.columns[1].sample_values.as_slice(), ["yes", "no", "yes"]);
    }

    #[test]
    fn overview_serializes_profiles() {
        let df = survey();
        let overview = dataset_overview(&df, &classify_columns(&df), 2);
        let json = serde_json::to_value(&overview).unwrap();

        let answer = &json["columns"][1];
        assert_eq!(answer["name"], "answer");
        assert_eq!(answer["kind"], "categorical");
        assert_eq!(answer["sample_values"], serde_json::json!(["yes", "no", "yes"]));
    }
}
