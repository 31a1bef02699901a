//! Paginated survey report.
//!
//! `build_report` gathers the same results the API serves per column and lays
//! them out page by page; `Report::to_pdf` turns the layout into a document.

pub mod format;
pub mod layout;
pub mod pdf;

use std::time::Instant;

use chrono::NaiveDateTime;
use polars::prelude::DataFrame;

use crate::error::{AnalysisError, ReportError};
use crate::services::analysis::{self, ColumnClassification, Normality};
use crate::services::charts::ChartRenderer;
use crate::services::dataset;
use crate::services::i18n::{localize, RenderOptions};
use format::{cell, fixed, general, truncate};
use layout::{ChartKind, Element, FontWeight, Page, PageCursor, BODY_SIZE, COLUMN_SIZE, SECTION_SIZE};

const TOP_ENTRIES: usize = 10;
const SCATTER_MIN_ROWS: usize = 3;
const LABEL_WIDTH: usize = 40;
const GRID_CELL: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub file_name: String,
    pub pages: Vec<Page>,
}

impl Report {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text line in reading order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|page| &page.elements)
            .filter_map(|element| match element {
                Element::Text(line) => Some(line.text.as_str()),
                Element::Image(_) => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|page| &page.elements)
            .filter(|element| matches!(element, Element::Image(_)))
            .count()
    }
}

struct ReportBuilder<'a> {
    df: &'a DataFrame,
    classification: &'a ColumnClassification,
    options: &'a RenderOptions,
    renderer: &'a dyn ChartRenderer,
    cursor: PageCursor,
}

impl<'a> ReportBuilder<'a> {
    fn text(&self, key: &'static str) -> &'static str {
        localize(self.options.language, key)
    }

    fn separator(&mut self) {
        self.cursor.body("-".repeat(90));
    }

    fn section(&mut self, key: &'static str) {
        self.separator();
        let heading = self.text(key);
        self.cursor.line(heading, FontWeight::Bold, SECTION_SIZE);
    }

    fn column_heading(&mut self, key: &'static str, column: &str) {
        let label = self.text(key);
        self.cursor.line(format!("{}: {}", label, column), FontWeight::Bold, COLUMN_SIZE);
    }

    fn header(&mut self, generated_at: NaiveDateTime) {
        let title = self.text("title");
        self.cursor.title(title);
        let stamp = generated_at.format(self.text("pdf_generated_on")).to_string();
        self.cursor.line_unchecked(stamp, FontWeight::Regular, BODY_SIZE);
        self.cursor.gap(4.0);
    }

    fn metadata(&mut self) {
        self.section("pdf_dataset_metadata");
        let counts = [
            ("rows", self.df.height()),
            ("cols", self.df.width()),
            ("num_cols", self.classification.numeric.len()),
            ("cat_cols", self.classification.categorical.len()),
            ("text_cols", self.classification.text.len()),
        ];
        for (key, count) in counts {
            let line = format!("{}: {}", self.text(key), count);
            self.cursor.body(line);
        }
    }

    fn numeric_columns(&mut self) -> Result<(), ReportError> {
        if self.classification.numeric.is_empty() {
            return Ok(());
        }
        self.section("pdf_numeric_stats");

        let classification = self.classification;
        for column in &classification.numeric {
            let summary = match analysis::describe_column(self.df, column) {
                Ok(summary) => summary,
                Err(AnalysisError::NoValidData(_)) => {
                    tracing::debug!("Skipping {} in report: no valid data", column);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let values: Vec<f64> = dataset::numeric_values(self.df, column)?
                .into_iter()
                .flatten()
                .collect();

            self.column_heading("pdf_column", column);
            let line = format!(
                "  {}: {}  {}: {}  {}: {}",
                self.text("pdf_count"),
                summary.count,
                self.text("pdf_mean"),
                fixed(summary.mean, 4),
                self.text("pdf_median"),
                fixed(summary.median, 4),
            );
            self.cursor.body(line);
            let line = format!(
                "  {}: {}  {}: {}  {}: {}  {}: {}",
                self.text("pdf_mode"),
                fixed(summary.mode, 4),
                self.text("pdf_min"),
                fixed(summary.min, 4),
                self.text("pdf_max"),
                fixed(summary.max, 4),
                self.text("pdf_std"),
                fixed(summary.std, 4),
            );
            self.cursor.body(line);
            let line = match summary.normality {
                Normality::Tested { statistic, p_value, .. } => format!(
                    "  {}: {}, {}: {}",
                    self.text("pdf_normaltest_stat_label"),
                    fixed(statistic, 4),
                    self.text("pdf_p_value_label"),
                    general(p_value, 4),
                ),
                Normality::InsufficientSampleSize { .. } => {
                    format!("  {}", self.text("pdf_normaltest_not_enough"))
                }
            };
            self.cursor.body(line);

            let caption = format!("{} - {}", self.text("hist_title"), column);
            self.cursor.body(caption);
            let histogram = self.renderer.histogram(&values, self.options)?;
            self.cursor.image(ChartKind::Histogram, histogram);

            let caption = format!("{} - {}", self.text("box_title"), column);
            self.cursor.body(caption);
            let boxplot = self.renderer.boxplot(&values, self.options)?;
            self.cursor.image(ChartKind::Boxplot, boxplot);
        }
        Ok(())
    }

    fn scatter_plots(&mut self) -> Result<(), ReportError> {
        let classification = self.classification;
        let numeric = &classification.numeric;
        if numeric.len() < 2 {
            return Ok(());
        }
        self.section("pdf_scatter_plots");

        for (i, x) in numeric.iter().enumerate() {
            for y in &numeric[i + 1..] {
                let xs = dataset::numeric_values(self.df, x)?;
                let ys = dataset::numeric_values(self.df, y)?;
                let (xs, ys) = dataset::complete_pairs(&xs, &ys);
                if xs.len() < SCATTER_MIN_ROWS {
                    tracing::debug!("Skipping scatter {} vs {}: {} complete rows", x, y, xs.len());
                    continue;
                }
                self.cursor.body(format!("{} vs {}", x, y));
                let scatter = self.renderer.scatter(&xs, &ys, self.options)?;
                self.cursor.image(ChartKind::Scatter, scatter);
            }
        }
        Ok(())
    }

    fn correlation_grid(&mut self) -> Result<(), ReportError> {
        if self.classification.numeric.is_empty() {
            return Ok(());
        }
        self.section("corr_matrix_title");

        let matrix = analysis::correlation_matrix(self.df, &self.classification.numeric)?;
        let header: Vec<String> = matrix.columns.iter().map(|c| cell(c, GRID_CELL)).collect();
        self.cursor.body(format!("{}{}", " ".repeat(GRID_CELL), header.join("  ")));

        for (name, row) in matrix.columns.iter().zip(&matrix.values) {
            let cells: Vec<String> = row.iter().map(|r| cell(&fixed(*r, 2), GRID_CELL)).collect();
            self.cursor.body(format!("{}  {}", cell(name, GRID_CELL), cells.join("  ")));
        }
        Ok(())
    }

    fn categorical_columns(&mut self) -> Result<(), ReportError> {
        if self.classification.categorical.is_empty() {
            return Ok(());
        }
        self.section("pdf_cat_cols");

        let classification = self.classification;
        for column in &classification.categorical {
            self.column_heading("pdf_column", column);
            let table = analysis::column_frequencies(self.df, column)?;
            for row in table.rows.iter().take(TOP_ENTRIES) {
                let label = row.value.as_deref().unwrap_or("nan");
                let percent = if table.total > 0 {
                    row.count as f64 / table.total as f64 * 100.0
                } else {
                    0.0
                };
                self.cursor.body(format!(
                    "  {}: {} ({}%)",
                    truncate(label, LABEL_WIDTH),
                    row.count,
                    fixed(percent, 1)
                ));
            }
        }
        Ok(())
    }

    fn text_columns(&mut self) -> Result<(), ReportError> {
        if self.classification.text.is_empty() {
            return Ok(());
        }
        self.section("pdf_text_summary");

        let classification = self.classification;
        for column in &classification.text {
            self.column_heading("pdf_text_column", column);
            let tokens = analysis::column_tokens(self.df, column)?;
            for (word, count) in tokens.most_common(TOP_ENTRIES) {
                self.cursor.body(format!("  {}: {}", word, count));
            }
        }
        Ok(())
    }
}

/// Lays out the full analysis of `df`. Sections with no columns are left out.
pub fn build_report(
    df: &DataFrame,
    classification: &ColumnClassification,
    options: &RenderOptions,
    generated_at: NaiveDateTime,
    renderer: &dyn ChartRenderer,
) -> Result<Report, ReportError> {
    let started = Instant::now();
    let mut builder = ReportBuilder {
        df,
        classification,
        options,
        renderer,
        cursor: PageCursor::new(),
    };

    builder.header(generated_at);
    builder.metadata();
    builder.numeric_columns()?;
    builder.scatter_plots()?;
    builder.correlation_grid()?;
    builder.categorical_columns()?;
    builder.text_columns()?;

    let pages = builder.cursor.finish();
    tracing::info!(
        "Built {} report: {} pages in {:?}",
        options.language,
        pages.len(),
        started.elapsed()
    );

    Ok(Report {
        title: localize(options.language, "title").to_string(),
        file_name: localize(options.language, "pdf_filename").to_string(),
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::charts::Raster;
    use crate::services::i18n::Language;
    use chrono::NaiveDate;
    use polars::prelude::*;

    struct StubRenderer;

    impl StubRenderer {
        fn raster() -> Raster {
            Raster {
                width: 4,
                height: 2,
                pixels: vec![0x80; 4 * 2 * 3],
            }
        }
    }

    impl ChartRenderer for StubRenderer {
        fn histogram(&self, _: &[f64], _: &RenderOptions) -> Result<Raster, ReportError> {
            Ok(Self::raster())
        }
        fn boxplot(&self, _: &[f64], _: &RenderOptions) -> Result<Raster, ReportError> {
            Ok(Self::raster())
        }
        fn scatter(&self, _: &[f64], _: &[f64], _: &RenderOptions) -> Result<Raster, ReportError> {
            Ok(Self::raster())
        }
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap()
    }

    fn survey() -> DataFrame {
        df!(
            "age" => &[21.0, 34.0, 45.0, 23.0, 51.0, 38.0, 29.0, 62.0],
            "score" => &[3.0, 4.0, 5.0, 3.0, 5.0, 4.0, 4.0, 5.0],
            "gender" => &["f", "m", "f", "f", "m", "m", "f", "m"]
        )
        .unwrap()
    }

    fn build(df: &DataFrame, options: &RenderOptions) -> Report {
        let classification = analysis::classify_columns(df);
        build_report(df, &classification, options, generated_at(), &StubRenderer).unwrap()
    }

    #[test]
    fn sections_appear_in_order() {
        let report = build(&survey(), &RenderOptions::default());
        let lines = report.text_lines();

        assert_eq!(lines[0], "Survey Analysis Dashboard");
        assert_eq!(lines[1], "Generated on 2024-05-01 09:30:00");
        assert!(lines.contains(&"Rows: 8"));
        assert!(lines.contains(&"age vs score"));
        assert!(lines.contains(&"  f: 4 (50.0%)"));

        let position = |needle: &str| lines.iter().position(|l| *l == needle).unwrap();
        assert!(position("Dataset metadata") < position("Numeric column statistics"));
        assert!(position("Numeric column statistics") < position("Scatter plots for numeric pairs"));
        assert!(position("Scatter plots for numeric pairs") < position("Pearson correlation matrix"));
        assert!(position("Pearson correlation matrix") < position("Categorical columns (top 10 categories)"));

        // histogram and boxplot per numeric column, one scatter for the pair
        assert_eq!(report.image_count(), 5);
        assert_eq!(report.file_name, "survey_report_en.pdf");
    }

    #[test]
    fn empty_sections_are_skipped() {
        let report = build(&survey(), &RenderOptions::default());
        assert!(!report.text_lines().contains(&"Text analysis summary (top 10 words per column)"));

        let numbers_only = df!("x" => &[1.0, 2.0, 3.0]).unwrap();
        let report = build(&numbers_only, &RenderOptions::default());
        let lines = report.text_lines();
        assert!(!lines.contains(&"Scatter plots for numeric pairs"));
        assert!(!lines.contains(&"Categorical columns (top 10 categories)"));
        assert!(lines.contains(&"  Normality test: not enough data (n < 8)."));
    }

    #[test]
    fn textual_content_is_deterministic() {
        let options = RenderOptions {
            language: Language::Id,
            dark_mode: true,
        };
        let first = build(&survey(), &options);
        let second = build(&survey(), &options);
        assert_eq!(first.text_lines(), second.text_lines());
        assert_eq!(first.file_name, "laporan_survei_id.pdf");
    }

    #[test]
    fn correlation_grid_uses_fixed_width_cells() {
        let report = build(&survey(), &RenderOptions::default());
        let lines = report.text_lines();
        let header = position_after(&lines, "Pearson correlation matrix");
        assert_eq!(lines[header], "      age     score ");
        assert!(lines[header + 1].starts_with("age     1.00    "));
    }

    fn position_after(lines: &[&str], heading: &str) -> usize {
        lines.iter().position(|l| *l == heading).unwrap() + 1
    }

    #[test]
    fn long_datasets_paginate() {
        let words: Vec<String> = (0..40).map(|i| format!("answer{}", i)).collect();
        let labels: Vec<String> = (0..200).map(|i| words[i % 40].clone()).collect();
        let columns: Vec<Series> = (0..12)
            .map(|c| Series::new(&format!("q{}", c), labels.clone()))
            .collect();
        let df = DataFrame::new(columns).unwrap();

        let report = build(&df, &RenderOptions::default());
        assert!(report.page_count() > 1);
        for page in &report.pages {
            for element in &page.elements {
                if let Element::Text(line) = element {
                    assert!(line.y >= layout::MARGIN);
                }
            }
        }
    }
}
