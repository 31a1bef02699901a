use serde::Serialize;
use smallvec::SmallVec;

use crate::services::i18n::{localize, Language};

pub const SAMPLE_SIZE: usize = 3;

/// Distinct-value ceiling separating categorical columns from free text.
pub const CATEGORICAL_MAX_DISTINCT: usize = 30;

/// Minimum number of observations for the omnibus normality test.
pub const NORMALITY_MIN_SAMPLES: usize = 8;

pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnClassification {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Text,
    Unclassified,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: String,
    pub kind: ColumnKind,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
    pub null_count: usize,
    pub unique_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_count: usize,
    pub categorical_count: usize,
    pub text_count: usize,
    pub classification: ColumnClassification,
    pub columns: Vec<ColumnProfile>,
    pub preview: Vec<Vec<String>>,
    pub x_total: Option<f64>,
    pub y_total: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Normality {
    Tested {
        statistic: f64,
        p_value: f64,
        rejects_normality: bool,
    },
    InsufficientSampleSize {
        count: usize,
        required: usize,
    },
}

impl Normality {
    pub fn statistic(&self) -> Option<f64> {
        match self {
            Normality::Tested { statistic, .. } => Some(*statistic),
            Normality::InsufficientSampleSize { .. } => None,
        }
    }

    pub fn interpretation(&self, lang: Language) -> Option<&'static str> {
        match self {
            Normality::Tested { rejects_normality: true, .. } => Some(localize(lang, "not_normal_interpret")),
            Normality::Tested { .. } => Some(localize(lang, "normal_interpret")),
            Normality::InsufficientSampleSize { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveSummary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; NaN for a single observation.
    pub std: f64,
    pub normality: Normality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    /// `None` is the missing-value category.
    pub value: Option<String>,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub total: usize,
    pub rows: Vec<FrequencyRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl Strength {
    /// Buckets |r|. An undefined coefficient counts as very weak.
    pub fn of(r: f64) -> Self {
        let ar = r.abs();
        if ar.is_nan() || ar < 0.2 {
            Strength::VeryWeak
        } else if ar < 0.4 {
            Strength::Weak
        } else if ar < 0.6 {
            Strength::Moderate
        } else if ar < 0.8 {
            Strength::Strong
        } else {
            Strength::VeryStrong
        }
    }

    pub fn label(self, lang: Language) -> &'static str {
        let key = match self {
            Strength::VeryWeak => "strength_very_weak",
            Strength::Weak => "strength_weak",
            Strength::Moderate => "strength_moderate",
            Strength::Strong => "strength_strong",
            Strength::VeryStrong => "strength_very_strong",
        };
        localize(lang, key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl Direction {
    pub fn of(r: f64) -> Self {
        if r > 0.0 {
            Direction::Positive
        } else if r < 0.0 {
            Direction::Negative
        } else {
            Direction::None
        }
    }

    pub fn label(self, lang: Language) -> &'static str {
        let key = match self {
            Direction::Positive => "direction_positive",
            Direction::Negative => "direction_negative",
            Direction::None => "direction_none",
        };
        localize(lang, key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coefficient {
    pub r: f64,
    pub p_value: f64,
    pub strength: Strength,
    pub direction: Direction,
}

impl Coefficient {
    pub fn new(r: f64, p_value: f64) -> Self {
        Self {
            r,
            p_value,
            strength: Strength::of(r),
            direction: Direction::of(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub x: String,
    pub y: String,
    pub n: usize,
    pub pearson: Coefficient,
    pub spearman: Coefficient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared entries.
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub cells: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    pub observed: ContingencyTable,
    pub expected: ContingencyTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenFrequency {
    pub tokens: Vec<String>,
    /// Every distinct token, most frequent first, ties in first-seen order.
    pub counts: Vec<(String, usize)>,
}

impl TokenFrequency {
    pub fn most_common(&self, n: usize) -> &[(String, usize)] {
        &self.counts[..n.min(self.counts.len())]
    }
}
