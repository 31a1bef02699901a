use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::DataFrame;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use super::types::*;
use crate::error::AnalysisError;
use crate::services::dataset;

fn ensure_distinct(first: &str, second: &str) -> Result<(), AnalysisError> {
    if first == second {
        return Err(AnalysisError::IdenticalColumnSelection(first.to_string()));
    }
    Ok(())
}

/// Pearson product-moment coefficient; NaN when either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if x.is_empty() {
        return f64::NAN;
    }
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let r = sxy / (sxx * syy).sqrt();
    if r.is_nan() { r } else { r.clamp(-1.0, 1.0) }
}

/// 1-based ranks, ties share their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let tie_len = order[i..]
            .iter()
            .take_while(|&&idx| values[idx] == values[order[i]])
            .count();
        // ranks i+1 ..= i+tie_len averaged
        let rank = i as f64 + (tie_len as f64 + 1.0) / 2.0;
        for &idx in &order[i..i + tie_len] {
            ranks[idx] = rank;
        }
        i += tie_len;
    }
    ranks
}

/// Two-sided p-value of a correlation coefficient under H0: rho = 0.
fn correlation_p_value(r: f64, n: usize) -> f64 {
    if r.is_nan() {
        return f64::NAN;
    }
    if n <= 2 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    let t = r * (df / denom).sqrt();
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |dist| (2.0 * dist.sf(t.abs())).min(1.0))
}

pub fn correlate_pairs(x: &[f64], y: &[f64]) -> (Coefficient, Coefficient) {
    let n = x.len();
    let r = pearson(x, y);
    let rho = pearson(&average_ranks(x), &average_ranks(y));
    (
        Coefficient::new(r, correlation_p_value(r, n)),
        Coefficient::new(rho, correlation_p_value(rho, n)),
    )
}

/// Pearson and Spearman correlation over the rows where both columns are present.
pub fn correlation_analysis(df: &DataFrame, x: &str, y: &str) -> Result<CorrelationResult, AnalysisError> {
    ensure_distinct(x, y)?;
    let xs = dataset::numeric_values(df, x)?;
    let ys = dataset::numeric_values(df, y)?;
    let (xs, ys) = dataset::complete_pairs(&xs, &ys);

    // a single pair has no defined coefficient
    if xs.len() < 2 {
        tracing::warn!("Correlation {} vs {}: only {} complete rows", x, y, xs.len());
        return Err(AnalysisError::NotEnoughData);
    }

    let (pearson, spearman) = correlate_pairs(&xs, &ys);
    Ok(CorrelationResult {
        x: x.to_string(),
        y: y.to_string(),
        n: xs.len(),
        pearson,
        spearman,
    })
}

/// Pearson matrix over `columns`, each pair on its own complete rows.
pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix, AnalysisError> {
    let data = columns
        .iter()
        .map(|name| dataset::numeric_values(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    let values = data
        .iter()
        .map(|a| {
            data.iter()
                .map(|b| {
                    let (xs, ys) = dataset::complete_pairs(a, b);
                    pearson(&xs, &ys)
                })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

fn contingency(labels: &[String], counts: &[Vec<f64>], column_labels: &[String]) -> ContingencyTable {
    ContingencyTable {
        row_labels: labels.to_vec(),
        column_labels: column_labels.to_vec(),
        cells: counts.to_vec(),
    }
}

/// Chi-square test of independence on the cross-tabulation of two columns.
/// Rows missing either value are left out of the table. Categories are
/// sorted, and the Yates continuity correction applies when dof is 1.
pub fn chi_square_test(df: &DataFrame, first: &str, second: &str) -> Result<ChiSquareResult, AnalysisError> {
    ensure_distinct(first, second)?;
    let a = dataset::label_values(df, first)?;
    let b = dataset::label_values(df, second)?;

    let mut joint: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    let mut row_set = BTreeSet::new();
    let mut col_set = BTreeSet::new();
    for (u, v) in a.iter().zip(&b) {
        if let (Some(u), Some(v)) = (u.as_deref(), v.as_deref()) {
            *joint.entry((u, v)).or_insert(0) += 1;
            row_set.insert(u);
            col_set.insert(v);
        }
    }
    if joint.is_empty() {
        tracing::warn!("Chi-square {} vs {}: empty contingency table", first, second);
        return Err(AnalysisError::NotEnoughData);
    }

    let row_labels: Vec<String> = row_set.iter().map(|s| s.to_string()).collect();
    let col_labels: Vec<String> = col_set.iter().map(|s| s.to_string()).collect();
    let observed: Vec<Vec<f64>> = row_set
        .iter()
        .map(|r| {
            col_set
                .iter()
                .map(|c| joint.get(&(*r, *c)).copied().unwrap_or(0) as f64)
                .collect()
        })
        .collect();

    let row_totals: Vec<f64> = observed.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..col_labels.len())
        .map(|j| observed.iter().map(|row| row[j]).sum())
        .collect();
    let grand: f64 = row_totals.iter().sum();
    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|rt| col_totals.iter().map(|ct| rt * ct / grand).collect())
        .collect();

    let dof = (row_labels.len() - 1) * (col_labels.len() - 1);
    let (statistic, p_value) = if dof == 0 {
        (0.0, 1.0)
    } else {
        let mut statistic = 0.0;
        for (obs_row, exp_row) in observed.iter().zip(&expected) {
            for (&o, &e) in obs_row.iter().zip(exp_row) {
                let diff = if dof == 1 {
                    let d = o - e;
                    d.signum() * (d.abs() - d.abs().min(0.5))
                } else {
                    o - e
                };
                statistic += diff * diff / e;
            }
        }
        let p = ChiSquared::new(dof as f64).map_or(f64::NAN, |dist| dist.sf(statistic));
        (statistic, p)
    };

    Ok(ChiSquareResult {
        statistic,
        p_value,
        dof,
        observed: contingency(&row_labels, &observed, &col_labels),
        expected: contingency(&row_labels, &expected, &col_labels),
    })
}
