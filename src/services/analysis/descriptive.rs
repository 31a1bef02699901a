use statrs::distribution::{ChiSquared, ContinuousCDF};

use super::types::*;
use crate::error::AnalysisError;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Most frequent value; the smallest one when several share the top count.
fn mode(sorted: &[f64]) -> f64 {
    let mut best = sorted[0];
    let mut best_run = 0;
    let mut i = 0;
    while i < sorted.len() {
        let run = sorted[i..].iter().take_while(|v| **v == sorted[i]).count();
        if run > best_run {
            best = sorted[i];
            best_run = run;
        }
        i += run;
    }
    best
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Biased central moment of order `k`.
fn central_moment(values: &[f64], mean: f64, k: i32) -> f64 {
    values.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / values.len() as f64
}

fn skew_z(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    let b2 = central_moment(values, mean, 3) / central_moment(values, mean, 2).powf(1.5);
    let y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    delta * ((y / alpha) + ((y / alpha).powi(2) + 1.0).sqrt()).ln()
}

fn kurtosis_z(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    let m2 = central_moment(values, mean, 2);
    let b2 = central_moment(values, mean, 4) / (m2 * m2);
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / sqrt_beta1.powi(2)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = if denom == 0.0 {
        f64::NAN
    } else {
        denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt()
    };
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// D'Agostino-Pearson K² omnibus test. Returns (statistic, p-value).
pub fn normality_test(values: &[f64]) -> (f64, f64) {
    let m = mean(values);
    let k2 = skew_z(values, m).powi(2) + kurtosis_z(values, m).powi(2);
    let p = ChiSquared::new(2.0).map_or(f64::NAN, |dist| dist.sf(k2));
    (k2, p)
}

/// Summary statistics over the non-missing values of a numeric column.
pub fn descriptive_stats(column: &str, values: &[Option<f64>]) -> Result<DescriptiveSummary, AnalysisError> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return Err(AnalysisError::NoValidData(column.to_string()));
    }
    let valid = sorted.clone();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = mean(&valid);

    let normality = if count >= NORMALITY_MIN_SAMPLES {
        let (statistic, p_value) = normality_test(&valid);
        Normality::Tested {
            statistic,
            p_value,
            rejects_normality: p_value < SIGNIFICANCE_LEVEL,
        }
    } else {
        tracing::debug!("Column {} has {} valid values, skipping normality test", column, count);
        Normality::InsufficientSampleSize {
            count,
            required: NORMALITY_MIN_SAMPLES,
        }
    };

    Ok(DescriptiveSummary {
        count,
        sum: valid.iter().sum(),
        mean,
        median: median(&sorted),
        mode: mode(&sorted),
        min: sorted[0],
        max: sorted[count - 1],
        std: sample_std(&valid, mean),
        normality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn basic_summary() {
        let summary = descriptive_stats("x", &some(&[4.0, 1.0, 2.0, 2.0, 6.0])).unwrap();
        assert_eq!(summary.count, 5);
        assert_eq!(summary.sum, 15.0);
        assert_eq!(summary.mean, 3.0);
        assert_eq!(summary.median, 2.0);
        assert_eq!(summary.mode, 2.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 6.0);
        assert_relative_eq!(summary.std, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_values_are_dropped() {
        let summary = descriptive_stats("x", &[Some(1.0), None, Some(3.0), None]).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.median, 2.0);
    }

    #[test]
    fn mode_takes_smallest_among_ties() {
        let summary = descriptive_stats("x", &some(&[3.0, 3.0, 1.0, 1.0, 2.0])).unwrap();
        assert_eq!(summary.mode, 1.0);
    }

    #[test]
    fn single_value_has_undefined_std() {
        let summary = descriptive_stats("x", &some(&[7.0])).unwrap();
        assert!(summary.std.is_nan());
        assert_eq!(summary.min, summary.max);
    }

    #[test]
    fn all_missing_is_no_valid_data() {
        assert_eq!(
            descriptive_stats("x", &[None, None]),
            Err(AnalysisError::NoValidData("x".into()))
        );
    }

    #[test]
    fn normality_needs_eight_observations() {
        let summary = descriptive_stats("x", &some(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(
            summary.normality,
            Normality::InsufficientSampleSize { count: 3, required: 8 }
        );
        assert_eq!(summary.normality.statistic(), None);

        let summary = descriptive_stats("x", &some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])).unwrap();
        assert!(summary.normality.statistic().is_some());
    }

    #[test]
    fn normality_matches_reference_values() {
        // scipy.stats.normaltest([1, 2, 3, 4, 5, 6, 7, 8])
        let (stat, p) = normality_test(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_relative_eq!(stat, 1.7004, epsilon = 1e-3);
        assert_relative_eq!(p, 0.4273, epsilon = 1e-3);
        assert_relative_eq!(p, (-stat / 2.0).exp(), epsilon = 1e-9);
        assert!(p > SIGNIFICANCE_LEVEL);
    }

    #[test]
    fn heavy_outlier_rejects_normality() {
        let mut values = vec![10.0; 3];
        values.extend([10.5, 9.5, 10.2, 9.8, 10.1, 9.9, 10.0, 10.3, 9.7, 10.4, 9.6, 10.0, 10.1, 9.9, 10.2, 9.8, 10.0, 10.1]);
        values.push(100.0);
        let summary = descriptive_stats("x", &some(&values)).unwrap();
        match summary.normality {
            Normality::Tested { rejects_normality, .. } => assert!(rejects_normality),
            other => panic!("expected a test result, got {:?}", other),
        }
    }

    #[test]
    fn ordering_invariants_hold() {
        let summary = descriptive_stats("x", &some(&[5.0, -3.0, 12.0, 0.5, 0.5, 99.0, -40.0])).unwrap();
        assert!(summary.min <= summary.median && summary.median <= summary.max);
        assert!(summary.std >= 0.0);
    }
}
