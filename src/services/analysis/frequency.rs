use std::collections::HashMap;

use super::types::*;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Counts every distinct value, missing included, ordered by descending count.
/// Equal counts keep the order in which the values were first seen.
pub fn frequency_table(column: &str, values: &[Option<String>]) -> FrequencyTable {
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    let mut counts: Vec<(Option<&str>, usize)> = Vec::new();

    for value in values {
        let key = value.as_deref();
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }
    // stable sort preserves first-seen order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = values.len();
    let rows = counts
        .into_iter()
        .map(|(value, count)| FrequencyRow {
            value: value.map(str::to_string),
            count,
            percent: round2(count as f64 / total as f64 * 100.0),
        })
        .collect();

    FrequencyTable {
        column: column.to_string(),
        total,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn counts_descend_with_first_seen_ties() {
        let table = frequency_table("c", &labels(&[Some("b"), Some("a"), Some("a"), Some("c"), Some("b"), Some("d")]));
        let order: Vec<_> = table.rows.iter().map(|r| (r.value.as_deref(), r.count)).collect();
        assert_eq!(order, vec![(Some("b"), 2), (Some("a"), 2), (Some("c"), 1), (Some("d"), 1)]);
    }

    #[test]
    fn missing_is_its_own_category() {
        let table = frequency_table("c", &labels(&[None, Some("x"), None, None]));
        assert_eq!(table.rows[0].value, None);
        assert_eq!(table.rows[0].count, 3);
        assert_eq!(table.rows[0].percent, 75.0);
        assert_eq!(table.total, 4);
    }

    #[test]
    fn percentages_are_rounded_and_sum_to_one_hundred() {
        let table = frequency_table("c", &labels(&[Some("a"), Some("b"), Some("c")]));
        assert_eq!(table.rows[0].percent, 33.33);
        let sum: f64 = table.rows.iter().map(|r| r.percent).sum();
        assert!((sum - 100.0).abs() <= 0.01 + 1e-9);
    }

    #[test]
    fn empty_column_gives_empty_table() {
        let table = frequency_table("c", &[]);
        assert!(table.rows.is_empty());
        assert_eq!(table.total, 0);
    }
}
