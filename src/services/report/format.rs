/// Text for a non-finite float, printed the way the report always has.
fn non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("nan".into())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" }.into())
    } else {
        None
    }
}

pub fn fixed(value: f64, decimals: usize) -> String {
    non_finite(value).unwrap_or_else(|| format!("{:.*}", decimals, value))
}

fn strip_fraction_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// `%g` style: `precision` significant digits, exponent form outside [1e-4, 10^precision).
pub fn general(value: f64, precision: usize) -> String {
    if let Some(text) = non_finite(value) {
        return text;
    }
    if value == 0.0 {
        return "0".into();
    }
    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_fraction_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

/// At most `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Truncated and left-justified to exactly `width` characters.
pub fn cell(text: &str, width: usize) -> String {
    format!("{:<width$}", truncate(text, width), width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_matches_printf() {
        assert_eq!(general(0.4273, 4), "0.4273");
        assert_eq!(general(0.041563, 4), "0.04156");
        assert_eq!(general(0.5, 4), "0.5");
        assert_eq!(general(1.0, 4), "1");
        assert_eq!(general(0.000012346, 4), "1.235e-05");
        assert_eq!(general(12346.0, 4), "1.235e+04");
        assert_eq!(general(9999.7, 4), "1e+04");
        assert_eq!(general(0.0, 4), "0");
        assert_eq!(general(f64::NAN, 4), "nan");
    }

    #[test]
    fn fixed_handles_nan() {
        assert_eq!(fixed(1.23456, 4), "1.2346");
        assert_eq!(fixed(f64::NAN, 2), "nan");
        assert_eq!(fixed(-0.5, 2), "-0.50");
    }

    #[test]
    fn cells_are_padded_and_truncated() {
        assert_eq!(cell("age", 6), "age   ");
        assert_eq!(cell("satisfaction", 6), "satisf");
        assert_eq!(cell("年齢データ列名前", 6), "年齢データ列");
        assert_eq!(truncate("short", 40), "short");
    }
}
