use crate::layout::FormatKind;
use serde_json::Value;

/// Converts a resolved value into its display string for a given format
/// kind. Never panics: anything that fails to parse degrades to the
/// plain stringification, and missing values render empty.
pub fn format_value(value: Option<&Value>, format: Option<FormatKind>) -> String {
    let value = match value {
        None | Some(Value::Null) => return String::new(),
        Some(value) => value,
    };
    match format {
        Some(FormatKind::Currency) => match value.as_f64() {
            Some(amount) => format_currency(amount),
            None => plain_string(value),
        },
        Some(FormatKind::Number) => match value.as_f64() {
            Some(number) => format_number(number),
            None => plain_string(value),
        },
        Some(FormatKind::Date) => match value {
            Value::String(text) => iso_date_part(text).unwrap_or_else(|| plain_string(value)),
            _ => plain_string(value),
        },
        Some(FormatKind::Text) | None => plain_string(value),
    }
}

/// `String(value)` semantics: strings verbatim, numbers and bools via
/// their canonical display, null empty, containers as compact JSON.
pub fn plain_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Fixed-currency money formatting: two decimals, grouped thousands.
/// Documents are issued in a single currency, so the symbol is fixed.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }
    let cents = (amount * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
        return amount.to_string();
    }
    let cents = cents as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!(
        "{}${}.{:02}",
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

/// Grouped numeric formatting with fractional digits capped at two and
/// trailing zeros dropped.
pub fn format_number(number: f64) -> String {
    if !number.is_finite() {
        return number.to_string();
    }
    let scaled = (number * 100.0).round();
    if scaled.abs() >= i64::MAX as f64 {
        return number.to_string();
    }
    let scaled = scaled as i64;
    let sign = if scaled < 0 { "-" } else { "" };
    let scaled = scaled.abs();
    let whole = group_thousands(scaled / 100);
    let frac = scaled % 100;
    if frac == 0 {
        format!("{}{}", sign, whole)
    } else if frac % 10 == 0 {
        format!("{}{}.{}", sign, whole, frac / 10)
    } else {
        format!("{}{}.{:02}", sign, whole, frac)
    }
}

fn group_thousands(mut value: i64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut groups: Vec<String> = Vec::new();
    while value > 0 {
        groups.push(format!("{:03}", value % 1000));
        value /= 1000;
    }
    let mut out = groups.pop().unwrap_or_default();
    out = out.trim_start_matches('0').to_string();
    if out.is_empty() {
        out.push('0');
    }
    for group in groups.iter().rev() {
        out.push(',');
        out.push_str(group);
    }
    out
}

/// Validates an ISO-8601 calendar date prefix (`YYYY-MM-DD`, optionally
/// followed by a `T` or space and a time part) and returns the date
/// portion. Returns None for anything that is not a real calendar date,
/// including impossible days like Feb 30.
pub fn iso_date_part(raw: &str) -> Option<String> {
    let text = raw.trim();
    let bytes = text.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| -> Option<u32> {
        let mut out = 0u32;
        for &b in &bytes[range] {
            if !b.is_ascii_digit() {
                return None;
            }
            out = out * 10 + (b - b'0') as u32;
        }
        Some(out)
    };
    let year = digits(0..4)?;
    let month = digits(5..7)?;
    let day = digits(8..10)?;
    if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
        return None;
    }
    match bytes.get(10) {
        None => {}
        Some(&b'T') | Some(&b' ') => {
            if bytes.len() == 11 {
                return None;
            }
        }
        Some(_) => return None,
    }
    Some(text[..10].to_string())
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_values_render_empty() {
        assert_eq!(format_value(None, Some(FormatKind::Currency)), "");
        assert_eq!(format_value(Some(&json!(null)), None), "");
    }

    #[test]
    fn currency_formats_two_decimals_with_grouping() {
        assert_eq!(format_value(Some(&json!(9.5)), Some(FormatKind::Currency)), "$9.50");
        assert_eq!(
            format_value(Some(&json!(1234.5)), Some(FormatKind::Currency)),
            "$1,234.50"
        );
        assert_eq!(
            format_value(Some(&json!(-1234567.891)), Some(FormatKind::Currency)),
            "-$1,234,567.89"
        );
        assert_eq!(format_value(Some(&json!(0)), Some(FormatKind::Currency)), "$0.00");
    }

    #[test]
    fn currency_on_non_numeric_falls_through() {
        assert_eq!(
            format_value(Some(&json!("POA")), Some(FormatKind::Currency)),
            "POA"
        );
    }

    #[test]
    fn number_groups_and_caps_fraction() {
        assert_eq!(format_value(Some(&json!(1234567)), Some(FormatKind::Number)), "1,234,567");
        assert_eq!(format_value(Some(&json!(12.5)), Some(FormatKind::Number)), "12.5");
        assert_eq!(format_value(Some(&json!(12.345)), Some(FormatKind::Number)), "12.35");
        assert_eq!(format_value(Some(&json!(-0.25)), Some(FormatKind::Number)), "-0.25");
        assert_eq!(format_value(Some(&json!(1000)), Some(FormatKind::Number)), "1,000");
    }

    #[test]
    fn date_emits_fixed_form_or_falls_through() {
        assert_eq!(
            format_value(Some(&json!("2026-02-28T14:00:00Z")), Some(FormatKind::Date)),
            "2026-02-28"
        );
        assert_eq!(
            format_value(Some(&json!("2024-02-29")), Some(FormatKind::Date)),
            "2024-02-29"
        );
        // Not a leap year: degrade to the raw string, never raise.
        assert_eq!(
            format_value(Some(&json!("2026-02-29")), Some(FormatKind::Date)),
            "2026-02-29"
        );
        assert_eq!(
            format_value(Some(&json!("next tuesday")), Some(FormatKind::Date)),
            "next tuesday"
        );
        assert_eq!(format_value(Some(&json!(20260228)), Some(FormatKind::Date)), "20260228");
    }

    #[test]
    fn no_format_is_plain_stringification() {
        assert_eq!(format_value(Some(&json!("Acacia")), None), "Acacia");
        assert_eq!(format_value(Some(&json!(3.25)), None), "3.25");
        assert_eq!(format_value(Some(&json!(true)), None), "true");
    }

    #[test]
    fn iso_date_part_rejects_malformed_input() {
        assert!(iso_date_part("2026-13-01").is_none());
        assert!(iso_date_part("2026-00-10").is_none());
        assert!(iso_date_part("2026-04-31").is_none());
        assert!(iso_date_part("20260401").is_none());
        assert!(iso_date_part("2026-04-01x").is_none());
        assert_eq!(iso_date_part("2026-04-30").as_deref(), Some("2026-04-30"));
        assert_eq!(
            iso_date_part("2026-04-30 08:15:00").as_deref(),
            Some("2026-04-30")
        );
    }
}
