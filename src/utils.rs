/// Shared utility functions for the station averages service
///
/// Normalize a station identifier read from a spreadsheet cell or CSV field
///
/// Spreadsheets frequently store numeric identifiers as floats, so a station
/// written as `101` in the measurement CSV shows up as `101.0` in the metadata
/// workbook. Integral floats are rendered without the fractional part so both
/// sides of the join agree. Surrounding whitespace is removed.
///
/// # Examples
///
/// ```
/// use station_averages_service::utils::normalize_station_id;
///
/// assert_eq!(normalize_station_id(" 2301 "), "2301");
/// assert_eq!(normalize_station_id("2301.0"), "2301");
/// assert_eq!(normalize_station_id("A1"), "A1");
/// assert_eq!(normalize_station_id("12.5"), "12.5");
/// ```
pub fn normalize_station_id(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(integral) = trimmed.strip_suffix(".0") {
        if !integral.is_empty() && integral.chars().all(|c| c.is_ascii_digit()) {
            return integral.to_string();
        }
    }
    trimmed.to_string()
}

/// Order grouping keys ascending, numerically when both keys are numbers
///
/// Station identifiers are usually numeric codes stored as text; plain lexical
/// ordering would put "1000" before "200". Mixed or textual keys fall back to
/// lexical ordering, with numbers sorting first.
pub fn compare_keys(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Whether a raw cell denotes a missing value
pub fn is_missing_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_normalize_station_id_plain() {
        assert_eq!(normalize_station_id("29200"), "29200");
    }

    #[test]
    fn test_normalize_station_id_float_suffix() {
        assert_eq!(normalize_station_id("29200.0"), "29200");
    }

    #[test]
    fn test_normalize_station_id_keeps_real_fraction() {
        assert_eq!(normalize_station_id("29200.5"), "29200.5");
    }

    #[test]
    fn test_normalize_station_id_alphanumeric() {
        assert_eq!(normalize_station_id("B2.0"), "B2.0");
    }

    #[test]
    fn test_compare_keys_numeric() {
        assert_eq!(compare_keys("200", "1000"), Ordering::Less);
        assert_eq!(compare_keys("1000", "200"), Ordering::Greater);
    }

    #[test]
    fn test_compare_keys_lexical() {
        assert_eq!(compare_keys("A1", "B2"), Ordering::Less);
        assert_eq!(compare_keys("A1", "A1"), Ordering::Equal);
    }

    #[test]
    fn test_compare_keys_numbers_before_text() {
        assert_eq!(compare_keys("999", "A1"), Ordering::Less);
    }

    #[test]
    fn test_is_missing_token() {
        assert!(is_missing_token(""));
        assert!(is_missing_token("  "));
        assert!(is_missing_token("NaN"));
        assert!(is_missing_token("NA"));
        assert!(!is_missing_token("0"));
        assert!(!is_missing_token("-1.5"));
    }
}
