/// Header key with case, whitespace and punctuation removed.
pub(crate) fn normalize_header(value: &str) -> String {
    value
        .replace(['\u{feff}', '\u{200b}'], "")
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parses a spreadsheet cell as a number, accepting `.` or `,` as the decimal
/// separator. When both appear the rightmost one is the decimal separator.
/// Anything unparseable becomes `0.0`.
pub(crate) fn parse_locale_number(value: &str) -> f64 {
    let compact: String = value
        .trim()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();
    if compact.is_empty() {
        return 0.0;
    }

    let canonical = match (compact.rfind('.'), compact.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (None, Some(_)) => compact.replace(',', "."),
        _ => compact,
    };

    match canonical.parse::<f64>() {
        Ok(number) if number.is_finite() => number,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_header_strips_case_spacing_and_punctuation() {
        assert_eq!(normalize_header("\u{feff}kWp Min"), "kwpmin");
        assert_eq!(normalize_header("kwp_min"), "kwpmin");
        assert_eq!(normalize_header("  Adic. Trans. "), "adictrans");
        assert_eq!(normalize_header("kWp Máx"), "kwpmáx");
    }

    #[test]
    fn parse_locale_number_accepts_both_separators() {
        assert_eq!(parse_locale_number("12.5"), 12.5);
        assert_eq!(parse_locale_number("12,5"), 12.5);
        assert_eq!(parse_locale_number("1.234,5"), 1234.5);
        assert_eq!(parse_locale_number("1,234.5"), 1234.5);
        assert_eq!(parse_locale_number(" -3 "), -3.0);
    }

    #[test]
    fn parse_locale_number_coerces_garbage_to_zero() {
        assert_eq!(parse_locale_number(""), 0.0);
        assert_eq!(parse_locale_number("n/a"), 0.0);
        assert_eq!(parse_locale_number("inf"), 0.0);
        assert_eq!(parse_locale_number("NaN"), 0.0);
    }
}
