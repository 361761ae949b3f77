use once_cell::sync::Lazy;
use regex::Regex;

// Leading number of a cell: "=25", "201–250", "1001+", "20,965", "25%", "50.3–54.2".
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*=?\s*(\d[\d,]*(?:\.\d+)?)").expect("leading number pattern is valid")
});

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*=?\s*(\d[\d,]*)").expect("leading integer pattern is valid"));

fn capture(re: &Regex, raw: &str) -> Option<String> {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace(',', ""))
}

/// Global rank. Tied ranks ("=25") keep their number, banded ranks
/// ("201–250", "1001+") resolve to the lower bound.
pub fn parse_rank(raw: &str) -> Option<u32> {
    capture(&LEADING_INTEGER, raw)
        .and_then(|digits| digits.parse::<u32>().ok())
        .filter(|rank| *rank >= 1)
}

/// Whole numbers, thousands separators allowed.
pub fn parse_count(raw: &str) -> Option<u64> {
    capture(&LEADING_INTEGER, raw).and_then(|digits| digits.parse::<u64>().ok())
}

pub fn parse_year(raw: &str) -> Option<u16> {
    capture(&LEADING_INTEGER, raw).and_then(|digits| digits.parse::<u16>().ok())
}

/// Scores, ratios and percentages. Empty cells and placeholders such as
/// "n/a" or "-" yield `None`.
pub fn parse_score(raw: &str) -> Option<f64> {
    capture(&LEADING_NUMBER, raw).and_then(|number| number.parse::<f64>().ok())
}

pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks() {
        assert_eq!(parse_rank("5"), Some(5));
        assert_eq!(parse_rank("=25"), Some(25));
        assert_eq!(parse_rank("201–250"), Some(201));
        assert_eq!(parse_rank("201-250"), Some(201));
        assert_eq!(parse_rank("1001+"), Some(1001));
        assert_eq!(parse_rank("0"), None);
        assert_eq!(parse_rank("Reporter"), None);
        assert_eq!(parse_rank(""), None);
    }

    #[test]
    fn counts_with_separators() {
        assert_eq!(parse_count("20,965"), Some(20965));
        assert_eq!(parse_count(" 1234 "), Some(1234));
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn scores_and_percentages() {
        assert_eq!(parse_score("98.5"), Some(98.5));
        assert_eq!(parse_score("25%"), Some(25.0));
        assert_eq!(parse_score("50.3–54.2"), Some(50.3));
        assert_eq!(parse_score("-"), None);
        assert_eq!(parse_score(""), None);
    }

    #[test]
    fn years() {
        assert_eq!(parse_year("2016"), Some(2016));
        assert_eq!(parse_year("twenty"), None);
    }
}
