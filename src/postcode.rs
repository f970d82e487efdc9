//! UK postcode parsing and normalization.
//!
//! Splits a raw postcode string into its four components: area (one or two
//! letters), district (one or two digits, or a digit followed by a
//! letter), sector (a single digit) and unit (two letters).

use regex::Regex;
use std::sync::LazyLock;

static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{1,2})([0-9]{1,2}|[0-9][A-Z])([0-9])([A-Z]{2})$")
        .expect("postcode pattern is valid")
});

/// A UK postcode decomposed into its four components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Postcode {
    /// Postcode area, one or two uppercase letters
    pub area: String,
    /// Postcode district, one or two digits or a digit plus a letter
    pub district: String,
    /// Postcode sector, a single digit
    pub sector: String,
    /// Postcode unit, two uppercase letters
    pub unit: String,
}

impl Postcode {
    /// Parse a raw postcode string.
    ///
    /// The input is upper-cased and internal whitespace is stripped before
    /// matching, so `"ab1b 1au"` and `"AB1B1AU"` parse identically.
    /// Returns `None` when the string does not fit the postcode shape,
    /// including empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let captures = POSTCODE_RE.captures(&normalized)?;

        Some(Self {
            area: captures[1].to_string(),
            district: captures[2].to_string(),
            sector: captures[3].to_string(),
            unit: captures[4].to_string(),
        })
    }
}

impl std::fmt::Display for Postcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} {}{}",
            self.area, self.district, self.sector, self.unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(raw: &str) -> Option<(String, String, String, String)> {
        Postcode::parse(raw).map(|p| (p.area, p.district, p.sector, p.unit))
    }

    fn owned(a: &str, d: &str, s: &str, u: &str) -> (String, String, String, String) {
        (a.to_string(), d.to_string(), s.to_string(), u.to_string())
    }

    #[test]
    fn test_parse_two_letter_area() {
        assert_eq!(parts("AB101AU"), Some(owned("AB", "10", "1", "AU")));
    }

    #[test]
    fn test_parse_single_letter_area_single_digit_district() {
        assert_eq!(parts("A11AA"), Some(owned("A", "1", "1", "AA")));
    }

    #[test]
    fn test_parse_alphanumeric_district() {
        assert_eq!(parts("AB1B1AU"), Some(owned("AB", "1B", "1", "AU")));
    }

    #[test]
    fn test_parse_is_whitespace_insensitive() {
        assert_eq!(parts("AB1B 1AU"), Some(owned("AB", "1B", "1", "AU")));
        assert_eq!(parts("AB1B   1AU"), Some(owned("AB", "1B", "1", "AU")));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parts("ab1b 1au"), parts("AB1B 1AU"));
        assert_eq!(parts("Ab101aU"), parts("AB101AU"));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert_eq!(parts(""), None);
        assert_eq!(parts("AB1BFFFF1AU"), None);
        assert_eq!(parts("12345"), None);
        assert_eq!(parts("ABC1 1AA"), None);
    }

    #[test]
    fn test_display_reassembles_postcode() {
        let postcode = Postcode::parse("ab101au").unwrap();
        assert_eq!(postcode.to_string(), "AB10 1AU");
    }
}
