//! Utility functions and types.

use std::fmt::{Debug, Formatter};

/// Redact hides secrets in `Debug` output.
///
/// Values shorter than 12 characters are fully masked; longer values keep
/// their first and last three characters so different keys stay
/// distinguishable in logs.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or_default())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = self.0;
        match s.len() {
            0 => f.write_str("EMPTY"),
            n if n < 12 || !s.is_char_boundary(3) || !s.is_char_boundary(n - 3) => {
                f.write_str("***")
            }
            n => write!(f, "{}***{}", &s[..3], &s[n - 3..]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("", "EMPTY"),
            ("LTAI5t", "***"),
            ("LTAI5tAbCdEf", "LTA***dEf"),
            ("uV3F3YluFJax1cknvbcGwgjY", "uV3***gjY"),
        ];

        for (input, expected) in cases {
            assert_eq!(format!("{:?}", Redact::from(input)), expected, "input: {input}");
        }

        let token: Option<String> = None;
        assert_eq!(format!("{:?}", Redact::from(&token)), "EMPTY");
    }
}
