//! Brazilian postal code (CEP) type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PostalCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeError {
    /// The input contains no digits.
    #[error("postal code cannot be empty")]
    Empty,
    /// The input does not contain exactly eight digits.
    #[error("postal code must have {expected} digits (got {got})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digits found in the input.
        got: usize,
    },
}

/// An eight-digit CEP.
///
/// Any non-digit characters in the input (the `-` of the `12345-678` mask,
/// spaces, dots) are ignored; exactly eight digits must remain.
///
/// ## Examples
///
/// ```
/// use noscope_core::PostalCode;
///
/// assert_eq!(PostalCode::parse("01310-100").unwrap().as_str(), "01310100");
/// assert!(PostalCode::parse("0131").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Number of digits in a CEP.
    pub const DIGITS: usize = 8;

    /// Parse a `PostalCode`, ignoring any non-digit characters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not contain exactly eight digits.
    pub fn parse(s: &str) -> Result<Self, PostalCodeError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(PostalCodeError::Empty);
        }
        if digits.len() != Self::DIGITS {
            return Err(PostalCodeError::WrongLength {
                expected: Self::DIGITS,
                got: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// The eight digits, without the mask.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The masked form, `12345-678`.
    #[must_use]
    pub fn masked(&self) -> String {
        format_postal_code_input(&self.0)
    }
}

/// Apply the CEP input mask to whatever the shopper has typed so far.
///
/// Non-digits are stripped, input is truncated to eight digits, and a `-` is
/// inserted after the fifth digit once there is a sixth.
#[must_use]
pub fn format_postal_code_input(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(PostalCode::DIGITS)
        .collect();

    if digits.len() > 5 {
        let (head, tail) = digits.split_at(5);
        format!("{head}-{tail}")
    } else {
        digits
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl std::str::FromStr for PostalCode {
    type Err = PostalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = PostalCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_mask() {
        assert_eq!(PostalCode::parse("01310-100").unwrap().as_str(), "01310100");
        assert_eq!(PostalCode::parse(" 01.310-100 ").unwrap().as_str(), "01310100");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PostalCode::parse(""), Err(PostalCodeError::Empty));
        assert_eq!(PostalCode::parse("--"), Err(PostalCodeError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            PostalCode::parse("0131010"),
            Err(PostalCodeError::WrongLength {
                expected: 8,
                got: 7
            })
        );
        assert!(PostalCode::parse("013101001").is_err());
    }

    #[test]
    fn test_input_mask() {
        assert_eq!(format_postal_code_input(""), "");
        assert_eq!(format_postal_code_input("01310"), "01310");
        assert_eq!(format_postal_code_input("013101"), "01310-1");
        assert_eq!(format_postal_code_input("01310100"), "01310-100");
        assert_eq!(format_postal_code_input("01310-1009999"), "01310-100");
        assert_eq!(format_postal_code_input("ab01c310"), "01310");
    }

    #[test]
    fn test_display_is_masked() {
        assert_eq!(PostalCode::parse("01310100").unwrap().to_string(), "01310-100");
    }
}
