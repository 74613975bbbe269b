// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const CODE_MAX_LEN: usize = 16;
pub const NAME_MAX_LEN: usize = 255;
pub const YEAR_MIN: i64 = 1995;
pub const YEAR_MAX: i64 = 2100;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    TooLong(&'static str, usize),
    NotAnInteger(&'static str),
    YearOutOfRange(i64),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::NotAnInteger(name) => write!(f, "{name} is not an integer"),
            Self::YearOutOfRange(value) => {
                write!(f, "census year {value} outside {YEAR_MIN}..={YEAR_MAX}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Institution code, kept as an opaque string. Codes in the extracts are
/// numeric-looking and can exceed 32-bit range, so they are never parsed
/// as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct InstitutionCode(String);

impl InstitutionCode {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty("co_entidade"));
        }
        if trimmed.len() > CODE_MAX_LEN {
            return Err(ParseError::TooLong("co_entidade", CODE_MAX_LEN));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InstitutionCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct CensusYear(i32);

impl CensusYear {
    pub fn parse(value: i64) -> Result<Self, ParseError> {
        if !(YEAR_MIN..=YEAR_MAX).contains(&value) {
            return Err(ParseError::YearOutOfRange(value));
        }
        Ok(Self(value as i32))
    }

    /// Accepts plain integers and float-formatted integers ("2022.0"),
    /// which appear when a numeric column passed through a float stage.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty("nu_ano_censo"));
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Self::parse(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 => Self::parse(v as i64),
            _ => Err(ParseError::NotAnInteger("nu_ano_censo")),
        }
    }

    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }
}

impl Display for CensusYear {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregation key: one institution in one census year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstitutionYearKey {
    pub code: InstitutionCode,
    pub year: CensusYear,
}

impl Display for InstitutionYearKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.code, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::{CensusYear, InstitutionCode, ParseError};

    #[test]
    fn institution_code_preserves_long_numeric_codes() {
        let code = InstitutionCode::parse("12345678901234").expect("code");
        assert_eq!(code.as_str(), "12345678901234");
    }

    #[test]
    fn institution_code_trims_surrounding_whitespace() {
        let code = InstitutionCode::parse("  26000012 ").expect("code");
        assert_eq!(code.as_str(), "26000012");
    }

    #[test]
    fn empty_code_is_rejected() {
        assert_eq!(
            InstitutionCode::parse("   "),
            Err(ParseError::Empty("co_entidade"))
        );
    }

    #[test]
    fn year_accepts_float_formatted_integers() {
        assert_eq!(CensusYear::parse_str("2022.0").expect("year").value(), 2022);
        assert_eq!(CensusYear::parse_str(" 2024 ").expect("year").value(), 2024);
    }

    #[test]
    fn year_out_of_range_is_rejected() {
        assert_eq!(CensusYear::parse(1901), Err(ParseError::YearOutOfRange(1901)));
        assert!(CensusYear::parse_str("20x2").is_err());
    }
}
