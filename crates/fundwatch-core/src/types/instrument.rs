//! Instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FundwatchError;

/// Fund code, normalized to six zero-padded digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Width of a normalized code.
    pub const WIDTH: usize = 6;

    /// Parse and zero-pad a raw code such as `"1234"` or `" 001234 "`.
    pub fn parse(raw: &str) -> Result<Self, FundwatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FundwatchError::Validation("empty instrument code".into()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(FundwatchError::Validation(format!(
                "instrument code must be numeric: {trimmed:?}"
            )));
        }
        if trimmed.len() > Self::WIDTH {
            return Err(FundwatchError::Validation(format!(
                "instrument code longer than {} digits: {trimmed}",
                Self::WIDTH
            )));
        }
        Ok(Self(format!("{:0>width$}", trimmed, width = Self::WIDTH)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InstrumentId {
    type Err = FundwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InstrumentId {
    type Error = FundwatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InstrumentId> for String {
    fn from(id: InstrumentId) -> Self {
        id.0
    }
}

impl AsRef<str> for InstrumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_padding() {
        assert_eq!(InstrumentId::parse("1234").unwrap().as_str(), "001234");
        assert_eq!(InstrumentId::parse(" 161725 ").unwrap().as_str(), "161725");
    }

    #[test]
    fn test_rejects_bad_codes() {
        assert!(InstrumentId::parse("").is_err());
        assert!(InstrumentId::parse("12a4").is_err());
        assert!(InstrumentId::parse("1234567").is_err());
        assert!(InstrumentId::parse("../etc").is_err());
    }

    #[test]
    fn test_serde_normalizes() {
        let id: InstrumentId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id.as_str(), "000042");
    }
}
