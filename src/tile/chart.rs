//! Chart identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ChartIdError;

/// Maximum length of a chart identifier.
pub const MAX_CHART_ID_LEN: usize = 64;

/// A validated chart identifier such as `chicago` or `new-york_2024`.
///
/// Only ASCII alphanumerics, `-` and `_` are accepted, so an identifier can be
/// joined onto a directory path without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartId(Arc<str>);

impl ChartId {
    pub fn parse(value: &str) -> Result<Self, ChartIdError> {
        if value.is_empty() {
            return Err(ChartIdError::Empty);
        }
        if value.len() > MAX_CHART_ID_LEN {
            return Err(ChartIdError::TooLong {
                len: value.len(),
                max: MAX_CHART_ID_LEN,
            });
        }
        if let Some(ch) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ChartIdError::InvalidCharacter { ch });
        }
        Ok(Self(Arc::from(value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChartId {
    type Err = ChartIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ChartId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
