//! Collection tick identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The short ticker string identifying a collection.
///
/// Ticks are case-insensitive upstream; they are normalized to lowercase
/// here so that cache keys and session keys agree regardless of how the
/// caller spelled them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tick(String);

impl Tick {
    /// Maximum accepted tick length.
    pub const MAX_LEN: usize = 32;

    /// Create from a string, validating format.
    pub fn new(tick: impl AsRef<str>) -> crate::Result<Self> {
        let tick = tick.as_ref().trim();
        if tick.is_empty() {
            return Err(crate::Error::InvalidTick("tick cannot be empty".into()));
        }
        if tick.len() > Self::MAX_LEN {
            return Err(crate::Error::InvalidTick(format!(
                "tick too long: {} chars (max {})",
                tick.len(),
                Self::MAX_LEN
            )));
        }
        for c in tick.chars() {
            if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_') {
                return Err(crate::Error::InvalidTick(format!(
                    "invalid character in tick: {c}"
                )));
            }
        }
        Ok(Self(tick.to_ascii_lowercase()))
    }

    /// Get the normalized tick string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tick {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<Tick> for String {
    fn from(tick: Tick) -> Self {
        tick.0
    }
}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({self})")
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
