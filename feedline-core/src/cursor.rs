//! Opaque pagination cursors
//!
//! A cursor is `"<timestamp>"` or `"<timestamp> <version>"`. Clients treat it
//! as an opaque string; only the pagination layer looks inside.

use crate::{TimestampMs, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the feed's sort order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CursorToken {
    pub timestamp: TimestampMs,
    pub version: Option<String>,
}

impl CursorToken {
    pub fn new(timestamp: TimestampMs, version: impl Into<String>) -> Self {
        Self {
            timestamp,
            version: Some(version.into()),
        }
    }

    pub fn at(timestamp: TimestampMs) -> Self {
        Self {
            timestamp,
            version: None,
        }
    }

    /// Parse the token supplied for request parameter `field`.
    pub fn parse(field: &str, raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidCursor {
            field: field.to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let token = raw.trim();
        if token.is_empty() {
            return Err(invalid("cursor is empty"));
        }

        // Versions are opaque and may themselves contain whitespace.
        let (timestamp, version) = match token.split_once(char::is_whitespace) {
            Some((timestamp, version)) => (timestamp, Some(version.trim_start().to_string())),
            None => (token, None),
        };
        let timestamp = timestamp
            .parse::<TimestampMs>()
            .map_err(|_| invalid("timestamp must be an integer"))?;

        Ok(Self { timestamp, version })
    }
}

impl fmt::Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.timestamp, version),
            None => write!(f, "{}", self.timestamp),
        }
    }
}

impl From<CursorToken> for String {
    fn from(token: CursorToken) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for CursorToken {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse("cursor", &value)
    }
}
