//! Requested content types
//!
//! `https://tent.io/types/status/v0#reply` splits into a base and a fragment
//! constraint. A trailing `#` with nothing after it is an explicit request for
//! posts whose type has no fragment; no `#` at all leaves the fragment
//! unconstrained.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a requested type constrains the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentMatch {
    /// No `#`: any fragment
    Any,
    /// `base#`: `fragment IS NULL`
    Absent,
    /// `base#frag`: `fragment = 'frag'`
    Exact(String),
}

/// A parsed type URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeUri {
    pub base: String,
    pub fragment: FragmentMatch,
}

impl TypeUri {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidTypeUri {
            uri: raw.to_string(),
            reason: reason.to_string(),
        };

        let uri = raw.trim();
        if uri.is_empty() {
            return Err(invalid("type URI is empty"));
        }
        if uri.chars().any(char::is_whitespace) {
            return Err(invalid("type URI contains whitespace"));
        }

        let (base, fragment) = match uri.split_once('#') {
            None => (uri, FragmentMatch::Any),
            Some((_, frag)) if frag.contains('#') => {
                return Err(invalid("type URI has more than one fragment"))
            }
            Some((base, "")) => (base, FragmentMatch::Absent),
            Some((base, frag)) => (base, FragmentMatch::Exact(frag.to_string())),
        };

        match base.split_once("://") {
            Some((scheme, rest))
                if !rest.is_empty()
                    && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) => {}
            _ => return Err(invalid("type URI must be absolute (scheme://...)")),
        }

        Ok(Self {
            base: base.to_string(),
            fragment,
        })
    }
}

impl FromStr for TypeUri {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            FragmentMatch::Any => f.write_str(&self.base),
            FragmentMatch::Absent => write!(f, "{}#", self.base),
            FragmentMatch::Exact(frag) => write!(f, "{}#{}", self.base, frag),
        }
    }
}
