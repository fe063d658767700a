#![forbid(unsafe_code)]

//! Panel identity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier correlating one embedded panel instance across
/// cross-context messages, configuration, and emitted events.
///
/// The legacy host renders one panel per location (for example `"normal"`
/// or `"side"`), and every inbound message declares the location it is
/// addressed to. Two panels must never share a location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Create a location from its host-assigned name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw location name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Location {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
