//! Tag Record - free-form annotations on experiments and runs

use serde::{Deserialize, Serialize};

/// Tag Record is a string key-value annotation.
///
/// Tags differ from params in that they may be overwritten at any time
/// while the owning entity is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRecord {
    key: String,
    value: String,
}

impl TagRecord {
    /// Create a new tag record.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the tag key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the tag value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}
