//! Store Configuration

use serde::Deserialize;

/// Configuration for the state containers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Course of the active session; 0 when no course is selected.
    pub course_id: u64,
    /// Skip records that fail to construct instead of failing the batch.
    pub skip_invalid_records: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            course_id: 0,
            skip_invalid_records: false, // Strict by default
        }
    }
}

impl StoreConfig {
    /// Create config where one bad record fails the whole batch.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Create config where bad records are logged and skipped.
    pub fn lenient() -> Self {
        Self {
            skip_invalid_records: true,
            ..Self::default()
        }
    }

    /// Set the active course.
    pub fn with_course_id(mut self, course_id: u64) -> Self {
        self.course_id = course_id;
        self
    }

    /// Parse config from JSON text. Missing keys take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
