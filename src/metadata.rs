//! Structured facts pulled out of report text.
//!
//! The report renders each fact as a `Marker: value` line. Absence of a
//! marker is an expected state and yields a sentinel rather than an error.

use serde::{Deserialize, Serialize};

/// Marker preceding the report creation time.
pub const CREATED_TIME_MARKER: &str = "Created Time:";

/// Marker preceding the report upload time.
pub const UPLOAD_TIME_MARKER: &str = "Upload Time:";

/// Returned when the report carries no creation time.
pub const NO_CREATED_TIME: &str = "No created time found.";

/// Facts extracted from a corpus document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Creation time as written in the report, or [`NO_CREATED_TIME`].
    pub created_time: String,
    /// Upload time as written in the report, if present.
    pub upload_time: Option<String>,
}

impl ExtractedMetadata {
    /// Extract all known facts from report text.
    pub fn from_text(text: &str) -> Self {
        Self {
            created_time: extract_created_time(text),
            upload_time: extract_field(text, UPLOAD_TIME_MARKER),
        }
    }

    /// Whether the report carried a creation time.
    pub fn has_created_time(&self) -> bool {
        self.created_time != NO_CREATED_TIME
    }
}

/// Return the creation time from the first line carrying the marker.
pub fn extract_created_time(text: &str) -> String {
    extract_field(text, CREATED_TIME_MARKER).unwrap_or_else(|| NO_CREATED_TIME.to_string())
}

/// Return the trimmed remainder after `marker` on the first line containing it.
pub fn extract_field(text: &str, marker: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.find(marker).map(|idx| &line[idx + marker.len()..]))
        .map(|rest| rest.trim().to_string())
}
