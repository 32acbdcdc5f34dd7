use serde::{Deserialize, Serialize};

/// Events emitted by the page scanner toward the dedup store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Titles collected from the tracker page, in document order.
    TitleReport {
        titles: Vec<String>,
        timestamp_ms: i64,
    },
    /// A scan gave up after exhausting its retries.
    ErrorReport { error: String, timestamp_ms: i64 },
}

impl ScanEvent {
    pub fn titles(titles: Vec<String>) -> Self {
        Self::TitleReport {
            titles,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::ErrorReport {
            error: error.into(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}
