//! In-memory run log
//!
//! Accumulates human-readable, timestamped lines for one workflow run;
//! cleared at the start of each new run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

/// Append-only log for a single workflow run
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            line: line.into(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
