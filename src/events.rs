//! Session event log
//!
//! Process-wide, append-only record of every transition on both sides.
//! Readers take snapshots; there is no subscription.

use chrono::{DateTime, Local};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::kinds::Side;

/// A single timestamped log line
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Shared handle to the append-only event log
///
/// Clones refer to the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message stamped with the current local time
    pub fn append(&self, message: impl Into<String>) {
        let entry = Self::stamp(message);
        info!(target: "session_events", "{}", entry.message);
        self.entries.write().push(entry);
    }

    /// Append a message raised by one side
    pub fn append_for(&self, side: Side, message: impl Into<String>) {
        let entry = Self::stamp(message);
        info!(target: "session_events", side = %side, "{}", entry.message);
        self.entries.write().push(entry);
    }

    fn stamp(message: impl Into<String>) -> LogEntry {
        LogEntry {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Copy of every entry appended so far, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    pub fn latest(&self) -> Option<LogEntry> {
        self.entries.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let log = EventLog::new();
        let other = log.clone();

        log.append("Camera access granted for left side");
        other.append("Camera left stopped");

        assert_eq!(log.len(), 2);
        assert_eq!(
            log.latest().map(|e| e.message),
            Some("Camera left stopped".to_string())
        );
    }

    #[test]
    fn test_side_entries_share_the_log() {
        let log = EventLog::new();
        log.append_for(Side::Left, "Audio left muted");
        log.append("Invite link generated");
        log.append_for(Side::Right, "Camera right stopped");

        let messages: Vec<String> = log.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            vec![
                "Audio left muted",
                "Invite link generated",
                "Camera right stopped"
            ]
        );
    }

    #[test]
    fn test_snapshot_is_detached() {
        let log = EventLog::new();
        log.append("first");

        let snapshot = log.snapshot();
        log.append("second");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }

    #[test]
    fn test_display_prefixes_time() {
        let log = EventLog::new();
        log.append("Invite link generated");

        let line = log.latest().unwrap().to_string();
        assert!(line.ends_with(": Invite link generated"));
    }
}
