//! Invite links embedding the current time as a session token

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::events::EventLog;

/// Destination for copied invite links
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Clipboard that keeps the last written text in memory
#[derive(Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

/// `<origin><path>?invite=<unix millis>`
pub fn invite_link(origin: &str, path: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}{}?invite={}",
        origin.trim_end_matches('/'),
        path,
        now.timestamp_millis()
    )
}

pub struct InviteLinkGenerator {
    origin: String,
    path: String,
    current: String,
    clipboard: Arc<dyn Clipboard>,
    log: EventLog,
}

impl InviteLinkGenerator {
    pub fn new(
        origin: impl Into<String>,
        path: impl Into<String>,
        clipboard: Arc<dyn Clipboard>,
        log: EventLog,
    ) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            current: String::new(),
            clipboard,
            log,
        }
    }

    /// Last generated link, empty before the first `generate`
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn generate(&mut self) -> String {
        self.current = invite_link(&self.origin, &self.path, Utc::now());
        self.log.append("Invite link generated");
        self.current.clone()
    }

    /// Copy the current link, even if none has been generated yet
    pub fn copy_to_clipboard(&self) -> Result<()> {
        self.clipboard.write_text(&self.current)?;
        self.log.append("Invite link copied");
        Ok(())
    }
}
