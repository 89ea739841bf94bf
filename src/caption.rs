//! Per-side caption producer
//!
//! Each side gets a periodic task publishing the latest caption line. Only
//! the newest value is kept; readers never see a backlog.

use chrono::{DateTime, Local};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::kinds::Side;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub interval_ms: u64,
    pub left_prefix: String,
    pub right_prefix: String,
}

impl CaptionConfig {
    pub fn prefix_for(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_prefix,
            Side::Right => &self.right_prefix,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            left_prefix: "Lorem ipsum".to_string(),
            right_prefix: "Dolor sit amet".to_string(),
        }
    }
}

pub fn caption_text(prefix: &str, now: DateTime<Local>) -> String {
    format!("{} {}", prefix, now.format("%H:%M:%S"))
}

/// Running caption producer for one side; stops when dropped
pub struct CaptionFeed {
    side: Side,
    rx: watch::Receiver<String>,
    handle: JoinHandle<()>,
}

impl CaptionFeed {
    pub fn spawn(side: Side, prefix: impl Into<String>, interval: Duration) -> Self {
        let prefix = prefix.into();
        let (tx, rx) = watch::channel(String::new());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if tx.send(caption_text(&prefix, Local::now())).is_err() {
                    break;
                }
            }
            debug!("Caption producer for {} side stopped", side);
        });

        Self { side, rx, handle }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn latest(&self) -> String {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}

impl Drop for CaptionFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Caption feeds for both sides
pub struct Captions {
    left: CaptionFeed,
    right: CaptionFeed,
}

impl Captions {
    pub fn spawn(config: &CaptionConfig) -> Self {
        let interval = Duration::from_millis(config.interval_ms.max(1));
        Self {
            left: CaptionFeed::spawn(Side::Left, config.prefix_for(Side::Left), interval),
            right: CaptionFeed::spawn(Side::Right, config.prefix_for(Side::Right), interval),
        }
    }

    pub fn feed(&self, side: Side) -> &CaptionFeed {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}
