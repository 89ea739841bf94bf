use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::backend::{CaptureBackend, LiveStream, StreamFeed};
use crate::error::SessionError;
use crate::kinds::DeviceKind;

/// Outcome of the next permission prompt for a device kind
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Grant,
    Deny(SessionError),
}

/// Backend driven entirely by the caller
///
/// Outcomes are consumed in order per device kind; an empty queue grants.
/// Granted streams expose their feed so chunks can be pushed by hand.
#[derive(Default)]
pub struct ScriptedBackend {
    outcomes: Mutex<HashMap<DeviceKind, VecDeque<ScriptedOutcome>>>,
    feeds: Mutex<HashMap<DeviceKind, StreamFeed>>,
    granted: Mutex<HashMap<DeviceKind, usize>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_outcome(&self, kind: DeviceKind, outcome: ScriptedOutcome) {
        self.outcomes.lock().entry(kind).or_default().push_back(outcome);
    }

    /// Deny the next prompt for `kind` with the given error
    pub fn deny_next(&self, kind: DeviceKind, error: SessionError) {
        self.push_outcome(kind, ScriptedOutcome::Deny(error));
    }

    /// Feed of the most recently granted stream for `kind`
    pub fn feed(&self, kind: DeviceKind) -> Option<StreamFeed> {
        self.feeds.lock().get(&kind).cloned()
    }

    /// Number of streams granted so far for `kind`
    pub fn granted_count(&self, kind: DeviceKind) -> usize {
        self.granted.lock().get(&kind).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedBackend {
    async fn acquire(&self, kind: DeviceKind) -> Result<LiveStream, SessionError> {
        let outcome = self
            .outcomes
            .lock()
            .get_mut(&kind)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(ScriptedOutcome::Grant);

        match outcome {
            ScriptedOutcome::Grant => {
                let (stream, feed) = LiveStream::open(kind, format!("scripted {}", kind));
                self.feeds.lock().insert(kind, feed);
                *self.granted.lock().entry(kind).or_insert(0) += 1;
                debug!("Scripted backend granted {} stream {}", kind, stream.id());
                Ok(stream)
            }
            ScriptedOutcome::Deny(error) => {
                debug!("Scripted backend denied {}: {}", kind, error);
                Err(error)
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
