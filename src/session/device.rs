use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::capture::LiveStream;
use crate::kinds::DeviceKind;

/// Marks one device as acquiring until dropped
///
/// The flag is cleared however the acquisition ends: completed, failed, or
/// abandoned because the awaiting caller went away.
#[derive(Debug)]
pub(crate) struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Acquisition state of one device on one side
///
/// `enabled` is derived from holding a stream. The in-flight flag guards
/// against a second acquisition while the first awaits its prompt; it is not
/// an observable enabled state.
#[derive(Debug)]
pub struct DeviceSession {
    kind: DeviceKind,
    stream: Option<LiveStream>,
    in_flight: Arc<AtomicBool>,
}

impl DeviceSession {
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            stream: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn stream(&self) -> Option<&LiveStream> {
        self.stream.as_ref()
    }

    /// Mark an acquisition as started
    ///
    /// Returns `None` if one is already running or a stream is held.
    pub(crate) fn begin_acquire(&mut self) -> Option<InFlight> {
        if self.stream.is_some() || self.in_flight.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(InFlight {
            flag: Arc::clone(&self.in_flight),
        })
    }

    /// Whether `guard` was handed out by this device
    pub(crate) fn owns(&self, guard: &InFlight) -> bool {
        Arc::ptr_eq(&self.in_flight, &guard.flag)
    }

    /// End the acquisition, storing the stream if one was granted
    pub(crate) fn finish_acquire(&mut self, guard: InFlight, stream: Option<LiveStream>) {
        drop(guard);
        if let Some(stream) = stream {
            debug!("{} stream {} stored", self.kind.label(), stream.id());
            if let Some(previous) = self.stream.replace(stream) {
                previous.stop();
            }
        }
    }

    /// Give up the held stream, if any
    pub(crate) fn release(&mut self) -> Option<LiveStream> {
        self.stream.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_cycle() {
        let mut device = DeviceSession::new(DeviceKind::Camera);
        assert!(!device.is_enabled());

        let guard = device.begin_acquire().expect("device is idle");
        assert!(device.is_in_flight());
        assert!(!device.is_enabled(), "acquiring is not enabled");
        assert!(
            device.begin_acquire().is_none(),
            "second acquisition must be refused"
        );

        let (stream, _feed) = LiveStream::open(DeviceKind::Camera, "test");
        device.finish_acquire(guard, Some(stream));
        assert!(device.is_enabled());
        assert!(!device.is_in_flight());
        assert!(
            device.begin_acquire().is_none(),
            "cannot acquire while holding a stream"
        );

        let released = device.release();
        assert!(released.is_some());
        assert!(!device.is_enabled());
    }

    #[test]
    fn test_failed_acquire_clears_flag() {
        let mut device = DeviceSession::new(DeviceKind::Microphone);
        let guard = device.begin_acquire().expect("device is idle");
        device.finish_acquire(guard, None);

        assert!(!device.is_in_flight());
        assert!(!device.is_enabled());
        assert!(device.begin_acquire().is_some(), "retry is allowed after failure");
    }

    #[test]
    fn test_abandoned_acquire_clears_flag() {
        let mut device = DeviceSession::new(DeviceKind::Camera);
        let guard = device.begin_acquire().expect("device is idle");
        assert!(device.is_in_flight());

        drop(guard);
        assert!(!device.is_in_flight());
        assert!(device.begin_acquire().is_some());
    }

    #[test]
    fn test_guard_ownership() {
        let mut camera = DeviceSession::new(DeviceKind::Camera);
        let mut microphone = DeviceSession::new(DeviceKind::Microphone);
        let guard = camera.begin_acquire().expect("device is idle");

        assert!(camera.owns(&guard));
        assert!(!microphone.owns(&guard));
        assert!(microphone.begin_acquire().is_some());
    }
}
