use serde::Deserialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SessionError;
use crate::kinds::DeviceKind;

/// Number of chunks a lagging subscriber may fall behind before dropping
const STREAM_CHANNEL_CAPACITY: usize = 256;

/// Encoded media data pushed by a live stream
#[derive(Debug, Clone)]
pub struct MediaChunk {
    /// Raw encoded bytes
    pub data: Vec<u8>,
    /// Milliseconds since the stream was opened
    pub timestamp_ms: u64,
    /// Device that produced the chunk
    pub kind: DeviceKind,
}

/// A single capture track belonging to a live stream
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: Uuid,
    kind: DeviceKind,
    ended: Arc<AtomicBool>,
}

impl MediaTrack {
    fn new(kind: DeviceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// Owned handle to an acquired camera or microphone stream
///
/// Dropping the handle stops every track, so a stream can never outlive the
/// device session that owns it.
#[derive(Debug)]
pub struct LiveStream {
    id: Uuid,
    kind: DeviceKind,
    label: String,
    tracks: Vec<MediaTrack>,
    chunks: broadcast::Sender<MediaChunk>,
}

impl LiveStream {
    /// Open a stream with one track and return the producer side with it
    pub fn open(kind: DeviceKind, label: impl Into<String>) -> (Self, StreamFeed) {
        let (chunks, _) = broadcast::channel(STREAM_CHANNEL_CAPACITY);
        let tracks = vec![MediaTrack::new(kind)];

        let stream = Self {
            id: Uuid::new_v4(),
            kind,
            label: label.into(),
            tracks: tracks.clone(),
            chunks: chunks.clone(),
        };

        let feed = StreamFeed {
            stream_id: stream.id,
            kind,
            tracks,
            chunks,
            opened_at: Instant::now(),
        };

        debug!("Opened {} stream {} ({})", kind, stream.id, stream.label);

        (stream, feed)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Whether any track is still producing
    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_ended())
    }

    /// Receive chunks pushed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<MediaChunk> {
        self.chunks.subscribe()
    }

    /// Stop all tracks and release the stream
    pub fn stop(self) {
        info!("Stopping {} stream {} ({})", self.kind, self.id, self.label);
        drop(self);
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Producer half of a live stream
///
/// Capture backends push encoded data here; pushes after the stream is
/// stopped are refused.
#[derive(Debug, Clone)]
pub struct StreamFeed {
    stream_id: Uuid,
    kind: DeviceKind,
    tracks: Vec<MediaTrack>,
    chunks: broadcast::Sender<MediaChunk>,
    opened_at: Instant,
}

impl StreamFeed {
    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_ended())
    }

    /// Push a chunk to every subscriber
    ///
    /// Returns false once the stream has been stopped.
    pub fn push(&self, data: Vec<u8>) -> bool {
        if !self.is_live() {
            return false;
        }

        let chunk = MediaChunk {
            data,
            timestamp_ms: self.opened_at.elapsed().as_millis() as u64,
            kind: self.kind,
        };

        // No subscribers is fine: nothing is recording right now
        let _ = self.chunks.send(chunk);
        true
    }
}

/// Capture backend trait
///
/// Implementations:
/// - Synthetic: generated chunks at a fixed cadence (demo server)
/// - Scripted: grant/deny outcomes queued by the caller (tests)
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Ask for access to a device and open a stream on it
    ///
    /// Suspends until the grant/deny decision is known. A dismissed prompt
    /// resolves to `PermissionDenied`.
    async fn acquire(&self, kind: DeviceKind) -> Result<LiveStream, SessionError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Which backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    Synthetic,
    Scripted,
}

/// Configuration for capture backends
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: CaptureSource,
    /// Simulated time spent waiting on the permission prompt
    pub grant_delay_ms: u64,
    /// Interval between generated chunks
    pub frame_interval_ms: u64,
    /// Size of each generated chunk in bytes
    pub frame_size_bytes: usize,
    /// Device kinds whose permission prompt is always denied
    pub denied: HashSet<DeviceKind>,
    /// Device kinds reported as absent
    pub unavailable: HashSet<DeviceKind>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::Synthetic,
            grant_delay_ms: 0,
            frame_interval_ms: 33, // ~30 fps
            frame_size_bytes: 4096,
            denied: HashSet::new(),
            unavailable: HashSet::new(),
        }
    }
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    pub fn create(config: CaptureConfig) -> Arc<dyn CaptureBackend> {
        match config.source {
            CaptureSource::Synthetic => Arc::new(super::synthetic::SyntheticBackend::new(config)),
            CaptureSource::Scripted => Arc::new(super::scripted::ScriptedBackend::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_after_stop_is_refused() {
        let (stream, feed) = LiveStream::open(DeviceKind::Camera, "test");
        assert!(feed.push(vec![1, 2, 3]));

        stream.stop();
        assert!(!feed.is_live());
        assert!(!feed.push(vec![4]));
    }

    #[tokio::test]
    async fn test_subscriber_receives_pushed_chunks() {
        let (stream, feed) = LiveStream::open(DeviceKind::Microphone, "test");
        let mut rx = stream.subscribe();

        feed.push(vec![7; 16]);

        let chunk = rx.recv().await.unwrap();
        assert_eq!(chunk.data.len(), 16);
        assert_eq!(chunk.kind, DeviceKind::Microphone);
    }

    #[test]
    fn test_drop_ends_tracks() {
        let (stream, feed) = LiveStream::open(DeviceKind::Camera, "test");
        let tracks = stream.tracks().to_vec();
        drop(stream);

        assert!(tracks.iter().all(|t| t.is_ended()));
        assert!(!feed.is_live());
    }
}
