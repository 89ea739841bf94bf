use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::artifact::RecordedArtifact;
use crate::capture::{LiveStream, MediaChunk};
use crate::kinds::Side;

/// Recorder configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Interval at which pushed data is cut into buffered chunks
    pub timeslice_ms: u64,
    /// Content type of finalized recordings
    pub content_type: String,
    /// Upper bound on buffered bytes; later chunks are dropped
    pub max_buffered_bytes: usize,
    /// Where finished recordings are offered for download
    pub downloads_dir: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            timeslice_ms: 1000,
            content_type: "video/webm".to_string(),
            max_buffered_bytes: 512 * 1024 * 1024,
            downloads_dir: "~/Downloads/asl-expressor".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Ordered chunks captured during one recording
struct CaptureBuffer {
    chunks: Vec<Vec<u8>>,
    bytes: Arc<AtomicUsize>,
    max_bytes: usize,
    dropped: usize,
}

impl CaptureBuffer {
    fn new(max_bytes: usize, bytes: Arc<AtomicUsize>) -> Self {
        bytes.store(0, Ordering::SeqCst);
        Self {
            chunks: Vec::new(),
            bytes,
            max_bytes,
            dropped: 0,
        }
    }

    /// Move pending data into the buffer as one chunk
    fn flush(&mut self, pending: &mut Vec<u8>) {
        if pending.is_empty() {
            return;
        }

        let chunk = std::mem::take(pending);
        let total = self.bytes.load(Ordering::SeqCst);
        if total + chunk.len() > self.max_bytes {
            self.dropped += 1;
            warn!(
                "Recording buffer full ({} bytes), dropping {} byte chunk",
                total,
                chunk.len()
            );
            return;
        }

        self.bytes.fetch_add(chunk.len(), Ordering::SeqCst);
        self.chunks.push(chunk);
    }
}

struct CaptureTask {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<CaptureBuffer>,
    started_at: DateTime<Utc>,
}

/// Records a side's live camera stream into a downloadable artifact
///
/// The buffer lives inside the capture task while recording and is moved
/// into the artifact when the task is joined, so a restart can never see
/// data from a previous recording.
pub struct Recorder {
    side: Side,
    config: RecorderConfig,
    task: Option<CaptureTask>,
    buffered_bytes: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new(side: Side, config: RecorderConfig) -> Self {
        Self {
            side,
            config,
            task: None,
            buffered_bytes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn state(&self) -> RecorderState {
        if self.task.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.task.is_some()
    }

    /// Bytes captured by the current recording (0 when idle)
    pub fn buffered_bytes(&self) -> usize {
        if self.task.is_some() {
            self.buffered_bytes.load(Ordering::SeqCst)
        } else {
            0
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Start capturing `camera`
    ///
    /// Returns false if a recording is already running.
    pub fn start(&mut self, camera: &LiveStream) -> bool {
        if self.task.is_some() {
            warn!("Recording already started on {} side", self.side);
            return false;
        }

        let rx = camera.subscribe();
        let (stop_tx, stop_rx) = oneshot::channel();
        let buffer = CaptureBuffer::new(
            self.config.max_buffered_bytes,
            Arc::clone(&self.buffered_bytes),
        );
        let timeslice = Duration::from_millis(self.config.timeslice_ms.max(1));

        info!(
            "Starting recording on {} side from stream {} ({}ms timeslice)",
            self.side,
            camera.id(),
            self.config.timeslice_ms
        );

        let handle = tokio::spawn(capture(rx, stop_rx, buffer, timeslice));

        self.task = Some(CaptureTask {
            stop_tx,
            handle,
            started_at: Utc::now(),
        });
        true
    }

    /// Stop capturing and finalize the buffer
    ///
    /// Returns `None` when no recording is running.
    pub async fn stop(&mut self) -> Option<RecordedArtifact> {
        let task = self.task.take()?;

        info!("Stopping recording on {} side", self.side);

        // The task may already have exited; joining still yields the buffer
        let _ = task.stop_tx.send(());

        let buffer = match task.handle.await {
            Ok(buffer) => buffer,
            Err(e) => {
                error!("Capture task on {} side panicked: {}", self.side, e);
                CaptureBuffer::new(
                    self.config.max_buffered_bytes,
                    Arc::clone(&self.buffered_bytes),
                )
            }
        };

        let finished_at = Utc::now();
        let chunk_count = buffer.chunks.len();
        let dropped_chunks = buffer.dropped;
        let data = buffer.chunks.concat();
        self.buffered_bytes.store(0, Ordering::SeqCst);

        let artifact = RecordedArtifact {
            file_name: RecordedArtifact::file_name_for(&self.config.content_type, finished_at),
            content_type: self.config.content_type.clone(),
            data,
            chunk_count,
            dropped_chunks,
            started_at: task.started_at,
            finished_at,
        };

        info!(
            "Recording on {} side finalized: {} ({} bytes, {} chunks)",
            self.side,
            artifact.file_name,
            artifact.size_bytes(),
            artifact.chunk_count
        );

        Some(artifact)
    }
}

/// Capture loop: append pushed data, cut a chunk every timeslice
async fn capture(
    mut rx: broadcast::Receiver<MediaChunk>,
    mut stop_rx: oneshot::Receiver<()>,
    mut buffer: CaptureBuffer,
    timeslice: Duration,
) -> CaptureBuffer {
    let mut ticker = tokio::time::interval(timeslice);
    ticker.tick().await;

    let mut pending: Vec<u8> = Vec::new();
    let mut stream_closed = false;

    loop {
        tokio::select! {
            biased;
            received = rx.recv(), if !stream_closed => match received {
                Ok(chunk) => pending.extend_from_slice(&chunk.data),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Recorder lagged behind camera stream, {} chunks lost", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Camera stream closed while recording");
                    stream_closed = true;
                }
            },
            _ = &mut stop_rx => break,
            _ = ticker.tick() => buffer.flush(&mut pending),
        }
    }

    // Pick up everything pushed before the stop request
    loop {
        match rx.try_recv() {
            Ok(chunk) => pending.extend_from_slice(&chunk.data),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("Recorder lagged behind camera stream, {} chunks lost", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    buffer.flush(&mut pending);

    buffer
}
