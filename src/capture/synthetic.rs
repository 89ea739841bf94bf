use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::backend::{CaptureBackend, CaptureConfig, LiveStream};
use crate::error::SessionError;
use crate::kinds::DeviceKind;

/// Backend that fabricates device streams
///
/// Each granted stream gets a producer task pushing patterned chunks at the
/// configured interval until the stream is stopped.
pub struct SyntheticBackend {
    config: CaptureConfig,
}

impl SyntheticBackend {
    pub fn new(config: CaptureConfig) -> Self {
        info!(
            "Synthetic capture backend initialized ({}ms frames, {} bytes each)",
            config.frame_interval_ms, config.frame_size_bytes
        );
        Self { config }
    }

    fn payload(kind: DeviceKind, sequence: u64, size: usize) -> Vec<u8> {
        let seed = match kind {
            DeviceKind::Camera => 0x56,
            DeviceKind::Microphone => 0x41,
        };
        (0..size)
            .map(|i| seed ^ (sequence as u8).wrapping_add(i as u8))
            .collect()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn acquire(&self, kind: DeviceKind) -> Result<LiveStream, SessionError> {
        if self.config.grant_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.grant_delay_ms)).await;
        }

        if self.config.unavailable.contains(&kind) {
            warn!("Synthetic {} reported as unavailable", kind);
            return Err(SessionError::DeviceUnavailable(format!(
                "Requested {} device not found",
                kind
            )));
        }

        if self.config.denied.contains(&kind) {
            warn!("Synthetic {} permission denied", kind);
            return Err(SessionError::PermissionDenied(
                "Permission denied by user".to_string(),
            ));
        }

        let (stream, feed) = LiveStream::open(kind, format!("synthetic {}", kind));

        let frame_interval = Duration::from_millis(self.config.frame_interval_ms.max(1));
        let frame_size = self.config.frame_size_bytes;

        tokio::spawn(async move {
            let mut ticker = interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut sequence: u64 = 0;

            loop {
                ticker.tick().await;
                if !feed.push(SyntheticBackend::payload(kind, sequence, frame_size)) {
                    break;
                }
                sequence += 1;
            }

            debug!(
                "Synthetic {} producer for stream {} stopped after {} chunks",
                kind,
                feed.stream_id(),
                sequence
            );
        });

        Ok(stream)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_denied_kind_is_refused() {
        let mut config = CaptureConfig::default();
        config.denied.insert(DeviceKind::Microphone);
        let backend = SyntheticBackend::new(config);

        let err = backend.acquire(DeviceKind::Microphone).await.unwrap_err();
        assert!(matches!(err, SessionError::PermissionDenied(_)));

        let stream = backend.acquire(DeviceKind::Camera).await.unwrap();
        assert!(stream.is_live());
    }

    #[tokio::test]
    async fn test_unavailable_kind_is_refused() {
        let mut config = CaptureConfig::default();
        config.unavailable.insert(DeviceKind::Camera);
        let backend = SyntheticBackend::new(config);

        let err = backend.acquire(DeviceKind::Camera).await.unwrap_err();
        assert!(matches!(err, SessionError::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_granted_stream_produces_chunks() {
        let config = CaptureConfig {
            frame_interval_ms: 5,
            frame_size_bytes: 32,
            ..Default::default()
        };
        let backend = SyntheticBackend::new(config);

        let stream = backend.acquire(DeviceKind::Camera).await.unwrap();
        let mut rx = stream.subscribe();

        let chunk = rx.recv().await.unwrap();
        assert_eq!(chunk.data.len(), 32);
        assert_eq!(chunk.kind, DeviceKind::Camera);
    }
}
