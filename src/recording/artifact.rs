use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Finalized recording handed off for download
#[derive(Debug, Clone, Serialize)]
pub struct RecordedArtifact {
    /// `recorded-video-<ISO8601>.<ext>`
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Number of timeslice chunks that made up the recording
    pub chunk_count: usize,
    /// Chunks discarded because the buffer cap was reached
    pub dropped_chunks: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RecordedArtifact {
    pub fn file_name_for(content_type: &str, finished_at: DateTime<Utc>) -> String {
        format!(
            "recorded-video-{}.{}",
            finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            extension_for(content_type)
        )
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// File extension for a content type, ignoring codec parameters
fn extension_for(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .and_then(|essence| essence.trim().split('/').nth(1))
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or("bin")
}

/// One-shot handoff of a finished recording to the user
#[async_trait::async_trait]
pub trait DownloadSink: Send + Sync {
    async fn offer(&self, artifact: &RecordedArtifact) -> Result<()>;
}

/// Writes offered recordings into a directory
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create downloads directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl DownloadSink for DirectoryDownloads {
    async fn offer(&self, artifact: &RecordedArtifact) -> Result<()> {
        let path = self.dir.join(&artifact.file_name);
        tokio::fs::write(&path, &artifact.data)
            .await
            .with_context(|| format!("Failed to write recording to {}", path.display()))?;

        info!(
            "Recording saved: {} ({} bytes)",
            path.display(),
            artifact.size_bytes()
        );
        Ok(())
    }
}

/// Keeps offered recordings in memory
#[derive(Default)]
pub struct MemoryDownloads {
    artifacts: Mutex<Vec<RecordedArtifact>>,
}

impl MemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<RecordedArtifact> {
        self.artifacts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.lock().is_empty()
    }
}

#[async_trait::async_trait]
impl DownloadSink for MemoryDownloads {
    async fn offer(&self, artifact: &RecordedArtifact) -> Result<()> {
        self.artifacts.lock().push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_uses_iso_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            RecordedArtifact::file_name_for("video/webm", at),
            "recorded-video-2024-03-09T14:05:07.000Z.webm"
        );
    }

    #[test]
    fn test_extension_ignores_codecs() {
        assert_eq!(extension_for("video/webm;codecs=vp8,opus"), "webm");
        assert_eq!(extension_for("video/mp4"), "mp4");
        assert_eq!(extension_for("garbage"), "bin");
    }
}
