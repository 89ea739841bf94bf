use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::kinds::MediaKind;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Size and type limits applied to an uploaded file
///
/// Fields left out of a config section keep the video defaults; see
/// [`UploadConfig`] for the audio slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub max_size_mb: u64,
    pub accepted_formats: Vec<String>,
}

impl UploadPolicy {
    pub fn video() -> Self {
        Self {
            max_size_mb: 100,
            accepted_formats: vec![
                "video/mp4".to_string(),
                "video/webm".to_string(),
                "video/ogg".to_string(),
            ],
        }
    }

    pub fn audio() -> Self {
        Self {
            max_size_mb: 100,
            accepted_formats: vec![
                "audio/mpeg".to_string(),
                "audio/wav".to_string(),
                "audio/webm".to_string(),
                "audio/ogg".to_string(),
            ],
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Short list of accepted subtypes, e.g. "mp4, webm, ogg"
    pub fn format_hint(&self) -> String {
        self.accepted_formats
            .iter()
            .map(|f| f.split('/').nth(1).unwrap_or(f.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check type first, then size
    pub fn validate(&self, media: MediaKind, file: &MediaFile) -> Result<(), ValidationError> {
        if !self.accepted_formats.iter().any(|f| f == &file.content_type) {
            return Err(ValidationError::UnsupportedFormat {
                media,
                content_type: file.content_type.clone(),
            });
        }

        if file.size_bytes > self.max_size_bytes() {
            return Err(ValidationError::TooLarge {
                max_size_mb: self.max_size_mb,
                size_bytes: file.size_bytes,
            });
        }

        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::video()
    }
}

/// Upload limits for side sessions, per media kind
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub video: UploadPolicy,
    #[serde(deserialize_with = "audio_policy")]
    pub audio: UploadPolicy,
}

/// Policy section with every field optional
#[derive(Deserialize)]
struct PolicyOverrides {
    max_size_mb: Option<u64>,
    accepted_formats: Option<Vec<String>>,
}

fn audio_policy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UploadPolicy, D::Error> {
    let overrides = PolicyOverrides::deserialize(deserializer)?;
    let defaults = UploadPolicy::audio();
    Ok(UploadPolicy {
        max_size_mb: overrides.max_size_mb.unwrap_or(defaults.max_size_mb),
        accepted_formats: overrides
            .accepted_formats
            .unwrap_or(defaults.accepted_formats),
    })
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            video: UploadPolicy::video(),
            audio: UploadPolicy::audio(),
        }
    }
}

/// A file chosen by the user
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub path: Option<PathBuf>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size_bytes,
            path: None,
        }
    }

    /// Describe a file on disk, inferring its content type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

        if !metadata.is_file() {
            anyhow::bail!("{} is not a file", path.display());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let content_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(content_type_for_extension)
            .unwrap_or("application/octet-stream");

        Ok(Self {
            name,
            content_type: content_type.to_string(),
            size_bytes: metadata.len(),
            path: Some(path.to_path_buf()),
        })
    }
}

fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogv" | "ogg" => "video/ogg",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "weba" => "audio/webm",
        "oga" | "opus" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Opaque playable URL standing in for an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayableRef {
    url: String,
    file_name: String,
    content_type: String,
}

impl PlayableRef {
    fn for_file(origin: &str, file: &MediaFile) -> Self {
        Self {
            url: format!("blob:{}/{}", origin.trim_end_matches('/'), Uuid::new_v4()),
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Validates chosen files and turns accepted ones into playable references
#[derive(Debug, Clone)]
pub struct Uploader {
    origin: String,
    config: UploadConfig,
}

impl Uploader {
    pub fn new(origin: impl Into<String>, config: UploadConfig) -> Self {
        Self {
            origin: origin.into(),
            config,
        }
    }

    pub fn policy(&self, media: MediaKind) -> &UploadPolicy {
        match media {
            MediaKind::Video => &self.config.video,
            MediaKind::Audio => &self.config.audio,
        }
    }

    /// Validate `file` and mint a playable reference for it
    ///
    /// A rejected file produces no reference.
    pub fn accept(
        &self,
        media: MediaKind,
        file: &MediaFile,
    ) -> Result<PlayableRef, ValidationError> {
        if let Err(e) = self.policy(media).validate(media, file) {
            debug!("Rejected {} upload {}: {}", media, file.name, e);
            return Err(e);
        }

        let playable = PlayableRef::for_file(&self.origin, file);
        info!(
            "Accepted {} upload {} ({} bytes) as {}",
            media, file.name, file.size_bytes, playable.url
        );
        Ok(playable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hint() {
        assert_eq!(UploadPolicy::video().format_hint(), "mp4, webm, ogg");
    }

    #[test]
    fn test_type_checked_before_size() {
        let policy = UploadPolicy::video();
        let file = MediaFile::new("notes.txt", "text/plain", 500 * BYTES_PER_MB);

        let err = policy.validate(MediaKind::Video, &file).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFormat { .. }));
        assert_eq!(err.to_string(), "Please upload a valid video file");
    }

    #[test]
    fn test_huge_limit_saturates() {
        let policy = UploadPolicy {
            max_size_mb: u64::MAX,
            ..UploadPolicy::video()
        };
        assert_eq!(policy.max_size_bytes(), u64::MAX);
        let file = MediaFile::new("big.mp4", "video/mp4", u64::MAX);
        assert!(policy.validate(MediaKind::Video, &file).is_ok());
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let policy = UploadPolicy::video();
        let file = MediaFile::new("clip.mp4", "video/mp4", 100 * BYTES_PER_MB);
        assert!(policy.validate(MediaKind::Video, &file).is_ok());

        let file = MediaFile::new("clip.mp4", "video/mp4", 100 * BYTES_PER_MB + 1);
        let err = policy.validate(MediaKind::Video, &file).unwrap_err();
        assert_eq!(err.to_string(), "File size should be less than 100MB");
    }

    #[test]
    fn test_playable_refs_are_unique() {
        let uploader = Uploader::new("http://localhost:8080", UploadConfig::default());
        let file = MediaFile::new("clip.webm", "video/webm", 1024);

        let first = uploader.accept(MediaKind::Video, &file).unwrap();
        let second = uploader.accept(MediaKind::Video, &file).unwrap();

        assert_ne!(first, second);
        assert!(first.url().starts_with("blob:http://localhost:8080/"));
    }

    #[test]
    fn test_from_path_infers_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Greeting.WEBM");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let file = MediaFile::from_path(&path).unwrap();
        assert_eq!(file.content_type, "video/webm");
        assert_eq!(file.size_bytes, 64);
        assert_eq!(file.name, "Greeting.WEBM");
    }
}
