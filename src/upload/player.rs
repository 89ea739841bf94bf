use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use super::validator::{MediaFile, PlayableRef, UploadConfig, UploadPolicy, Uploader};
use crate::error::ValidationError;
use crate::kinds::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Paused,
    Playing,
}

/// Point-in-time view of the player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub source: Option<PlayableRef>,
    pub playback: PlaybackState,
    pub position_ms: u64,
    pub error: Option<String>,
    pub max_size_mb: u64,
    pub formats: String,
}

/// Standalone single-video player, independent of both sides
pub struct VideoUploadPlayer {
    uploader: Uploader,
    source: Option<PlayableRef>,
    playback: PlaybackState,
    position: Duration,
    error: Option<String>,
}

impl VideoUploadPlayer {
    pub fn new(origin: impl Into<String>, policy: UploadPolicy) -> Self {
        let config = UploadConfig {
            video: policy,
            ..Default::default()
        };
        Self {
            uploader: Uploader::new(origin, config),
            source: None,
            playback: PlaybackState::Paused,
            position: Duration::ZERO,
            error: None,
        }
    }

    /// Validate and load a new video
    ///
    /// On rejection the previous video, playback state, and position stay as
    /// they were and the error message replaces any earlier one.
    pub fn upload(&mut self, file: &MediaFile) -> Result<PlayableRef, ValidationError> {
        match self.uploader.accept(MediaKind::Video, file) {
            Ok(playable) => {
                self.error = None;
                self.source = Some(playable.clone());
                self.playback = PlaybackState::Paused;
                self.position = Duration::ZERO;
                Ok(playable)
            }
            Err(e) => {
                warn!("Player rejected {}: {}", file.name, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Flip between playing and paused; does nothing without a video
    pub fn toggle_play(&mut self) -> PlaybackState {
        if self.source.is_none() {
            return self.playback;
        }

        self.playback = match self.playback {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        };
        info!("Player {:?}", self.playback);
        self.playback
    }

    /// Seek to the start and pause
    pub fn reset(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.position = Duration::ZERO;
        self.playback = PlaybackState::Paused;
    }

    /// Playback reached the end of the video
    pub fn ended(&mut self) {
        self.playback = PlaybackState::Paused;
    }

    pub fn seek(&mut self, position: Duration) {
        if self.source.is_some() {
            self.position = position;
        }
    }

    pub fn source(&self) -> Option<&PlayableRef> {
        self.source.as_ref()
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let policy = self.uploader.policy(MediaKind::Video);
        PlayerSnapshot {
            source: self.source.clone(),
            playback: self.playback,
            position_ms: self.position.as_millis() as u64,
            error: self.error.clone(),
            max_size_mb: policy.max_size_mb,
            formats: policy.format_hint(),
        }
    }
}
