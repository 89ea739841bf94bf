use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::config::SideConfig;
use super::device::{DeviceSession, InFlight};
use super::selector::{ActiveSource, SourceSelector};
use super::stats::{DeviceSnapshot, RecorderSnapshot, SideSnapshot};
use crate::capture::{CaptureBackend, LiveStream};
use crate::error::{SessionError, SessionResult};
use crate::events::EventLog;
use crate::kinds::{DeviceKind, MediaKind, Side};
use crate::recording::{DownloadSink, RecordedArtifact, Recorder, RecorderState};
use crate::upload::{MediaFile, PlayableRef, Uploader};

/// Result of the first half of a device toggle
#[derive(Debug)]
pub enum Toggle {
    /// The device was enabled and has been released
    Released,
    /// The device was disabled; the caller must acquire and then call
    /// [`SideSession::complete_acquire`] with the ticket
    Acquire(AcquireTicket),
}

/// Proof that an acquisition was started for (side, kind)
///
/// Dropping a ticket without completing it abandons the acquisition and
/// frees the device for the next toggle.
#[derive(Debug)]
#[must_use = "an acquisition ticket should be completed with the backend result"]
pub struct AcquireTicket {
    side: Side,
    kind: DeviceKind,
    guard: InFlight,
}

impl AcquireTicket {
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }
}

/// All media state owned by one side
///
/// Two instances make up the application. They share nothing mutable; the
/// event log they both append to is append-only.
pub struct SideSession {
    side: Side,
    camera: DeviceSession,
    microphone: DeviceSession,
    selector: SourceSelector,
    recorder: Recorder,
    uploader: Uploader,
    muted: bool,
    last_error: Option<String>,
    backend: Arc<dyn CaptureBackend>,
    downloads: Arc<dyn DownloadSink>,
    log: EventLog,
}

impl SideSession {
    pub fn new(
        side: Side,
        config: SideConfig,
        backend: Arc<dyn CaptureBackend>,
        downloads: Arc<dyn DownloadSink>,
        log: EventLog,
    ) -> Self {
        info!(
            "Creating {} side session (capture backend: {})",
            side,
            backend.name()
        );

        Self {
            side,
            camera: DeviceSession::new(DeviceKind::Camera),
            microphone: DeviceSession::new(DeviceKind::Microphone),
            selector: SourceSelector::new(),
            recorder: Recorder::new(side, config.recorder),
            uploader: Uploader::new(config.origin, config.upload),
            muted: false,
            last_error: None,
            backend,
            downloads,
            log,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn backend(&self) -> Arc<dyn CaptureBackend> {
        Arc::clone(&self.backend)
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    fn device(&self, kind: DeviceKind) -> &DeviceSession {
        match kind {
            DeviceKind::Camera => &self.camera,
            DeviceKind::Microphone => &self.microphone,
        }
    }

    fn device_mut(&mut self, kind: DeviceKind) -> &mut DeviceSession {
        match kind {
            DeviceKind::Camera => &mut self.camera,
            DeviceKind::Microphone => &mut self.microphone,
        }
    }

    pub fn is_enabled(&self, kind: DeviceKind) -> bool {
        self.device(kind).is_enabled()
    }

    pub fn is_in_flight(&self, kind: DeviceKind) -> bool {
        self.device(kind).is_in_flight()
    }

    pub fn stream(&self, kind: DeviceKind) -> Option<&LiveStream> {
        self.device(kind).stream()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn uploaded(&self, media: MediaKind) -> Option<&PlayableRef> {
        self.selector.uploaded(media)
    }

    /// Source the presentation layer should play for `media`
    pub fn active_source(&self, media: MediaKind) -> ActiveSource {
        self.selector
            .resolve(media, self.device(media.device_kind()).stream())
    }

    pub fn snapshot(&self) -> SideSnapshot {
        let device = |d: &DeviceSession| DeviceSnapshot {
            enabled: d.is_enabled(),
            in_flight: d.is_in_flight(),
        };

        SideSnapshot {
            side: self.side,
            camera: device(&self.camera),
            microphone: device(&self.microphone),
            muted: self.muted,
            recorder: RecorderSnapshot {
                state: self.recorder.state(),
                buffered_bytes: self.recorder.buffered_bytes(),
            },
            video: self.active_source(MediaKind::Video),
            audio: self.active_source(MediaKind::Audio),
            last_error: self.last_error.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Device toggles
    // ------------------------------------------------------------------

    /// Toggle a device: release it if enabled, otherwise acquire it
    ///
    /// Returns the new enabled state. An acquisition failure leaves the
    /// device disabled and the session usable.
    pub async fn toggle_device(&mut self, kind: DeviceKind) -> SessionResult<bool> {
        match self.begin_toggle(kind).await? {
            Toggle::Released => Ok(false),
            Toggle::Acquire(ticket) => {
                let result = self.backend.acquire(kind).await;
                self.complete_acquire(ticket, result)?;
                Ok(true)
            }
        }
    }

    /// First half of a toggle
    ///
    /// Releasing completes here. Acquiring only marks the device in flight so
    /// the caller can await the backend without holding the session.
    pub async fn begin_toggle(&mut self, kind: DeviceKind) -> SessionResult<Toggle> {
        if self.device(kind).is_in_flight() {
            warn!("{} acquisition already in flight on {} side", kind, self.side);
            return Err(SessionError::AcquisitionInFlight {
                side: self.side,
                kind,
            });
        }

        if self.device(kind).is_enabled() {
            self.release_device(kind).await;
            return Ok(Toggle::Released);
        }

        let Some(guard) = self.device_mut(kind).begin_acquire() else {
            return Err(SessionError::AcquisitionInFlight {
                side: self.side,
                kind,
            });
        };
        debug!("Acquiring {} for {} side", kind, self.side);
        Ok(Toggle::Acquire(AcquireTicket {
            side: self.side,
            kind,
            guard,
        }))
    }

    /// Second half of an acquiring toggle
    pub fn complete_acquire(
        &mut self,
        ticket: AcquireTicket,
        result: Result<LiveStream, SessionError>,
    ) -> SessionResult<()> {
        let AcquireTicket { side, kind, guard } = ticket;
        if !self.device(kind).owns(&guard) {
            return Err(SessionError::PreconditionViolation(format!(
                "{} side ticket completed on {} side",
                side, self.side
            )));
        }

        match result {
            Ok(stream) => {
                self.device_mut(kind).finish_acquire(guard, Some(stream));
                self.last_error = None;
                self.log.append_for(
                    side,
                    format!("{} access granted for {} side", kind.label(), side),
                );
                Ok(())
            }
            Err(e) => {
                self.device_mut(kind).finish_acquire(guard, None);
                warn!("Failed to access {} for {} side: {}", kind, side, e);
                self.last_error = Some(e.to_string());
                self.log.append_for(
                    side,
                    format!("Failed to access {} for {} side: {}", kind, side, e),
                );
                Err(e)
            }
        }
    }

    async fn release_device(&mut self, kind: DeviceKind) {
        if kind == DeviceKind::Camera && self.recorder.is_recording() {
            self.finish_recording(Some("camera disabled")).await;
        }

        if let Some(stream) = self.device_mut(kind).release() {
            stream.stop();
            self.log.append_for(self.side, format!("{} {} stopped", kind.label(), self.side));
        }
    }

    // ------------------------------------------------------------------
    // Audio monitor
    // ------------------------------------------------------------------

    /// Flip the audio monitor mute flag; device state is unaffected
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        let verb = if self.muted { "muted" } else { "unmuted" };
        self.log.append_for(self.side, format!("Audio {} {}", self.side, verb));
        self.muted
    }

    // ------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------

    /// Start recording the live camera stream
    ///
    /// Fails with `PreconditionViolation` when the camera is disabled; the
    /// camera is never enabled implicitly. Starting twice is a no-op.
    pub fn start_recording(&mut self) -> SessionResult<()> {
        let Some(camera) = self.camera.stream() else {
            return Err(SessionError::PreconditionViolation(format!(
                "cannot record on {} side while the camera is disabled",
                self.side
            )));
        };

        if self.recorder.start(camera) {
            self.log.append_for(self.side, format!("Recording {} started", self.side));
        }
        Ok(())
    }

    /// Stop recording and offer the result for download
    ///
    /// Returns `None` when nothing was being recorded.
    pub async fn stop_recording(&mut self) -> Option<RecordedArtifact> {
        if !self.recorder.is_recording() {
            debug!("Stop requested on {} side while idle", self.side);
            return None;
        }
        self.finish_recording(None).await
    }

    async fn finish_recording(&mut self, reason: Option<&str>) -> Option<RecordedArtifact> {
        let artifact = self.recorder.stop().await?;

        if let Err(e) = self.downloads.offer(&artifact).await {
            error!("Failed to offer {} for download: {:#}", artifact.file_name, e);
        }

        let message = match reason {
            Some(reason) => format!(
                "Recording {} stopped ({}): {}",
                self.side, reason, artifact.file_name
            ),
            None => format!("Recording {} stopped: {}", self.side, artifact.file_name),
        };
        self.log.append_for(self.side, message);

        Some(artifact)
    }

    // ------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------

    /// Use an uploaded file as the `media` source for this side
    ///
    /// `None` means no file was chosen: nothing changes. A rejected file
    /// leaves the previous upload in place.
    pub fn upload(
        &mut self,
        media: MediaKind,
        file: Option<MediaFile>,
    ) -> SessionResult<Option<PlayableRef>> {
        let Some(file) = file else {
            debug!("No {} file chosen for {} side", media, self.side);
            return Ok(None);
        };

        let playable = match self.uploader.accept(media, &file) {
            Ok(playable) => playable,
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.log.append_for(
                    self.side,
                    format!("Rejected {} upload for {} side: {}", media, self.side, e),
                );
                return Err(e.into());
            }
        };

        if let Some(previous) = self.selector.replace(media, playable.clone()) {
            debug!("Released {} upload {}", media, previous.url());
        }

        self.last_error = None;
        let message = format!(
            "{} file {} uploaded for {} side",
            media.label(),
            file.name,
            self.side
        );
        self.log.append_for(self.side, message);

        Ok(Some(playable))
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Finalize any recording, release both devices and drop uploads
    pub async fn shutdown(&mut self) {
        info!("Tearing down {} side session", self.side);

        if self.recorder.is_recording() {
            self.finish_recording(Some("side torn down")).await;
        }

        for kind in DeviceKind::ALL {
            self.release_device(kind).await;
        }

        for playable in self.selector.clear() {
            debug!("Released upload {}", playable.url());
        }
    }
}
