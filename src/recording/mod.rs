//! Camera recording
//!
//! This module provides:
//! - `Recorder`: Idle/Recording state machine capturing a live camera stream
//! - `RecordedArtifact`: the finalized, named recording
//! - `DownloadSink`: one-shot handoff of finished recordings to the user

mod artifact;
mod recorder;

pub use artifact::{DirectoryDownloads, DownloadSink, MemoryDownloads, RecordedArtifact};
pub use recorder::{Recorder, RecorderConfig, RecorderState};
