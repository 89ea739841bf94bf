use serde::Serialize;

use super::selector::ActiveSource;
use crate::kinds::Side;
use crate::recording::RecorderState;

/// Device state as seen by the presentation layer
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeviceSnapshot {
    pub enabled: bool,
    pub in_flight: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecorderSnapshot {
    pub state: RecorderState,
    pub buffered_bytes: usize,
}

/// Point-in-time view of one side
#[derive(Debug, Clone, Serialize)]
pub struct SideSnapshot {
    pub side: Side,
    pub camera: DeviceSnapshot,
    pub microphone: DeviceSnapshot,
    /// Audio monitor mute flag
    pub muted: bool,
    pub recorder: RecorderSnapshot,
    pub video: ActiveSource,
    pub audio: ActiveSource,
    /// Most recent device or upload error
    pub last_error: Option<String>,
}
