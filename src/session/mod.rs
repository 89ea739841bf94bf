//! Per-side media session
//!
//! This module provides the `SideSession` aggregate that manages:
//! - Camera and microphone acquisition/release (one `DeviceSession` each)
//! - Uploaded file tracking and playback source resolution
//! - Recording of the live camera stream
//! - The audio monitor mute flag

mod config;
mod device;
mod selector;
mod session;
mod stats;

pub use config::SideConfig;
pub use device::DeviceSession;
pub use selector::{ActiveSource, SourceKind, SourceSelector};
pub use session::{AcquireTicket, SideSession, Toggle};
pub use stats::{DeviceSnapshot, RecorderSnapshot, SideSnapshot};
