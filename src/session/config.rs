use serde::Deserialize;

use crate::recording::RecorderConfig;
use crate::upload::UploadConfig;

/// Configuration shared by both side sessions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    /// Origin used to mint playable references for uploads
    /// (e.g., "http://localhost:8080")
    pub origin: String,

    pub recorder: RecorderConfig,

    pub upload: UploadConfig,
}

impl SideConfig {
    pub fn new(origin: impl Into<String>, recorder: RecorderConfig, upload: UploadConfig) -> Self {
        Self {
            origin: origin.into(),
            recorder,
            upload,
        }
    }
}
