use anyhow::{Context, Result};
use serde::Deserialize;

use crate::caption::CaptionConfig;
use crate::capture::CaptureConfig;
use crate::recording::RecorderConfig;
use crate::session::SideConfig;
use crate::upload::{UploadConfig, UploadPolicy};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    pub recorder: RecorderConfig,
    pub upload: UploadConfig,
    pub player: UploadPolicy,
    pub captions: CaptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Origin the UI is served from; used for invite links and upload URLs
    pub public_origin: String,
    /// Path appended to the origin in invite links
    pub invite_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "asl-expressor".to_string(),
            http: HttpConfig::default(),
            public_origin: "http://localhost:8080".to_string(),
            invite_path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate knows, extension optional)
    /// layered under `ASL_EXPRESSOR__*` environment overrides
    ///
    /// A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ASL_EXPRESSOR").separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Settings handed to each side session
    pub fn side_config(&self) -> SideConfig {
        SideConfig::new(
            self.service.public_origin.clone(),
            self.recorder.clone(),
            self.upload.clone(),
        )
    }
}
