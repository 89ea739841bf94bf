pub mod backend;
pub mod scripted;
pub mod synthetic;

pub use backend::{
    CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureSource, LiveStream, MediaChunk,
    MediaTrack, StreamFeed,
};
pub use scripted::{ScriptedBackend, ScriptedOutcome};
pub use synthetic::SyntheticBackend;
