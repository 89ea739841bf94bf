pub mod caption;
pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod invite;
pub mod kinds;
pub mod recording;
pub mod session;
pub mod upload;

pub use caption::{CaptionConfig, CaptionFeed, Captions};
pub use capture::{
    CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureSource, LiveStream, MediaChunk,
    ScriptedBackend, StreamFeed, SyntheticBackend,
};
pub use config::Config;
pub use error::{SessionError, ValidationError};
pub use events::{EventLog, LogEntry};
pub use http::{create_router, AppState};
pub use invite::{Clipboard, InviteLinkGenerator, MemoryClipboard};
pub use kinds::{DeviceKind, MediaKind, Side};
pub use recording::{
    DirectoryDownloads, DownloadSink, MemoryDownloads, RecordedArtifact, Recorder, RecorderConfig,
    RecorderState,
};
pub use session::{ActiveSource, SideConfig, SideSession, SideSnapshot, SourceKind, Toggle};
pub use upload::{MediaFile, PlayableRef, UploadPolicy, Uploader, VideoUploadPlayer};
