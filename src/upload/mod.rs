//! File uploads: validation of chosen files and the standalone video player

pub mod player;
pub mod validator;

pub use player::{PlaybackState, PlayerSnapshot, VideoUploadPlayer};
pub use validator::{MediaFile, PlayableRef, UploadConfig, UploadPolicy, Uploader};
