// Integration tests for uploaded sources and playback source resolution
//
// Policy under test: an enabled live stream always supersedes an uploaded
// file of the same media kind; the upload is presented only while no live
// stream is enabled.

use anyhow::Result;
use asl_expressor::capture::ScriptedBackend;
use asl_expressor::{
    ActiveSource, DeviceKind, EventLog, MediaFile, MediaKind, MemoryDownloads, SessionError, Side,
    SideConfig, SideSession, SourceKind, ValidationError,
};
use std::sync::Arc;

const MB: u64 = 1024 * 1024;

fn new_side(side: Side) -> (SideSession, EventLog) {
    let log = EventLog::new();
    let session = SideSession::new(
        side,
        SideConfig::default(),
        Arc::new(ScriptedBackend::new()),
        Arc::new(MemoryDownloads::new()),
        log.clone(),
    );
    (session, log)
}

fn video(name: &str) -> MediaFile {
    MediaFile::new(name, "video/mp4", 5 * MB)
}

#[tokio::test]
async fn test_upload_sets_uploaded_source() -> Result<()> {
    let (mut session, log) = new_side(Side::Right);
    assert_eq!(session.active_source(MediaKind::Video).kind(), SourceKind::None);

    let playable = session
        .upload(MediaKind::Video, Some(video("hello.mp4")))?
        .expect("file was chosen");

    assert_eq!(
        session.active_source(MediaKind::Video),
        ActiveSource::UploadedFile {
            playable: playable.clone()
        }
    );
    assert_eq!(session.active_source(MediaKind::Audio).kind(), SourceKind::None);
    assert_eq!(
        log.latest().unwrap().message,
        "Video file hello.mp4 uploaded for right side"
    );
    Ok(())
}

#[tokio::test]
async fn test_new_upload_replaces_previous() -> Result<()> {
    let (mut session, _log) = new_side(Side::Left);

    let first = session.upload(MediaKind::Video, Some(video("a.mp4")))?.unwrap();
    let second = session.upload(MediaKind::Video, Some(video("b.mp4")))?.unwrap();

    assert_ne!(first, second);
    assert_eq!(session.uploaded(MediaKind::Video), Some(&second));
    match session.active_source(MediaKind::Video) {
        ActiveSource::UploadedFile { playable } => assert_ne!(playable, first),
        other => panic!("expected uploaded file, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_dismissed_picker_is_noop() -> Result<()> {
    let (mut session, log) = new_side(Side::Left);
    let file = MediaFile::new("a.mp3", "audio/mpeg", MB);
    let playable = session.upload(MediaKind::Audio, Some(file))?;

    assert!(session.upload(MediaKind::Audio, None)?.is_none());
    assert_eq!(session.uploaded(MediaKind::Audio), playable.as_ref());
    assert_eq!(log.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rejected_upload_keeps_previous_source() -> Result<()> {
    let (mut session, log) = new_side(Side::Left);
    let kept = session.upload(MediaKind::Video, Some(video("keep.mp4")))?.unwrap();

    let err = session
        .upload(MediaKind::Video, Some(MediaFile::new("big.mp4", "video/mp4", 150 * MB)))
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::Validation(ValidationError::TooLarge {
            max_size_mb: 100,
            size_bytes: 150 * MB
        })
    );
    assert_eq!(session.last_error(), Some("File size should be less than 100MB"));
    assert_eq!(session.uploaded(MediaKind::Video), Some(&kept));

    let err = session
        .upload(MediaKind::Video, Some(MediaFile::new("doc.pdf", "application/pdf", MB)))
        .unwrap_err();
    assert_eq!(err.to_string(), "Please upload a valid video file");
    assert_eq!(session.uploaded(MediaKind::Video), Some(&kept));

    assert_eq!(log.len(), 3, "one event per upload attempt");
    Ok(())
}

#[tokio::test]
async fn test_live_stream_supersedes_upload() -> Result<()> {
    let (mut session, _log) = new_side(Side::Left);
    let playable = session.upload(MediaKind::Video, Some(video("clip.mp4")))?.unwrap();

    session.toggle_device(DeviceKind::Camera).await?;
    let stream_id = session.stream(DeviceKind::Camera).unwrap().id();
    assert_eq!(
        session.active_source(MediaKind::Video),
        ActiveSource::Live { stream_id }
    );

    // Uploading while live does not take over either
    session.upload(MediaKind::Video, Some(video("other.mp4")))?;
    assert_eq!(session.active_source(MediaKind::Video).kind(), SourceKind::Live);

    // Disabling the camera falls back to the latest upload
    session.toggle_device(DeviceKind::Camera).await?;
    match session.active_source(MediaKind::Video) {
        ActiveSource::UploadedFile { playable: current } => {
            assert_ne!(current, playable);
            assert_eq!(current.file_name(), "other.mp4");
        }
        other => panic!("expected uploaded file, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_media_kinds_are_independent() -> Result<()> {
    let (mut session, _log) = new_side(Side::Left);
    session.toggle_device(DeviceKind::Microphone).await?;
    session.upload(MediaKind::Video, Some(video("clip.webm")))?;

    assert_eq!(session.active_source(MediaKind::Audio).kind(), SourceKind::Live);
    assert_eq!(
        session.active_source(MediaKind::Video).kind(),
        SourceKind::UploadedFile
    );
    Ok(())
}

#[tokio::test]
async fn test_shutdown_releases_everything() -> Result<()> {
    let (mut session, _log) = new_side(Side::Right);
    session.toggle_device(DeviceKind::Camera).await?;
    session.toggle_device(DeviceKind::Microphone).await?;
    session.upload(MediaKind::Audio, Some(MediaFile::new("a.wav", "audio/wav", MB)))?;

    session.shutdown().await;

    let snapshot = session.snapshot();
    assert!(!snapshot.camera.enabled);
    assert!(!snapshot.microphone.enabled);
    assert_eq!(snapshot.audio, ActiveSource::None);
    assert_eq!(snapshot.video, ActiveSource::None);
    Ok(())
}
