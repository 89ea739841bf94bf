// Integration tests for camera/microphone toggling on a side session
//
// These tests drive a side through the scripted capture backend so grant and
// deny decisions are deterministic.

use anyhow::Result;
use asl_expressor::capture::ScriptedBackend;
use asl_expressor::{
    CaptureBackend, CaptureConfig, DeviceKind, EventLog, MemoryDownloads, SessionError, Side,
    SideConfig, SideSession, SyntheticBackend, Toggle,
};
use std::sync::Arc;
use std::time::Duration;

fn new_side(side: Side) -> (SideSession, Arc<ScriptedBackend>, EventLog) {
    let backend = Arc::new(ScriptedBackend::new());
    let log = EventLog::new();
    let session = SideSession::new(
        side,
        SideConfig::default(),
        backend.clone(),
        Arc::new(MemoryDownloads::new()),
        log.clone(),
    );
    (session, backend, log)
}

#[tokio::test]
async fn test_toggle_twice_returns_to_disabled() -> Result<()> {
    for side in Side::ALL {
        for kind in DeviceKind::ALL {
            let (mut session, backend, _log) = new_side(side);
            assert!(!session.is_enabled(kind));

            assert!(session.toggle_device(kind).await?);
            assert!(session.is_enabled(kind));
            let feed = backend.feed(kind).expect("stream should have been granted");
            assert!(feed.is_live());

            assert!(!session.toggle_device(kind).await?);
            assert!(!session.is_enabled(kind));
            assert!(!feed.is_live(), "released stream must stop its tracks");

            assert_eq!(backend.granted_count(kind), 1, "exactly one stream created");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_toggle_logs_grant_and_stop() -> Result<()> {
    let (mut session, _backend, log) = new_side(Side::Left);

    session.toggle_device(DeviceKind::Camera).await?;
    session.toggle_device(DeviceKind::Camera).await?;
    session.toggle_device(DeviceKind::Microphone).await?;

    let messages: Vec<String> = log.snapshot().into_iter().map(|e| e.message).collect();
    assert_eq!(
        messages,
        vec![
            "Camera access granted for left side",
            "Camera left stopped",
            "Microphone access granted for left side",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_denied_acquisition_is_recovered() -> Result<()> {
    let (mut session, backend, log) = new_side(Side::Right);
    backend.deny_next(
        DeviceKind::Camera,
        SessionError::PermissionDenied("Permission dismissed".to_string()),
    );

    let err = session.toggle_device(DeviceKind::Camera).await.unwrap_err();
    assert!(matches!(err, SessionError::PermissionDenied(_)));
    assert!(!session.is_enabled(DeviceKind::Camera));
    assert!(!session.is_in_flight(DeviceKind::Camera));
    assert_eq!(
        session.last_error(),
        Some("Permission denied: Permission dismissed")
    );

    assert_eq!(log.len(), 1);
    let entry = log.latest().unwrap();
    assert!(entry
        .message
        .starts_with("Failed to access camera for right side:"));

    // Retry succeeds and clears the message
    assert!(session.toggle_device(DeviceKind::Camera).await?);
    assert!(session.is_enabled(DeviceKind::Camera));
    assert_eq!(session.last_error(), None);
    assert_eq!(log.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_latest_error_overwrites_previous() -> Result<()> {
    let (mut session, backend, _log) = new_side(Side::Left);
    backend.deny_next(
        DeviceKind::Camera,
        SessionError::DeviceUnavailable("no camera".to_string()),
    );
    backend.deny_next(
        DeviceKind::Microphone,
        SessionError::PermissionDenied("blocked".to_string()),
    );

    let _ = session.toggle_device(DeviceKind::Camera).await;
    let _ = session.toggle_device(DeviceKind::Microphone).await;

    assert_eq!(session.last_error(), Some("Permission denied: blocked"));
    Ok(())
}

#[tokio::test]
async fn test_second_acquisition_rejected_while_in_flight() -> Result<()> {
    let (mut session, backend, log) = new_side(Side::Left);

    let ticket = match session.begin_toggle(DeviceKind::Microphone).await? {
        Toggle::Acquire(ticket) => ticket,
        Toggle::Released => panic!("device was disabled, expected an acquisition"),
    };
    assert!(session.is_in_flight(DeviceKind::Microphone));
    assert!(!session.is_enabled(DeviceKind::Microphone));

    let err = session
        .begin_toggle(DeviceKind::Microphone)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::AcquisitionInFlight {
            side: Side::Left,
            kind: DeviceKind::Microphone
        }
    );
    assert!(log.is_empty(), "a rejected toggle emits no event");

    // The other device is unaffected
    assert!(session.toggle_device(DeviceKind::Camera).await?);

    let stream = backend.acquire(DeviceKind::Microphone).await;
    session.complete_acquire(ticket, stream)?;
    assert!(!session.is_in_flight(DeviceKind::Microphone));
    assert!(session.is_enabled(DeviceKind::Microphone));
    Ok(())
}

#[tokio::test]
async fn test_mute_is_independent_of_device_state() -> Result<()> {
    let (mut session, _backend, _log) = new_side(Side::Left);

    assert!(!session.is_muted());
    assert!(session.toggle_mute());
    assert!(!session.is_enabled(DeviceKind::Microphone));
    assert!(!session.toggle_mute());
    Ok(())
}

#[tokio::test]
async fn test_abandoned_toggle_can_be_retried() -> Result<()> {
    let backend = Arc::new(SyntheticBackend::new(CaptureConfig {
        grant_delay_ms: 300,
        ..Default::default()
    }));
    let log = EventLog::new();
    let mut session = SideSession::new(
        Side::Left,
        SideConfig::default(),
        backend,
        Arc::new(MemoryDownloads::new()),
        log.clone(),
    );

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        session.toggle_device(DeviceKind::Camera),
    )
    .await;
    assert!(abandoned.is_err(), "grant should still be pending");
    assert!(!session.is_in_flight(DeviceKind::Camera));
    assert!(!session.is_enabled(DeviceKind::Camera));
    assert!(log.is_empty());

    assert!(session.toggle_device(DeviceKind::Camera).await?);
    assert!(session.is_enabled(DeviceKind::Camera));
    Ok(())
}

#[tokio::test]
async fn test_foreign_ticket_is_rejected_and_released() -> Result<()> {
    let (mut left, backend, _) = new_side(Side::Left);
    let (mut right, _, _) = new_side(Side::Right);

    let ticket = match left.begin_toggle(DeviceKind::Camera).await? {
        Toggle::Acquire(ticket) => ticket,
        Toggle::Released => panic!("device was disabled, expected an acquisition"),
    };
    let stream = backend.acquire(DeviceKind::Camera).await;

    let err = right.complete_acquire(ticket, stream).unwrap_err();
    assert!(matches!(err, SessionError::PreconditionViolation(_)));
    assert!(!right.is_enabled(DeviceKind::Camera));
    assert!(!left.is_in_flight(DeviceKind::Camera));

    assert!(left.toggle_device(DeviceKind::Camera).await?);
    Ok(())
}
