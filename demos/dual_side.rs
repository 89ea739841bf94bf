use anyhow::Result;
use asl_expressor::{
    CaptureBackendFactory, CaptureConfig, DeviceKind, EventLog, MediaFile, MediaKind,
    MemoryDownloads, Side, SideConfig, SideSession,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("🎥 Dual-side session walkthrough with synthetic devices");

    let mut capture = CaptureConfig::default();
    capture.denied.insert(DeviceKind::Microphone);
    let backend = CaptureBackendFactory::create(capture);
    let downloads = Arc::new(MemoryDownloads::new());
    let log = EventLog::new();

    let mut left = SideSession::new(
        Side::Left,
        SideConfig::default(),
        backend.clone(),
        downloads.clone(),
        log.clone(),
    );
    let mut right = SideSession::new(
        Side::Right,
        SideConfig::default(),
        backend,
        downloads.clone(),
        log.clone(),
    );

    // 1. Left camera on, start recording
    left.toggle_device(DeviceKind::Camera).await?;
    left.start_recording()?;
    info!("✅ Left side recording");

    // 2. Right microphone is denied by config: recovered, side stays usable
    if let Err(e) = right.toggle_device(DeviceKind::Microphone).await {
        info!("⚠️  Right microphone refused: {}", e);
    }

    // 3. Right side presents an uploaded clip instead
    right.upload(
        MediaKind::Video,
        Some(MediaFile::new("reply.webm", "video/webm", 3 * 1024 * 1024)),
    )?;

    sleep(Duration::from_secs(2)).await;

    // 4. Turning the camera off finalizes the recording
    left.toggle_device(DeviceKind::Camera).await?;

    for artifact in downloads.artifacts() {
        info!(
            "💾 {} ({} bytes, {} chunks)",
            artifact.file_name,
            artifact.size_bytes(),
            artifact.chunk_count
        );
    }

    info!("📋 Session log:");
    for entry in log.snapshot() {
        info!("   {}", entry);
    }

    info!("Left: {:?}", left.snapshot());
    info!("Right: {:?}", right.snapshot());

    left.shutdown().await;
    right.shutdown().await;

    Ok(())
}
