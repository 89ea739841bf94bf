use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::caption::Captions;
use crate::capture::CaptureBackend;
use crate::config::Config;
use crate::events::EventLog;
use crate::invite::{Clipboard, InviteLinkGenerator};
use crate::kinds::Side;
use crate::recording::DownloadSink;
use crate::session::SideSession;
use crate::upload::VideoUploadPlayer;

/// Shared application state for HTTP handlers
///
/// Each side sits behind its own lock so the two can be driven
/// concurrently.
#[derive(Clone)]
pub struct AppState {
    pub left: Arc<Mutex<SideSession>>,
    pub right: Arc<Mutex<SideSession>>,
    pub log: EventLog,
    pub player: Arc<Mutex<VideoUploadPlayer>>,
    pub invites: Arc<Mutex<InviteLinkGenerator>>,
    pub captions: Arc<Captions>,
    /// Served under `/downloads` when set
    pub downloads_dir: Option<PathBuf>,
}

impl AppState {
    /// Build both sides, the player and the caption feeds
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        config: &Config,
        backend: Arc<dyn CaptureBackend>,
        downloads: Arc<dyn DownloadSink>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        let log = EventLog::new();
        let side = |side: Side| {
            Arc::new(Mutex::new(SideSession::new(
                side,
                config.side_config(),
                Arc::clone(&backend),
                Arc::clone(&downloads),
                log.clone(),
            )))
        };

        Self {
            left: side(Side::Left),
            right: side(Side::Right),
            player: Arc::new(Mutex::new(VideoUploadPlayer::new(
                config.service.public_origin.clone(),
                config.player.clone(),
            ))),
            invites: Arc::new(Mutex::new(InviteLinkGenerator::new(
                config.service.public_origin.clone(),
                config.service.invite_path.clone(),
                clipboard,
                log.clone(),
            ))),
            captions: Arc::new(Captions::spawn(&config.captions)),
            log,
            downloads_dir: None,
        }
    }

    pub fn with_downloads_dir(mut self, dir: PathBuf) -> Self {
        self.downloads_dir = Some(dir);
        self
    }

    pub fn side(&self, side: Side) -> &Arc<Mutex<SideSession>> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Tear both sides down concurrently
    pub async fn shutdown(&self) {
        futures::join!(
            async { self.left.lock().await.shutdown().await },
            async { self.right.lock().await.shutdown().await },
        );
    }
}
