use serde::Serialize;
use uuid::Uuid;

use crate::capture::LiveStream;
use crate::kinds::MediaKind;
use crate::upload::PlayableRef;

/// Which source a side is presenting for one media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Live,
    UploadedFile,
    None,
}

/// Resolved playback source, with the handle the presentation layer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveSource {
    Live { stream_id: Uuid },
    UploadedFile { playable: PlayableRef },
    None,
}

impl ActiveSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ActiveSource::Live { .. } => SourceKind::Live,
            ActiveSource::UploadedFile { .. } => SourceKind::UploadedFile,
            ActiveSource::None => SourceKind::None,
        }
    }
}

/// Tracks uploaded files per media kind and resolves the active source
///
/// Precedence: an enabled live stream always wins; the uploaded file is
/// presented only while no live stream of that kind is enabled.
#[derive(Debug, Default)]
pub struct SourceSelector {
    video: Option<PlayableRef>,
    audio: Option<PlayableRef>,
}

impl SourceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, media: MediaKind) -> &mut Option<PlayableRef> {
        match media {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        }
    }

    pub fn uploaded(&self, media: MediaKind) -> Option<&PlayableRef> {
        match media {
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Audio => self.audio.as_ref(),
        }
    }

    /// Track a new upload, returning the reference it replaces
    pub fn replace(&mut self, media: MediaKind, playable: PlayableRef) -> Option<PlayableRef> {
        self.slot(media).replace(playable)
    }

    pub fn resolve(&self, media: MediaKind, live: Option<&LiveStream>) -> ActiveSource {
        match (live, self.uploaded(media)) {
            (Some(stream), _) => ActiveSource::Live {
                stream_id: stream.id(),
            },
            (None, Some(playable)) => ActiveSource::UploadedFile {
                playable: playable.clone(),
            },
            (None, None) => ActiveSource::None,
        }
    }

    /// Drop every tracked upload
    pub fn clear(&mut self) -> Vec<PlayableRef> {
        self.video.take().into_iter().chain(self.audio.take()).collect()
    }
}
