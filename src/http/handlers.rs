use super::state::AppState;
use crate::error::SessionError;
use crate::events::LogEntry;
use crate::kinds::{DeviceKind, MediaKind, Side};
use crate::recording::RecordedArtifact;
use crate::session::{SideSnapshot, Toggle};
use crate::upload::{MediaFile, PlayerSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    /// Path of the chosen file; absent when the picker was dismissed
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub side: Side,
    pub artifact: Option<RecordedArtifact>,
    pub snapshot: SideSnapshot,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub side: Side,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by handlers, rendered as `{ "error": ... }`
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        let status = match &error {
            SessionError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            SessionError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SessionError::PreconditionViolation(_) => StatusCode::CONFLICT,
            SessionError::AcquisitionInFlight { .. } => StatusCode::CONFLICT,
            SessionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn chosen_file(req: UploadRequest) -> Result<Option<MediaFile>, ApiError> {
    req.path
        .map(|path| {
            MediaFile::from_path(&path).map_err(|e| {
                warn!("Could not read chosen file {}: {:#}", path, e);
                ApiError::bad_request(format!("{:#}", e))
            })
        })
        .transpose()
}

// ============================================================================
// Side Handlers
// ============================================================================

/// GET /sides/:side
pub async fn get_side(
    State(state): State<AppState>,
    Path(side): Path<Side>,
) -> Json<SideSnapshot> {
    Json(state.side(side).lock().await.snapshot())
}

/// GET /sides/:side/caption
pub async fn get_caption(
    State(state): State<AppState>,
    Path(side): Path<Side>,
) -> Json<CaptionResponse> {
    Json(CaptionResponse {
        side,
        text: state.captions.feed(side).latest(),
    })
}

/// POST /sides/:side/devices/:kind/toggle
///
/// The side lock is released while the backend decides on the acquisition,
/// so the other device and the other side stay responsive.
pub async fn toggle_device(
    State(state): State<AppState>,
    Path((side, kind)): Path<(Side, DeviceKind)>,
) -> ApiResult<SideSnapshot> {
    let session = state.side(side).clone();

    let (toggle, backend) = {
        let mut session = session.lock().await;
        (session.begin_toggle(kind).await?, session.backend())
    };

    if let Toggle::Acquire(ticket) = toggle {
        info!("Acquiring {} for {} side via {}", kind, side, backend.name());
        let result = backend.acquire(kind).await;
        session.lock().await.complete_acquire(ticket, result)?;
    }

    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// POST /sides/:side/mute
pub async fn toggle_mute(
    State(state): State<AppState>,
    Path(side): Path<Side>,
) -> Json<SideSnapshot> {
    let mut session = state.side(side).lock().await;
    session.toggle_mute();
    Json(session.snapshot())
}

/// POST /sides/:side/record/start
pub async fn start_recording(
    State(state): State<AppState>,
    Path(side): Path<Side>,
) -> ApiResult<SideSnapshot> {
    let mut session = state.side(side).lock().await;
    session.start_recording()?;
    Ok(Json(session.snapshot()))
}

/// POST /sides/:side/record/stop
pub async fn stop_recording(
    State(state): State<AppState>,
    Path(side): Path<Side>,
) -> Json<StopRecordingResponse> {
    let mut session = state.side(side).lock().await;
    let artifact = session.stop_recording().await;
    Json(StopRecordingResponse {
        side,
        artifact,
        snapshot: session.snapshot(),
    })
}

/// POST /sides/:side/uploads/:media
pub async fn upload_file(
    State(state): State<AppState>,
    Path((side, media)): Path<(Side, MediaKind)>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<SideSnapshot> {
    let file = chosen_file(req)?;
    let mut session = state.side(side).lock().await;
    session.upload(media, file)?;
    Ok(Json(session.snapshot()))
}

// ============================================================================
// Event Log Handlers
// ============================================================================

/// GET /logs
pub async fn get_logs(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    Json(state.log.snapshot())
}

/// GET /logs/latest
pub async fn get_latest_log(State(state): State<AppState>) -> impl IntoResponse {
    match state.log.latest() {
        Some(entry) => (StatusCode::OK, Json(entry)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

// ============================================================================
// Invite Handlers
// ============================================================================

/// POST /invite
pub async fn generate_invite(State(state): State<AppState>) -> Json<InviteResponse> {
    let link = state.invites.lock().await.generate();
    Json(InviteResponse { link })
}

/// POST /invite/copy
pub async fn copy_invite(State(state): State<AppState>) -> ApiResult<InviteResponse> {
    let invites = state.invites.lock().await;
    invites.copy_to_clipboard().map_err(|e| ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("Failed to copy invite link: {:#}", e),
    })?;
    Ok(Json(InviteResponse {
        link: invites.current().to_string(),
    }))
}

// ============================================================================
// Player Handlers
// ============================================================================

/// GET /player
pub async fn get_player(State(state): State<AppState>) -> Json<PlayerSnapshot> {
    Json(state.player.lock().await.snapshot())
}

/// POST /player/upload
pub async fn player_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<PlayerSnapshot> {
    let Some(file) = chosen_file(req)? else {
        return Ok(Json(state.player.lock().await.snapshot()));
    };

    let mut player = state.player.lock().await;
    player
        .upload(&file)
        .map_err(|e| ApiError::from(SessionError::from(e)))?;
    Ok(Json(player.snapshot()))
}

/// POST /player/toggle
pub async fn player_toggle(State(state): State<AppState>) -> Json<PlayerSnapshot> {
    let mut player = state.player.lock().await;
    player.toggle_play();
    Json(player.snapshot())
}

/// POST /player/reset
pub async fn player_reset(State(state): State<AppState>) -> Json<PlayerSnapshot> {
    let mut player = state.player.lock().await;
    player.reset();
    Json(player.snapshot())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
