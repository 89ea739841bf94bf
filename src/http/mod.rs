//! HTTP control surface for the dual-side session
//!
//! This module provides a JSON API standing in for the UI:
//! - GET /sides/:side - Side snapshot
//! - POST /sides/:side/devices/:kind/toggle - Acquire or release a device
//! - POST /sides/:side/mute - Toggle the audio monitor
//! - POST /sides/:side/record/{start,stop} - Control recording
//! - POST /sides/:side/uploads/:media - Use a file instead of the device
//! - GET /logs - Session event log
//! - POST /invite - Generate an invite link
//! - /player/* - Standalone video player
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
