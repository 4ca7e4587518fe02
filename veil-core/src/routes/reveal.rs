use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult};
use veil_shared::types::auth::AuthUser;
use veil_shared::types::ApiResponse;

use crate::services::match_engine::{self, RevealOutcome};
use crate::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevealStatus {
    Requested,
    AlreadyRevealed,
    Accepted,
}

#[derive(Debug, Serialize)]
pub struct RevealResponse {
    pub status: RevealStatus,
    pub is_friend: bool,
}

/// POST /matches/:match_id/reveal - ask the counterpart to unveil photos
pub async fn request_reveal(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RevealResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let match_row = match_engine::load_match_for_participant(&mut conn, match_id, user.id, false)?;

    let response = match match_engine::request_reveal(&mut conn, &match_row, user.id)? {
        RevealOutcome::AlreadyRevealed => RevealResponse {
            status: RevealStatus::AlreadyRevealed,
            is_friend: true,
        },
        RevealOutcome::Requested => RevealResponse {
            status: RevealStatus::Requested,
            is_friend: false,
        },
    };

    Ok(Json(ApiResponse::ok(response)))
}

/// POST /matches/:match_id/reveal/accept - unveil photos for both sides
pub async fn accept_reveal(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RevealResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let match_row = match_engine::load_match_for_participant(&mut conn, match_id, user.id, false)?;

    match_engine::accept_reveal(&mut conn, &match_row, user.id)?;

    tracing::info!(match_id = %match_row.id, acceptor = %user.id, "photos revealed");

    Ok(Json(ApiResponse::ok(RevealResponse {
        status: RevealStatus::Accepted,
        is_friend: true,
    })))
}
