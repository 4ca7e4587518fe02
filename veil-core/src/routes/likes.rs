use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult, ErrorCode};
use veil_shared::types::auth::AuthUser;
use veil_shared::types::ApiResponse;

use crate::models::Match;
use crate::services::match_engine::{self, LikeOutcome};
use crate::services::{discovery, profile_service, scoring};
use crate::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LikeStatus {
    Liked,
    AlreadyLiked,
    Mutual,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub outcome: LikeStatus,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_row: Option<Match>,
}

/// POST /likes/:target_id - like a profile, promoting to a match on reciprocity
pub async fn like_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let today = Utc::now().date_naive();

    let target = profile_service::get_profile(&mut conn, target_id)?;

    if !discovery::is_adult(target.birth_date, today) {
        return Err(AppError::new(ErrorCode::NotEligible, "target must be 18 or older"));
    }
    if target.id == user.id {
        return Err(AppError::new(ErrorCode::SelfAction, "cannot like yourself"));
    }

    let actor = profile_service::get_profile(&mut conn, user.id)?;

    // Actor-perspective score; fixed into the match row at creation.
    let actor_input = profile_service::score_input(&mut conn, &actor)?;
    let target_input = profile_service::score_input(&mut conn, &target)?;
    let score = scoring::compatibility_score(&actor_input, &target_input);

    let outcome = match_engine::like_user(&mut conn, user.id, target.id, score)?;

    let response = match outcome {
        LikeOutcome::Liked => LikeResponse { outcome: LikeStatus::Liked, match_row: None },
        LikeOutcome::AlreadyLiked => LikeResponse { outcome: LikeStatus::AlreadyLiked, match_row: None },
        LikeOutcome::Mutual(match_row) => {
            tracing::info!(
                actor = %user.id,
                target = %target.id,
                match_id = %match_row.id,
                score = match_row.compatibility_score,
                "mutual like, match active"
            );
            LikeResponse { outcome: LikeStatus::Mutual, match_row: Some(match_row) }
        }
    };

    Ok(Json(ApiResponse::ok(response)))
}
