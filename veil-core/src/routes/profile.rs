use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult, ErrorCode};
use veil_shared::types::auth::AuthUser;
use veil_shared::types::ApiResponse;

use crate::models::{Match, NewDiscoveryLog, Profile};
use crate::schema::{discovery_log, likes, matches};
use crate::services::{discovery, match_engine, profile_service, scoring};
use crate::AppState;

/// What discovery, profile views and chat render for a user. Whether the
/// photo is blurred is the client's call, driven by the reveal state the
/// surrounding payload carries.
#[derive(Debug, Serialize, Clone)]
pub struct ProfileCard {
    pub id: Uuid,
    pub display_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    #[serde(rename = "profile_photo")]
    pub profile_photo_url: Option<String>,
    pub is_verified: bool,
    pub is_online: bool,
    pub interests: Vec<String>,
}

impl ProfileCard {
    pub fn from_profile(profile: &Profile, interests: Vec<String>, today: NaiveDate) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name.clone(),
            age: profile.age_on(today),
            gender: profile.gender.clone(),
            city: profile.city.clone(),
            bio: profile.bio.clone(),
            profile_photo_url: profile.profile_photo_url.clone(),
            is_verified: profile.is_verified,
            is_online: profile.is_online(),
            interests,
        }
    }
}

// --- GET /me ---

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub completion: i32,
    pub can_access_discovery: bool,
}

pub async fn me(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profile_service::get_profile(&mut conn, user.id)?;
    let completion = profile.completion_pct;

    Ok(Json(ApiResponse::ok(MeResponse {
        profile,
        completion,
        can_access_discovery: completion >= discovery::COMPLETION_THRESHOLD,
    })))
}

// --- GET /profiles/:id ---

#[derive(Debug, Serialize)]
pub struct ProfileViewResponse {
    pub profile: ProfileCard,
    pub is_self: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_row: Option<Match>,
    pub liked_by_me: bool,
    pub liked_by_them: bool,
}

/// Opening a full profile is what writes the discovery log entry; list
/// appearances alone never do.
pub async fn view_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProfileViewResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let today = Utc::now().date_naive();

    let target = profile_service::get_profile(&mut conn, target_id)?;

    // Viewing your own page: no log entry, no score, no flags.
    if target.id == user.id {
        let names = profile_service::interest_names_batch(&mut conn, &[target.id])?
            .remove(&target.id)
            .unwrap_or_default();
        return Ok(Json(ApiResponse::ok(ProfileViewResponse {
            profile: ProfileCard::from_profile(&target, names, today),
            is_self: true,
            score: None,
            match_row: None,
            liked_by_me: false,
            liked_by_them: false,
        })));
    }

    if !discovery::is_adult(target.birth_date, today) {
        return Err(AppError::new(ErrorCode::NotEligible, "profile is not eligible"));
    }

    // First open logs the view permanently; repeats are no-ops.
    diesel::insert_into(discovery_log::table)
        .values(&NewDiscoveryLog { viewer_id: user.id, viewed_id: target.id })
        .on_conflict_do_nothing()
        .execute(&mut conn)?;

    let viewer = profile_service::get_profile(&mut conn, user.id)?;
    let viewer_input = profile_service::score_input(&mut conn, &viewer)?;
    let target_input = profile_service::score_input(&mut conn, &target)?;
    let score = scoring::compatibility_score(&viewer_input, &target_input);

    let (a, b) = match_engine::canonical_pair(user.id, target.id);
    let match_row: Option<Match> = matches::table
        .filter(matches::user_a_id.eq(a))
        .filter(matches::user_b_id.eq(b))
        .first::<Match>(&mut conn)
        .optional()?;

    let liked_by_me: bool = diesel::select(diesel::dsl::exists(
        likes::table
            .filter(likes::liker_id.eq(user.id))
            .filter(likes::liked_id.eq(target.id)),
    ))
    .get_result(&mut conn)?;

    let liked_by_them: bool = diesel::select(diesel::dsl::exists(
        likes::table
            .filter(likes::liker_id.eq(target.id))
            .filter(likes::liked_id.eq(user.id)),
    ))
    .get_result(&mut conn)?;

    let names = profile_service::interest_names_batch(&mut conn, &[target.id])?
        .remove(&target.id)
        .unwrap_or_default();

    Ok(Json(ApiResponse::ok(ProfileViewResponse {
        profile: ProfileCard::from_profile(&target, names, today),
        is_self: false,
        score: Some(score),
        match_row,
        liked_by_me,
        liked_by_them,
    })))
}
