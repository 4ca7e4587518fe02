use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult, ErrorCode};
use veil_shared::types::auth::AuthUser;
use veil_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::{discovery_log, profiles};
use crate::services::discovery::{self, CandidateInput};
use crate::services::profile_service;
use crate::services::scoring::ScoreInput;
use crate::AppState;

use super::profile::ProfileCard;

#[derive(Debug, Deserialize)]
pub struct DiscoverParams {
    #[serde(default = "default_page")]
    page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct DiscoverCard {
    pub profile: ProfileCard,
    pub score: f64,
    pub distance_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub candidates: Vec<DiscoverCard>,
    pub page: u32,
    pub has_next: bool,
}

/// GET /discover?page=N - ranked candidate page for the caller
pub async fn discover(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoverParams>,
) -> AppResult<Json<ApiResponse<DiscoverResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let viewer = profile_service::get_profile(&mut conn, user.id)?;
    if viewer.completion_pct < discovery::COMPLETION_THRESHOLD {
        return Err(AppError::new(
            ErrorCode::ProfileIncomplete,
            "complete at least 80% of your profile to access discovery",
        ));
    }

    let today = Utc::now().date_naive();
    let cutoff = discovery::adult_birth_cutoff(today);

    let viewed: Vec<Uuid> = discovery_log::table
        .filter(discovery_log::viewer_id.eq(user.id))
        .select(discovery_log::viewed_id)
        .load::<Uuid>(&mut conn)?;

    let mut query = profiles::table
        .filter(profiles::id.ne(user.id))
        .filter(profiles::birth_date.is_not_null())
        .filter(profiles::birth_date.le(cutoff))
        .into_boxed();

    if let Some(gender) = discovery::target_gender(viewer.gender.as_deref()) {
        query = query.filter(profiles::gender.eq(gender));
    }
    if !viewed.is_empty() {
        query = query.filter(profiles::id.ne_all(viewed));
    }

    let candidates: Vec<Profile> = query.order(profiles::id.asc()).load::<Profile>(&mut conn)?;

    let candidate_ids: Vec<Uuid> = candidates.iter().map(|p| p.id).collect();
    let mut interest_sets = profile_service::interest_ids_batch(&mut conn, &candidate_ids)?;
    let viewer_input = profile_service::score_input(&mut conn, &viewer)?;

    let inputs: Vec<CandidateInput> = candidates
        .iter()
        .map(|p| CandidateInput {
            id: p.id,
            score_input: ScoreInput {
                interests: interest_sets.remove(&p.id).unwrap_or_default(),
                location: p.location(),
            },
        })
        .collect();

    let ranked = discovery::rank(&viewer_input, inputs);
    let (page_items, has_next) = discovery::page(&ranked, params.page);

    // Hydrate cards for the returned page only.
    let page_ids: Vec<Uuid> = page_items.iter().map(|r| r.id).collect();
    let mut names = profile_service::interest_names_batch(&mut conn, &page_ids)?;
    let by_id: HashMap<Uuid, &Profile> = candidates.iter().map(|p| (p.id, p)).collect();

    let cards: Vec<DiscoverCard> = page_items
        .iter()
        .filter_map(|ranked_candidate| {
            by_id.get(&ranked_candidate.id).map(|p| DiscoverCard {
                profile: ProfileCard::from_profile(
                    p,
                    names.remove(&ranked_candidate.id).unwrap_or_default(),
                    today,
                ),
                score: ranked_candidate.score,
                distance_km: ranked_candidate.distance_km,
            })
        })
        .collect();

    tracing::debug!(
        viewer = %user.id,
        page = params.page,
        pool = candidates.len(),
        returned = cards.len(),
        "discovery page served"
    );

    Ok(Json(ApiResponse::ok(DiscoverResponse {
        candidates: cards,
        page: params.page.max(1),
        has_next,
    })))
}
