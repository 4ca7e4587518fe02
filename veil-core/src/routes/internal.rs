use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::schema::profiles;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatePresenceRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub ok: bool,
}

/// POST /internal/presence — stamp last_seen_at (service-to-service, no auth).
/// The derived online flag reads this with a 2-minute window.
pub async fn update_presence(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePresenceRequest>,
) -> Json<PresenceResponse> {
    let mut conn = match state.db.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to get db connection for presence update");
            return Json(PresenceResponse { ok: false });
        }
    };

    let result = diesel::update(profiles::table.find(req.user_id))
        .set(profiles::last_seen_at.eq(Some(Utc::now())))
        .execute(&mut conn);

    match result {
        Ok(_) => {
            tracing::debug!(user_id = %req.user_id, "presence updated");
            Json(PresenceResponse { ok: true })
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %req.user_id, "failed to update presence");
            Json(PresenceResponse { ok: false })
        }
    }
}
