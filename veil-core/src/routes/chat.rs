use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult};
use veil_shared::types::auth::AuthUser;
use veil_shared::types::ApiResponse;

use crate::models::{ChatRoom, Match, Message, RevealRequest};
use crate::schema::{matches, messages, reveal_requests};
use crate::services::{match_engine, profile_service, thread_service};
use crate::AppState;

use super::profile::ProfileCard;

// --- Response DTOs ---

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            body: message.body,
            is_read: message.is_read,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevealFlags {
    pub requested_by_me: bool,
    pub requested_by_them: bool,
}

#[derive(Debug, Serialize)]
pub struct ThreadView {
    pub room_id: Uuid,
    pub match_id: Uuid,
    pub other_user: ProfileCard,
    pub can_see_photo: bool,
    pub reveal: RevealFlags,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct ChatPreview {
    pub room_id: Uuid,
    pub match_id: Uuid,
    pub other_user: ProfileCard,
    pub can_see_photo: bool,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}

// --- Request DTOs ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

// --- Helpers ---

/// Resolve a room to its match and authorize the caller as a participant.
fn load_room_for_participant(
    conn: &mut PgConnection,
    room_id: Uuid,
    user_id: Uuid,
) -> AppResult<(ChatRoom, Match)> {
    let room = thread_service::get_room(conn, room_id)?;
    let match_row = match_engine::load_match_for_participant(conn, room.match_id, user_id, true)?;
    Ok((room, match_row))
}

fn other_user_card(
    conn: &mut PgConnection,
    other_id: Uuid,
    today: chrono::NaiveDate,
) -> AppResult<ProfileCard> {
    let other = profile_service::get_profile(conn, other_id)?;
    let names = profile_service::interest_names_batch(conn, &[other_id])?
        .remove(&other_id)
        .unwrap_or_default();
    Ok(ProfileCard::from_profile(&other, names, today))
}

// --- Handlers ---

/// GET /chat/:match_id - open (lazily creating) the thread for a match.
/// Opening marks every unread counterpart message as read.
pub async fn open_thread(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ThreadView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let today = Utc::now().date_naive();

    let match_row = match_engine::load_match_for_participant(&mut conn, match_id, user.id, true)?;
    let room = match_engine::ensure_chat_room(&mut conn, match_row.id)?;
    let other_id = match_row.other_participant(user.id);

    thread_service::mark_counterpart_read(&mut conn, room.id, other_id)?;

    let requests: Vec<RevealRequest> = reveal_requests::table
        .filter(reveal_requests::match_id.eq(match_row.id))
        .load::<RevealRequest>(&mut conn)?;

    let message_views = thread_service::visible_messages(&mut conn, room.id)?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(Json(ApiResponse::ok(ThreadView {
        room_id: room.id,
        match_id: match_row.id,
        other_user: other_user_card(&mut conn, other_id, today)?,
        can_see_photo: match_row.is_friend,
        reveal: RevealFlags {
            requested_by_me: requests.iter().any(|r| r.requester_id == user.id),
            requested_by_them: requests.iter().any(|r| r.requester_id == other_id),
        },
        messages: message_views,
    })))
}

/// GET /chat/rooms/:room_id/messages - poll the thread. Polling doubles as
/// the read receipt, same as opening.
pub async fn fetch_messages(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<MessageView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let (room, match_row) = load_room_for_participant(&mut conn, room_id, user.id)?;

    thread_service::mark_counterpart_read(&mut conn, room.id, match_row.other_participant(user.id))?;

    let views: Vec<MessageView> = thread_service::visible_messages(&mut conn, room.id)?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// POST /chat/rooms/:room_id/messages - append a message. Blank input is a
/// successful no-op, mirroring the polling client's behavior.
pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<SendMessageResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let (room, _match_row) = load_room_for_participant(&mut conn, room_id, user.id)?;

    let message = thread_service::post_message(&mut conn, room.id, user.id, &req.text)?;

    if let Some(ref m) = message {
        tracing::debug!(room = %room.id, sender = %user.id, message = %m.id, "message sent");
    }

    Ok(Json(ApiResponse::ok(SendMessageResponse {
        message: message.map(MessageView::from),
    })))
}

/// DELETE /chat/messages/:message_id - soft delete, sender only
pub async fn delete_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MessageView>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = thread_service::soft_delete_message(&mut conn, message_id, user.id)?;

    Ok(Json(ApiResponse::ok(MessageView::from(deleted))))
}

/// GET /chat/unread-count - global unread badge
pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total_unread = thread_service::unread_total(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread })))
}

/// GET /chat - one preview per active match, most recent activity first
pub async fn chat_list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ChatPreview>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let today = Utc::now().date_naive();

    let active: Vec<Match> = matches::table
        .filter(matches::is_active.eq(true))
        .filter(matches::user_a_id.eq(user.id).or(matches::user_b_id.eq(user.id)))
        .load::<Match>(&mut conn)?;

    let mut previews = Vec::with_capacity(active.len());
    for match_row in &active {
        let room = match_engine::ensure_chat_room(&mut conn, match_row.id)?;
        let other_id = match_row.other_participant(user.id);

        let last: Option<Message> = messages::table
            .filter(messages::room_id.eq(room.id))
            .order((messages::created_at.desc(), messages::seq.desc()))
            .first::<Message>(&mut conn)
            .optional()?;

        let unread = thread_service::unread_in_room(&mut conn, room.id, other_id)?;

        let last_message_at = last.as_ref().map(|m| m.created_at);
        let last_message = last.and_then(|m| if m.is_deleted { None } else { Some(m.body) });

        // Most recent activity first; empty threads fall back to room age.
        let sort_time = last_message_at.unwrap_or(room.created_at);

        previews.push((
            sort_time,
            ChatPreview {
                room_id: room.id,
                match_id: match_row.id,
                other_user: other_user_card(&mut conn, other_id, today)?,
                can_see_photo: match_row.is_friend,
                last_message,
                last_message_at,
                unread,
            },
        ));
    }

    previews.sort_by(|a, b| b.0.cmp(&a.0));
    let previews: Vec<ChatPreview> = previews.into_iter().map(|(_, p)| p).collect();

    Ok(Json(ApiResponse::ok(previews)))
}
