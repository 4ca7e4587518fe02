use diesel::dsl::count_star;
use diesel::prelude::*;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{ChatRoom, Match, Message, NewMessage};
use crate::schema::{chat_rooms, matches, messages};

/// Trimmed message body; None for empty/whitespace-only input, which
/// callers treat as a successful no-op.
pub fn normalized_body(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn get_room(conn: &mut PgConnection, room_id: Uuid) -> AppResult<ChatRoom> {
    chat_rooms::table
        .find(room_id)
        .first::<ChatRoom>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound, "chat room not found"))
}

/// Bulk read receipt: every unread message the counterpart sent into this
/// room is flipped at open/poll time, not per-message.
pub fn mark_counterpart_read(
    conn: &mut PgConnection,
    room_id: Uuid,
    counterpart_id: Uuid,
) -> AppResult<usize> {
    let updated = diesel::update(
        messages::table
            .filter(messages::room_id.eq(room_id))
            .filter(messages::sender_id.eq(counterpart_id))
            .filter(messages::is_read.eq(false)),
    )
    .set(messages::is_read.eq(true))
    .execute(conn)?;

    Ok(updated)
}

/// Non-deleted messages in thread order: created_at ascending, insertion
/// sequence breaking timestamp ties.
pub fn visible_messages(conn: &mut PgConnection, room_id: Uuid) -> AppResult<Vec<Message>> {
    let rows = messages::table
        .filter(messages::room_id.eq(room_id))
        .filter(messages::is_deleted.eq(false))
        .order((messages::created_at.asc(), messages::seq.asc()))
        .load::<Message>(conn)?;
    Ok(rows)
}

/// Append a message; empty input creates nothing and returns None.
pub fn post_message(
    conn: &mut PgConnection,
    room_id: Uuid,
    sender_id: Uuid,
    text: &str,
) -> AppResult<Option<Message>> {
    let Some(body) = normalized_body(text) else {
        return Ok(None);
    };

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage { room_id, sender_id, body })
        .get_result(conn)?;

    Ok(Some(message))
}

/// Soft delete: only the original sender may hide a message. The row stays
/// stored and counted, just excluded from rendered output.
pub fn soft_delete_message(
    conn: &mut PgConnection,
    message_id: Uuid,
    actor_id: Uuid,
) -> AppResult<Message> {
    let message: Message = messages::table
        .find(message_id)
        .first::<Message>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    if message.sender_id != actor_id {
        return Err(AppError::new(
            ErrorCode::Forbidden,
            "you can only delete your own messages",
        ));
    }

    let updated: Message = diesel::update(messages::table.find(message_id))
        .set(messages::is_deleted.eq(true))
        .get_result(conn)?;

    Ok(updated)
}

/// Count of unread counterpart messages in one room.
pub fn unread_in_room(
    conn: &mut PgConnection,
    room_id: Uuid,
    counterpart_id: Uuid,
) -> AppResult<i64> {
    let unread: i64 = messages::table
        .filter(messages::room_id.eq(room_id))
        .filter(messages::sender_id.eq(counterpart_id))
        .filter(messages::is_read.eq(false))
        .select(count_star())
        .first::<i64>(conn)?;
    Ok(unread)
}

/// Aggregate unread badge across every active match involving `user_id`,
/// recomputed in full on each call.
pub fn unread_total(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i64> {
    let active: Vec<Match> = matches::table
        .filter(matches::is_active.eq(true))
        .filter(matches::user_a_id.eq(user_id).or(matches::user_b_id.eq(user_id)))
        .load::<Match>(conn)?;

    let mut total: i64 = 0;
    for match_row in &active {
        let room: Option<ChatRoom> = chat_rooms::table
            .filter(chat_rooms::match_id.eq(match_row.id))
            .first::<ChatRoom>(conn)
            .optional()?;

        if let Some(room) = room {
            total += unread_in_room(conn, room.id, match_row.other_participant(user_id))?;
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_body_trims_and_rejects_blank() {
        assert_eq!(normalized_body("  hello  "), Some("hello".to_string()));
        assert_eq!(normalized_body(""), None);
        assert_eq!(normalized_body("   \n\t "), None);
    }
}
