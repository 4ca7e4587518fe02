use diesel::prelude::*;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{ChatRoom, Like, Match, NewChatRoom, NewLike, NewMatch, NewRevealRequest};
use crate::schema::{chat_rooms, likes, matches, reveal_requests};

/// Matches are stored as (lower id, higher id) so the unique pair key is
/// order-independent.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug)]
pub enum LikeOutcome {
    Liked,
    AlreadyLiked,
    Mutual(Match),
}

/// Transaction-scoped advisory lock on the canonical pair key. Released at
/// commit/rollback; both directions of a pair contend on the same key.
fn lock_pair(conn: &mut PgConnection, a: Uuid, b: Uuid) -> AppResult<()> {
    let (lo, hi) = canonical_pair(a, b);
    let key = format!("like-pair:{lo}:{hi}");
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind::<diesel::sql_types::Text, _>(key)
        .execute(conn)?;
    Ok(())
}

/// Record `actor` liking `target`, promoting the pair to a match on
/// reciprocity.
///
/// Runs as one transaction. A transaction-scoped advisory lock on the
/// canonical pair key serializes racing cross-likes even before either
/// like row exists (a row lock alone cannot cover that window); the
/// FOR UPDATE reads additionally pin the like rows for the duration of the
/// check-then-promote sequence. `score` is the actor-perspective
/// compatibility score; it is stored when the match row is first created
/// and never recomputed.
///
/// Reciprocity dominates: a repeated like still reports `Mutual` when the
/// reciprocal like exists, so the loser of a cross-like race sees the match
/// on its next call.
pub fn like_user(
    conn: &mut PgConnection,
    actor: Uuid,
    target: Uuid,
    score: f64,
) -> AppResult<LikeOutcome> {
    conn.transaction::<_, AppError, _>(|conn| {
        lock_pair(conn, actor, target)?;

        let existing: Option<Like> = likes::table
            .filter(likes::liker_id.eq(actor))
            .filter(likes::liked_id.eq(target))
            .for_update()
            .first::<Like>(conn)
            .optional()?;

        let created = match existing {
            Some(_) => false,
            None => {
                let inserted = diesel::insert_into(likes::table)
                    .values(&NewLike { liker_id: actor, liked_id: target })
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                if inserted == 0 {
                    // Lost an insert race; block on the winner's row lock.
                    likes::table
                        .filter(likes::liker_id.eq(actor))
                        .filter(likes::liked_id.eq(target))
                        .for_update()
                        .first::<Like>(conn)?;
                    false
                } else {
                    true
                }
            }
        };

        let reciprocal: Option<Like> = likes::table
            .filter(likes::liker_id.eq(target))
            .filter(likes::liked_id.eq(actor))
            .for_update()
            .first::<Like>(conn)
            .optional()?;

        if reciprocal.is_some() {
            let (user_a_id, user_b_id) = canonical_pair(actor, target);
            // On conflict only is_active is forced back on; the stored
            // score stays whatever it was at creation.
            let match_row: Match = diesel::insert_into(matches::table)
                .values(&NewMatch { user_a_id, user_b_id, compatibility_score: score })
                .on_conflict((matches::user_a_id, matches::user_b_id))
                .do_update()
                .set(matches::is_active.eq(true))
                .get_result(conn)?;

            ensure_chat_room(conn, match_row.id)?;

            return Ok(LikeOutcome::Mutual(match_row));
        }

        Ok(if created {
            LikeOutcome::Liked
        } else {
            LikeOutcome::AlreadyLiked
        })
    })
}

/// Load a match and authorize `user_id` as one of its two participants.
/// With `require_active`, an inactive match is indistinguishable from a
/// missing one.
pub fn load_match_for_participant(
    conn: &mut PgConnection,
    match_id: Uuid,
    user_id: Uuid,
    require_active: bool,
) -> AppResult<Match> {
    let match_row: Match = matches::table
        .find(match_id)
        .first::<Match>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::MatchNotFound, "match not found"))?;

    if require_active && !match_row.is_active {
        return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
    }

    if !match_row.involves(user_id) {
        return Err(AppError::new(
            ErrorCode::NotMatchParticipant,
            "you are not part of this match",
        ));
    }

    Ok(match_row)
}

/// Idempotent create-or-fetch of the room attached to a match. Safe under
/// concurrent first-opens.
pub fn ensure_chat_room(conn: &mut PgConnection, match_id: Uuid) -> AppResult<ChatRoom> {
    diesel::insert_into(chat_rooms::table)
        .values(&NewChatRoom { match_id })
        .on_conflict_do_nothing()
        .execute(conn)?;

    let room = chat_rooms::table
        .filter(chat_rooms::match_id.eq(match_id))
        .first::<ChatRoom>(conn)?;

    Ok(room)
}

#[derive(Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Requested,
    AlreadyRevealed,
}

/// Ask the counterpart to unveil photos. Repeated requests by the same
/// participant are harmless.
pub fn request_reveal(
    conn: &mut PgConnection,
    match_row: &Match,
    requester: Uuid,
) -> AppResult<RevealOutcome> {
    if match_row.is_friend {
        return Ok(RevealOutcome::AlreadyRevealed);
    }

    diesel::insert_into(reveal_requests::table)
        .values(&NewRevealRequest { match_id: match_row.id, requester_id: requester })
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(RevealOutcome::Requested)
}

/// Unveil photos for both sides: is_friend goes true (monotonic, never
/// reverts) and the counterpart's outstanding request is consumed.
/// Acceptance is unconditional for a participant; no prior request needed.
pub fn accept_reveal(conn: &mut PgConnection, match_row: &Match, acceptor: Uuid) -> AppResult<()> {
    let other = match_row.other_participant(acceptor);

    conn.transaction::<_, AppError, _>(|conn| {
        diesel::update(matches::table.find(match_row.id))
            .set(matches::is_friend.eq(true))
            .execute(conn)?;

        diesel::delete(
            reveal_requests::table
                .filter(reveal_requests::match_id.eq(match_row.id))
                .filter(reveal_requests::requester_id.eq(other)),
        )
        .execute(conn)?;

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_order_independent() {
        let a = Uuid::from_u128(7);
        let b = Uuid::from_u128(42);
        assert_eq!(canonical_pair(a, b), (a, b));
        assert_eq!(canonical_pair(b, a), (a, b));
    }

    #[test]
    fn canonical_pair_of_equal_ids_is_stable() {
        let a = Uuid::from_u128(7);
        assert_eq!(canonical_pair(a, a), (a, a));
    }
}
