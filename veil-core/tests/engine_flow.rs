//! DB-backed flow tests for the like/match engine, the reveal handshake and
//! conversation threads. They need a migrated Postgres; point
//! `TEST_DATABASE_URL` at one and run `cargo test -- --ignored`.

use std::sync::{Arc, Barrier};

use chrono::NaiveDate;
use diesel::dsl::count_star;
use diesel::prelude::*;
use uuid::Uuid;

use veil_core::models::Match;
use veil_core::schema::{matches, messages, profiles, reveal_requests};
use veil_core::services::match_engine::{self, LikeOutcome, RevealOutcome};
use veil_core::services::thread_service;

fn connect() -> PgConnection {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a migrated Postgres");
    PgConnection::establish(&url).expect("failed to connect to test database")
}

fn insert_profile(conn: &mut PgConnection, name: &str) -> Uuid {
    diesel::insert_into(profiles::table)
        .values((
            profiles::display_name.eq(name),
            profiles::birth_date.eq(NaiveDate::from_ymd_opt(1995, 5, 17).unwrap()),
            profiles::completion_pct.eq(100),
        ))
        .returning(profiles::id)
        .get_result(conn)
        .expect("failed to insert test profile")
}

fn match_rows_for(conn: &mut PgConnection, a: Uuid, b: Uuid) -> Vec<Match> {
    let (lo, hi) = match_engine::canonical_pair(a, b);
    matches::table
        .filter(matches::user_a_id.eq(lo))
        .filter(matches::user_b_id.eq(hi))
        .load::<Match>(conn)
        .unwrap()
}

fn make_match(conn: &mut PgConnection, a: Uuid, b: Uuid) -> Match {
    assert!(matches!(
        match_engine::like_user(conn, a, b, 50.0).unwrap(),
        LikeOutcome::Liked
    ));
    match match_engine::like_user(conn, b, a, 50.0).unwrap() {
        LikeOutcome::Mutual(m) => m,
        other => panic!("expected mutual, got {other:?}"),
    }
}

#[test]
#[ignore = "requires a migrated Postgres via TEST_DATABASE_URL"]
fn mutual_like_promotes_exactly_once() {
    let mut conn = connect();
    let a = insert_profile(&mut conn, "flow-a");
    let b = insert_profile(&mut conn, "flow-b");

    assert!(matches!(
        match_engine::like_user(&mut conn, a, b, 61.67).unwrap(),
        LikeOutcome::Liked
    ));

    let m = match match_engine::like_user(&mut conn, b, a, 85.0).unwrap() {
        LikeOutcome::Mutual(m) => m,
        other => panic!("expected mutual, got {other:?}"),
    };

    assert!(m.is_active);
    assert!(!m.is_friend);
    // Score fixed at creation, from the perspective of the like that
    // completed the pair.
    assert_eq!(m.compatibility_score, 85.0);

    // Reciprocity dominates already_liked: the first liker also sees the
    // match when it retries.
    assert!(matches!(
        match_engine::like_user(&mut conn, a, b, 61.67).unwrap(),
        LikeOutcome::Mutual(_)
    ));

    let rows = match_rows_for(&mut conn, a, b);
    assert_eq!(rows.len(), 1);

    // The thread was created lazily alongside the match.
    match_engine::ensure_chat_room(&mut conn, rows[0].id).unwrap();
}

#[test]
#[ignore = "requires a migrated Postgres via TEST_DATABASE_URL"]
fn relike_without_reciprocity_is_already_liked() {
    let mut conn = connect();
    let a = insert_profile(&mut conn, "relike-a");
    let b = insert_profile(&mut conn, "relike-b");

    assert!(matches!(
        match_engine::like_user(&mut conn, a, b, 15.0).unwrap(),
        LikeOutcome::Liked
    ));
    assert!(matches!(
        match_engine::like_user(&mut conn, a, b, 15.0).unwrap(),
        LikeOutcome::AlreadyLiked
    ));
    assert!(match_rows_for(&mut conn, a, b).is_empty());
}

#[test]
#[ignore = "requires a migrated Postgres via TEST_DATABASE_URL"]
fn racing_cross_likes_create_one_match() {
    let mut conn = connect();
    let a = insert_profile(&mut conn, "race-a");
    let b = insert_profile(&mut conn, "race-b");

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for (actor, target) in [(a, b), (b, a)] {
        let barrier = barrier.clone();
        handles.push(std::thread::spawn(move || {
            let mut conn = connect();
            barrier.wait();
            match_engine::like_user(&mut conn, actor, target, 42.0).unwrap()
        }));
    }

    let outcomes: Vec<LikeOutcome> = handles
        .into_iter()
        .map(|h| h.join().expect("like thread panicked"))
        .collect();

    // Whichever transaction serialized second saw the first one's like.
    assert!(outcomes.iter().any(|o| matches!(o, LikeOutcome::Mutual(_))));
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, LikeOutcome::Liked | LikeOutcome::Mutual(_))));

    assert_eq!(match_rows_for(&mut conn, a, b).len(), 1);

    // Both sides now observe the match.
    assert!(matches!(
        match_engine::like_user(&mut conn, a, b, 42.0).unwrap(),
        LikeOutcome::Mutual(_)
    ));
    assert!(matches!(
        match_engine::like_user(&mut conn, b, a, 42.0).unwrap(),
        LikeOutcome::Mutual(_)
    ));
}

#[test]
#[ignore = "requires a migrated Postgres via TEST_DATABASE_URL"]
fn reveal_handshake_consumes_request() {
    let mut conn = connect();
    let a = insert_profile(&mut conn, "reveal-a");
    let b = insert_profile(&mut conn, "reveal-b");
    let m = make_match(&mut conn, a, b);

    assert_eq!(
        match_engine::request_reveal(&mut conn, &m, a).unwrap(),
        RevealOutcome::Requested
    );
    // Re-requesting is harmless and leaves a single row.
    assert_eq!(
        match_engine::request_reveal(&mut conn, &m, a).unwrap(),
        RevealOutcome::Requested
    );
    let pending: i64 = reveal_requests::table
        .filter(reveal_requests::match_id.eq(m.id))
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    assert_eq!(pending, 1);

    match_engine::accept_reveal(&mut conn, &m, b).unwrap();

    let reloaded: Match = matches::table.find(m.id).first(&mut conn).unwrap();
    assert!(reloaded.is_friend);

    // A's request was consumed.
    let pending: i64 = reveal_requests::table
        .filter(reveal_requests::match_id.eq(m.id))
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    assert_eq!(pending, 0);

    // Accepting again (from either side) stays a no-op.
    match_engine::accept_reveal(&mut conn, &reloaded, a).unwrap();
    let reloaded: Match = matches::table.find(m.id).first(&mut conn).unwrap();
    assert!(reloaded.is_friend);

    // And a late request just reports the terminal state.
    assert_eq!(
        match_engine::request_reveal(&mut conn, &reloaded, a).unwrap(),
        RevealOutcome::AlreadyRevealed
    );
}

#[test]
#[ignore = "requires a migrated Postgres via TEST_DATABASE_URL"]
fn thread_read_receipts_and_soft_delete() {
    let mut conn = connect();
    let a = insert_profile(&mut conn, "thread-a");
    let b = insert_profile(&mut conn, "thread-b");
    let m = make_match(&mut conn, a, b);
    let room = match_engine::ensure_chat_room(&mut conn, m.id).unwrap();

    let msg = thread_service::post_message(&mut conn, room.id, a, "  hello  ")
        .unwrap()
        .expect("non-blank body creates a message");
    assert_eq!(msg.body, "hello");
    assert!(!msg.is_read);

    // Blank input is a successful no-op.
    assert!(thread_service::post_message(&mut conn, room.id, a, "   ")
        .unwrap()
        .is_none());

    // B polls: A's message flips to read.
    assert_eq!(thread_service::unread_in_room(&mut conn, room.id, a).unwrap(), 1);
    assert_eq!(thread_service::unread_total(&mut conn, b).unwrap(), 1);
    assert_eq!(thread_service::mark_counterpart_read(&mut conn, room.id, a).unwrap(), 1);
    assert_eq!(thread_service::unread_in_room(&mut conn, room.id, a).unwrap(), 0);
    assert_eq!(thread_service::unread_total(&mut conn, b).unwrap(), 0);

    // Only the sender can delete.
    assert!(thread_service::soft_delete_message(&mut conn, msg.id, b).is_err());
    let deleted = thread_service::soft_delete_message(&mut conn, msg.id, a).unwrap();
    assert!(deleted.is_deleted);

    // Hidden from the thread, still stored.
    assert!(thread_service::visible_messages(&mut conn, room.id).unwrap().is_empty());
    let stored: i64 = messages::table
        .filter(messages::room_id.eq(room.id))
        .select(count_star())
        .first(&mut conn)
        .unwrap();
    assert_eq!(stored, 1);
}

#[test]
#[ignore = "requires a migrated Postgres via TEST_DATABASE_URL"]
fn messages_keep_insertion_order() {
    let mut conn = connect();
    let a = insert_profile(&mut conn, "order-a");
    let b = insert_profile(&mut conn, "order-b");
    let m = make_match(&mut conn, a, b);
    let room = match_engine::ensure_chat_room(&mut conn, m.id).unwrap();

    for body in ["first", "second", "third"] {
        thread_service::post_message(&mut conn, room.id, a, body).unwrap();
    }

    let bodies: Vec<String> = thread_service::visible_messages(&mut conn, room.id)
        .unwrap()
        .into_iter()
        .map(|m| m.body)
        .collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
}
