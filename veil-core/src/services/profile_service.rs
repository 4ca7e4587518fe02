use std::collections::{HashMap, HashSet};

use diesel::prelude::*;
use uuid::Uuid;

use veil_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::Profile;
use crate::schema::{interests, profile_interests, profiles};
use crate::services::scoring::ScoreInput;

pub fn get_profile(conn: &mut PgConnection, id: Uuid) -> AppResult<Profile> {
    profiles::table
        .find(id)
        .first::<Profile>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

pub fn interest_ids(conn: &mut PgConnection, profile_id: Uuid) -> AppResult<HashSet<Uuid>> {
    let ids = profile_interests::table
        .filter(profile_interests::profile_id.eq(profile_id))
        .select(profile_interests::interest_id)
        .load::<Uuid>(conn)?;
    Ok(ids.into_iter().collect())
}

/// Interest-id sets for a batch of profiles in one query. Profiles without
/// interests are simply absent from the map.
pub fn interest_ids_batch(
    conn: &mut PgConnection,
    profile_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, HashSet<Uuid>>> {
    if profile_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, Uuid)> = profile_interests::table
        .filter(profile_interests::profile_id.eq_any(profile_ids))
        .select((profile_interests::profile_id, profile_interests::interest_id))
        .load(conn)?;

    let mut map: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for (profile_id, interest_id) in rows {
        map.entry(profile_id).or_default().insert(interest_id);
    }
    Ok(map)
}

/// Interest names per profile, alphabetical, for card rendering.
pub fn interest_names_batch(
    conn: &mut PgConnection,
    profile_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<String>>> {
    if profile_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, String)> = profile_interests::table
        .inner_join(interests::table)
        .filter(profile_interests::profile_id.eq_any(profile_ids))
        .order(interests::name.asc())
        .select((profile_interests::profile_id, interests::name))
        .load(conn)?;

    let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (profile_id, name) in rows {
        map.entry(profile_id).or_default().push(name);
    }
    Ok(map)
}

/// The scoring-relevant slice of a profile: interest ids + location.
pub fn score_input(conn: &mut PgConnection, profile: &Profile) -> AppResult<ScoreInput> {
    Ok(ScoreInput {
        interests: interest_ids(conn, profile.id)?,
        location: profile.location(),
    })
}
