use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{
    chat_rooms, discovery_log, likes, matches, messages, reveal_requests,
};
use crate::services::scoring::GeoPoint;

// --- Profile ---

/// Read-only view of the external profile store. The core never writes
/// profiles except for the presence timestamp.
#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = crate::schema::profiles)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub profile_photo_url: Option<String>,
    pub is_verified: bool,
    pub completion_pct: i32,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.birth_date
            .map(|dob| crate::services::discovery::age_on(dob, today))
    }

    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        }
    }

    /// Seen within the last 2 minutes.
    pub fn is_online(&self) -> bool {
        self.last_seen_at
            .map(|seen| Utc::now().signed_duration_since(seen) < Duration::minutes(2))
            .unwrap_or(false)
    }
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub liked_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub liker_id: Uuid,
    pub liked_id: Uuid,
}

// --- Match ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub compatibility_score: f64,
    pub is_active: bool,
    pub is_friend: bool,
    pub matched_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.user_a_id == user_id {
            self.user_b_id
        } else {
            self.user_a_id
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub compatibility_score: f64,
}

// --- DiscoveryLog ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = discovery_log)]
pub struct DiscoveryLog {
    pub id: Uuid,
    pub viewer_id: Uuid,
    pub viewed_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = discovery_log)]
pub struct NewDiscoveryLog {
    pub viewer_id: Uuid,
    pub viewed_id: Uuid,
}

// --- RevealRequest ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = reveal_requests)]
pub struct RevealRequest {
    pub id: Uuid,
    pub match_id: Uuid,
    pub requester_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reveal_requests)]
pub struct NewRevealRequest {
    pub match_id: Uuid,
    pub requester_id: Uuid,
}

// --- ChatRoom ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = chat_rooms)]
pub struct ChatRoom {
    pub id: Uuid,
    pub match_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chat_rooms)]
pub struct NewChatRoom {
    pub match_id: Uuid,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub is_read: bool,
    pub is_deleted: bool,
    pub seq: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
}
