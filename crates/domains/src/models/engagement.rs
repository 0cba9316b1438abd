use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media::MediaRef;

pub const MIN_SCORE: i16 = 1;
pub const MAX_SCORE: i16 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: MediaRef,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: Uuid, target: MediaRef, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            target,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One user's score for one piece of media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: MediaRef,
    pub score: i16,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: Uuid, target: MediaRef, score: i16, review: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            target,
            score,
            review,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

impl RatingSummary {
    pub fn from_scores(scores: &[i16]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let sum: i64 = scores.iter().map(|s| i64::from(*s)).sum();
        let count = scores.len() as i64;
        Self {
            average: round2(sum as f64 / count as f64),
            count,
        }
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Per-user collections that hold media references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shelf {
    Favorites,
    Watchlist,
}

impl Shelf {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shelf::Favorites => "favorites",
            Shelf::Watchlist => "watchlist",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "favorites" => Some(Shelf::Favorites),
            "watchlist" => Some(Shelf::Watchlist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShelfEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shelf: Shelf,
    pub target: MediaRef,
    pub created_at: DateTime<Utc>,
}

impl ShelfEntry {
    pub fn new(user_id: Uuid, shelf: Shelf, target: MediaRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            shelf,
            target,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: MediaRef,
    pub progress_seconds: i32,
    pub completed: bool,
    pub watched_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(user_id: Uuid, target: MediaRef, progress_seconds: i32, completed: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            target,
            progress_seconds,
            completed,
            watched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_no_scores_is_zero() {
        assert_eq!(RatingSummary::from_scores(&[]), RatingSummary::default());
    }

    #[test]
    fn summary_rounds_to_two_places() {
        let s = RatingSummary::from_scores(&[7, 8, 8]);
        assert_eq!(s.count, 3);
        assert_eq!(s.average, 7.67);
    }
}
