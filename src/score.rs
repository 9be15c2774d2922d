use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rocket::serde::json::serde_json::Number;
use rocket::serde::{Deserialize, Serialize};

pub type ScoreId = i64;
pub type Points = i32;

/// A recorded score. Never changes once the store has created it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreEntry {
    pub id: ScoreId,
    pub player_name: String,
    pub points: Points,
    pub created_at: DateTime<Utc>,
}

/// Score as submitted by a client, before any validation.
///
/// `points` keeps whatever JSON number was sent, so out-of-range and
/// fractional values are reported by validation rather than by the parser.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreSubmission {
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub points: Option<Number>,
}

#[cfg(test)]
impl ScoreSubmission {
    pub fn new(player_name: impl Into<String>, points: i64) -> Self {
        Self {
            player_name: Some(player_name.into()),
            points: Some(Number::from(points)),
        }
    }
}

/// Leaderboard order: higher points first, then the more recent entry,
/// then the later insertion when timestamps collide.
///
/// `Ordering::Less` means `a` ranks above `b`.
pub fn ranking(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}
