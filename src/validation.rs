use std::collections::BTreeMap;
use std::fmt;

use rocket::serde::json::serde_json::Number;
use rocket::serde::Serialize;
use thiserror::Error;

use crate::score::{Points, ScoreSubmission};

pub const MAX_PLAYER_NAME_CHARS: usize = 100;
pub const MAX_POINTS: i64 = 1_000_000_000;

/// Submission fields that can be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub enum Field {
    PlayerName,
    Points,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerName => "playerName",
            Self::Points => "points",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every field violation found in a single submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
#[error("validation failed: {}", describe(.errors))]
pub struct ValidationError {
    errors: BTreeMap<Field, String>,
}

fn describe(errors: &BTreeMap<Field, String>) -> String {
    errors
        .values()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    fn reject(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    #[cfg(test)]
    pub fn message(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A score that passed validation and may be appended to a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewScore {
    player_name: String,
    points: Points,
}

impl NewScore {
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn points(&self) -> Points {
        self.points
    }

    pub fn into_parts(self) -> (String, Points) {
        (self.player_name, self.points)
    }
}

/// Whole value of `number`, saturated to the `i64` range.
/// `None` when the number has a fractional part.
fn whole_value(number: &Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if number.as_u64().is_some() {
        return Some(i64::MAX);
    }
    // Integers beyond u64 arrive as floats; `as` saturates
    number
        .as_f64()
        .filter(|value| value.fract() == 0.0)
        .map(|value| value as i64)
}

/// Trims the player name and range-checks both fields.
/// All violations are reported together.
pub fn validate(submission: ScoreSubmission) -> Result<NewScore, ValidationError> {
    let mut error = ValidationError::default();

    let player_name = match submission.player_name.as_deref().map(str::trim) {
        None | Some("") => {
            error.reject(Field::PlayerName, "playerName is required");
            None
        }
        Some(name) if name.chars().count() > MAX_PLAYER_NAME_CHARS => {
            error.reject(
                Field::PlayerName,
                format!(
                    "playerName length must be between 1 and {}",
                    MAX_PLAYER_NAME_CHARS
                ),
            );
            None
        }
        Some(name) => Some(name.to_owned()),
    };

    let points = match submission.points.as_ref().map(whole_value) {
        None => {
            error.reject(Field::Points, "points is required");
            None
        }
        Some(None) => {
            error.reject(Field::Points, "points must be a whole number");
            None
        }
        Some(Some(points)) if points < 0 => {
            error.reject(Field::Points, "points must be >= 0");
            None
        }
        Some(Some(points)) if points > MAX_POINTS => {
            error.reject(Field::Points, format!("points must be <= {}", MAX_POINTS));
            None
        }
        Some(Some(points)) => match Points::try_from(points) {
            Ok(points) => Some(points),
            Err(_) => {
                error.reject(Field::Points, format!("points must be <= {}", MAX_POINTS));
                None
            }
        },
    };

    match (player_name, points) {
        (Some(player_name), Some(points)) if error.is_empty() => Ok(NewScore {
            player_name,
            points,
        }),
        _ => Err(error),
    }
}
