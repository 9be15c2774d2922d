use rocket::http::Status;
use rocket::response::status;
use rocket::serde::{json::Json, Serialize};
use rocket::{get, post, State};

use crate::api::cors::AllowedOrigin;
use crate::leaderboard::{LeaderboardError, LeaderboardService};
use crate::score::{ScoreEntry, ScoreSubmission};

pub type ApiResult<T, E = LeaderboardError> = std::result::Result<T, E>;

#[get("/")]
pub fn index() -> &'static str {
    "This is an online leaderboard server!"
}

/// Records a score and returns it with its assigned id and timestamp.
#[post("/scores", format = "json", data = "<submission>")]
pub async fn create_score(
    _origin: AllowedOrigin,
    submission: Json<ScoreSubmission>,
    leaderboard: &State<LeaderboardService>,
) -> ApiResult<status::Custom<Json<ScoreEntry>>> {
    let entry = leaderboard.submit(submission.into_inner()).await?;
    Ok(status::Custom(Status::Created, Json(entry)))
}

/// The best scores, highest points first and newest first among ties.
#[get("/scores/top")]
pub async fn top_scores(
    _origin: AllowedOrigin,
    leaderboard: &State<LeaderboardService>,
) -> ApiResult<Json<Vec<ScoreEntry>>> {
    Ok(Json(leaderboard.top().await?))
}

#[derive(Serialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct Health {
    pub status: &'static str,
    pub scores: u64,
}

#[get("/health")]
pub async fn health(
    _origin: AllowedOrigin,
    leaderboard: &State<LeaderboardService>,
) -> ApiResult<Json<Health>> {
    let scores = leaderboard.entry_count().await?;
    Ok(Json(Health {
        status: "ok",
        scores,
    }))
}
