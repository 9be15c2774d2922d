use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::database::{ScoreStore, StoreError};
use crate::score::{ScoreEntry, ScoreSubmission};
use crate::validation::{self, ValidationError};

/// Number of entries the public leaderboard shows.
pub const TOP_SCORES: usize = 10;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type LeaderboardResult<T, E = LeaderboardError> = std::result::Result<T, E>;

/// Sits between untrusted submissions and the score store.
pub struct LeaderboardService {
    store: Arc<dyn ScoreStore>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Validates `submission` and records it.
    /// Rejected submissions never reach the store.
    #[instrument(skip_all)]
    pub async fn submit(&self, submission: ScoreSubmission) -> LeaderboardResult<ScoreEntry> {
        let candidate = validation::validate(submission).map_err(|err| {
            debug!(%err, "rejected score submission");
            err
        })?;

        let entry = self.store.append(candidate).await.map_err(|err| {
            error!(%err, "failed to record score");
            err
        })?;

        info!(
            id = entry.id,
            player = %entry.player_name,
            points = entry.points,
            "score recorded"
        );
        Ok(entry)
    }

    /// Current top entries, best first.
    #[instrument(skip_all)]
    pub async fn top(&self) -> LeaderboardResult<Vec<ScoreEntry>> {
        self.store.top(TOP_SCORES).await.map_err(|err| {
            error!(%err, "failed to read top scores");
            err.into()
        })
    }

    pub async fn entry_count(&self) -> LeaderboardResult<u64> {
        Ok(self.store.count().await?)
    }
}
