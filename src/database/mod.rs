use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use crate::score::ScoreEntry;
use crate::validation::NewScore;

mod memory;
mod sql;
mod store_error;

pub use memory::MemoryScoreStore;
pub use sql::SqlScoreStore;
pub use store_error::*;

/// Time source used to stamp new entries.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall clock truncated to microseconds, the precision the SQL store keeps.
pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().trunc_subsecs(6))
}

/// Append-only storage of score entries.
///
/// Implementations assign `id` and `created_at` atomically with respect to
/// concurrent `append` calls, and a `top` call made after an `append`
/// returned must observe that entry.
#[rocket::async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persists a validated score and returns it with its assigned id and timestamp.
    async fn append(&self, candidate: NewScore) -> StoreResult<ScoreEntry>;

    /// Returns at most `limit` entries in [`ranking`](crate::score::ranking) order.
    async fn top(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>>;

    async fn count(&self) -> StoreResult<u64>;
}
