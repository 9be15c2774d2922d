use std::cmp::Ordering;

use tokio::sync::Mutex;

use super::*;
use crate::score::{ranking, ScoreId};

/// Process-local store. Entries are lost on shutdown.
pub struct MemoryScoreStore {
    state: Mutex<Ranked>,
    clock: Clock,
}

#[derive(Default)]
struct Ranked {
    /// Always sorted by [`ranking`].
    entries: Vec<ScoreEntry>,
    last_id: ScoreId,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: Mutex::new(Ranked::default()),
            clock,
        }
    }
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

#[rocket::async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn append(&self, candidate: NewScore) -> StoreResult<ScoreEntry> {
        let (player_name, points) = candidate.into_parts();

        let mut state = self.state.lock().await;
        state.last_id += 1;
        let entry = ScoreEntry {
            id: state.last_id,
            player_name,
            points,
            created_at: (self.clock)(),
        };

        let position = state
            .entries
            .partition_point(|existing| ranking(existing, &entry) == Ordering::Less);
        state.entries.insert(position, entry.clone());

        Ok(entry)
    }

    async fn top(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>> {
        let state = self.state.lock().await;
        Ok(state.entries.iter().take(limit).cloned().collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        let state = self.state.lock().await;
        Ok(state.entries.len() as u64)
    }
}
