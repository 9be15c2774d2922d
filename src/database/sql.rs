use rocket::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::Row;
use tracing::{debug, info, instrument};

use super::*;
use crate::score::{Points, ScoreId};

pub type DatabasePool = sqlx::AnyPool;

/// Store backed by SQLite or PostgreSQL through sqlx's `Any` driver.
pub struct SqlScoreStore {
    pool: DatabasePool,
    clock: Clock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    fn from_url(database_url: &str) -> StoreResult<Self> {
        let scheme = database_url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(StoreError::UnsupportedDatabase {
                scheme: scheme.to_owned(),
            }),
        }
    }

    fn schema(self) -> &'static [&'static str] {
        match self {
            Self::Sqlite => &[
                "CREATE TABLE IF NOT EXISTS scores (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    player_name TEXT NOT NULL,
                    points BIGINT NOT NULL CHECK (points BETWEEN 0 AND 1000000000),
                    created_at BIGINT NOT NULL
                )",
                "CREATE INDEX IF NOT EXISTS scores_ranking
                    ON scores (points DESC, created_at DESC, id DESC)",
            ],
            Self::Postgres => &[
                "CREATE TABLE IF NOT EXISTS scores (
                    id BIGSERIAL PRIMARY KEY,
                    player_name VARCHAR(100) NOT NULL,
                    points BIGINT NOT NULL CHECK (points BETWEEN 0 AND 1000000000),
                    created_at BIGINT NOT NULL
                )",
                "CREATE INDEX IF NOT EXISTS scores_ranking
                    ON scores (points DESC, created_at DESC, id DESC)",
            ],
        }
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl SqlScoreStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Self::connect_with_clock(database_url, system_clock()).await
    }

    /// Connects to `database_url` and creates the `scores` table if needed.
    pub async fn connect_with_clock(database_url: &str, clock: Clock) -> StoreResult<Self> {
        sqlx::any::install_default_drivers();
        let backend = Backend::from_url(database_url)?;

        let mut options = AnyPoolOptions::new();
        if backend == Backend::Sqlite && is_in_memory(database_url) {
            // Each new connection would open a separate, empty database
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(database_url).await?;

        for statement in backend.schema() {
            sqlx::query(*statement).execute(&pool).await?;
        }
        info!(?backend, "score store ready");

        Ok(Self { pool, clock })
    }
}

fn entry_from_row(row: &AnyRow) -> StoreResult<ScoreEntry> {
    let id: ScoreId = row.try_get(0)?;
    let player_name: String = row.try_get(1)?;
    let points: i64 = row.try_get(2)?;
    let created_at: i64 = row.try_get(3)?;

    let points = Points::try_from(points).map_err(|_| StoreError::CorruptRow {
        id,
        column: "points",
    })?;
    let created_at =
        DateTime::<Utc>::from_timestamp_micros(created_at).ok_or(StoreError::CorruptRow {
            id,
            column: "created_at",
        })?;

    Ok(ScoreEntry {
        id,
        player_name,
        points,
        created_at,
    })
}

#[async_trait]
impl ScoreStore for SqlScoreStore {
    #[instrument(skip_all)]
    async fn append(&self, candidate: NewScore) -> StoreResult<ScoreEntry> {
        let created_at = (self.clock)();

        let row = sqlx::query(
            "INSERT INTO scores (player_name, points, created_at) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(candidate.player_name().to_owned())
        .bind(i64::from(candidate.points()))
        .bind(created_at.timestamp_micros())
        .fetch_one(&self.pool)
        .await?;
        let id: ScoreId = row.try_get(0)?;
        debug!(id, "inserted score");

        let (player_name, points) = candidate.into_parts();

        Ok(ScoreEntry {
            id,
            player_name,
            points,
            created_at,
        })
    }

    #[instrument(skip(self))]
    async fn top(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT id, player_name, points, created_at FROM scores
             ORDER BY points DESC, created_at DESC, id DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn count(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) FROM scores")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }
}
