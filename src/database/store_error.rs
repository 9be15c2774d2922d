use thiserror::Error;

use crate::score::ScoreId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("unsupported database url scheme: {scheme}")]
    UnsupportedDatabase { scheme: String },
    #[error("stored score {id} has an invalid {column}")]
    CorruptRow { id: ScoreId, column: &'static str },
}

pub type StoreResult<T, E = StoreError> = std::result::Result<T, E>;
