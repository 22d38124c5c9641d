//! Error type shared by the library modules.

use thiserror::Error;

/// Errors emitted while loading questions or touching local state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("trivia request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("trivia provider answered with response code {0}")]
    ProviderCode(u8),
    #[error("trivia provider returned no questions")]
    EmptyResults,
    #[error("malformed question data: {0}")]
    Malformed(String),
    #[error("no bundled questions for {0}")]
    MissingBundle(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
