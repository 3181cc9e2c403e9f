//! CLI error types.

use domain::DomainError;
use history_store::HistoryStoreError;
use projections::ProjectionError;
use thiserror::Error;

/// Everything that can make a command fail.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("DATABASE_URL must be set for this command")]
    DatabaseRequired,

    #[error("No conference with acronym {0}")]
    ConferenceNotFound(String),

    #[error("No conference has been created yet")]
    NoConference,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    HistoryStore(#[from] HistoryStoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) | CliError::DatabaseRequired => 2,
            CliError::ConferenceNotFound(_) | CliError::NoConference => 3,
            _ => 1,
        }
    }
}
