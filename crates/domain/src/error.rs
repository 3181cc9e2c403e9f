//! Domain error types.

use history_store::HistoryStoreError;
use thiserror::Error;

use crate::conference::ConferenceError;
use crate::person::PersonError;

/// Errors returned by domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The history store failed or detected a concurrent writer.
    #[error("History store error: {0}")]
    HistoryStore(#[from] HistoryStoreError),

    /// A conference command was rejected.
    #[error("Conference error: {0}")]
    Conference(ConferenceError),

    /// A person command was rejected.
    #[error("Person error: {0}")]
    Person(PersonError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// A stored payload or snapshot could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ConferenceError> for DomainError {
    fn from(e: ConferenceError) -> Self {
        DomainError::Conference(e)
    }
}

impl From<PersonError> for DomainError {
    fn from(e: PersonError) -> Self {
        DomainError::Person(e)
    }
}
