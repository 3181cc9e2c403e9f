//! Core projection trait and position tracking.

use async_trait::async_trait;
use history_store::ChangeRecord;

use crate::Result;

/// How many records of the global stream a projection has consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    pub records_processed: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self {
            records_processed: 0,
        }
    }

    /// Advances the position by one record.
    pub fn advance(&self) -> Self {
        Self {
            records_processed: self.records_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.records_processed)
    }
}

/// Folds change records into a read model.
///
/// Every record of the global stream is handed to every projection, so a
/// projection must advance its position even for records it ignores.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Handles a single record, updating the read model.
    async fn handle(&self, record: &ChangeRecord) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Drops all state and rewinds to position zero.
    async fn reset(&self) -> Result<()>;
}
