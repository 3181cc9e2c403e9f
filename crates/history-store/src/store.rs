use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{
    AggregateId, ChangeRecord, HistoryQuery, HistoryStoreError, Result, Snapshot, Version,
};

/// Options for appending records to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected version of the aggregate for optimistic concurrency control.
    /// If None, no version check is performed.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the aggregate to have no history yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of change records.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<ChangeRecord>> + Send>>;

/// Persistence and audit collaborator for event-sourced aggregates.
///
/// Implementations must be thread-safe and must append each batch atomically:
/// a multi-record change (a rescale, a role-state update) is either fully
/// visible to readers or not at all.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends records to the store.
    ///
    /// If `options.expected_version` is set, the operation fails with
    /// `ConcurrencyConflict` when the aggregate has moved on.
    ///
    /// Returns the new version of the aggregate after appending.
    async fn append(&self, records: Vec<ChangeRecord>, options: AppendOptions) -> Result<Version>;

    /// Retrieves the full history of an aggregate, oldest first.
    async fn records_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<ChangeRecord>>;

    /// Retrieves the history of an aggregate starting at `from_version` (inclusive).
    async fn records_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<ChangeRecord>>;

    /// Retrieves records matching a query, ordered by timestamp then version.
    async fn query_records(&self, query: HistoryQuery) -> Result<Vec<ChangeRecord>>;

    /// Retrieves every record of one change type, ordered by timestamp.
    async fn records_by_type(&self, change_type: &str) -> Result<Vec<ChangeRecord>>;

    /// Streams every record in insertion order.
    async fn stream_all_records(&self) -> Result<RecordStream>;

    /// Gets the current version of an aggregate, or None if it has no history.
    async fn aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;

    /// Saves a snapshot, replacing any previous one for the same aggregate.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for an aggregate.
    async fn snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>>;
}

/// Convenience methods available on every history store.
#[async_trait]
pub trait HistoryStoreExt: HistoryStore {
    /// Appends a single record.
    async fn append_record(&self, record: ChangeRecord, options: AppendOptions) -> Result<Version> {
        self.append(vec![record], options).await
    }

    /// Checks if an aggregate has any history.
    async fn aggregate_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.aggregate_version(aggregate_id).await?.is_some())
    }

    /// Loads an aggregate's records, starting after its snapshot when one exists.
    async fn load_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<ChangeRecord>)> {
        if let Some(snapshot) = self.snapshot(aggregate_id).await? {
            let records = self
                .records_for_aggregate_from_version(aggregate_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), records))
        } else {
            let records = self.records_for_aggregate(aggregate_id).await?;
            Ok((None, records))
        }
    }

    /// Lists the ids of every aggregate of a type that recorded `creation_type`,
    /// in creation order.
    async fn aggregate_ids(
        &self,
        aggregate_type: &str,
        creation_type: &str,
    ) -> Result<Vec<AggregateId>> {
        let records = self
            .query_records(
                HistoryQuery::new()
                    .aggregate_type(aggregate_type)
                    .change_type(creation_type),
            )
            .await?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            if !ids.contains(&record.aggregate_id) {
                ids.push(record.aggregate_id);
            }
        }
        Ok(ids)
    }
}

impl<T: HistoryStore + ?Sized> HistoryStoreExt for T {}

/// Validates a batch before it is appended.
///
/// A batch must be non-empty, belong to a single aggregate and carry
/// consecutive versions.
pub fn validate_append(records: &[ChangeRecord]) -> Result<()> {
    let Some(first) = records.first() else {
        return Err(HistoryStoreError::InvalidAppend(
            "cannot append an empty batch".to_string(),
        ));
    };

    let mut expected_version = first.version;
    for record in records.iter().skip(1) {
        if record.aggregate_id != first.aggregate_id
            || record.aggregate_type != first.aggregate_type
        {
            return Err(HistoryStoreError::InvalidAppend(
                "all records of a batch must belong to the same aggregate".to_string(),
            ));
        }
        expected_version = expected_version.next();
        if record.version != expected_version {
            return Err(HistoryStoreError::InvalidAppend(format!(
                "record versions must be consecutive: expected {}, got {}",
                expected_version, record.version
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(aggregate_id: AggregateId, aggregate_type: &str, version: i64) -> ChangeRecord {
        ChangeRecord::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type(aggregate_type)
            .change_type("RoomAdded")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            validate_append(&[]),
            Err(HistoryStoreError::InvalidAppend(_))
        ));
    }

    #[test]
    fn mixed_aggregates_are_rejected() {
        let batch = vec![
            record(AggregateId::new(), "Conference", 1),
            record(AggregateId::new(), "Conference", 2),
        ];
        assert!(validate_append(&batch).is_err());
    }

    #[test]
    fn gaps_in_versions_are_rejected() {
        let id = AggregateId::new();
        let batch = vec![record(id, "Conference", 1), record(id, "Conference", 3)];
        assert!(validate_append(&batch).is_err());
    }

    #[test]
    fn consecutive_batch_is_accepted() {
        let id = AggregateId::new();
        let batch = vec![
            record(id, "Person", 4),
            record(id, "Person", 5),
            record(id, "Person", 6),
        ];
        assert!(validate_append(&batch).is_ok());
    }
}
