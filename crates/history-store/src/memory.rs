use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, ChangeRecord, HistoryQuery, HistoryStoreError, Result, Snapshot, Version,
    store::{AppendOptions, HistoryStore, RecordStream, validate_append},
};

/// In-memory history store.
///
/// Used by tests and by the CLI when no database is configured. Cloning the
/// store shares the underlying history.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    records: Arc<RwLock<Vec<ChangeRecord>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryHistoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records and snapshots.
    pub async fn clear(&self) {
        self.records.write().await.clear();
        self.snapshots.write().await.clear();
    }
}

fn current_version(records: &[ChangeRecord], aggregate_id: AggregateId) -> Version {
    records
        .iter()
        .filter(|r| r.aggregate_id == aggregate_id)
        .map(|r| r.version)
        .max()
        .unwrap_or(Version::initial())
}

fn matches(query: &HistoryQuery, record: &ChangeRecord) -> bool {
    if let Some(id) = query.aggregate_id
        && record.aggregate_id != id
    {
        return false;
    }
    if let Some(ref aggregate_type) = query.aggregate_type
        && &record.aggregate_type != aggregate_type
    {
        return false;
    }
    if let Some(ref types) = query.change_types
        && !types.contains(&record.change_type)
    {
        return false;
    }
    if let Some(from) = query.from_version
        && record.version < from
    {
        return false;
    }
    if let Some(to) = query.to_version
        && record.version > to
    {
        return false;
    }
    if let Some(from) = query.from_timestamp
        && record.timestamp < from
    {
        return false;
    }
    if let Some(to) = query.to_timestamp
        && record.timestamp > to
    {
        return false;
    }
    true
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, records: Vec<ChangeRecord>, options: AppendOptions) -> Result<Version> {
        validate_append(&records)?;

        let first = &records[0];
        let aggregate_id = first.aggregate_id;

        let mut store = self.records.write().await;
        let current = current_version(&store, aggregate_id);

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(HistoryStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        // Mirrors the unique (aggregate_id, version) constraint of the database.
        if first.version <= current {
            return Err(HistoryStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        let last_version = records.last().map(|r| r.version).unwrap_or(current);
        metrics::counter!("history_records_appended").increment(records.len() as u64);
        store.extend(records);

        Ok(last_version)
    }

    async fn records_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<ChangeRecord>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .iter()
            .filter(|r| r.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }

    async fn records_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<ChangeRecord>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .iter()
            .filter(|r| r.aggregate_id == aggregate_id && r.version >= from_version)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }

    async fn query_records(&self, query: HistoryQuery) -> Result<Vec<ChangeRecord>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .iter()
            .filter(|r| matches(&query, r))
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.version.cmp(&b.version))
        });

        let records = records
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(records)
    }

    async fn records_by_type(&self, change_type: &str) -> Result<Vec<ChangeRecord>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .iter()
            .filter(|r| r.change_type == change_type)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(records)
    }

    async fn stream_all_records(&self) -> Result<RecordStream> {
        use futures_util::stream;

        let records = self.records.read().await.clone();
        Ok(Box::pin(stream::iter(records.into_iter().map(Ok))))
    }

    async fn aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let store = self.records.read().await;
        let version = store
            .iter()
            .filter(|r| r.aggregate_id == aggregate_id)
            .map(|r| r.version)
            .max();
        Ok(version)
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(&aggregate_id).cloned())
    }
}
