//! Feeds change records from the history store to projections.

use futures_util::StreamExt;
use history_store::{ChangeRecord, HistoryStore};

use crate::Result;
use crate::projection::Projection;

/// Delivers change records to registered projections.
///
/// Catch-up replays the whole store and skips records a projection has
/// already consumed, so it can be run repeatedly. Rebuild resets every
/// projection first.
pub struct ProjectionProcessor<S: HistoryStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: HistoryStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Streams every record in the store to each projection that has not
    /// seen it yet.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let mut stream = self.store.stream_all_records().await?;
        let mut record_index: u64 = 0;

        while let Some(result) = stream.next().await {
            let record = result?;
            record_index += 1;

            for projection in &self.projections {
                let pos = projection.position().await;
                if pos.records_processed < record_index {
                    projection.handle(&record).await?;
                    metrics::counter!("projections_records_processed", "projection" => projection.name())
                        .increment(1);
                }
            }
        }

        tracing::info!(records_processed = record_index, "catch-up complete");

        Ok(())
    }

    /// Delivers one freshly appended record to every projection.
    #[tracing::instrument(skip(self, record), fields(change_type = %record.change_type))]
    pub async fn process_record(&self, record: &ChangeRecord) -> Result<()> {
        for projection in &self.projections {
            projection.handle(record).await?;
            metrics::counter!("projections_records_processed", "projection" => projection.name())
                .increment(1);
        }
        Ok(())
    }

    /// Resets all projections and replays the store from the start.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            tracing::debug!(projection = projection.name(), "resetting projection");
            projection.reset().await?;
        }
        self.run_catch_up().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use common::AggregateId;
    use history_store::{AppendOptions, InMemoryHistoryStore, Version};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    struct CountingProjection {
        count: Arc<RwLock<u64>>,
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl CountingProjection {
        fn new() -> Self {
            Self {
                count: Arc::new(RwLock::new(0)),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        async fn handle(&self, _record: &ChangeRecord) -> Result<()> {
            *self.count.write().await += 1;
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.count.write().await = 0;
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn record(aggregate_id: AggregateId, version: i64) -> ChangeRecord {
        ChangeRecord::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Conference")
            .change_type("RoomAdded")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    async fn store_with(records: i64) -> InMemoryHistoryStore {
        let store = InMemoryHistoryStore::new();
        if records > 0 {
            let id = AggregateId::new();
            let batch = (1..=records).map(|v| record(id, v)).collect();
            store.append(batch, AppendOptions::new()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn catch_up_processes_all_records() {
        let projection = CountingProjection::new();
        let count = Arc::clone(&projection.count);
        let mut processor = ProjectionProcessor::new(store_with(3).await);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();

        assert_eq!(*count.read().await, 3);
    }

    #[tokio::test]
    async fn catch_up_skips_already_processed() {
        let projection = CountingProjection::new();
        let count = Arc::clone(&projection.count);
        let mut processor = ProjectionProcessor::new(store_with(3).await);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        processor.run_catch_up().await.unwrap();

        assert_eq!(*count.read().await, 3);
    }

    #[tokio::test]
    async fn process_single_record() {
        let projection = CountingProjection::new();
        let count = Arc::clone(&projection.count);
        let mut processor = ProjectionProcessor::new(InMemoryHistoryStore::new());
        processor.register(Box::new(projection));

        processor
            .process_record(&record(AggregateId::new(), 1))
            .await
            .unwrap();

        assert_eq!(*count.read().await, 1);
    }

    #[tokio::test]
    async fn rebuild_resets_and_replays() {
        let projection = CountingProjection::new();
        let count = Arc::clone(&projection.count);
        let position = Arc::clone(&projection.position);
        let mut processor = ProjectionProcessor::new(store_with(2).await);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        processor.rebuild_all().await.unwrap();

        assert_eq!(*count.read().await, 2);
        assert_eq!(position.read().await.records_processed, 2);
    }

    #[tokio::test]
    async fn empty_store_catch_up() {
        let projection = CountingProjection::new();
        let count = Arc::clone(&projection.count);
        let mut processor = ProjectionProcessor::new(store_with(0).await);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();

        assert_eq!(*count.read().await, 0);
    }

    #[tokio::test]
    async fn every_projection_sees_every_record() {
        let first = CountingProjection::new();
        let second = CountingProjection::new();
        let first_count = Arc::clone(&first.count);
        let second_count = Arc::clone(&second.count);
        let mut processor = ProjectionProcessor::new(store_with(2).await);
        processor.register(Box::new(first));
        processor.register(Box::new(second));
        assert_eq!(processor.projection_count(), 2);

        processor.run_catch_up().await.unwrap();

        assert_eq!(*first_count.read().await, 2);
        assert_eq!(*second_count.read().await, 2);
    }
}
