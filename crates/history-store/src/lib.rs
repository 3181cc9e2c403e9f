//! Append-only change history for event-sourced aggregates.
//!
//! Every accepted mutation of a conference or a person is stored as a
//! [`ChangeRecord`]. The history doubles as the audit trail: records are
//! captured automatically on every write and never rewritten.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{HistoryStoreError, Result};
pub use memory::InMemoryHistoryStore;
pub use postgres::PostgresHistoryStore;
pub use query::HistoryQuery;
pub use record::{ChangeRecord, ChangeRecordBuilder, RecordId, Version};
pub use snapshot::Snapshot;
pub use store::{AppendOptions, HistoryStore, HistoryStoreExt, RecordStream};
