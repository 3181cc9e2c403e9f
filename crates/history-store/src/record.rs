use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AggregateId;

/// Unique identifier for a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version number for an aggregate, used for optimistic concurrency control.
///
/// Versions start at 1 for the first record and increment by 1 for each
/// subsequent record of the same aggregate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for an aggregate with no history.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1) for the first record.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// One recorded change of an aggregate.
///
/// The payload is the serialized domain change; the remaining fields locate
/// it in the history of its aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Unique identifier for this record.
    pub record_id: RecordId,

    /// The kind of change (e.g. "EventSubmitted", "TimeslotDurationChanged").
    pub change_type: String,

    /// The aggregate this change belongs to.
    pub aggregate_id: AggregateId,

    /// The type of aggregate ("Conference" or "Person").
    pub aggregate_type: String,

    /// The version of the aggregate after this change.
    pub version: Version,

    /// When the change was recorded.
    pub timestamp: DateTime<Utc>,

    /// The change payload as JSON.
    pub payload: serde_json::Value,

    /// Free-form metadata (actor, correlation id, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChangeRecord {
    /// Creates a new change record builder.
    pub fn builder() -> ChangeRecordBuilder {
        ChangeRecordBuilder::default()
    }
}

/// Builder for constructing change records.
#[derive(Debug, Default)]
pub struct ChangeRecordBuilder {
    record_id: Option<RecordId>,
    change_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    version: Option<Version>,
    timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl ChangeRecordBuilder {
    /// Sets the record ID. If not set, a new ID will be generated.
    pub fn record_id(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    /// Sets the change type.
    pub fn change_type(mut self, change_type: impl Into<String>) -> Self {
        self.change_type = Some(change_type.into());
        self
    }

    /// Sets the aggregate ID.
    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    /// Sets the aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Sets the version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the change record.
    ///
    /// # Panics
    ///
    /// Panics if required fields (change_type, aggregate_id, aggregate_type, version, payload)
    /// are not set. Use [`try_build`](Self::try_build) when the fields come from untrusted input.
    pub fn build(self) -> ChangeRecord {
        ChangeRecord {
            record_id: self.record_id.unwrap_or_default(),
            change_type: self.change_type.expect("change_type is required"),
            aggregate_id: self.aggregate_id.expect("aggregate_id is required"),
            aggregate_type: self.aggregate_type.expect("aggregate_type is required"),
            version: self.version.expect("version is required"),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload.expect("payload is required"),
            metadata: self.metadata,
        }
    }

    /// Tries to build the change record, returning None if required fields are missing.
    pub fn try_build(self) -> Option<ChangeRecord> {
        Some(ChangeRecord {
            record_id: self.record_id.unwrap_or_default(),
            change_type: self.change_type?,
            aggregate_id: self.aggregate_id?,
            aggregate_type: self.aggregate_type?,
            version: self.version?,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload?,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_new_creates_unique_ids() {
        assert_ne!(RecordId::new(), RecordId::new());
    }

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
    }

    #[test]
    fn version_initial_and_first() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::first().as_i64(), 1);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn change_record_builder() {
        let aggregate_id = AggregateId::new();
        let payload = serde_json::json!({"type": "EventSubmitted"});

        let record = ChangeRecord::builder()
            .change_type("EventSubmitted")
            .aggregate_id(aggregate_id)
            .aggregate_type("Conference")
            .version(Version::first())
            .payload_raw(payload.clone())
            .metadata("actor", serde_json::json!("cfp-team"))
            .build();

        assert_eq!(record.change_type, "EventSubmitted");
        assert_eq!(record.aggregate_id, aggregate_id);
        assert_eq!(record.aggregate_type, "Conference");
        assert_eq!(record.version, Version::first());
        assert_eq!(record.payload, payload);
        assert_eq!(
            record.metadata.get("actor"),
            Some(&serde_json::json!("cfp-team"))
        );
    }

    #[test]
    fn change_record_try_build_returns_none_on_missing_fields() {
        assert!(ChangeRecord::builder().try_build().is_none());
    }
}
