//! Core aggregate and change traits.

use common::AggregateId;
use history_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded against an aggregate.
///
/// Changes are immutable and named in past tense. Their serialized form is
/// the payload of a [`history_store::ChangeRecord`].
pub trait DomainChange: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the change type name stored alongside the payload.
    fn change_type(&self) -> &'static str;
}

/// An event-sourced aggregate root.
///
/// Aggregates are rebuilt by folding their changes, produce new changes from
/// commands and apply changes without side effects. Owned entities (events,
/// availabilities, participations) are only reachable through their root.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The changes this aggregate produces and consumes.
    type Change: DomainChange;

    /// The validation errors its commands can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name used in the history store.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identifier, or None before creation.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the version of the last applied change.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the command handler after loading changes.
    fn set_version(&mut self, version: Version);

    /// Applies a change to the aggregate.
    ///
    /// Must be deterministic and must not fail: changes are facts that have
    /// already been accepted.
    fn apply(&mut self, change: Self::Change);

    /// Applies several changes in order.
    fn apply_changes(&mut self, changes: impl IntoIterator<Item = Self::Change>) {
        for change in changes {
            self.apply(change);
        }
    }
}

/// Aggregates whose folded state is periodically persisted as a snapshot.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Number of changes between snapshots.
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum CounterChange {
        Opened { id: AggregateId },
        Bumped { by: u32 },
    }

    impl DomainChange for CounterChange {
        fn change_type(&self) -> &'static str {
            match self {
                CounterChange::Opened { .. } => "CounterOpened",
                CounterChange::Bumped { .. } => "CounterBumped",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Counter {
        id: Option<AggregateId>,
        total: u32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counter error")]
    struct CounterError;

    impl Aggregate for Counter {
        type Change = CounterChange;
        type Error = CounterError;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, change: Self::Change) {
            match change {
                CounterChange::Opened { id } => self.id = Some(id),
                CounterChange::Bumped { by } => self.total += by,
            }
        }
    }

    impl SnapshotCapable for Counter {
        fn snapshot_interval() -> usize {
            10
        }
    }

    #[test]
    fn changes_fold_in_order() {
        let id = AggregateId::new();
        let mut counter = Counter::default();
        counter.apply_changes(vec![
            CounterChange::Opened { id },
            CounterChange::Bumped { by: 2 },
            CounterChange::Bumped { by: 3 },
        ]);

        assert_eq!(counter.id(), Some(id));
        assert_eq!(counter.total, 5);
        assert_eq!(CounterChange::Bumped { by: 1 }.change_type(), "CounterBumped");
    }

    #[test]
    fn snapshot_taken_on_interval_boundaries() {
        let mut counter = Counter::default();
        assert!(!counter.should_snapshot());

        counter.set_version(Version::new(10));
        assert!(counter.should_snapshot());

        counter.set_version(Version::new(11));
        assert!(!counter.should_snapshot());
    }
}
