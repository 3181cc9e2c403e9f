//! Command handling: load, decide, append.

use std::marker::PhantomData;

use common::AggregateId;
use history_store::{
    AppendOptions, ChangeRecord, HistoryStore, HistoryStoreExt, Snapshot, Version,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::aggregate::{Aggregate, DomainChange, SnapshotCapable};
use crate::error::DomainError;

/// Outcome of a successfully executed command.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate with the new changes applied.
    pub aggregate: A,

    /// The changes that were appended.
    pub changes: Vec<A::Change>,

    /// The aggregate version after the command.
    pub new_version: Version,
}

/// An intention to mutate one aggregate.
pub trait Command: Send + Sync {
    /// The aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the targeted aggregate.
    fn aggregate_id(&self) -> AggregateId;
}

/// Executes commands against aggregates stored in a [`HistoryStore`].
///
/// Every command is decided against the current fold of the aggregate and
/// its changes are appended as one batch guarded by the version the decision
/// was made on. Either the whole batch lands or none of it does.
pub struct CommandHandler<S, A>
where
    S: HistoryStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: HistoryStore,
    A: Aggregate,
{
    /// Creates a new handler over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate, returning a default instance when it has no history.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A: DeserializeOwned,
    {
        let (snapshot, records) = self.store.load_aggregate(aggregate_id).await?;

        let mut aggregate = match snapshot {
            Some(snapshot) => Self::restore_from_snapshot(snapshot)?,
            None => A::default(),
        };

        for record in records {
            let change: A::Change = serde_json::from_value(record.payload)?;
            aggregate.apply(change);
            aggregate.set_version(record.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it was never created.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError>
    where
        A: DeserializeOwned,
    {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Loads an aggregate that must exist.
    pub async fn load_required(&self, aggregate_id: AggregateId) -> Result<A, DomainError>
    where
        A: DeserializeOwned,
    {
        self.load_existing(aggregate_id)
            .await?
            .ok_or_else(|| DomainError::AggregateNotFound {
                aggregate_type: A::aggregate_type(),
                aggregate_id: aggregate_id.to_string(),
            })
    }

    /// Decides a command against the current state and appends its changes.
    ///
    /// A command that yields no changes appends nothing and leaves the
    /// version untouched.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: DeserializeOwned,
        F: FnOnce(&A) -> Result<Vec<A::Change>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let changes = command_fn(&aggregate)?;

        if changes.is_empty() {
            return Ok(CommandResult {
                aggregate,
                changes,
                new_version: current_version,
            });
        }

        let records = Self::build_records(aggregate_id, current_version, &changes)?;
        let new_version = self
            .store
            .append(records, AppendOptions::expect_version(current_version))
            .await?;

        tracing::debug!(
            aggregate_type = A::aggregate_type(),
            %aggregate_id,
            changes = changes.len(),
            %new_version,
            "command applied"
        );

        for change in &changes {
            aggregate.apply(change.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            changes,
            new_version,
        })
    }

    fn build_records(
        aggregate_id: AggregateId,
        current_version: Version,
        changes: &[A::Change],
    ) -> Result<Vec<ChangeRecord>, DomainError>
    where
        A::Change: Serialize,
    {
        let mut records = Vec::with_capacity(changes.len());
        let mut version = current_version;

        for change in changes {
            version = version.next();
            let record = ChangeRecord::builder()
                .aggregate_id(aggregate_id)
                .aggregate_type(A::aggregate_type())
                .change_type(change.change_type())
                .version(version)
                .payload(change)?
                .build();
            records.push(record);
        }

        Ok(records)
    }

    fn restore_from_snapshot(snapshot: Snapshot) -> Result<A, DomainError>
    where
        A: DeserializeOwned,
    {
        Ok(snapshot.into_state()?)
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: HistoryStore,
    A: SnapshotCapable,
{
    /// Executes a command and saves a snapshot when the interval is reached.
    pub async fn execute_with_snapshot<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Change>, A::Error>,
        DomainError: From<A::Error>,
    {
        let result = self.execute(aggregate_id, command_fn).await?;

        if !result.changes.is_empty() && result.aggregate.should_snapshot() {
            let snapshot = Snapshot::from_state(
                aggregate_id,
                A::aggregate_type(),
                result.new_version,
                &result.aggregate,
            )?;
            self.store.save_snapshot(snapshot).await?;
        }

        Ok(result)
    }
}
