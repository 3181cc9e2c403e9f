//! Submission audit trail: what happened to each event, in order.
//!
//! Rows are derived from the conference change stream. A timeslot rescale
//! touches every event but is recorded once per conference in
//! [`RescaleEntry`], never as per-event rows.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, EventId, RoomId};
use domain::{Aggregate, Conference, ConferenceChange, EventState};
use history_store::{ChangeRecord, Version};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// What happened to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionChange {
    Submitted { title: String, time_slots: u32 },
    Updated { title: String },
    Scheduled {
        start_time: Option<DateTime<Utc>>,
        room_id: Option<RoomId>,
    },
    TimeSlotsChanged { from: u32, to: u32 },
    StateChanged { from: EventState, to: EventState },
}

impl fmt::Display for SubmissionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionChange::Submitted { title, time_slots } => {
                write!(f, "submitted {title:?} ({time_slots} slots)")
            }
            SubmissionChange::Updated { title } => write!(f, "updated as {title:?}"),
            SubmissionChange::Scheduled {
                start_time: Some(start),
                ..
            } => write!(f, "scheduled at {}", start.format("%Y-%m-%d %H:%M UTC")),
            SubmissionChange::Scheduled { start_time: None, .. } => f.write_str("unscheduled"),
            SubmissionChange::TimeSlotsChanged { from, to } => {
                write!(f, "time slots {from} -> {to}")
            }
            SubmissionChange::StateChanged { from, to } => write!(f, "state {from} -> {to}"),
        }
    }
}

/// One audit row for an event.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionHistoryEntry {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    /// Conference version the change was recorded at.
    pub version: Version,
    pub recorded_at: DateTime<Utc>,
    pub change: SubmissionChange,
}

/// A slot size change, covering every event of the conference at once.
#[derive(Debug, Clone, PartialEq)]
pub struct RescaleEntry {
    pub conference_id: AggregateId,
    pub version: Version,
    pub old_duration: u32,
    pub new_duration: u32,
    pub events_rescaled: usize,
    pub changed_at: DateTime<Utc>,
}

struct SubmissionHistoryState {
    by_event: HashMap<EventId, Vec<SubmissionHistoryEntry>>,
    rescales: HashMap<AggregateId, Vec<RescaleEntry>>,
    position: ProjectionPosition,
}

/// Per-event audit trail built from conference change records.
#[derive(Clone)]
pub struct SubmissionHistoryView {
    state: Arc<RwLock<SubmissionHistoryState>>,
}

impl SubmissionHistoryView {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SubmissionHistoryState {
                by_event: HashMap::new(),
                rescales: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Audit rows of one event, oldest first.
    pub async fn history_for_event(&self, event_id: EventId) -> Vec<SubmissionHistoryEntry> {
        self.state
            .read()
            .await
            .by_event
            .get(&event_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Audit rows of every event in a conference, in recording order.
    pub async fn history_for_conference(
        &self,
        conference_id: AggregateId,
    ) -> Vec<SubmissionHistoryEntry> {
        let state = self.state.read().await;
        let mut entries: Vec<SubmissionHistoryEntry> = state
            .by_event
            .values()
            .flatten()
            .filter(|e| e.conference_id == conference_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.version);
        entries
    }

    pub async fn rescales_for(&self, conference_id: AggregateId) -> Vec<RescaleEntry> {
        self.state
            .read()
            .await
            .rescales
            .get(&conference_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn entry_count(&self) -> usize {
        self.state.read().await.by_event.values().map(Vec::len).sum()
    }
}

impl Default for SubmissionHistoryView {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionHistoryState {
    fn push(&mut self, record: &ChangeRecord, event_id: EventId, change: SubmissionChange) {
        self.by_event
            .entry(event_id)
            .or_default()
            .push(SubmissionHistoryEntry {
                conference_id: record.aggregate_id,
                event_id,
                version: record.version,
                recorded_at: record.timestamp,
                change,
            });
    }
}

#[async_trait]
impl Projection for SubmissionHistoryView {
    fn name(&self) -> &'static str {
        "SubmissionHistoryView"
    }

    async fn handle(&self, record: &ChangeRecord) -> Result<()> {
        if record.aggregate_type != Conference::aggregate_type() {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let change: ConferenceChange = serde_json::from_value(record.payload.clone())?;
        let mut state = self.state.write().await;

        match change {
            ConferenceChange::EventSubmitted(data) => {
                let change = SubmissionChange::Submitted {
                    title: data.draft.title,
                    time_slots: data.draft.time_slots,
                };
                state.push(record, data.event_id, change);
            }
            ConferenceChange::EventUpdated(data) => {
                let change = SubmissionChange::Updated { title: data.title };
                state.push(record, data.event_id, change);
            }
            ConferenceChange::EventScheduled(data) => {
                let change = SubmissionChange::Scheduled {
                    start_time: data.start_time,
                    room_id: data.room_id,
                };
                state.push(record, data.event_id, change);
            }
            ConferenceChange::EventTimeSlotsSet(data) => {
                let change = SubmissionChange::TimeSlotsChanged {
                    from: data.old_time_slots,
                    to: data.new_time_slots,
                };
                state.push(record, data.event_id, change);
            }
            ConferenceChange::EventStateChanged(data) => {
                let change = SubmissionChange::StateChanged {
                    from: data.from,
                    to: data.to,
                };
                state.push(record, data.event_id, change);
            }
            ConferenceChange::TimeslotDurationChanged(data) => {
                state
                    .rescales
                    .entry(record.aggregate_id)
                    .or_default()
                    .push(RescaleEntry {
                        conference_id: record.aggregate_id,
                        version: record.version,
                        old_duration: data.old_duration,
                        new_duration: data.new_duration,
                        events_rescaled: data.events_rescaled,
                        changed_at: data.changed_at,
                    });
            }
            ConferenceChange::ConferenceCreated(_)
            | ConferenceChange::ConferenceDetailsUpdated(_)
            | ConferenceChange::RoomAdded(_)
            | ConferenceChange::RoomRemoved(_)
            | ConferenceChange::TrackAdded(_)
            | ConferenceChange::TrackRemoved(_)
            | ConferenceChange::LanguageAdded(_)
            | ConferenceChange::LanguageRemoved(_)
            | ConferenceChange::FeedbackRecorded(_) => {}
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.by_event.clear();
        state.rescales.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for SubmissionHistoryView {
    fn name(&self) -> &'static str {
        "SubmissionHistoryView"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|s| s.by_event.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainChange;
    use domain::conference::{
        EventStateChangedData, EventSubmittedData, TimeslotDurationChangedData,
    };
    use domain::EventDraft;

    fn make_record(
        conference_id: AggregateId,
        version: i64,
        change: &ConferenceChange,
    ) -> ChangeRecord {
        ChangeRecord::builder()
            .aggregate_id(conference_id)
            .aggregate_type("Conference")
            .change_type(change.change_type())
            .version(Version::new(version))
            .payload(change)
            .unwrap()
            .build()
    }

    fn submitted(event_id: EventId, title: &str) -> ConferenceChange {
        ConferenceChange::EventSubmitted(EventSubmittedData {
            event_id,
            draft: EventDraft::new(title).with_time_slots(4),
            submitted_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn submission_and_state_change_are_recorded_in_order() {
        let view = SubmissionHistoryView::new();
        let conference_id = AggregateId::new();
        let event_id = EventId::new();

        view.handle(&make_record(conference_id, 2, &submitted(event_id, "Async Rust")))
            .await
            .unwrap();
        let accepted = ConferenceChange::EventStateChanged(EventStateChangedData {
            event_id,
            from: EventState::New,
            to: EventState::Confirmed,
            updated_at: Utc::now(),
        });
        view.handle(&make_record(conference_id, 3, &accepted))
            .await
            .unwrap();

        let history = view.history_for_event(event_id).await;
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0].change,
            SubmissionChange::Submitted {
                title: "Async Rust".to_string(),
                time_slots: 4
            }
        );
        assert_eq!(
            history[1].change,
            SubmissionChange::StateChanged {
                from: EventState::New,
                to: EventState::Confirmed
            }
        );
        assert_eq!(history[1].version, Version::new(3));
    }

    #[tokio::test]
    async fn rescale_adds_no_event_rows() {
        let view = SubmissionHistoryView::new();
        let conference_id = AggregateId::new();
        let first = EventId::new();
        let second = EventId::new();

        view.handle(&make_record(conference_id, 2, &submitted(first, "One")))
            .await
            .unwrap();
        view.handle(&make_record(conference_id, 3, &submitted(second, "Two")))
            .await
            .unwrap();
        let rescale = ConferenceChange::TimeslotDurationChanged(TimeslotDurationChangedData {
            old_duration: 15,
            new_duration: 5,
            events_rescaled: 2,
            changed_at: Utc::now(),
        });
        view.handle(&make_record(conference_id, 4, &rescale))
            .await
            .unwrap();

        assert_eq!(view.entry_count().await, 2);
        let rescales = view.rescales_for(conference_id).await;
        assert_eq!(rescales.len(), 1);
        assert_eq!(rescales[0].events_rescaled, 2);
        assert_eq!(view.position().await.records_processed, 3);
    }

    #[tokio::test]
    async fn other_aggregates_only_advance_position() {
        let view = SubmissionHistoryView::new();
        let record = ChangeRecord::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Person")
            .change_type("PersonCreated")
            .version(Version::new(1))
            .payload_raw(serde_json::json!({"type": "AvatarRemoved"}))
            .build();

        view.handle(&record).await.unwrap();

        assert_eq!(view.entry_count().await, 0);
        assert_eq!(view.position().await.records_processed, 1);
    }

    #[tokio::test]
    async fn conference_history_is_scoped_and_ordered() {
        let view = SubmissionHistoryView::new();
        let ours = AggregateId::new();
        let theirs = AggregateId::new();

        view.handle(&make_record(ours, 3, &submitted(EventId::new(), "Late")))
            .await
            .unwrap();
        view.handle(&make_record(theirs, 2, &submitted(EventId::new(), "Elsewhere")))
            .await
            .unwrap();
        view.handle(&make_record(ours, 2, &submitted(EventId::new(), "Early")))
            .await
            .unwrap();

        let history = view.history_for_conference(ours).await;
        let versions: Vec<i64> = history.iter().map(|e| e.version.as_i64()).collect();
        assert_eq!(versions, vec![2, 3]);
    }

    #[test]
    fn changes_render_for_operators() {
        let change = SubmissionChange::StateChanged {
            from: EventState::Review,
            to: EventState::Rejected,
        };
        assert_eq!(change.to_string(), "state review -> rejected");
        let unscheduled = SubmissionChange::Scheduled {
            start_time: None,
            room_id: None,
        };
        assert_eq!(unscheduled.to_string(), "unscheduled");
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let view = SubmissionHistoryView::new();
        let conference_id = AggregateId::new();
        view.handle(&make_record(conference_id, 2, &submitted(EventId::new(), "Talk")))
            .await
            .unwrap();
        assert_eq!(ReadModel::count(&view), 1);

        view.reset().await.unwrap();

        assert_eq!(view.entry_count().await, 0);
        assert_eq!(view.position().await, ProjectionPosition::zero());
    }
}
