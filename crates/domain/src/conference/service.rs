//! Conference service providing the command and lookup API.

use std::collections::HashMap;

use common::AggregateId;
use history_store::{HistoryQuery, HistoryStore, HistoryStoreExt};

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    AddConferenceLanguage, AddRoom, AddTrack, ChangeEventState, ChangeTimeslotDuration,
    Conference, ConferenceChange, ConferenceError, CreateConference, RecordFeedback,
    RemoveConferenceLanguage, RemoveRoom, RemoveTrack, ScheduleEvent, SetEventTimeSlots,
    SubmitEvent, UpdateConferenceDetails, UpdateEvent,
};

const CREATED: &str = "ConferenceCreated";
const DETAILS_UPDATED: &str = "ConferenceDetailsUpdated";

/// Service for managing conferences and their events.
pub struct ConferenceService<S: HistoryStore> {
    handler: CommandHandler<S, Conference>,
}

impl<S: HistoryStore> ConferenceService<S> {
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    pub fn handler(&self) -> &CommandHandler<S, Conference> {
        &self.handler
    }

    /// Creates a conference. The acronym must not be used by any other conference.
    #[tracing::instrument(skip(self), fields(acronym = %cmd.details.acronym))]
    pub async fn create_conference(
        &self,
        cmd: CreateConference,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.ensure_acronym_available(&cmd.details.acronym, None)
            .await?;

        let CreateConference {
            conference_id,
            details,
            created_at,
        } = cmd;
        self.run("create_conference", conference_id, |conference| {
            conference.create(conference_id, details, created_at)
        })
        .await
    }

    /// Updates the details. A changed slot size rescales every event in the
    /// same atomic append.
    #[tracing::instrument(skip(self))]
    pub async fn update_details(
        &self,
        cmd: UpdateConferenceDetails,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.ensure_acronym_available(&cmd.details.acronym, Some(cmd.conference_id))
            .await?;

        let details = cmd.details;
        self.run("update_details", cmd.conference_id, |conference| {
            conference.update_details(details)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_timeslot_duration(
        &self,
        cmd: ChangeTimeslotDuration,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("change_timeslot_duration", cmd.conference_id, |conference| {
            conference.change_timeslot_duration(cmd.new_duration)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_room(&self, cmd: AddRoom) -> Result<CommandResult<Conference>, DomainError> {
        let room = cmd.room;
        self.run("add_room", cmd.conference_id, |conference| {
            conference.add_room(room)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_room(
        &self,
        cmd: RemoveRoom,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("remove_room", cmd.conference_id, |conference| {
            conference.remove_room(cmd.room_id)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_track(&self, cmd: AddTrack) -> Result<CommandResult<Conference>, DomainError> {
        let track = cmd.track;
        self.run("add_track", cmd.conference_id, |conference| {
            conference.add_track(track)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_track(
        &self,
        cmd: RemoveTrack,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("remove_track", cmd.conference_id, |conference| {
            conference.remove_track(cmd.track_id)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_language(
        &self,
        cmd: AddConferenceLanguage,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("add_language", cmd.conference_id, |conference| {
            conference.add_language(&cmd.code)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_language(
        &self,
        cmd: RemoveConferenceLanguage,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("remove_language", cmd.conference_id, |conference| {
            conference.remove_language(&cmd.code)
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(event_id = %cmd.event_id))]
    pub async fn submit_event(
        &self,
        cmd: SubmitEvent,
    ) -> Result<CommandResult<Conference>, DomainError> {
        let SubmitEvent {
            conference_id,
            event_id,
            draft,
            submitted_at,
        } = cmd;
        self.run("submit_event", conference_id, |conference| {
            conference.submit_event(event_id, draft, submitted_at)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_event(
        &self,
        cmd: UpdateEvent,
    ) -> Result<CommandResult<Conference>, DomainError> {
        let draft = cmd.draft;
        self.run("update_event", cmd.conference_id, |conference| {
            conference.update_event(cmd.event_id, draft)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn schedule_event(
        &self,
        cmd: ScheduleEvent,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("schedule_event", cmd.conference_id, |conference| {
            conference.schedule_event(cmd.event_id, cmd.start_time, cmd.room_id)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_event_time_slots(
        &self,
        cmd: SetEventTimeSlots,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("set_event_time_slots", cmd.conference_id, |conference| {
            conference.set_event_time_slots(cmd.event_id, cmd.time_slots)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_event_state(
        &self,
        cmd: ChangeEventState,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("change_event_state", cmd.conference_id, |conference| {
            conference.change_event_state(cmd.event_id, cmd.state)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn record_feedback(
        &self,
        cmd: RecordFeedback,
    ) -> Result<CommandResult<Conference>, DomainError> {
        self.run("record_feedback", cmd.conference_id, |conference| {
            conference.record_feedback(cmd.event_id, cmd.rating)
        })
        .await
    }

    /// Loads a conference by ID. Returns None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_conference(
        &self,
        conference_id: AggregateId,
    ) -> Result<Option<Conference>, DomainError> {
        self.handler.load_existing(conference_id).await
    }

    /// Every conference, in creation order.
    #[tracing::instrument(skip(self))]
    pub async fn list_conferences(&self) -> Result<Vec<Conference>, DomainError> {
        let ids = self
            .handler
            .store()
            .aggregate_ids(Conference::aggregate_type(), CREATED)
            .await?;

        let mut conferences = Vec::with_capacity(ids.len());
        for id in ids {
            conferences.push(self.handler.load_required(id).await?);
        }
        Ok(conferences)
    }

    /// The most recently created conference.
    #[tracing::instrument(skip(self))]
    pub async fn current_conference(&self) -> Result<Option<Conference>, DomainError> {
        Ok(self
            .list_conferences()
            .await?
            .into_iter()
            .max_by_key(|conference| conference.created_at()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_acronym(&self, acronym: &str) -> Result<Option<Conference>, DomainError> {
        let acronym = acronym.trim();
        let owner = self
            .acronyms()
            .await?
            .into_iter()
            .find_map(|(id, taken)| (taken == acronym).then_some(id));

        match owner {
            Some(id) => self.handler.load_existing(id).await,
            None => Ok(None),
        }
    }

    async fn run<F>(
        &self,
        command: &'static str,
        conference_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<Conference>, DomainError>
    where
        F: FnOnce(&Conference) -> Result<Vec<ConferenceChange>, ConferenceError>,
    {
        metrics::counter!("conference_commands_total", "command" => command).increment(1);
        let result = self
            .handler
            .execute_with_snapshot(conference_id, command_fn)
            .await?;

        for change in &result.changes {
            if let ConferenceChange::TimeslotDurationChanged(data) = change {
                tracing::info!(
                    %conference_id,
                    old_duration = data.old_duration,
                    new_duration = data.new_duration,
                    events = data.events_rescaled,
                    "rescaled event time slots"
                );
                metrics::counter!("conference_events_rescaled")
                    .increment(data.events_rescaled as u64);
            }
        }

        Ok(result)
    }

    /// Current acronym of every conference, folded from the identity changes.
    async fn acronyms(&self) -> Result<HashMap<AggregateId, String>, DomainError> {
        let records = self
            .handler
            .store()
            .query_records(
                HistoryQuery::new()
                    .aggregate_type(Conference::aggregate_type())
                    .change_types([CREATED, DETAILS_UPDATED]),
            )
            .await?;

        let mut acronyms = HashMap::new();
        for record in records {
            let acronym = match serde_json::from_value(record.payload)? {
                ConferenceChange::ConferenceCreated(data) => data.details.acronym,
                ConferenceChange::ConferenceDetailsUpdated(data) => data.acronym,
                _ => continue,
            };
            acronyms.insert(record.aggregate_id, acronym);
        }
        Ok(acronyms)
    }

    async fn ensure_acronym_available(
        &self,
        acronym: &str,
        owner: Option<AggregateId>,
    ) -> Result<(), DomainError> {
        let acronym = acronym.trim();
        let taken = self
            .acronyms()
            .await?
            .into_iter()
            .any(|(id, taken)| Some(id) != owner && taken == acronym);

        if taken {
            tracing::warn!(acronym, "acronym already taken");
            return Err(ConferenceError::DuplicateAcronym(acronym.to_string()).into());
        }
        Ok(())
    }
}
