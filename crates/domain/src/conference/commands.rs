//! Conference commands.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use common::{AggregateId, EventId, RoomId, TrackId};

use crate::command::Command;

use super::{Conference, ConferenceDetails, EventDraft, EventState, Room, Track};

macro_rules! conference_command {
    ($name:ident) => {
        impl Command for $name {
            type Aggregate = Conference;

            fn aggregate_id(&self) -> AggregateId {
                self.conference_id
            }
        }
    };
}

/// Command to create a new conference.
#[derive(Debug, Clone)]
pub struct CreateConference {
    pub conference_id: AggregateId,
    pub details: ConferenceDetails,
    pub created_at: DateTime<Utc>,
}

impl CreateConference {
    /// Creates a conference in UTC with a generated ID.
    pub fn new(
        title: impl Into<String>,
        acronym: impl Into<String>,
        timeslot_duration: u32,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Self {
        Self {
            conference_id: AggregateId::new(),
            details: ConferenceDetails {
                title: title.into(),
                acronym: acronym.into(),
                timeslot_duration,
                first_day,
                last_day,
                time_zone: Tz::UTC,
            },
            created_at: Utc::now(),
        }
    }

    pub fn in_time_zone(mut self, time_zone: Tz) -> Self {
        self.details.time_zone = time_zone;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

conference_command!(CreateConference);

/// Command to replace a conference's details, slot size included.
#[derive(Debug, Clone)]
pub struct UpdateConferenceDetails {
    pub conference_id: AggregateId,
    pub details: ConferenceDetails,
}

impl UpdateConferenceDetails {
    pub fn new(conference_id: AggregateId, details: ConferenceDetails) -> Self {
        Self {
            conference_id,
            details,
        }
    }
}

conference_command!(UpdateConferenceDetails);

/// Command to change the slot size and rescale every event.
#[derive(Debug, Clone)]
pub struct ChangeTimeslotDuration {
    pub conference_id: AggregateId,
    pub new_duration: u32,
}

impl ChangeTimeslotDuration {
    pub fn new(conference_id: AggregateId, new_duration: u32) -> Self {
        Self {
            conference_id,
            new_duration,
        }
    }
}

conference_command!(ChangeTimeslotDuration);

#[derive(Debug, Clone)]
pub struct AddRoom {
    pub conference_id: AggregateId,
    pub room: Room,
}

impl AddRoom {
    pub fn new(conference_id: AggregateId, room: Room) -> Self {
        Self {
            conference_id,
            room,
        }
    }
}

conference_command!(AddRoom);

#[derive(Debug, Clone)]
pub struct RemoveRoom {
    pub conference_id: AggregateId,
    pub room_id: RoomId,
}

impl RemoveRoom {
    pub fn new(conference_id: AggregateId, room_id: RoomId) -> Self {
        Self {
            conference_id,
            room_id,
        }
    }
}

conference_command!(RemoveRoom);

#[derive(Debug, Clone)]
pub struct AddTrack {
    pub conference_id: AggregateId,
    pub track: Track,
}

impl AddTrack {
    pub fn new(conference_id: AggregateId, track: Track) -> Self {
        Self {
            conference_id,
            track,
        }
    }
}

conference_command!(AddTrack);

#[derive(Debug, Clone)]
pub struct RemoveTrack {
    pub conference_id: AggregateId,
    pub track_id: TrackId,
}

impl RemoveTrack {
    pub fn new(conference_id: AggregateId, track_id: TrackId) -> Self {
        Self {
            conference_id,
            track_id,
        }
    }
}

conference_command!(RemoveTrack);

/// Command to register a language on a conference.
#[derive(Debug, Clone)]
pub struct AddConferenceLanguage {
    pub conference_id: AggregateId,
    pub code: String,
}

impl AddConferenceLanguage {
    pub fn new(conference_id: AggregateId, code: impl Into<String>) -> Self {
        Self {
            conference_id,
            code: code.into(),
        }
    }
}

conference_command!(AddConferenceLanguage);

#[derive(Debug, Clone)]
pub struct RemoveConferenceLanguage {
    pub conference_id: AggregateId,
    pub code: String,
}

impl RemoveConferenceLanguage {
    pub fn new(conference_id: AggregateId, code: impl Into<String>) -> Self {
        Self {
            conference_id,
            code: code.into(),
        }
    }
}

conference_command!(RemoveConferenceLanguage);

/// Command to submit an event to a conference.
#[derive(Debug, Clone)]
pub struct SubmitEvent {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub draft: EventDraft,
    pub submitted_at: DateTime<Utc>,
}

impl SubmitEvent {
    /// Creates a submission with a generated event ID, submitted now.
    pub fn new(conference_id: AggregateId, draft: EventDraft) -> Self {
        Self {
            conference_id,
            event_id: EventId::new(),
            draft,
            submitted_at: Utc::now(),
        }
    }

    pub fn submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = submitted_at;
        self
    }
}

conference_command!(SubmitEvent);

#[derive(Debug, Clone)]
pub struct UpdateEvent {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub draft: EventDraft,
}

impl UpdateEvent {
    pub fn new(conference_id: AggregateId, event_id: EventId, draft: EventDraft) -> Self {
        Self {
            conference_id,
            event_id,
            draft,
        }
    }
}

conference_command!(UpdateEvent);

/// Command to place an event in the schedule. A None start unschedules it.
#[derive(Debug, Clone)]
pub struct ScheduleEvent {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub start_time: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
}

impl ScheduleEvent {
    pub fn new(
        conference_id: AggregateId,
        event_id: EventId,
        start_time: DateTime<Utc>,
        room_id: Option<RoomId>,
    ) -> Self {
        Self {
            conference_id,
            event_id,
            start_time: Some(start_time),
            room_id,
        }
    }

    pub fn unschedule(conference_id: AggregateId, event_id: EventId) -> Self {
        Self {
            conference_id,
            event_id,
            start_time: None,
            room_id: None,
        }
    }
}

conference_command!(ScheduleEvent);

#[derive(Debug, Clone)]
pub struct SetEventTimeSlots {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub time_slots: u32,
}

impl SetEventTimeSlots {
    pub fn new(conference_id: AggregateId, event_id: EventId, time_slots: u32) -> Self {
        Self {
            conference_id,
            event_id,
            time_slots,
        }
    }
}

conference_command!(SetEventTimeSlots);

#[derive(Debug, Clone)]
pub struct ChangeEventState {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub state: EventState,
}

impl ChangeEventState {
    pub fn new(conference_id: AggregateId, event_id: EventId, state: EventState) -> Self {
        Self {
            conference_id,
            event_id,
            state,
        }
    }
}

conference_command!(ChangeEventState);

/// Command to add one audience rating to an event.
#[derive(Debug, Clone)]
pub struct RecordFeedback {
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub rating: f64,
}

impl RecordFeedback {
    pub fn new(conference_id: AggregateId, event_id: EventId, rating: f64) -> Self {
        Self {
            conference_id,
            event_id,
            rating,
        }
    }
}

conference_command!(RecordFeedback);
