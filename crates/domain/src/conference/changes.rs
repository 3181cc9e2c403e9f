//! Changes recorded against a conference.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use common::{AggregateId, EventId, RoomId, TrackId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainChange;

use super::{EventDraft, EventState, Room, Track};

/// Everything that can happen to a conference and the events it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConferenceChange {
    ConferenceCreated(ConferenceCreatedData),
    ConferenceDetailsUpdated(ConferenceDetailsUpdatedData),

    /// The slot size changed. Applying it rescales every owned event, so no
    /// per-event record is ever written for a rescale.
    TimeslotDurationChanged(TimeslotDurationChangedData),

    RoomAdded(RoomAddedData),
    RoomRemoved(RoomRemovedData),
    TrackAdded(TrackAddedData),
    TrackRemoved(TrackRemovedData),
    LanguageAdded(LanguageData),
    LanguageRemoved(LanguageData),

    EventSubmitted(EventSubmittedData),
    EventUpdated(EventUpdatedData),
    EventScheduled(EventScheduledData),
    EventTimeSlotsSet(EventTimeSlotsSetData),
    EventStateChanged(EventStateChangedData),
    FeedbackRecorded(FeedbackRecordedData),
}

impl DomainChange for ConferenceChange {
    fn change_type(&self) -> &'static str {
        match self {
            ConferenceChange::ConferenceCreated(_) => "ConferenceCreated",
            ConferenceChange::ConferenceDetailsUpdated(_) => "ConferenceDetailsUpdated",
            ConferenceChange::TimeslotDurationChanged(_) => "TimeslotDurationChanged",
            ConferenceChange::RoomAdded(_) => "RoomAdded",
            ConferenceChange::RoomRemoved(_) => "RoomRemoved",
            ConferenceChange::TrackAdded(_) => "TrackAdded",
            ConferenceChange::TrackRemoved(_) => "TrackRemoved",
            ConferenceChange::LanguageAdded(_) => "LanguageAdded",
            ConferenceChange::LanguageRemoved(_) => "LanguageRemoved",
            ConferenceChange::EventSubmitted(_) => "EventSubmitted",
            ConferenceChange::EventUpdated(_) => "EventUpdated",
            ConferenceChange::EventScheduled(_) => "EventScheduled",
            ConferenceChange::EventTimeSlotsSet(_) => "EventTimeSlotsSet",
            ConferenceChange::EventStateChanged(_) => "EventStateChanged",
            ConferenceChange::FeedbackRecorded(_) => "FeedbackRecorded",
        }
    }
}

impl ConferenceChange {
    /// The event a change is about, if any.
    pub fn event_id(&self) -> Option<EventId> {
        match self {
            ConferenceChange::EventSubmitted(data) => Some(data.event_id),
            ConferenceChange::EventUpdated(data) => Some(data.event_id),
            ConferenceChange::EventScheduled(data) => Some(data.event_id),
            ConferenceChange::EventTimeSlotsSet(data) => Some(data.event_id),
            ConferenceChange::EventStateChanged(data) => Some(data.event_id),
            ConferenceChange::FeedbackRecorded(data) => Some(data.event_id),
            _ => None,
        }
    }
}

/// Identity and calendar settings of a conference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceDetails {
    pub title: String,
    pub acronym: String,
    /// Slot size in minutes.
    pub timeslot_duration: u32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub time_zone: Tz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceCreatedData {
    pub conference_id: AggregateId,
    pub details: ConferenceDetails,
    pub created_at: DateTime<Utc>,
}

/// Title, acronym, days or zone changed. The slot size is carried by
/// [`TimeslotDurationChangedData`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceDetailsUpdatedData {
    pub title: String,
    pub acronym: String,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub time_zone: Tz,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeslotDurationChangedData {
    pub old_duration: u32,
    pub new_duration: u32,
    /// Number of events rescaled when the change was applied.
    pub events_rescaled: usize,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAddedData {
    pub room: Room,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRemovedData {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAddedData {
    pub track: Track,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRemovedData {
    pub track_id: TrackId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageData {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSubmittedData {
    pub event_id: EventId,
    pub draft: EventDraft,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventUpdatedData {
    pub event_id: EventId,
    pub title: String,
    pub abstract_text: Option<String>,
    pub language: String,
    pub public: bool,
    pub track_id: Option<TrackId>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventScheduledData {
    pub event_id: EventId,
    /// None unschedules the event.
    pub start_time: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimeSlotsSetData {
    pub event_id: EventId,
    pub old_time_slots: u32,
    pub new_time_slots: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStateChangedData {
    pub event_id: EventId,
    pub from: EventState,
    pub to: EventState,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecordedData {
    pub event_id: EventId,
    pub rating: f64,
    pub recorded_at: DateTime<Utc>,
}
