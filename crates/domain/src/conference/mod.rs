//! Conference aggregate and the events, rooms, tracks and languages it owns.

mod aggregate;
mod changes;
mod commands;
mod event;
mod service;
mod venue;

pub use aggregate::{Conference, rescale_time_slots};
pub use changes::{
    ConferenceChange, ConferenceCreatedData, ConferenceDetails, ConferenceDetailsUpdatedData,
    EventScheduledData, EventStateChangedData, EventSubmittedData, EventTimeSlotsSetData,
    EventUpdatedData, FeedbackRecordedData, LanguageData, RoomAddedData, RoomRemovedData,
    TimeslotDurationChangedData, TrackAddedData, TrackRemovedData,
};
pub use commands::*;
pub use event::{Event, EventDraft, EventState, Feedback, StateBucket};
pub use service::ConferenceService;
pub use venue::{Room, Track};

use chrono::NaiveDate;
use common::{EventId, RoomId, TrackId};
use thiserror::Error;

/// Lowest accepted feedback rating.
pub const MIN_RATING: f64 = 1.0;
/// Highest accepted feedback rating.
pub const MAX_RATING: f64 = 5.0;

/// Reasons a conference command is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ConferenceError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Acronym is required")]
    AcronymRequired,

    #[error("Acronym {0} is already taken")]
    DuplicateAcronym(String),

    #[error("Timeslot duration must be greater than zero")]
    InvalidTimeslotDuration,

    #[error("First day {first_day} is after last day {last_day}")]
    InvalidDateRange {
        first_day: NaiveDate,
        last_day: NaiveDate,
    },

    #[error("Conference already created")]
    AlreadyCreated,

    #[error("Conference has not been created")]
    NotCreated,

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    #[error("Event already exists: {0}")]
    EventAlreadyExists(EventId),

    #[error("Event title is required")]
    EventTitleRequired,

    #[error("Language {0} is not offered by this conference")]
    UnknownLanguage(String),

    #[error("Language code must not be blank")]
    EmptyLanguageCode,

    #[error("Language {0} is already registered")]
    LanguageAlreadyRegistered(String),

    #[error("Language {0} is not registered")]
    LanguageNotRegistered(String),

    #[error("Language {0} is still used by events")]
    LanguageInUse(String),

    #[error("Room name is required")]
    RoomNameRequired,

    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Room {0} still has scheduled events")]
    RoomInUse(RoomId),

    #[error("Track name is required")]
    TrackNameRequired,

    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Track {0} still has events")]
    TrackInUse(TrackId),

    #[error("Rating {0} is outside {MIN_RATING}..={MAX_RATING}")]
    InvalidRating(f64),
}
