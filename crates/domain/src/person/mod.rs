//! Person aggregate: profile, languages, contacts, availabilities and event
//! participations.

mod aggregate;
mod availability;
mod changes;
mod commands;
mod participation;
mod service;
mod value_objects;

pub use aggregate::Person;
pub use availability::{Availability, SliderEntry, SliderPlan, ZonedAvailability, leading_integer, parse_local_timestamp};
pub use changes::{
    AvailabilityRemovedData, AvailabilitySetData, AvatarAttachedData, ContactAddedData,
    ContactRemovedData, ParticipationAddedData, ParticipationRemovedData, PersonChange,
    PersonCreatedData, PersonLanguageData, ProfileUpdatedData, RoleStateSetData,
};
pub use commands::*;
pub use participation::{EventParticipation, EventRole, RoleState};
pub use service::PersonService;
pub use value_objects::{Avatar, AvatarStyle, Contact, ContactKind, Gender, PersonProfile};

use common::{AggregateId, AvailabilityId, ContactId, EventId, ParticipationId};
use thiserror::Error;

/// Reasons a person command is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum PersonError {
    #[error("Public name is required")]
    PublicNameRequired,

    #[error("Email is required")]
    EmailRequired,

    #[error("Avatar content type {0} is not an image")]
    InvalidAvatarContentType(String),

    #[error("Person already created")]
    AlreadyCreated,

    #[error("Person has not been created")]
    NotCreated,

    #[error("Cannot parse timestamp {0:?}")]
    MalformedTimestamp(String),

    #[error("Availability ends before it starts")]
    InvalidAvailabilityRange,

    #[error("Availability not found: {0}")]
    AvailabilityNotFound(AvailabilityId),

    #[error("Language code must not be blank")]
    EmptyLanguageCode,

    #[error("Language {0} is already registered")]
    LanguageAlreadyRegistered(String),

    #[error("Language {0} is not registered")]
    LanguageNotRegistered(String),

    #[error("Participation not found: {0}")]
    ParticipationNotFound(ParticipationId),

    #[error("Already participating in event {0} with this role")]
    DuplicateParticipation(EventId),

    #[error("Event {event_id} does not belong to conference {conference_id}")]
    EventNotInConference {
        conference_id: AggregateId,
        event_id: EventId,
    },

    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    #[error("Contact value is required")]
    ContactValueRequired,
}
