//! Domain layer of the conference system.
//!
//! This crate provides:
//! - Aggregate and DomainChange traits for event-sourced entities
//! - Command trait and CommandHandler for command processing
//! - The Conference aggregate, owning events, rooms, tracks and languages,
//!   including the timeslot rescale
//! - The Person aggregate, owning availabilities and event participations
//! - Locale matching between people and conferences

pub mod aggregate;
pub mod command;
pub mod conference;
pub mod directory;
pub mod error;
pub mod language;
pub mod person;

pub use aggregate::{Aggregate, DomainChange, SnapshotCapable};
pub use command::{Command, CommandHandler, CommandResult};
pub use conference::{
    Conference, ConferenceChange, ConferenceDetails, ConferenceError, ConferenceService, Event,
    EventDraft, EventState, Room, StateBucket, Track, rescale_time_slots,
};
pub use directory::EventDirectory;
pub use error::DomainError;
pub use language::{DEFAULT_LOCALE, Language, LanguageOwner, LanguageRegistry, best_locale};
pub use person::{
    Availability, EventParticipation, EventRole, Person, PersonChange, PersonError,
    PersonProfile, PersonService, RoleState, SliderEntry,
};
