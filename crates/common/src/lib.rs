//! Identifiers shared by every crate of the conference domain core.

mod types;

pub use types::{
    AggregateId, AvailabilityId, ContactId, EventId, ParticipationId, RoomId, TrackId,
};
