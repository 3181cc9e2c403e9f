//! Changes recorded against a person.

use chrono::{DateTime, Utc};
use common::{AggregateId, AvailabilityId, ContactId, ParticipationId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainChange;

use super::{Availability, Avatar, Contact, EventParticipation, PersonProfile, RoleState};

/// Everything that can happen to a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PersonChange {
    PersonCreated(PersonCreatedData),
    ProfileUpdated(ProfileUpdatedData),
    AvatarAttached(AvatarAttachedData),
    AvatarRemoved,

    #[serde(rename = "PersonLanguageAdded")]
    LanguageAdded(PersonLanguageData),
    #[serde(rename = "PersonLanguageRemoved")]
    LanguageRemoved(PersonLanguageData),

    ContactAdded(ContactAddedData),
    ContactRemoved(ContactRemovedData),

    ParticipationAdded(ParticipationAddedData),
    ParticipationRemoved(ParticipationRemovedData),
    RoleStateSet(RoleStateSetData),

    AvailabilitySet(AvailabilitySetData),
    AvailabilityRemoved(AvailabilityRemovedData),
}

impl DomainChange for PersonChange {
    fn change_type(&self) -> &'static str {
        match self {
            PersonChange::PersonCreated(_) => "PersonCreated",
            PersonChange::ProfileUpdated(_) => "ProfileUpdated",
            PersonChange::AvatarAttached(_) => "AvatarAttached",
            PersonChange::AvatarRemoved => "AvatarRemoved",
            PersonChange::LanguageAdded(_) => "PersonLanguageAdded",
            PersonChange::LanguageRemoved(_) => "PersonLanguageRemoved",
            PersonChange::ContactAdded(_) => "ContactAdded",
            PersonChange::ContactRemoved(_) => "ContactRemoved",
            PersonChange::ParticipationAdded(_) => "ParticipationAdded",
            PersonChange::ParticipationRemoved(_) => "ParticipationRemoved",
            PersonChange::RoleStateSet(_) => "RoleStateSet",
            PersonChange::AvailabilitySet(_) => "AvailabilitySet",
            PersonChange::AvailabilityRemoved(_) => "AvailabilityRemoved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCreatedData {
    pub person_id: AggregateId,
    pub profile: PersonProfile,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdatedData {
    pub profile: PersonProfile,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarAttachedData {
    pub avatar: Avatar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonLanguageData {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactAddedData {
    pub contact: Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRemovedData {
    pub contact_id: ContactId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationAddedData {
    pub participation: EventParticipation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationRemovedData {
    pub participation_id: ParticipationId,
}

/// One participation moved to a new role state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleStateSetData {
    pub participation_id: ParticipationId,
    pub from: RoleState,
    pub to: RoleState,
    pub updated_at: DateTime<Utc>,
}

/// Creates the availability or replaces the row with the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySetData {
    pub availability: Availability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRemovedData {
    pub availability_id: AvailabilityId,
}
