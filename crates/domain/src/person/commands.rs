//! Person commands.

use chrono::{DateTime, Utc};
use common::{AggregateId, ContactId, EventId, ParticipationId};

use crate::command::Command;

use super::{Avatar, Contact, EventRole, Person, PersonProfile, RoleState, SliderEntry};

macro_rules! person_command {
    ($name:ident) => {
        impl Command for $name {
            type Aggregate = Person;

            fn aggregate_id(&self) -> AggregateId {
                self.person_id
            }
        }
    };
}

/// Command to create a new person.
#[derive(Debug, Clone)]
pub struct CreatePerson {
    pub person_id: AggregateId,
    pub profile: PersonProfile,
    pub created_at: DateTime<Utc>,
}

impl CreatePerson {
    pub fn new(profile: PersonProfile) -> Self {
        Self {
            person_id: AggregateId::new(),
            profile,
            created_at: Utc::now(),
        }
    }
}

person_command!(CreatePerson);

#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub person_id: AggregateId,
    pub profile: PersonProfile,
}

impl UpdateProfile {
    pub fn new(person_id: AggregateId, profile: PersonProfile) -> Self {
        Self {
            person_id,
            profile,
        }
    }
}

person_command!(UpdateProfile);

#[derive(Debug, Clone)]
pub struct AttachAvatar {
    pub person_id: AggregateId,
    pub avatar: Avatar,
}

impl AttachAvatar {
    pub fn new(person_id: AggregateId, avatar: Avatar) -> Self {
        Self { person_id, avatar }
    }
}

person_command!(AttachAvatar);

#[derive(Debug, Clone)]
pub struct RemoveAvatar {
    pub person_id: AggregateId,
}

person_command!(RemoveAvatar);

#[derive(Debug, Clone)]
pub struct AddPersonLanguage {
    pub person_id: AggregateId,
    pub code: String,
}

impl AddPersonLanguage {
    pub fn new(person_id: AggregateId, code: impl Into<String>) -> Self {
        Self {
            person_id,
            code: code.into(),
        }
    }
}

person_command!(AddPersonLanguage);

#[derive(Debug, Clone)]
pub struct RemovePersonLanguage {
    pub person_id: AggregateId,
    pub code: String,
}

impl RemovePersonLanguage {
    pub fn new(person_id: AggregateId, code: impl Into<String>) -> Self {
        Self {
            person_id,
            code: code.into(),
        }
    }
}

person_command!(RemovePersonLanguage);

#[derive(Debug, Clone)]
pub struct AddContact {
    pub person_id: AggregateId,
    pub contact: Contact,
}

impl AddContact {
    pub fn new(person_id: AggregateId, contact: Contact) -> Self {
        Self { person_id, contact }
    }
}

person_command!(AddContact);

#[derive(Debug, Clone)]
pub struct RemoveContact {
    pub person_id: AggregateId,
    pub contact_id: ContactId,
}

impl RemoveContact {
    pub fn new(person_id: AggregateId, contact_id: ContactId) -> Self {
        Self {
            person_id,
            contact_id,
        }
    }
}

person_command!(RemoveContact);

/// Command to link a person to an event of a conference.
#[derive(Debug, Clone)]
pub struct AddParticipation {
    pub person_id: AggregateId,
    pub participation_id: ParticipationId,
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub role: EventRole,
}

impl AddParticipation {
    pub fn new(
        person_id: AggregateId,
        conference_id: AggregateId,
        event_id: EventId,
        role: EventRole,
    ) -> Self {
        Self {
            person_id,
            participation_id: ParticipationId::new(),
            conference_id,
            event_id,
            role,
        }
    }
}

person_command!(AddParticipation);

#[derive(Debug, Clone)]
pub struct RemoveParticipation {
    pub person_id: AggregateId,
    pub participation_id: ParticipationId,
}

impl RemoveParticipation {
    pub fn new(person_id: AggregateId, participation_id: ParticipationId) -> Self {
        Self {
            person_id,
            participation_id,
        }
    }
}

person_command!(RemoveParticipation);

/// Command to move every presenter participation in a conference to `state`.
#[derive(Debug, Clone)]
pub struct SetRoleState {
    pub person_id: AggregateId,
    pub conference_id: AggregateId,
    pub state: RoleState,
}

impl SetRoleState {
    pub fn new(person_id: AggregateId, conference_id: AggregateId, state: RoleState) -> Self {
        Self {
            person_id,
            conference_id,
            state,
        }
    }
}

person_command!(SetRoleState);

/// Command carrying a raw availability slider submission.
#[derive(Debug, Clone)]
pub struct UpdateAvailabilities {
    pub person_id: AggregateId,
    pub entries: Vec<SliderEntry>,
}

impl UpdateAvailabilities {
    pub fn new(person_id: AggregateId, entries: Vec<SliderEntry>) -> Self {
        Self { person_id, entries }
    }
}

person_command!(UpdateAvailabilities);
