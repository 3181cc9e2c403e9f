//! Links between people and the events they take part in.

use std::fmt;
use std::str::FromStr;

use common::{AggregateId, EventId, ParticipationId};
use serde::{Deserialize, Serialize};

/// What a person does for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventRole {
    Submitter,
    Coordinator,
    Speaker,
    Moderator,
    Reviewer,
}

impl EventRole {
    /// Speakers and moderators appear on stage.
    pub fn is_presenter(&self) -> bool {
        matches!(self, EventRole::Speaker | EventRole::Moderator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventRole::Submitter => "submitter",
            EventRole::Coordinator => "coordinator",
            EventRole::Speaker => "speaker",
            EventRole::Moderator => "moderator",
            EventRole::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for EventRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-participation status, independent of the event's own state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleState {
    #[default]
    Pending,
    Offer,
    Unclear,
    Confirmed,
    Declined,
    Canceled,
    Attending,
}

impl RoleState {
    pub const ALL: [RoleState; 7] = [
        RoleState::Pending,
        RoleState::Offer,
        RoleState::Unclear,
        RoleState::Confirmed,
        RoleState::Declined,
        RoleState::Canceled,
        RoleState::Attending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleState::Pending => "pending",
            RoleState::Offer => "offer",
            RoleState::Unclear => "unclear",
            RoleState::Confirmed => "confirmed",
            RoleState::Declined => "declined",
            RoleState::Canceled => "canceled",
            RoleState::Attending => "attending",
        }
    }
}

impl fmt::Display for RoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RoleState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role state: {s}"))
    }
}

/// One person's role on one event.
///
/// The event is referenced by its owning conference and id; it is never
/// owned by the person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParticipation {
    pub id: ParticipationId,
    pub conference_id: AggregateId,
    pub event_id: EventId,
    pub role: EventRole,
    pub role_state: RoleState,
}

impl EventParticipation {
    pub fn is_presenter(&self) -> bool {
        self.role.is_presenter()
    }

    pub fn is_in(&self, conference_id: AggregateId) -> bool {
        self.conference_id == conference_id
    }
}
