//! Resolving event references held outside their owning conference.

use std::collections::HashMap;

use common::{AggregateId, EventId};

use crate::aggregate::Aggregate;
use crate::conference::{Conference, Event};

/// Looks up events by the conference that owns them.
///
/// People hold participations as (conference, event) references; the
/// directory resolves them against whatever conferences the caller loaded.
pub trait EventDirectory {
    fn find_event(&self, conference_id: AggregateId, event_id: EventId) -> Option<&Event>;
}

impl EventDirectory for Conference {
    fn find_event(&self, conference_id: AggregateId, event_id: EventId) -> Option<&Event> {
        if self.id() != Some(conference_id) {
            return None;
        }
        self.event(event_id)
    }
}

impl EventDirectory for [Conference] {
    fn find_event(&self, conference_id: AggregateId, event_id: EventId) -> Option<&Event> {
        self.iter()
            .find_map(|conference| conference.find_event(conference_id, event_id))
    }
}

impl EventDirectory for Vec<Conference> {
    fn find_event(&self, conference_id: AggregateId, event_id: EventId) -> Option<&Event> {
        self.as_slice().find_event(conference_id, event_id)
    }
}

impl EventDirectory for HashMap<AggregateId, Conference> {
    fn find_event(&self, conference_id: AggregateId, event_id: EventId) -> Option<&Event> {
        self.get(&conference_id)?.event(event_id)
    }
}
