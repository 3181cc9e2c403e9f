//! Calendar feed of a conference's published schedule.

use chrono::{DateTime, Utc};
use domain::Conference;
use icalendar::{Calendar, Component, EventLike};
use serde::Serialize;

const ICS_TIMESTAMP: &str = "%Y%m%dT%H%M%SZ";

/// One scheduled event as it appears in a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    /// `event-{event id}@{host}`, stable across exports.
    pub uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    /// The event abstract, if any.
    pub description: Option<String>,
    /// Name of the assigned room, if any.
    pub location: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// Public, accepted and scheduled events ordered by title.
///
/// Unscheduled events, and events whose end cannot be represented, are
/// left out.
pub fn calendar_feed(conference: &Conference, host: &str) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = conference
        .accepted_events()
        .filter(|event| event.public)
        .filter_map(|event| {
            let start = event.start_time?;
            let end = conference.event_end_time(event)?;
            Some(CalendarEntry {
                uid: format!("event-{}@{}", event.id, host),
                start,
                end,
                summary: event.title.clone(),
                description: event.abstract_text.clone(),
                location: event
                    .room_id
                    .and_then(|room_id| conference.room(room_id))
                    .map(|room| room.name.clone()),
                last_modified: event.updated_at,
            })
        })
        .collect();
    entries.sort_by(|a, b| a.summary.cmp(&b.summary));
    entries
}

/// Renders a feed as an iCalendar document.
pub fn to_ics(entries: &[CalendarEntry]) -> String {
    let mut calendar = Calendar::new();

    for entry in entries {
        let mut event = icalendar::Event::new();
        event.uid(&entry.uid);
        event.summary(&entry.summary);

        let stamp = entry.last_modified.format(ICS_TIMESTAMP).to_string();
        event.add_property("DTSTAMP", &stamp);
        event.add_property("LAST-MODIFIED", &stamp);
        event.add_property("DTSTART", entry.start.format(ICS_TIMESTAMP).to_string());
        event.add_property("DTEND", entry.end.format(ICS_TIMESTAMP).to_string());

        if let Some(ref description) = entry.description {
            event.description(description);
        }
        if let Some(ref location) = entry.location {
            event.location(location);
        }

        calendar.push(event.done());
    }

    calendar.done().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use common::{AggregateId, EventId};
    use domain::{Aggregate, ConferenceDetails, EventDraft, EventState, Room};

    struct Schedule {
        conference: Conference,
    }

    impl Schedule {
        fn new() -> Self {
            let day = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
            let details = ConferenceDetails {
                title: "RustConf".to_string(),
                acronym: "rc24".to_string(),
                timeslot_duration: 15,
                first_day: day,
                last_day: day,
                time_zone: chrono_tz::UTC,
            };
            let mut conference = Conference::default();
            let changes = conference
                .create(AggregateId::new(), details, Utc::now())
                .unwrap();
            conference.apply_changes(changes);
            Self { conference }
        }

        fn apply(&mut self, changes: Vec<domain::ConferenceChange>) {
            self.conference.apply_changes(changes);
        }

        fn room(&mut self, name: &str) -> common::RoomId {
            let room = Room::new(name);
            let id = room.id;
            let changes = self.conference.add_room(room).unwrap();
            self.apply(changes);
            id
        }

        fn event(&mut self, draft: EventDraft, state: EventState, hour: Option<u32>) -> EventId {
            let id = EventId::new();
            let changes = self
                .conference
                .submit_event(id, draft.with_time_slots(4), Utc::now())
                .unwrap();
            self.apply(changes);
            if state != EventState::New {
                let changes = self.conference.change_event_state(id, state).unwrap();
                self.apply(changes);
            }
            if let Some(hour) = hour {
                let start = Utc.with_ymd_and_hms(2024, 9, 10, hour, 0, 0).unwrap();
                let changes = self.conference.schedule_event(id, Some(start), None).unwrap();
                self.apply(changes);
            }
            id
        }
    }

    #[test]
    fn feed_contains_public_accepted_scheduled_events_by_title() {
        let mut schedule = Schedule::new();
        schedule.event(EventDraft::new("Zebra"), EventState::Confirmed, Some(9));
        schedule.event(EventDraft::new("Alpha"), EventState::Unconfirmed, Some(11));
        schedule.event(EventDraft::new("Unscheduled"), EventState::Confirmed, None);
        schedule.event(EventDraft::new("Rejected"), EventState::Rejected, Some(10));
        schedule.event(
            EventDraft::new("Private").with_public(false),
            EventState::Confirmed,
            Some(12),
        );

        let feed = calendar_feed(&schedule.conference, "example.org");
        let titles: Vec<&str> = feed.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zebra"]);
        assert_eq!(feed[1].end - feed[1].start, chrono::Duration::minutes(60));
    }

    #[test]
    fn event_ending_out_of_range_is_left_out() {
        let mut schedule = Schedule::new();
        let changes = schedule.conference.change_timeslot_duration(60).unwrap();
        schedule.apply(changes);
        schedule.event(EventDraft::new("Keynote"), EventState::Confirmed, Some(9));
        let endless = schedule.event(EventDraft::new("Endless"), EventState::Confirmed, Some(10));
        let changes = schedule
            .conference
            .set_event_time_slots(endless, u32::MAX)
            .unwrap();
        schedule.apply(changes);

        let feed = calendar_feed(&schedule.conference, "example.org");
        let titles: Vec<&str> = feed.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(titles, vec!["Keynote"]);
    }

    #[test]
    fn entry_carries_uid_abstract_and_room() {
        let mut schedule = Schedule::new();
        let room = schedule.room("Hall A");
        let bare = schedule.event(EventDraft::new("Bare"), EventState::Confirmed, Some(9));
        let full = schedule.event(
            EventDraft::new("Full").with_abstract("Ownership in depth"),
            EventState::Confirmed,
            None,
        );
        let start = Utc.with_ymd_and_hms(2024, 9, 10, 14, 0, 0).unwrap();
        let changes = schedule
            .conference
            .schedule_event(full, Some(start), Some(room))
            .unwrap();
        schedule.apply(changes);

        let feed = calendar_feed(&schedule.conference, "example.org");
        assert_eq!(feed[0].uid, format!("event-{bare}@example.org"));
        assert_eq!(feed[0].description, None);
        assert_eq!(feed[0].location, None);
        assert_eq!(feed[1].description.as_deref(), Some("Ownership in depth"));
        assert_eq!(feed[1].location.as_deref(), Some("Hall A"));
    }

    #[test]
    fn ics_output_lists_every_entry() {
        let mut schedule = Schedule::new();
        let id = schedule.event(
            EventDraft::new("Borrowing").with_abstract("Lifetimes"),
            EventState::Confirmed,
            Some(13),
        );

        let ics = to_ics(&calendar_feed(&schedule.conference, "example.org"));
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert!(ics.contains(&format!("UID:event-{id}@example.org")));
        assert!(ics.contains("SUMMARY:Borrowing"));
        assert!(ics.contains("DESCRIPTION:Lifetimes"));
        assert!(ics.contains("DTSTART:20240910T130000Z"));
        assert!(ics.contains("DTEND:20240910T140000Z"));
    }

    #[test]
    fn empty_feed_renders_an_empty_calendar() {
        let ics = to_ics(&[]);
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }
}
