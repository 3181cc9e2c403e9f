//! Integration tests for the Person aggregate.
//!
//! People and conferences share one history store here, the way the
//! services are wired in the binary.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{AggregateId, EventId};
use domain::conference::{
    AddConferenceLanguage, ChangeEventState, CreateConference, RecordFeedback, SubmitEvent,
};
use domain::person::{
    AddParticipation, AddPersonLanguage, CreatePerson, SetRoleState, UpdateAvailabilities,
};
use domain::{
    Aggregate, Conference, ConferenceService, DomainChange, DomainError, EventDraft, EventRole,
    EventState, PersonChange, PersonProfile, PersonService, RoleState, SliderEntry,
};
use history_store::{
    AppendOptions, ChangeRecord, HistoryStore, HistoryStoreError, InMemoryHistoryStore, Version,
};

struct Fixture {
    store: InMemoryHistoryStore,
    conferences: ConferenceService<InMemoryHistoryStore>,
    people: PersonService<InMemoryHistoryStore>,
}

impl Fixture {
    fn new() -> Self {
        let store = InMemoryHistoryStore::new();
        Self {
            conferences: ConferenceService::new(store.clone()),
            people: PersonService::new(store.clone()),
            store,
        }
    }

    async fn conference(&self, acronym: &str) -> AggregateId {
        let day = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        let cmd = CreateConference::new(acronym.to_uppercase(), acronym, 15, day, day)
            .in_time_zone(chrono_tz::America::New_York);
        let id = cmd.conference_id;
        self.conferences.create_conference(cmd).await.unwrap();
        id
    }

    async fn event(&self, conference_id: AggregateId, state: EventState) -> EventId {
        let submit = SubmitEvent::new(conference_id, EventDraft::new("Talk").with_time_slots(2));
        let event_id = submit.event_id;
        self.conferences.submit_event(submit).await.unwrap();
        self.conferences
            .change_event_state(ChangeEventState::new(conference_id, event_id, state))
            .await
            .unwrap();
        event_id
    }

    async fn load(&self, conference_id: AggregateId) -> Conference {
        self.conferences
            .get_conference(conference_id)
            .await
            .unwrap()
            .unwrap()
    }

    async fn person(&self, name: &str) -> AggregateId {
        let cmd = CreatePerson::new(PersonProfile::new(name, format!("{name}@example.org")));
        let id = cmd.person_id;
        self.people.create_person(cmd).await.unwrap();
        id
    }

    async fn join(
        &self,
        person_id: AggregateId,
        conference_id: AggregateId,
        event_id: EventId,
        role: EventRole,
    ) {
        let conference = self.load(conference_id).await;
        self.people
            .add_participation(
                AddParticipation::new(person_id, conference_id, event_id, role),
                &conference,
            )
            .await
            .unwrap();
    }
}

mod role_state {
    use super::*;

    #[tokio::test]
    async fn set_role_state_updates_presenters_atomically() {
        let fx = Fixture::new();
        let conf = fx.conference("rc24").await;
        let talk = fx.event(conf, EventState::Confirmed).await;
        let panel = fx.event(conf, EventState::Unconfirmed).await;
        let person = fx.person("ferris").await;
        fx.join(person, conf, talk, EventRole::Speaker).await;
        fx.join(person, conf, panel, EventRole::Moderator).await;
        fx.join(person, conf, panel, EventRole::Coordinator).await;

        let result = fx
            .people
            .set_role_state(SetRoleState::new(person, conf, RoleState::Offer))
            .await
            .unwrap();
        assert_eq!(result.changes.len(), 2);

        let records = fx.store.records_by_type("RoleStateSet").await.unwrap();
        assert_eq!(records.len(), 2);

        let reloaded = fx.people.get_person(person).await.unwrap().unwrap();
        assert_eq!(reloaded.role_state(conf), "offer");
    }

    #[tokio::test]
    async fn stale_role_state_batch_fails_whole() {
        let fx = Fixture::new();
        let conf = fx.conference("rc24").await;
        let talk = fx.event(conf, EventState::Confirmed).await;
        let workshop = fx.event(conf, EventState::Confirmed).await;
        let person = fx.person("ferris").await;
        fx.join(person, conf, talk, EventRole::Speaker).await;
        fx.join(person, conf, workshop, EventRole::Speaker).await;

        let stale = fx.people.handler().load(person).await.unwrap();
        let changes = stale.set_role_state(conf, RoleState::Declined).unwrap();
        assert_eq!(changes.len(), 2);

        // Someone else writes to the person in between.
        fx.people
            .add_language(AddPersonLanguage::new(person, "de"))
            .await
            .unwrap();

        let records: Vec<ChangeRecord> = changes
            .iter()
            .enumerate()
            .map(|(i, change)| {
                ChangeRecord::builder()
                    .aggregate_id(person)
                    .aggregate_type(domain::Person::aggregate_type())
                    .change_type(change.change_type())
                    .version(Version::new(stale.version().as_i64() + 1 + i as i64))
                    .payload(change)
                    .unwrap()
                    .build()
            })
            .collect();
        let result = fx
            .store
            .append(records, AppendOptions::expect_version(stale.version()))
            .await;
        assert!(matches!(
            result,
            Err(HistoryStoreError::ConcurrencyConflict { .. })
        ));

        let current = fx.people.get_person(person).await.unwrap().unwrap();
        assert_eq!(current.role_state(conf), "pending");
    }
}

mod availability {
    use super::*;

    #[tokio::test]
    async fn slider_creates_deletes_and_drops() {
        let fx = Fixture::new();
        let conf_id = fx.conference("rc24").await;
        let conf = fx.load(conf_id).await;
        let person = fx.person("ferris").await;

        let result = fx
            .people
            .update_availabilities(
                UpdateAvailabilities::new(
                    person,
                    vec![SliderEntry::new("2024-09-10 09:00", "2024-09-10 17:00")],
                ),
                &conf,
            )
            .await
            .unwrap();
        let row = result.aggregate.availabilities()[0].clone();
        // New York is UTC-4 in September.
        assert_eq!(row.start_date, Utc.with_ymd_and_hms(2024, 9, 10, 13, 0, 0).unwrap());

        let dropped = fx
            .people
            .update_availabilities(
                UpdateAvailabilities::new(person, vec![SliderEntry::new("0", "0")]),
                &conf,
            )
            .await
            .unwrap();
        assert!(dropped.changes.is_empty());
        assert_eq!(dropped.aggregate.availabilities().len(), 1);

        let deleted = fx
            .people
            .update_availabilities(
                UpdateAvailabilities::new(person, vec![SliderEntry::delete(row.id)]),
                &conf,
            )
            .await
            .unwrap();
        assert!(matches!(
            deleted.changes.as_slice(),
            [PersonChange::AvailabilityRemoved(_)]
        ));
        assert!(deleted.aggregate.availabilities_in(&conf).is_empty());
    }

    #[tokio::test]
    async fn availabilities_are_scoped_per_conference() {
        let fx = Fixture::new();
        let first = fx.load(fx.conference("one").await).await;
        let second = fx.load(fx.conference("two").await).await;
        let person = fx.person("ferris").await;

        for conf in [&first, &second] {
            fx.people
                .update_availabilities(
                    UpdateAvailabilities::new(
                        person,
                        vec![SliderEntry::new("2024-09-10", "2024-09-10 12:00")],
                    ),
                    conf,
                )
                .await
                .unwrap();
        }

        let reloaded = fx.people.get_person(person).await.unwrap().unwrap();
        assert_eq!(reloaded.availabilities().len(), 2);
        let zoned = reloaded.availabilities_in(&first);
        assert_eq!(zoned.len(), 1);
        assert_eq!(zoned[0].start_date.format("%H:%M").to_string(), "00:00");
    }
}

mod eligibility {
    use super::*;

    #[tokio::test]
    async fn presenter_status_spans_conferences() {
        let fx = Fixture::new();
        let old = fx.conference("rc23").await;
        let new = fx.conference("rc24").await;
        let accepted = fx.event(old, EventState::Confirmed).await;
        let rejected = fx.event(new, EventState::Rejected).await;

        let veteran = fx.person("veteran").await;
        let hopeful = fx.person("hopeful").await;
        fx.join(veteran, old, accepted, EventRole::Speaker).await;
        fx.join(hopeful, new, rejected, EventRole::Speaker).await;

        let all = fx.conferences.list_conferences().await.unwrap();
        let veteran = fx.people.get_person(veteran).await.unwrap().unwrap();
        let hopeful = fx.people.get_person(hopeful).await.unwrap().unwrap();

        assert!(veteran.is_active_presenter_anywhere(&all));
        assert!(!hopeful.is_active_presenter_anywhere(&all));
        assert_eq!(veteran.events_as_presenter_not_in(&all, new).len(), 1);
        assert!(hopeful.is_involved_in(&fx.load(new).await));
    }

    #[tokio::test]
    async fn speaker_feedback_across_conferences() {
        let fx = Fixture::new();
        let first = fx.conference("one").await;
        let second = fx.conference("two").await;
        let a = fx.event(first, EventState::Confirmed).await;
        let b = fx.event(second, EventState::Confirmed).await;

        for (conf, event, rating) in [(first, a, 5.0), (first, a, 3.0), (second, b, 1.0)] {
            fx.conferences
                .record_feedback(RecordFeedback::new(conf, event, rating))
                .await
                .unwrap();
        }

        let person = fx.person("ferris").await;
        fx.join(person, first, a, EventRole::Speaker).await;
        fx.join(person, second, b, EventRole::Moderator).await;

        let directory: HashMap<_, _> = [
            (first, fx.load(first).await),
            (second, fx.load(second).await),
        ]
        .into();
        let person = fx.people.get_person(person).await.unwrap().unwrap();
        assert_eq!(person.average_feedback_as_speaker(&directory), Some(3.0));
    }

    #[tokio::test]
    async fn mailing_locale_follows_person_order() {
        let fx = Fixture::new();
        let conf = fx.conference("rc24").await;
        for code in ["en", "de", "fr"] {
            fx.conferences
                .add_language(AddConferenceLanguage::new(conf, code))
                .await
                .unwrap();
        }
        let person = fx.person("ferris").await;
        for code in ["nl", "fr", "de"] {
            fx.people
                .add_language(AddPersonLanguage::new(person, code))
                .await
                .unwrap();
        }

        let person = fx.people.get_person(person).await.unwrap().unwrap();
        assert_eq!(person.locale_for_mailing(&fx.load(conf).await), "fr");
    }

    #[tokio::test]
    async fn participation_in_unknown_event_is_rejected() {
        let fx = Fixture::new();
        let conf = fx.conference("rc24").await;
        let person = fx.person("ferris").await;
        let conference = fx.load(conf).await;

        let result = fx
            .people
            .add_participation(
                AddParticipation::new(person, conf, EventId::new(), EventRole::Speaker),
                &conference,
            )
            .await;
        assert!(matches!(result, Err(DomainError::Person(_))));
    }
}
