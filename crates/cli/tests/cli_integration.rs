//! Integration tests: reports rendered from an in-memory store.

use chrono::{NaiveDate, TimeZone, Utc};
use cli::{App, CliError, Config, Report, create_app, execute};
use fixture::*;
use history_store::InMemoryHistoryStore;

mod fixture {
    use super::*;
    use domain::EventState;
    use domain::conference::{
        AddConferenceLanguage, ChangeEventState, ChangeTimeslotDuration, CreateConference,
        ScheduleEvent, SubmitEvent,
    };
    use domain::EventDraft;

    pub fn app() -> App<InMemoryHistoryStore> {
        let config = Config {
            calendar_host: "cfp.example.org".to_string(),
            ..Config::default()
        };
        create_app(InMemoryHistoryStore::new(), &config)
    }

    /// A conference with one scheduled keynote, one open submission and a
    /// slot size change from 15 to 5 minutes.
    pub async fn seed(app: &App<InMemoryHistoryStore>, acronym: &str) {
        let day = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        let cmd = CreateConference::new("RustConf", acronym, 15, day, day)
            .in_time_zone(chrono_tz::America::New_York);
        let id = cmd.conference_id;
        app.conferences.create_conference(cmd).await.unwrap();
        app.conferences
            .add_language(AddConferenceLanguage::new(id, "en"))
            .await
            .unwrap();

        let keynote = SubmitEvent::new(
            id,
            EventDraft::new("Keynote")
                .with_language("en")
                .with_time_slots(4),
        )
        .submitted_at(Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap());
        let keynote_id = keynote.event_id;
        app.conferences.submit_event(keynote).await.unwrap();
        app.conferences
            .change_event_state(ChangeEventState::new(id, keynote_id, EventState::Confirmed))
            .await
            .unwrap();
        let start = Utc.with_ymd_and_hms(2024, 9, 10, 13, 0, 0).unwrap();
        app.conferences
            .schedule_event(ScheduleEvent::new(id, keynote_id, start, None))
            .await
            .unwrap();

        let open = SubmitEvent::new(id, EventDraft::new("Open talk").with_time_slots(2))
            .submitted_at(Utc.with_ymd_and_hms(2024, 3, 3, 15, 0, 0).unwrap());
        app.conferences.submit_event(open).await.unwrap();

        app.conferences
            .change_timeslot_duration(ChangeTimeslotDuration::new(id, 5))
            .await
            .unwrap();
    }

    pub async fn render(app: &App<InMemoryHistoryStore>, report: Report) -> String {
        let mut out = Vec::new();
        execute(app, report, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }
}

#[tokio::test]
async fn conferences_are_listed() {
    let app = app();
    seed(&app, "rc24").await;

    let output = render(&app, Report::Conferences).await;

    assert_eq!(
        output,
        "rc24\tRustConf\t2024-09-10..2024-09-10\tAmerica/New_York\n"
    );
}

#[tokio::test]
async fn ical_exports_the_public_schedule() {
    let app = app();
    seed(&app, "rc24").await;

    let output = render(
        &app,
        Report::Ical {
            conference: Some("rc24".to_string()),
        },
    )
    .await;

    assert_eq!(output.matches("BEGIN:VEVENT").count(), 1);
    assert!(output.contains("SUMMARY:Keynote"));
    assert!(output.contains("@cfp.example.org"));
    // Twelve 5-minute slots still end an hour after the start.
    assert!(output.contains("DTEND:20240910T140000Z"));
}

#[tokio::test]
async fn stats_are_printed_as_json() {
    let app = app();
    seed(&app, "rc24").await;

    let output = render(
        &app,
        Report::Stats {
            conference: None,
            accepted_only: false,
        },
    )
    .await;
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["conference"], "rc24");
    assert_eq!(json["events_by_state"], serde_json::json!([1, 1, 0, 0]));
    assert_eq!(json["submissions_by_day"].as_array().unwrap().len(), 3);
    assert_eq!(
        json["languages"],
        serde_json::json!([
            {"label": "en", "count": 1},
            {"label": "unknown", "count": 1}
        ])
    );
}

#[tokio::test]
async fn history_lists_event_rows_and_one_rescale_row() {
    let app = app();
    seed(&app, "rc24").await;

    let output = render(
        &app,
        Report::History {
            conference: Some("rc24".to_string()),
        },
    )
    .await;
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("submitted \"Keynote\" (4 slots)"));
    assert!(lines[1].contains("state new -> confirmed"));
    assert!(lines[2].contains("scheduled at 2024-09-10 13:00 UTC"));
    assert!(lines[4].contains("timeslot 15 -> 5 minutes (2 events rescaled)"));
}

#[tokio::test]
async fn unknown_acronym_is_reported() {
    let app = app();
    seed(&app, "rc24").await;

    let mut out = Vec::new();
    let result = execute(
        &app,
        Report::Ical {
            conference: Some("nope".to_string()),
        },
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(CliError::ConferenceNotFound(ref a)) if a == "nope"));
}
