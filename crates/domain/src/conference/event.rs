//! Events (talk submissions) owned by a conference.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use common::{AggregateId, EventId, RoomId, TrackId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an event.
///
/// Transitions are owned by the surrounding review workflow; this core only
/// classifies states for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    #[default]
    New,
    Review,
    Unconfirmed,
    Confirmed,
    Rejected,
    Withdrawn,
    Canceled,
}

impl EventState {
    pub const ALL: [EventState; 7] = [
        EventState::New,
        EventState::Review,
        EventState::Unconfirmed,
        EventState::Confirmed,
        EventState::Rejected,
        EventState::Withdrawn,
        EventState::Canceled,
    ];

    /// The reporting bucket this state is counted in.
    pub fn bucket(&self) -> StateBucket {
        match self {
            EventState::New | EventState::Review => StateBucket::Open,
            EventState::Unconfirmed | EventState::Confirmed => StateBucket::Accepted,
            EventState::Rejected => StateBucket::Rejected,
            EventState::Withdrawn | EventState::Canceled => StateBucket::Withdrawn,
        }
    }

    /// Accepted events are the ones published in schedules and statistics.
    pub fn is_accepted(&self) -> bool {
        self.bucket() == StateBucket::Accepted
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::New => "new",
            EventState::Review => "review",
            EventState::Unconfirmed => "unconfirmed",
            EventState::Confirmed => "confirmed",
            EventState::Rejected => "rejected",
            EventState::Withdrawn => "withdrawn",
            EventState::Canceled => "canceled",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown event state: {s}"))
    }
}

/// The four fixed reporting groups of event states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateBucket {
    /// new, review
    Open = 0,
    /// unconfirmed, confirmed
    Accepted = 1,
    /// rejected
    Rejected = 2,
    /// withdrawn, canceled
    Withdrawn = 3,
}

impl StateBucket {
    /// Buckets in emission order.
    pub const ALL: [StateBucket; 4] = [
        StateBucket::Open,
        StateBucket::Accepted,
        StateBucket::Rejected,
        StateBucket::Withdrawn,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Accumulated audience feedback for an event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Feedback {
    total: f64,
    count: u32,
}

impl Feedback {
    pub fn record(&mut self, rating: f64) {
        self.total += rating;
        self.count += 1;
    }

    /// Mean rating, or None while nobody has rated the event.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / f64::from(self.count))
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// A talk or workshop submitted to a conference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub conference_id: AggregateId,
    pub title: String,
    pub abstract_text: Option<String>,
    /// Locale code, empty when unknown.
    pub language: String,
    pub time_slots: u32,
    pub state: EventState,
    pub public: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub room_id: Option<RoomId>,
    pub track_id: Option<TrackId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub feedback: Feedback,
}

impl Event {
    /// Length of the event for a given slot size in minutes.
    ///
    /// None when the length does not fit a `Duration`.
    pub fn duration(&self, timeslot_duration: u32) -> Option<Duration> {
        i64::from(self.time_slots)
            .checked_mul(i64::from(timeslot_duration))
            .and_then(Duration::try_minutes)
    }

    /// Start plus duration, None while the event is unscheduled or when the
    /// end falls outside the representable range.
    pub fn end_time(&self, timeslot_duration: u32) -> Option<DateTime<Utc>> {
        let start = self.start_time?;
        start.checked_add_signed(self.duration(timeslot_duration)?)
    }

    pub fn is_accepted(&self) -> bool {
        self.state.is_accepted()
    }

    pub fn is_scheduled(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn average_feedback(&self) -> Option<f64> {
        self.feedback.average()
    }

    pub fn feedback_count(&self) -> u32 {
        self.feedback.count()
    }
}

/// Editable fields of an event, used for submissions and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub abstract_text: Option<String>,
    pub language: String,
    pub time_slots: u32,
    pub public: bool,
    pub track_id: Option<TrackId>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            abstract_text: None,
            language: String::new(),
            time_slots: 0,
            public: true,
            track_id: None,
        }
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_time_slots(mut self, time_slots: u32) -> Self {
        self.time_slots = time_slots;
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_track(mut self, track_id: TrackId) -> Self {
        self.track_id = Some(track_id);
        self
    }
}
