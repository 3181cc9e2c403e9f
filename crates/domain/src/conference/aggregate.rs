//! Conference aggregate implementation.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use common::{AggregateId, EventId, RoomId, TrackId};
use history_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::language::{Language, LanguageOwner, LanguageRegistry, normalize_code};

use super::{
    ConferenceChange, ConferenceCreatedData, ConferenceDetails, ConferenceDetailsUpdatedData,
    ConferenceError, Event, EventDraft, EventScheduledData, EventState, EventStateChangedData,
    EventSubmittedData, EventTimeSlotsSetData, EventUpdatedData, Feedback, FeedbackRecordedData,
    LanguageData, MAX_RATING, MIN_RATING, Room, RoomAddedData, RoomRemovedData,
    TimeslotDurationChangedData, Track, TrackAddedData, TrackRemovedData,
};

/// Rescales a slot count so the event keeps its length in minutes.
///
/// `old_duration` and `new_duration` are slot sizes in minutes and
/// `new_duration` must be non-zero. The result is rounded to the nearest
/// whole slot, capped at `u32::MAX`. An event that had a length keeps at
/// least one slot.
pub fn rescale_time_slots(time_slots: u32, old_duration: u32, new_duration: u32) -> u32 {
    if time_slots == 0 {
        return 0;
    }
    let factor = f64::from(old_duration) / f64::from(new_duration);
    let scaled = (f64::from(time_slots) * factor)
        .round()
        .clamp(1.0, f64::from(u32::MAX));
    scaled as u32
}

/// Conference aggregate root.
///
/// Owns its events, rooms, tracks and languages. Every mutation goes through
/// a command method returning the changes to append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conference {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    title: String,
    acronym: String,
    timeslot_duration: u32,
    first_day: NaiveDate,
    last_day: NaiveDate,
    time_zone: Tz,
    created_at: DateTime<Utc>,

    events: Vec<Event>,
    rooms: Vec<Room>,
    tracks: Vec<Track>,
    languages: Vec<Language>,
}

impl Default for Conference {
    fn default() -> Self {
        Self {
            id: None,
            version: Version::initial(),
            title: String::new(),
            acronym: String::new(),
            timeslot_duration: 0,
            first_day: NaiveDate::MIN,
            last_day: NaiveDate::MIN,
            time_zone: Tz::UTC,
            created_at: DateTime::<Utc>::MIN_UTC,
            events: Vec::new(),
            rooms: Vec::new(),
            tracks: Vec::new(),
            languages: Vec::new(),
        }
    }
}

impl Aggregate for Conference {
    type Change = ConferenceChange;
    type Error = ConferenceError;

    fn aggregate_type() -> &'static str {
        "Conference"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, change: Self::Change) {
        match change {
            ConferenceChange::ConferenceCreated(data) => self.apply_created(data),
            ConferenceChange::ConferenceDetailsUpdated(data) => self.apply_details_updated(data),
            ConferenceChange::TimeslotDurationChanged(data) => self.apply_rescale(data),
            ConferenceChange::RoomAdded(data) => self.rooms.push(data.room),
            ConferenceChange::RoomRemoved(data) => self.rooms.retain(|r| r.id != data.room_id),
            ConferenceChange::TrackAdded(data) => self.tracks.push(data.track),
            ConferenceChange::TrackRemoved(data) => self.tracks.retain(|t| t.id != data.track_id),
            ConferenceChange::LanguageAdded(data) => {
                if let Some(id) = self.id {
                    self.languages
                        .push(Language::new(LanguageOwner::Conference(id), data.code));
                }
            }
            ConferenceChange::LanguageRemoved(data) => {
                self.languages.retain(|l| l.code != data.code);
            }
            ConferenceChange::EventSubmitted(data) => self.apply_event_submitted(data),
            ConferenceChange::EventUpdated(data) => {
                if let Some(event) = self.event_mut(data.event_id) {
                    event.title = data.title;
                    event.abstract_text = data.abstract_text;
                    event.language = data.language;
                    event.public = data.public;
                    event.track_id = data.track_id;
                    event.updated_at = data.updated_at;
                }
            }
            ConferenceChange::EventScheduled(data) => {
                if let Some(event) = self.event_mut(data.event_id) {
                    event.start_time = data.start_time;
                    event.room_id = data.room_id;
                    event.updated_at = data.updated_at;
                }
            }
            ConferenceChange::EventTimeSlotsSet(data) => {
                if let Some(event) = self.event_mut(data.event_id) {
                    event.time_slots = data.new_time_slots;
                    event.updated_at = data.updated_at;
                }
            }
            ConferenceChange::EventStateChanged(data) => {
                if let Some(event) = self.event_mut(data.event_id) {
                    event.state = data.to;
                    event.updated_at = data.updated_at;
                }
            }
            ConferenceChange::FeedbackRecorded(data) => {
                if let Some(event) = self.event_mut(data.event_id) {
                    event.feedback.record(data.rating);
                }
            }
        }
    }
}

impl SnapshotCapable for Conference {
    fn snapshot_interval() -> usize {
        50
    }
}

impl LanguageRegistry for Conference {
    fn languages(&self) -> &[Language] {
        &self.languages
    }
}

// Query methods
impl Conference {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn acronym(&self) -> &str {
        &self.acronym
    }

    /// Slot size in minutes.
    pub fn timeslot_duration(&self) -> u32 {
        self.timeslot_duration
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    /// Zone all conference-local times are expressed in.
    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn details(&self) -> ConferenceDetails {
        ConferenceDetails {
            title: self.title.clone(),
            acronym: self.acronym.clone(),
            timeslot_duration: self.timeslot_duration,
            first_day: self.first_day,
            last_day: self.last_day,
            time_zone: self.time_zone,
        }
    }

    /// Events in submission order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn accepted_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_accepted())
    }

    /// End of an event given this conference's slot size.
    pub fn event_end_time(&self, event: &Event) -> Option<DateTime<Utc>> {
        event.end_time(self.timeslot_duration)
    }

    /// Total scheduled length of all events in minutes.
    pub fn total_event_minutes(&self) -> u64 {
        self.events
            .iter()
            .map(|e| u64::from(e.time_slots) * u64::from(self.timeslot_duration))
            .sum()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    /// Every day from the first to the last conference day, inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.first_day
            .iter_days()
            .take_while(|day| *day <= self.last_day)
            .collect()
    }
}

// Command methods (return changes)
impl Conference {
    /// Creates the conference.
    pub fn create(
        &self,
        conference_id: AggregateId,
        details: ConferenceDetails,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        if self.id.is_some() {
            return Err(ConferenceError::AlreadyCreated);
        }
        let details = validate_details(details)?;

        Ok(vec![ConferenceChange::ConferenceCreated(
            ConferenceCreatedData {
                conference_id,
                details,
                created_at,
            },
        )])
    }

    /// Updates title, acronym, days, zone and slot size in one go.
    ///
    /// A changed slot size produces a [`ConferenceChange::TimeslotDurationChanged`]
    /// in the same batch as the details change.
    pub fn update_details(
        &self,
        details: ConferenceDetails,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        let details = validate_details(details)?;
        let now = Utc::now();

        let mut changes = Vec::new();
        if details.title != self.title
            || details.acronym != self.acronym
            || details.first_day != self.first_day
            || details.last_day != self.last_day
            || details.time_zone != self.time_zone
        {
            changes.push(ConferenceChange::ConferenceDetailsUpdated(
                ConferenceDetailsUpdatedData {
                    title: details.title,
                    acronym: details.acronym,
                    first_day: details.first_day,
                    last_day: details.last_day,
                    time_zone: details.time_zone,
                    updated_at: now,
                },
            ));
        }
        changes.extend(self.timeslot_change(details.timeslot_duration, now));

        Ok(changes)
    }

    /// Changes the slot size, rescaling every event.
    ///
    /// Setting the current value again records nothing.
    pub fn change_timeslot_duration(
        &self,
        new_duration: u32,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        if new_duration == 0 {
            return Err(ConferenceError::InvalidTimeslotDuration);
        }
        Ok(self.timeslot_change(new_duration, Utc::now()).into_iter().collect())
    }

    pub fn add_room(&self, room: Room) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        if room.name.trim().is_empty() {
            return Err(ConferenceError::RoomNameRequired);
        }
        Ok(vec![ConferenceChange::RoomAdded(RoomAddedData { room })])
    }

    /// Removes a room. Rooms events are scheduled in cannot be removed.
    pub fn remove_room(&self, room_id: RoomId) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        if self.room(room_id).is_none() {
            return Err(ConferenceError::RoomNotFound(room_id));
        }
        if self.events.iter().any(|e| e.room_id == Some(room_id)) {
            return Err(ConferenceError::RoomInUse(room_id));
        }
        Ok(vec![ConferenceChange::RoomRemoved(RoomRemovedData {
            room_id,
        })])
    }

    pub fn add_track(&self, track: Track) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        if track.name.trim().is_empty() {
            return Err(ConferenceError::TrackNameRequired);
        }
        Ok(vec![ConferenceChange::TrackAdded(TrackAddedData { track })])
    }

    pub fn remove_track(
        &self,
        track_id: TrackId,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        if self.track(track_id).is_none() {
            return Err(ConferenceError::TrackNotFound(track_id));
        }
        if self.events.iter().any(|e| e.track_id == Some(track_id)) {
            return Err(ConferenceError::TrackInUse(track_id));
        }
        Ok(vec![ConferenceChange::TrackRemoved(TrackRemovedData {
            track_id,
        })])
    }

    /// Registers a language events may be held in.
    pub fn add_language(&self, code: &str) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        let code = normalize_code(code).ok_or(ConferenceError::EmptyLanguageCode)?;
        if self.has_language(&code) {
            return Err(ConferenceError::LanguageAlreadyRegistered(code));
        }
        Ok(vec![ConferenceChange::LanguageAdded(LanguageData { code })])
    }

    /// Unregisters a language no event uses any more.
    pub fn remove_language(&self, code: &str) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        let code = normalize_code(code).ok_or(ConferenceError::EmptyLanguageCode)?;
        if !self.has_language(&code) {
            return Err(ConferenceError::LanguageNotRegistered(code));
        }
        if self.events.iter().any(|e| e.language == code) {
            return Err(ConferenceError::LanguageInUse(code));
        }
        Ok(vec![ConferenceChange::LanguageRemoved(LanguageData {
            code,
        })])
    }

    /// Accepts a new submission in state `new`.
    pub fn submit_event(
        &self,
        event_id: EventId,
        draft: EventDraft,
        submitted_at: DateTime<Utc>,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.ensure_created()?;
        if self.event(event_id).is_some() {
            return Err(ConferenceError::EventAlreadyExists(event_id));
        }
        let draft = self.validate_draft(draft)?;

        Ok(vec![ConferenceChange::EventSubmitted(EventSubmittedData {
            event_id,
            draft,
            submitted_at,
        })])
    }

    /// Replaces the editable fields of an event.
    ///
    /// A different slot count is recorded as its own change.
    pub fn update_event(
        &self,
        event_id: EventId,
        draft: EventDraft,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        let event = self.existing_event(event_id)?;
        let draft = self.validate_draft(draft)?;
        let now = Utc::now();

        let mut changes = Vec::new();
        if draft.title != event.title
            || draft.abstract_text != event.abstract_text
            || draft.language != event.language
            || draft.public != event.public
            || draft.track_id != event.track_id
        {
            changes.push(ConferenceChange::EventUpdated(EventUpdatedData {
                event_id,
                title: draft.title,
                abstract_text: draft.abstract_text,
                language: draft.language,
                public: draft.public,
                track_id: draft.track_id,
                updated_at: now,
            }));
        }
        if draft.time_slots != event.time_slots {
            changes.push(ConferenceChange::EventTimeSlotsSet(EventTimeSlotsSetData {
                event_id,
                old_time_slots: event.time_slots,
                new_time_slots: draft.time_slots,
                updated_at: now,
            }));
        }
        Ok(changes)
    }

    /// Places an event in the schedule, or removes it when `start_time` is None.
    pub fn schedule_event(
        &self,
        event_id: EventId,
        start_time: Option<DateTime<Utc>>,
        room_id: Option<RoomId>,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        let event = self.existing_event(event_id)?;
        if let Some(room_id) = room_id
            && self.room(room_id).is_none()
        {
            return Err(ConferenceError::RoomNotFound(room_id));
        }
        if event.start_time == start_time && event.room_id == room_id {
            return Ok(vec![]);
        }
        Ok(vec![ConferenceChange::EventScheduled(EventScheduledData {
            event_id,
            start_time,
            room_id,
            updated_at: Utc::now(),
        })])
    }

    pub fn set_event_time_slots(
        &self,
        event_id: EventId,
        time_slots: u32,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        let event = self.existing_event(event_id)?;
        if event.time_slots == time_slots {
            return Ok(vec![]);
        }
        Ok(vec![ConferenceChange::EventTimeSlotsSet(
            EventTimeSlotsSetData {
                event_id,
                old_time_slots: event.time_slots,
                new_time_slots: time_slots,
                updated_at: Utc::now(),
            },
        )])
    }

    /// Moves an event to another state. Any state may follow any other.
    pub fn change_event_state(
        &self,
        event_id: EventId,
        state: EventState,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        let event = self.existing_event(event_id)?;
        if event.state == state {
            return Ok(vec![]);
        }
        Ok(vec![ConferenceChange::EventStateChanged(
            EventStateChangedData {
                event_id,
                from: event.state,
                to: state,
                updated_at: Utc::now(),
            },
        )])
    }

    pub fn record_feedback(
        &self,
        event_id: EventId,
        rating: f64,
    ) -> Result<Vec<ConferenceChange>, ConferenceError> {
        self.existing_event(event_id)?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ConferenceError::InvalidRating(rating));
        }
        Ok(vec![ConferenceChange::FeedbackRecorded(
            FeedbackRecordedData {
                event_id,
                rating,
                recorded_at: Utc::now(),
            },
        )])
    }
}

// Validation helpers
impl Conference {
    fn ensure_created(&self) -> Result<(), ConferenceError> {
        match self.id {
            Some(_) => Ok(()),
            None => Err(ConferenceError::NotCreated),
        }
    }

    fn existing_event(&self, event_id: EventId) -> Result<&Event, ConferenceError> {
        self.ensure_created()?;
        self.event(event_id)
            .ok_or(ConferenceError::EventNotFound(event_id))
    }

    fn validate_draft(&self, mut draft: EventDraft) -> Result<EventDraft, ConferenceError> {
        draft.title = draft.title.trim().to_string();
        if draft.title.is_empty() {
            return Err(ConferenceError::EventTitleRequired);
        }
        draft.abstract_text = draft
            .abstract_text
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        draft.language = normalize_code(&draft.language).unwrap_or_default();
        if !draft.language.is_empty() && !self.has_language(&draft.language) {
            return Err(ConferenceError::UnknownLanguage(draft.language));
        }
        if let Some(track_id) = draft.track_id
            && self.track(track_id).is_none()
        {
            return Err(ConferenceError::TrackNotFound(track_id));
        }
        Ok(draft)
    }

    fn timeslot_change(&self, new_duration: u32, at: DateTime<Utc>) -> Option<ConferenceChange> {
        (new_duration != self.timeslot_duration).then(|| {
            ConferenceChange::TimeslotDurationChanged(TimeslotDurationChangedData {
                old_duration: self.timeslot_duration,
                new_duration,
                events_rescaled: self.events.len(),
                changed_at: at,
            })
        })
    }
}

fn validate_details(mut details: ConferenceDetails) -> Result<ConferenceDetails, ConferenceError> {
    details.title = details.title.trim().to_string();
    details.acronym = details.acronym.trim().to_string();
    if details.title.is_empty() {
        return Err(ConferenceError::TitleRequired);
    }
    if details.acronym.is_empty() {
        return Err(ConferenceError::AcronymRequired);
    }
    if details.timeslot_duration == 0 {
        return Err(ConferenceError::InvalidTimeslotDuration);
    }
    if details.first_day > details.last_day {
        return Err(ConferenceError::InvalidDateRange {
            first_day: details.first_day,
            last_day: details.last_day,
        });
    }
    Ok(details)
}

// Apply helpers
impl Conference {
    fn event_mut(&mut self, event_id: EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    fn apply_created(&mut self, data: ConferenceCreatedData) {
        let ConferenceDetails {
            title,
            acronym,
            timeslot_duration,
            first_day,
            last_day,
            time_zone,
        } = data.details;
        self.id = Some(data.conference_id);
        self.title = title;
        self.acronym = acronym;
        self.timeslot_duration = timeslot_duration;
        self.first_day = first_day;
        self.last_day = last_day;
        self.time_zone = time_zone;
        self.created_at = data.created_at;
    }

    fn apply_details_updated(&mut self, data: ConferenceDetailsUpdatedData) {
        self.title = data.title;
        self.acronym = data.acronym;
        self.first_day = data.first_day;
        self.last_day = data.last_day;
        self.time_zone = data.time_zone;
    }

    fn apply_rescale(&mut self, data: TimeslotDurationChangedData) {
        // Events keep their updated_at: a rescale is not an edit of the event.
        for event in &mut self.events {
            event.time_slots =
                rescale_time_slots(event.time_slots, data.old_duration, data.new_duration);
        }
        self.timeslot_duration = data.new_duration;
    }

    fn apply_event_submitted(&mut self, data: EventSubmittedData) {
        let Some(conference_id) = self.id else {
            return;
        };
        let draft = data.draft;
        self.events.push(Event {
            id: data.event_id,
            conference_id,
            title: draft.title,
            abstract_text: draft.abstract_text,
            language: draft.language,
            time_slots: draft.time_slots,
            state: EventState::New,
            public: draft.public,
            start_time: None,
            room_id: None,
            track_id: draft.track_id,
            created_at: data.submitted_at,
            updated_at: data.submitted_at,
            feedback: Feedback::default(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainChange;
    use chrono::TimeZone;

    fn details(duration: u32) -> ConferenceDetails {
        ConferenceDetails {
            title: "RustFest".to_string(),
            acronym: "rf24".to_string(),
            timeslot_duration: duration,
            first_day: NaiveDate::from_ymd_opt(2024, 11, 7).unwrap(),
            last_day: NaiveDate::from_ymd_opt(2024, 11, 9).unwrap(),
            time_zone: chrono_tz::Europe::Berlin,
        }
    }

    fn created(duration: u32) -> Conference {
        let mut conference = Conference::default();
        let changes = conference
            .create(AggregateId::new(), details(duration), Utc::now())
            .unwrap();
        conference.apply_changes(changes);
        conference
    }

    fn with_events(duration: u32, slots: &[u32]) -> Conference {
        let mut conference = created(duration);
        for (i, time_slots) in slots.iter().enumerate() {
            let draft = EventDraft::new(format!("Talk {i}")).with_time_slots(*time_slots);
            let changes = conference
                .submit_event(EventId::new(), draft, Utc::now())
                .unwrap();
            conference.apply_changes(changes);
        }
        conference
    }

    #[test]
    fn create_validates_required_fields() {
        let conference = Conference::default();
        let id = AggregateId::new();

        let mut missing_title = details(15);
        missing_title.title = "  ".to_string();
        assert_eq!(
            conference.create(id, missing_title, Utc::now()),
            Err(ConferenceError::TitleRequired)
        );

        let mut missing_acronym = details(15);
        missing_acronym.acronym = String::new();
        assert_eq!(
            conference.create(id, missing_acronym, Utc::now()),
            Err(ConferenceError::AcronymRequired)
        );

        assert_eq!(
            conference.create(id, details(0), Utc::now()),
            Err(ConferenceError::InvalidTimeslotDuration)
        );

        let mut reversed = details(15);
        std::mem::swap(&mut reversed.first_day, &mut reversed.last_day);
        assert!(matches!(
            conference.create(id, reversed, Utc::now()),
            Err(ConferenceError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn create_twice_fails() {
        let conference = created(15);
        assert_eq!(
            conference.create(AggregateId::new(), details(15), Utc::now()),
            Err(ConferenceError::AlreadyCreated)
        );
    }

    #[test]
    fn rescale_preserves_minutes() {
        let mut conference = with_events(15, &[4, 2, 1]);
        let minutes_before = conference.total_event_minutes();

        let changes = conference.change_timeslot_duration(5).unwrap();
        assert_eq!(changes.len(), 1);
        conference.apply_changes(changes);

        let slots: Vec<u32> = conference.events().iter().map(|e| e.time_slots).collect();
        assert_eq!(slots, vec![12, 6, 3]);
        assert_eq!(conference.timeslot_duration(), 5);
        assert_eq!(conference.total_event_minutes(), minutes_before);
    }

    #[test]
    fn halving_duration_doubles_slots() {
        let mut conference = with_events(30, &[1, 3]);
        conference.apply_changes(conference.change_timeslot_duration(15).unwrap());

        let slots: Vec<u32> = conference.events().iter().map(|e| e.time_slots).collect();
        assert_eq!(slots, vec![2, 6]);
    }

    #[test]
    fn coarser_duration_rounds_to_nearest_slot() {
        assert_eq!(rescale_time_slots(5, 10, 15), 3);
        assert_eq!(rescale_time_slots(4, 10, 15), 3);
        assert_eq!(rescale_time_slots(0, 15, 5), 0);
    }

    #[test]
    fn short_event_keeps_one_slot() {
        assert_eq!(rescale_time_slots(1, 10, 30), 1);
        assert_eq!(rescale_time_slots(1, 5, 120), 1);

        let mut conference = with_events(10, &[1, 0]);
        conference.apply_changes(conference.change_timeslot_duration(30).unwrap());
        let slots: Vec<u32> = conference.events().iter().map(|e| e.time_slots).collect();
        assert_eq!(slots, vec![1, 0]);
    }

    #[test]
    fn finer_duration_caps_slot_count() {
        assert_eq!(rescale_time_slots(u32::MAX, 60, 1), u32::MAX);
        assert_eq!(rescale_time_slots(u32::MAX / 2, 4, 1), u32::MAX);
    }

    #[test]
    fn same_duration_records_nothing() {
        let conference = with_events(15, &[4]);
        assert!(conference.change_timeslot_duration(15).unwrap().is_empty());
        assert!(conference.update_details(details(15)).unwrap().is_empty());
    }

    #[test]
    fn zero_duration_is_rejected_before_rescaling() {
        let conference = with_events(15, &[4]);
        assert_eq!(
            conference.change_timeslot_duration(0),
            Err(ConferenceError::InvalidTimeslotDuration)
        );
        assert_eq!(
            conference.update_details(details(0)),
            Err(ConferenceError::InvalidTimeslotDuration)
        );
    }

    #[test]
    fn rescale_without_events_only_records_configuration() {
        let mut conference = created(15);
        let changes = conference.change_timeslot_duration(10).unwrap();
        assert!(matches!(
            &changes[..],
            [ConferenceChange::TimeslotDurationChanged(TimeslotDurationChangedData {
                events_rescaled: 0,
                ..
            })]
        ));
        conference.apply_changes(changes);
        assert!(conference.events().is_empty());
        assert_eq!(conference.timeslot_duration(), 10);
    }

    #[test]
    fn rescale_does_not_touch_event_timestamps() {
        let mut conference = with_events(15, &[4]);
        let before = conference.events()[0].updated_at;
        conference.apply_changes(conference.change_timeslot_duration(5).unwrap());
        assert_eq!(conference.events()[0].updated_at, before);
    }

    #[test]
    fn update_details_batches_rename_and_rescale() {
        let conference = with_events(15, &[2]);
        let mut new_details = details(5);
        new_details.title = "RustFest Global".to_string();

        let changes = conference.update_details(new_details).unwrap();
        let types: Vec<&str> = changes
            .iter()
            .map(|change| change.change_type())
            .collect();
        assert_eq!(types, vec!["ConferenceDetailsUpdated", "TimeslotDurationChanged"]);
    }

    #[test]
    fn days_cover_the_whole_range() {
        let conference = created(15);
        let days = conference.days();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 11, 7).unwrap());
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 11, 9).unwrap());
    }

    #[test]
    fn languages_are_normalized_and_unique() {
        let mut conference = created(15);
        conference.apply_changes(conference.add_language(" DE ").unwrap());
        assert_eq!(conference.codes(), vec!["de"]);
        assert_eq!(
            conference.add_language("de"),
            Err(ConferenceError::LanguageAlreadyRegistered("de".to_string()))
        );
        assert_eq!(
            conference.add_language(""),
            Err(ConferenceError::EmptyLanguageCode)
        );
    }

    #[test]
    fn event_language_must_be_offered() {
        let mut conference = created(15);
        conference.apply_changes(conference.add_language("en").unwrap());

        let draft = EventDraft::new("Ownership").with_language("fr");
        assert_eq!(
            conference.submit_event(EventId::new(), draft, Utc::now()),
            Err(ConferenceError::UnknownLanguage("fr".to_string()))
        );

        let draft = EventDraft::new("Ownership").with_language("EN");
        let changes = conference
            .submit_event(EventId::new(), draft, Utc::now())
            .unwrap();
        conference.apply_changes(changes);
        assert_eq!(conference.events()[0].language, "en");

        assert_eq!(
            conference.remove_language("en"),
            Err(ConferenceError::LanguageInUse("en".to_string()))
        );
    }

    #[test]
    fn event_title_is_required() {
        let conference = created(15);
        assert_eq!(
            conference.submit_event(EventId::new(), EventDraft::new(" "), Utc::now()),
            Err(ConferenceError::EventTitleRequired)
        );
    }

    #[test]
    fn scheduling_requires_known_room() {
        let mut conference = with_events(15, &[4]);
        let event_id = conference.events()[0].id;
        let start = Utc.with_ymd_and_hms(2024, 11, 7, 9, 0, 0).unwrap();

        assert!(matches!(
            conference.schedule_event(event_id, Some(start), Some(RoomId::new())),
            Err(ConferenceError::RoomNotFound(_))
        ));

        let room = Room::new("Saal 1");
        let room_id = room.id;
        conference.apply_changes(conference.add_room(room).unwrap());
        conference.apply_changes(
            conference
                .schedule_event(event_id, Some(start), Some(room_id))
                .unwrap(),
        );

        let event = conference.event(event_id).unwrap();
        assert_eq!(
            conference.event_end_time(event),
            Some(Utc.with_ymd_and_hms(2024, 11, 7, 10, 0, 0).unwrap())
        );
        assert_eq!(
            conference.remove_room(room_id),
            Err(ConferenceError::RoomInUse(room_id))
        );
    }

    #[test]
    fn state_changes_are_recorded_once() {
        let mut conference = with_events(15, &[4]);
        let event_id = conference.events()[0].id;

        conference.apply_changes(
            conference
                .change_event_state(event_id, EventState::Confirmed)
                .unwrap(),
        );
        assert!(conference.event(event_id).unwrap().is_accepted());
        assert!(
            conference
                .change_event_state(event_id, EventState::Confirmed)
                .unwrap()
                .is_empty()
        );
        assert_eq!(conference.accepted_events().count(), 1);
    }

    #[test]
    fn feedback_is_bounded() {
        let mut conference = with_events(15, &[4]);
        let event_id = conference.events()[0].id;

        assert_eq!(
            conference.record_feedback(event_id, 6.0),
            Err(ConferenceError::InvalidRating(6.0))
        );
        conference.apply_changes(conference.record_feedback(event_id, 3.0).unwrap());
        conference.apply_changes(conference.record_feedback(event_id, 5.0).unwrap());

        let event = conference.event(event_id).unwrap();
        assert_eq!(event.average_feedback(), Some(4.0));
        assert_eq!(event.feedback_count(), 2);
    }

    #[test]
    fn commands_on_missing_event_fail() {
        let conference = created(15);
        let missing = EventId::new();
        assert_eq!(
            conference.set_event_time_slots(missing, 2),
            Err(ConferenceError::EventNotFound(missing))
        );
    }

    #[test]
    fn snapshot_round_trip_keeps_events() {
        let conference = with_events(15, &[4, 2]);
        let json = serde_json::to_string(&conference).unwrap();
        let restored: Conference = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id(), conference.id());
        assert_eq!(restored.events(), conference.events());
        assert_eq!(restored.time_zone(), chrono_tz::Europe::Berlin);
    }
}
