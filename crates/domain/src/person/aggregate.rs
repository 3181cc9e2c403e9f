//! Person aggregate implementation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use common::{AggregateId, AvailabilityId, ContactId, EventId, ParticipationId};
use history_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::conference::{Conference, Event, EventState};
use crate::directory::EventDirectory;
use crate::language::{Language, LanguageOwner, LanguageRegistry, best_locale, normalize_code};

use super::{
    Availability, AvatarAttachedData, Avatar, AvatarStyle, Contact, ContactAddedData,
    ContactRemovedData, EventParticipation, EventRole, Gender, ParticipationAddedData,
    ParticipationRemovedData, PersonChange, PersonCreatedData, PersonError, PersonLanguageData,
    PersonProfile, ProfileUpdatedData, RoleState, RoleStateSetData, SliderEntry, SliderPlan,
    ZonedAvailability,
};

/// Person aggregate root.
///
/// Owns availabilities, participations, languages and contacts. Events are
/// only referenced and resolved through an [`EventDirectory`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Person {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    first_name: String,
    last_name: String,
    public_name: String,
    email: String,
    gender: Option<Gender>,
    abstract_text: Option<String>,
    description: Option<String>,
    avatar: Option<Avatar>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    languages: Vec<Language>,
    contacts: Vec<Contact>,
    participations: Vec<EventParticipation>,
    availabilities: Vec<Availability>,
}

impl Aggregate for Person {
    type Change = PersonChange;
    type Error = PersonError;

    fn aggregate_type() -> &'static str {
        "Person"
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
            PersonChange::PersonCreated(data) => {
                self.id = Some(data.person_id);
                self.set_profile(data.profile);
                self.created_at = data.created_at;
                self.updated_at = data.created_at;
            }
            PersonChange::ProfileUpdated(data) => {
                self.set_profile(data.profile);
                self.updated_at = data.updated_at;
            }
            PersonChange::AvatarAttached(data) => self.avatar = Some(data.avatar),
            PersonChange::AvatarRemoved => self.avatar = None,
            PersonChange::LanguageAdded(data) => {
                if let Some(id) = self.id {
                    self.languages
                        .push(Language::new(LanguageOwner::Person(id), data.code));
                }
            }
            PersonChange::LanguageRemoved(data) => {
                self.languages.retain(|l| l.code != data.code);
            }
            PersonChange::ContactAdded(data) => self.contacts.push(data.contact),
            PersonChange::ContactRemoved(data) => {
                self.contacts.retain(|c| c.id != data.contact_id);
            }
            PersonChange::ParticipationAdded(data) => self.participations.push(data.participation),
            PersonChange::ParticipationRemoved(data) => {
                self.participations.retain(|p| p.id != data.participation_id);
            }
            PersonChange::RoleStateSet(data) => {
                if let Some(participation) = self
                    .participations
                    .iter_mut()
                    .find(|p| p.id == data.participation_id)
                {
                    participation.role_state = data.to;
                }
            }
            PersonChange::AvailabilitySet(data) => {
                let availability = data.availability;
                match self
                    .availabilities
                    .iter_mut()
                    .find(|a| a.id == availability.id)
                {
                    Some(existing) => *existing = availability,
                    None => self.availabilities.push(availability),
                }
            }
            PersonChange::AvailabilityRemoved(data) => {
                self.availabilities.retain(|a| a.id != data.availability_id);
            }
        }
    }
}

impl SnapshotCapable for Person {}

impl LanguageRegistry for Person {
    fn languages(&self) -> &[Language] {
        &self.languages
    }
}

// Query methods
impl Person {
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn abstract_text(&self) -> Option<&str> {
        self.abstract_text.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn profile(&self) -> PersonProfile {
        PersonProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            public_name: self.public_name.clone(),
            email: self.email.clone(),
            gender: self.gender,
            abstract_text: self.abstract_text.clone(),
            description: self.description.clone(),
        }
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn participations(&self) -> &[EventParticipation] {
        &self.participations
    }

    pub fn availabilities(&self) -> &[Availability] {
        &self.availabilities
    }

    /// "First Last", or the public name when a part is missing.
    pub fn full_name(&self) -> String {
        let part_missing = self.first_name.is_empty() || self.last_name.is_empty();
        if part_missing && !self.public_name.is_empty() {
            self.public_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    /// The public name, falling back to the full name.
    pub fn full_public_name(&self) -> String {
        if self.public_name.is_empty() {
            self.full_name()
        } else {
            self.public_name.clone()
        }
    }

    /// URL of the avatar in the given style, if one was uploaded.
    pub fn avatar_path(&self, style: AvatarStyle) -> Option<String> {
        let id = self.id?;
        self.avatar.as_ref().map(|avatar| avatar.path(id, style))
    }

    /// Locale to write mails about `conference` in.
    pub fn locale_for_mailing(&self, conference: &Conference) -> String {
        best_locale(self, conference)
    }

    pub fn participations_in(
        &self,
        conference_id: AggregateId,
    ) -> impl Iterator<Item = &EventParticipation> {
        self.participations
            .iter()
            .filter(move |p| p.is_in(conference_id))
    }

    /// True when the person has any role on an event of `conference`.
    pub fn is_involved_in(&self, conference: &Conference) -> bool {
        self.participations
            .iter()
            .any(|p| conference.find_event(p.conference_id, p.event_id).is_some())
    }

    /// True when the person presents an accepted event of any conference.
    pub fn is_active_presenter_anywhere<D>(&self, directory: &D) -> bool
    where
        D: EventDirectory + ?Sized,
    {
        self.participations
            .iter()
            .filter(|p| p.is_presenter())
            .filter_map(|p| directory.find_event(p.conference_id, p.event_id))
            .any(Event::is_accepted)
    }

    /// Distinct role states of the presenter participations in a conference,
    /// in first-seen order, joined with ", ".
    pub fn role_state(&self, conference_id: AggregateId) -> String {
        let mut states: Vec<&'static str> = Vec::new();
        for participation in self.presenter_participations_in(conference_id) {
            let state = participation.role_state.as_str();
            if !states.contains(&state) {
                states.push(state);
            }
        }
        states.join(", ")
    }

    /// Feedback-count weighted mean of the events the person presents.
    ///
    /// Events without feedback are skipped. Returns None when there is no
    /// feedback at all.
    pub fn average_feedback_as_speaker<D>(&self, directory: &D) -> Option<f64>
    where
        D: EventDirectory + ?Sized,
    {
        let (sum, weight) = self
            .resolve_events(directory, EventParticipation::is_presenter)
            .into_iter()
            .filter_map(|event| {
                let average = event.average_feedback()?;
                let count = event.feedback_count();
                Some((average * f64::from(count), u64::from(count)))
            })
            .fold((0.0, 0u64), |(sum, weight), (s, w)| (sum + s, weight + w));

        (weight > 0).then(|| sum / weight as f64)
    }

    pub fn events_in<'a, D>(&self, directory: &'a D, conference_id: AggregateId) -> Vec<&'a Event>
    where
        D: EventDirectory + ?Sized,
    {
        self.resolve_events(directory, |p| p.is_in(conference_id))
    }

    pub fn events_as_presenter_in<'a, D>(
        &self,
        directory: &'a D,
        conference_id: AggregateId,
    ) -> Vec<&'a Event>
    where
        D: EventDirectory + ?Sized,
    {
        self.resolve_events(directory, |p| p.is_presenter() && p.is_in(conference_id))
    }

    /// Presented events of every other conference.
    pub fn events_as_presenter_not_in<'a, D>(
        &self,
        directory: &'a D,
        conference_id: AggregateId,
    ) -> Vec<&'a Event>
    where
        D: EventDirectory + ?Sized,
    {
        self.resolve_events(directory, |p| p.is_presenter() && !p.is_in(conference_id))
    }

    /// Confirmed, public events the person presents at `conference`.
    pub fn public_and_accepted_events_as_speaker_in<'a>(
        &self,
        conference: &'a Conference,
    ) -> Vec<&'a Event> {
        let Some(conference_id) = conference.id() else {
            return Vec::new();
        };
        self.events_as_presenter_in(conference, conference_id)
            .into_iter()
            .filter(|event| event.public && event.state == EventState::Confirmed)
            .collect()
    }

    /// Availabilities for `conference`, expressed in its zone.
    pub fn availabilities_in(&self, conference: &Conference) -> Vec<ZonedAvailability> {
        let Some(conference_id) = conference.id() else {
            return Vec::new();
        };
        self.availabilities
            .iter()
            .filter(|a| a.conference_id == conference_id)
            .map(|a| a.in_zone(conference.time_zone()))
            .collect()
    }
}

// Command methods (return changes)
impl Person {
    pub fn create(
        &self,
        person_id: AggregateId,
        profile: PersonProfile,
        created_at: DateTime<Utc>,
    ) -> Result<Vec<PersonChange>, PersonError> {
        if self.id.is_some() {
            return Err(PersonError::AlreadyCreated);
        }
        let profile = profile.validated()?;

        Ok(vec![PersonChange::PersonCreated(PersonCreatedData {
            person_id,
            profile,
            created_at,
        })])
    }

    pub fn update_profile(&self, profile: PersonProfile) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        let profile = profile.validated()?;
        if profile == self.profile() {
            return Ok(vec![]);
        }

        Ok(vec![PersonChange::ProfileUpdated(ProfileUpdatedData {
            profile,
            updated_at: Utc::now(),
        })])
    }

    pub fn attach_avatar(&self, avatar: Avatar) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        let avatar = Avatar::new(avatar.file_name, avatar.content_type)?;

        Ok(vec![PersonChange::AvatarAttached(AvatarAttachedData {
            avatar,
        })])
    }

    pub fn remove_avatar(&self) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        if self.avatar.is_none() {
            return Ok(vec![]);
        }
        Ok(vec![PersonChange::AvatarRemoved])
    }

    pub fn add_language(&self, code: &str) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        let code = normalize_code(code).ok_or(PersonError::EmptyLanguageCode)?;
        if self.has_language(&code) {
            return Err(PersonError::LanguageAlreadyRegistered(code));
        }

        Ok(vec![PersonChange::LanguageAdded(PersonLanguageData {
            code,
        })])
    }

    pub fn remove_language(&self, code: &str) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        let code = normalize_code(code).ok_or(PersonError::EmptyLanguageCode)?;
        if !self.has_language(&code) {
            return Err(PersonError::LanguageNotRegistered(code));
        }

        Ok(vec![PersonChange::LanguageRemoved(PersonLanguageData {
            code,
        })])
    }

    pub fn add_contact(&self, mut contact: Contact) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        contact.value = contact.value.trim().to_string();
        if contact.value.is_empty() {
            return Err(PersonError::ContactValueRequired);
        }

        Ok(vec![PersonChange::ContactAdded(ContactAddedData { contact })])
    }

    pub fn remove_contact(&self, contact_id: ContactId) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        if !self.contacts.iter().any(|c| c.id == contact_id) {
            return Err(PersonError::ContactNotFound(contact_id));
        }

        Ok(vec![PersonChange::ContactRemoved(ContactRemovedData {
            contact_id,
        })])
    }

    /// Links the person to an event, which must exist in `conference_id`.
    ///
    /// New participations start out pending.
    pub fn add_participation<D>(
        &self,
        directory: &D,
        participation_id: ParticipationId,
        conference_id: AggregateId,
        event_id: EventId,
        role: EventRole,
    ) -> Result<Vec<PersonChange>, PersonError>
    where
        D: EventDirectory + ?Sized,
    {
        self.ensure_created()?;
        if directory.find_event(conference_id, event_id).is_none() {
            return Err(PersonError::EventNotInConference {
                conference_id,
                event_id,
            });
        }
        if self
            .participations
            .iter()
            .any(|p| p.event_id == event_id && p.role == role)
        {
            return Err(PersonError::DuplicateParticipation(event_id));
        }

        Ok(vec![PersonChange::ParticipationAdded(
            ParticipationAddedData {
                participation: EventParticipation {
                    id: participation_id,
                    conference_id,
                    event_id,
                    role,
                    role_state: RoleState::default(),
                },
            },
        )])
    }

    pub fn remove_participation(
        &self,
        participation_id: ParticipationId,
    ) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        if !self.participations.iter().any(|p| p.id == participation_id) {
            return Err(PersonError::ParticipationNotFound(participation_id));
        }

        Ok(vec![PersonChange::ParticipationRemoved(
            ParticipationRemovedData { participation_id },
        )])
    }

    /// Moves every presenter participation in a conference to `state`.
    ///
    /// One change per participation that is not already in `state`; the
    /// handler appends them as a single batch.
    pub fn set_role_state(
        &self,
        conference_id: AggregateId,
        state: RoleState,
    ) -> Result<Vec<PersonChange>, PersonError> {
        self.ensure_created()?;
        let now = Utc::now();

        Ok(self
            .presenter_participations_in(conference_id)
            .filter(|p| p.role_state != state)
            .map(|p| {
                PersonChange::RoleStateSet(RoleStateSetData {
                    participation_id: p.id,
                    from: p.role_state,
                    to: state,
                    updated_at: now,
                })
            })
            .collect())
    }

    /// Decodes a slider submission against this person's rows for a conference.
    pub fn plan_slider_update(
        &self,
        conference_id: AggregateId,
        time_zone: Tz,
        entries: Vec<SliderEntry>,
    ) -> Result<SliderPlan, PersonError> {
        self.ensure_created()?;
        let existing: Vec<Availability> = self
            .availabilities
            .iter()
            .filter(|a| a.conference_id == conference_id)
            .cloned()
            .collect();
        SliderPlan::build(conference_id, time_zone, entries, &existing)
    }

    /// Applies a slider submission: deletions first, then creates and replaces.
    pub fn apply_slider_update(
        &self,
        conference_id: AggregateId,
        time_zone: Tz,
        entries: Vec<SliderEntry>,
    ) -> Result<Vec<PersonChange>, PersonError> {
        Ok(self
            .plan_slider_update(conference_id, time_zone, entries)?
            .into_changes())
    }

    pub fn availability(&self, availability_id: AvailabilityId) -> Option<&Availability> {
        self.availabilities.iter().find(|a| a.id == availability_id)
    }
}

// Helpers
impl Person {
    fn ensure_created(&self) -> Result<(), PersonError> {
        match self.id {
            Some(_) => Ok(()),
            None => Err(PersonError::NotCreated),
        }
    }

    fn set_profile(&mut self, profile: PersonProfile) {
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        self.public_name = profile.public_name;
        self.email = profile.email;
        self.gender = profile.gender;
        self.abstract_text = profile.abstract_text;
        self.description = profile.description;
    }

    fn presenter_participations_in(
        &self,
        conference_id: AggregateId,
    ) -> impl Iterator<Item = &EventParticipation> {
        self.participations_in(conference_id)
            .filter(|p| p.is_presenter())
    }

    /// Distinct events of the participations matching `keep`, in
    /// participation order. Unresolvable references are skipped.
    fn resolve_events<'a, D, P>(&self, directory: &'a D, keep: P) -> Vec<&'a Event>
    where
        D: EventDirectory + ?Sized,
        P: Fn(&EventParticipation) -> bool,
    {
        let mut events: Vec<&'a Event> = Vec::new();
        for participation in self.participations.iter().filter(|p| keep(p)) {
            if let Some(event) =
                directory.find_event(participation.conference_id, participation.event_id)
                && !events.iter().any(|e| e.id == event.id)
            {
                events.push(event);
            }
        }
        events
    }
}
