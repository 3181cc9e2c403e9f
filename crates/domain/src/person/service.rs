//! Person service providing the command API and the people scopes.

use common::AggregateId;
use history_store::{HistoryStore, HistoryStoreExt};

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::conference::{Conference, ConferenceError, Event, EventState};
use crate::directory::EventDirectory;
use crate::error::DomainError;

use super::{
    AddContact, AddParticipation, AddPersonLanguage, AttachAvatar, CreatePerson,
    EventParticipation, Person, PersonChange, PersonError, RemoveAvatar, RemoveContact,
    RemoveParticipation, RemovePersonLanguage, SetRoleState, UpdateAvailabilities, UpdateProfile,
};

/// Service for managing people and their participations.
pub struct PersonService<S: HistoryStore> {
    handler: CommandHandler<S, Person>,
}

impl<S: HistoryStore> PersonService<S> {
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    pub fn handler(&self) -> &CommandHandler<S, Person> {
        &self.handler
    }

    #[tracing::instrument(skip(self, cmd), fields(person_id = %cmd.person_id))]
    pub async fn create_person(
        &self,
        cmd: CreatePerson,
    ) -> Result<CommandResult<Person>, DomainError> {
        let CreatePerson {
            person_id,
            profile,
            created_at,
        } = cmd;
        self.run("create_person", person_id, |person| {
            person.create(person_id, profile, created_at)
        })
        .await
    }

    #[tracing::instrument(skip(self, cmd), fields(person_id = %cmd.person_id))]
    pub async fn update_profile(
        &self,
        cmd: UpdateProfile,
    ) -> Result<CommandResult<Person>, DomainError> {
        let profile = cmd.profile;
        self.run("update_profile", cmd.person_id, |person| {
            person.update_profile(profile)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn attach_avatar(
        &self,
        cmd: AttachAvatar,
    ) -> Result<CommandResult<Person>, DomainError> {
        let avatar = cmd.avatar;
        self.run("attach_avatar", cmd.person_id, |person| {
            person.attach_avatar(avatar)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_avatar(
        &self,
        cmd: RemoveAvatar,
    ) -> Result<CommandResult<Person>, DomainError> {
        self.run("remove_avatar", cmd.person_id, Person::remove_avatar)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_language(
        &self,
        cmd: AddPersonLanguage,
    ) -> Result<CommandResult<Person>, DomainError> {
        self.run("add_language", cmd.person_id, |person| {
            person.add_language(&cmd.code)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_language(
        &self,
        cmd: RemovePersonLanguage,
    ) -> Result<CommandResult<Person>, DomainError> {
        self.run("remove_language", cmd.person_id, |person| {
            person.remove_language(&cmd.code)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_contact(&self, cmd: AddContact) -> Result<CommandResult<Person>, DomainError> {
        let contact = cmd.contact;
        self.run("add_contact", cmd.person_id, |person| {
            person.add_contact(contact)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_contact(
        &self,
        cmd: RemoveContact,
    ) -> Result<CommandResult<Person>, DomainError> {
        self.run("remove_contact", cmd.person_id, |person| {
            person.remove_contact(cmd.contact_id)
        })
        .await
    }

    /// Links a person to an event found through `directory`.
    #[tracing::instrument(skip(self, directory))]
    pub async fn add_participation<D>(
        &self,
        cmd: AddParticipation,
        directory: &D,
    ) -> Result<CommandResult<Person>, DomainError>
    where
        D: EventDirectory + Sync + ?Sized,
    {
        self.run("add_participation", cmd.person_id, |person| {
            person.add_participation(
                directory,
                cmd.participation_id,
                cmd.conference_id,
                cmd.event_id,
                cmd.role,
            )
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_participation(
        &self,
        cmd: RemoveParticipation,
    ) -> Result<CommandResult<Person>, DomainError> {
        self.run("remove_participation", cmd.person_id, |person| {
            person.remove_participation(cmd.participation_id)
        })
        .await
    }

    /// Sets the role state of every presenter participation in a conference.
    ///
    /// All changed participations are appended in one batch. A concurrent
    /// writer makes the whole call fail with a concurrency conflict.
    #[tracing::instrument(skip(self))]
    pub async fn set_role_state(
        &self,
        cmd: SetRoleState,
    ) -> Result<CommandResult<Person>, DomainError> {
        let result = self
            .run("set_role_state", cmd.person_id, |person| {
                person.set_role_state(cmd.conference_id, cmd.state)
            })
            .await?;

        let updated = result.changes.len();
        tracing::info!(updated, state = %cmd.state, "role states set");
        metrics::counter!("person_role_states_set").increment(updated as u64);
        Ok(result)
    }

    /// Applies an availability slider submission for `conference`.
    ///
    /// Timestamps are read in the conference's zone. A malformed entry
    /// rejects the whole submission.
    #[tracing::instrument(skip(self, cmd, conference), fields(person_id = %cmd.person_id))]
    pub async fn update_availabilities(
        &self,
        cmd: UpdateAvailabilities,
        conference: &Conference,
    ) -> Result<CommandResult<Person>, DomainError> {
        let conference_id = conference.id().ok_or(ConferenceError::NotCreated)?;
        let time_zone = conference.time_zone();

        let mut discarded = 0;
        let result = self
            .run("update_availabilities", cmd.person_id, |person| {
                let plan = person.plan_slider_update(conference_id, time_zone, cmd.entries)?;
                discarded = plan.discarded;
                Ok(plan.into_changes())
            })
            .await?;

        let deleted = result
            .changes
            .iter()
            .filter(|c| matches!(c, PersonChange::AvailabilityRemoved(_)))
            .count();
        tracing::debug!(
            deleted,
            saved = result.changes.len() - deleted,
            discarded,
            "availabilities updated"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_person(&self, person_id: AggregateId) -> Result<Option<Person>, DomainError> {
        self.handler.load_existing(person_id).await
    }

    /// Every person, in creation order.
    #[tracing::instrument(skip(self))]
    pub async fn list_people(&self) -> Result<Vec<Person>, DomainError> {
        let ids = self
            .handler
            .store()
            .aggregate_ids(Person::aggregate_type(), "PersonCreated")
            .await?;

        let mut people = Vec::with_capacity(ids.len());
        for id in ids {
            people.push(self.handler.load_required(id).await?);
        }
        Ok(people)
    }

    /// People with any role on an event of `conference`.
    pub async fn involved_in(&self, conference: &Conference) -> Result<Vec<Person>, DomainError> {
        self.people_where(conference, |_, _| true).await
    }

    /// People presenting an accepted event of `conference`.
    pub async fn speaking_at(&self, conference: &Conference) -> Result<Vec<Person>, DomainError> {
        self.people_where(conference, |participation, event| {
            participation.is_presenter() && event.is_accepted()
        })
        .await
    }

    /// People presenting an accepted public event of `conference`.
    pub async fn publicly_speaking_at(
        &self,
        conference: &Conference,
    ) -> Result<Vec<Person>, DomainError> {
        self.people_where(conference, |participation, event| {
            participation.is_presenter() && event.is_accepted() && event.public
        })
        .await
    }

    /// People with any role on a confirmed event of `conference`.
    pub async fn confirmed_at(&self, conference: &Conference) -> Result<Vec<Person>, DomainError> {
        self.people_where(conference, |_, event| event.state == EventState::Confirmed)
            .await
    }

    async fn people_where<P>(
        &self,
        conference: &Conference,
        matches: P,
    ) -> Result<Vec<Person>, DomainError>
    where
        P: Fn(&EventParticipation, &Event) -> bool,
    {
        let Some(conference_id) = conference.id() else {
            return Ok(Vec::new());
        };

        let people = self.list_people().await?;
        Ok(people
            .into_iter()
            .filter(|person| {
                person.participations_in(conference_id).any(|participation| {
                    conference
                        .event(participation.event_id)
                        .is_some_and(|event| matches(participation, event))
                })
            })
            .collect())
    }

    async fn run<F>(
        &self,
        command: &'static str,
        person_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<Person>, DomainError>
    where
        F: FnOnce(&Person) -> Result<Vec<PersonChange>, PersonError>,
    {
        metrics::counter!("person_commands_total", "command" => command).increment(1);
        self.handler
            .execute_with_snapshot(person_id, command_fn)
            .await
    }
}
