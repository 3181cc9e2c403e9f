//! Operator tool for the conference history.
//!
//! Runs migrations and prints the calendar feed, statistics and submission
//! audit trail of a conference. Logs go to stderr, reports to stdout.

pub mod commands;
pub mod config;
pub mod error;

use domain::{Aggregate, Conference, ConferenceService};
use history_store::HistoryStore;
use projections::{Projection, ProjectionProcessor, SubmissionHistoryView};

pub use commands::{Cli, Command, Report, execute, run};
pub use config::{Config, LogFormat};
pub use error::CliError;

/// Services and read models wired over one history store.
pub struct App<S: HistoryStore + Clone + 'static> {
    pub conferences: ConferenceService<S>,
    pub history: SubmissionHistoryView,
    pub processor: ProjectionProcessor<S>,
    pub calendar_host: String,
}

/// Wires the conference service and the submission history projection.
pub fn create_app<S: HistoryStore + Clone + 'static>(store: S, config: &Config) -> App<S> {
    let history = SubmissionHistoryView::new();

    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(history.clone()) as Box<dyn Projection>);

    App {
        conferences: ConferenceService::new(store),
        history,
        processor,
        calendar_host: config.calendar_host.clone(),
    }
}

impl<S: HistoryStore + Clone + 'static> App<S> {
    /// The conference with the given acronym, or the newest one.
    pub async fn resolve_conference(&self, acronym: Option<&str>) -> Result<Conference, CliError> {
        let conference = match acronym {
            Some(acronym) => self
                .conferences
                .find_by_acronym(acronym)
                .await?
                .ok_or_else(|| CliError::ConferenceNotFound(acronym.to_string()))?,
            None => self
                .conferences
                .current_conference()
                .await?
                .ok_or(CliError::NoConference)?,
        };
        tracing::debug!(
            conference_id = ?conference.id(),
            acronym = conference.acronym(),
            "resolved conference"
        );
        Ok(conference)
    }
}
