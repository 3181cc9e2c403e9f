//! Command-line interface and report rendering.

use std::io::Write;

use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use domain::Aggregate;
use history_store::{HistoryStore, InMemoryHistoryStore, PostgresHistoryStore, Version};
use projections::{
    LanguageCount, calendar_feed, events_by_state, language_breakdown, submissions_by_day, to_ics,
};
use serde::Serialize;

use crate::config::Config;
use crate::error::CliError;
use crate::{App, create_app};

#[derive(Debug, Parser)]
#[command(name = "conference")]
#[command(about = "Inspect conference submissions and export the public schedule")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply database migrations (requires DATABASE_URL)
    Migrate,

    #[command(flatten)]
    Report(Report),
}

#[derive(Debug, Subcommand)]
pub enum Report {
    /// List every conference
    Conferences,
    /// Print the public schedule as iCalendar
    Ical {
        /// Conference acronym; defaults to the newest conference
        #[arg(short, long)]
        conference: Option<String>,
    },
    /// Print submission statistics as JSON
    Stats {
        /// Conference acronym; defaults to the newest conference
        #[arg(short, long)]
        conference: Option<String>,

        /// Count only accepted events in the language breakdown
        #[arg(long)]
        accepted_only: bool,
    },
    /// Print the submission audit trail
    History {
        /// Conference acronym; defaults to the newest conference
        #[arg(short, long)]
        conference: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct StatisticsReport<'a> {
    conference: &'a str,
    submissions_by_day: Vec<(i64, usize)>,
    events_by_state: [usize; 4],
    languages: Vec<LanguageCount>,
}

/// Picks the store from the configuration and runs the command.
pub async fn run<W: Write>(cli: Cli, config: &Config, out: &mut W) -> Result<(), CliError> {
    match cli.command {
        Command::Migrate => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(CliError::DatabaseRequired)?;
            let store = PostgresHistoryStore::connect(url).await?;
            store.run_migrations().await?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Command::Report(report) => match config.database_url.as_deref() {
            Some(url) => {
                let store = PostgresHistoryStore::connect(url).await?;
                execute(&create_app(store, config), report, out).await
            }
            None => {
                tracing::warn!("DATABASE_URL is not set, reading an empty in-memory store");
                let app = create_app(InMemoryHistoryStore::new(), config);
                execute(&app, report, out).await
            }
        },
    }
}

/// Renders one report against an already wired app.
#[tracing::instrument(skip(app, out))]
pub async fn execute<S, W>(app: &App<S>, report: Report, out: &mut W) -> Result<(), CliError>
where
    S: HistoryStore + Clone + 'static,
    W: Write,
{
    match report {
        Report::Conferences => {
            for conference in app.conferences.list_conferences().await? {
                writeln!(
                    out,
                    "{}\t{}\t{}..{}\t{}",
                    conference.acronym(),
                    conference.title(),
                    conference.first_day(),
                    conference.last_day(),
                    conference.time_zone()
                )?;
            }
        }
        Report::Ical { conference } => {
            let conference = app.resolve_conference(conference.as_deref()).await?;
            let feed = calendar_feed(&conference, &app.calendar_host);
            tracing::info!(
                acronym = conference.acronym(),
                entries = feed.len(),
                "exporting calendar"
            );
            write!(out, "{}", to_ics(&feed))?;
        }
        Report::Stats {
            conference,
            accepted_only,
        } => {
            let conference = app.resolve_conference(conference.as_deref()).await?;
            let report = StatisticsReport {
                conference: conference.acronym(),
                submissions_by_day: submissions_by_day(&conference),
                events_by_state: events_by_state(&conference),
                languages: language_breakdown(&conference, accepted_only),
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        Report::History { conference } => {
            let conference = app.resolve_conference(conference.as_deref()).await?;
            let conference_id = conference.id().ok_or(CliError::NoConference)?;
            app.processor.run_catch_up().await?;

            let mut rows: Vec<(Version, String)> = app
                .history
                .history_for_conference(conference_id)
                .await
                .into_iter()
                .map(|entry| {
                    let line = format!(
                        "{}\t{}\t{}\t{}",
                        entry.version,
                        entry.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                        entry.event_id,
                        entry.change
                    );
                    (entry.version, line)
                })
                .collect();
            rows.extend(app.history.rescales_for(conference_id).await.into_iter().map(
                |rescale| {
                    let line = format!(
                        "{}\t{}\t*\ttimeslot {} -> {} minutes ({} events rescaled)",
                        rescale.version,
                        rescale.changed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                        rescale.old_duration,
                        rescale.new_duration,
                        rescale.events_rescaled
                    );
                    (rescale.version, line)
                },
            ));
            rows.sort_by_key(|(version, _)| *version);

            for (_, line) in rows {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_stats_flags() {
        let cli = Cli::parse_from(["conference", "stats", "-c", "rc24", "--accepted-only"]);
        match cli.command {
            Command::Report(Report::Stats {
                conference,
                accepted_only,
            }) => {
                assert_eq!(conference.as_deref(), Some("rc24"));
                assert!(accepted_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_migrate() {
        let cli = Cli::parse_from(["conference", "migrate"]);
        assert!(matches!(cli.command, Command::Migrate));
    }

    #[tokio::test]
    async fn migrate_without_database_is_rejected() {
        let cli = Cli::parse_from(["conference", "migrate"]);
        let mut out = Vec::new();
        let result = run(cli, &Config::default(), &mut out).await;
        assert!(matches!(result, Err(CliError::DatabaseRequired)));
    }

    #[tokio::test]
    async fn reports_on_empty_store_explain_missing_conference() {
        let cli = Cli::parse_from(["conference", "ical"]);
        let mut out = Vec::new();
        let result = run(cli, &Config::default(), &mut out).await;
        assert!(matches!(result, Err(CliError::NoConference)));
        assert!(out.is_empty());
    }
}
