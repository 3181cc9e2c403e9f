//! Read side of the conference system.
//!
//! - [`statistics`]: submission histogram, state buckets and language
//!   breakdown computed from a loaded conference
//! - [`calendar`]: the public calendar feed and its iCalendar rendering
//! - [`SubmissionHistoryView`]: per-event audit trail fed by the
//!   [`ProjectionProcessor`]

pub mod calendar;
pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod statistics;
pub mod views;

pub use calendar::{CalendarEntry, calendar_feed, to_ics};
pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use statistics::{LanguageCount, events_by_state, language_breakdown, submissions_by_day};
pub use views::{RescaleEntry, SubmissionChange, SubmissionHistoryEntry, SubmissionHistoryView};
