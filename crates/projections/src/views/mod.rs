//! Projection-backed read model views.

pub mod submission_history;

pub use submission_history::{
    RescaleEntry, SubmissionChange, SubmissionHistoryEntry, SubmissionHistoryView,
};
