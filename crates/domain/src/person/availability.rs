//! Availabilities and the slider form that edits them.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use common::{AggregateId, AvailabilityId};
use serde::{Deserialize, Serialize};

use super::{AvailabilityRemovedData, AvailabilitySetData, PersonChange, PersonError};

/// Start value the slider sends for a row the user cleared.
const DELETE_SENTINEL: i64 = -1;

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// When a person can be scheduled at one conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub id: AvailabilityId,
    pub conference_id: AggregateId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Availability {
    pub fn in_zone(&self, time_zone: Tz) -> ZonedAvailability {
        ZonedAvailability {
            id: self.id,
            conference_id: self.conference_id,
            start_date: self.start_date.with_timezone(&time_zone),
            end_date: self.end_date.with_timezone(&time_zone),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_date <= instant && instant <= self.end_date
    }
}

/// An availability expressed in the conference's zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZonedAvailability {
    pub id: AvailabilityId,
    pub conference_id: AggregateId,
    pub start_date: DateTime<Tz>,
    pub end_date: DateTime<Tz>,
}

/// One row of the availability slider form, still in its raw text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderEntry {
    pub id: Option<AvailabilityId>,
    pub start_date: String,
    pub end_date: String,
}

impl SliderEntry {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            id: None,
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    pub fn for_row(
        id: AvailabilityId,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(start_date, end_date)
        }
    }

    /// Marks an existing row for deletion.
    pub fn delete(id: AvailabilityId) -> Self {
        Self::for_row(id, DELETE_SENTINEL.to_string(), String::new())
    }
}

/// Decodes the integer a string starts with, ignoring whatever follows.
///
/// Leading whitespace and one sign are accepted. Strings without leading
/// digits decode to 0, so `"2024-05-01"` decodes to 2024 and `"abc"` to 0.
pub fn leading_integer(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });

    if negative { -value } else { value }
}

/// Parses a slider timestamp as a time in `time_zone`.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` (space or `T`), a bare date
/// meaning local midnight, or a whole number of epoch seconds.
pub fn parse_local_timestamp(raw: &str, time_zone: Tz) -> Result<DateTime<Utc>, PersonError> {
    let trimmed = raw.trim();
    let malformed = || PersonError::MalformedTimestamp(raw.to_string());

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: i64 = trimmed.parse().map_err(|_| malformed())?;
        return Utc.timestamp_opt(seconds, 0).single().ok_or_else(malformed);
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(malformed)?;

    // Inside a DST gap there is no such local time; in an overlap the earlier wins.
    time_zone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(malformed)
}

/// What a slider submission does to a person's availabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliderPlan {
    /// Existing rows to delete.
    pub deleted: Vec<AvailabilityId>,
    /// Rows to create or replace.
    pub upserts: Vec<Availability>,
    /// Entries dropped without effect.
    pub discarded: usize,
}

impl SliderPlan {
    /// Decodes raw slider entries against the rows a person already has.
    ///
    /// Deletions are resolved first. An entry whose row was deleted is never
    /// parsed again. Any malformed timestamp or reversed range rejects the
    /// whole submission.
    pub fn build(
        conference_id: AggregateId,
        time_zone: Tz,
        entries: Vec<SliderEntry>,
        existing: &[Availability],
    ) -> Result<Self, PersonError> {
        let known: HashSet<AvailabilityId> = existing.iter().map(|a| a.id).collect();
        let mut plan = SliderPlan::default();

        let mut remaining = Vec::with_capacity(entries.len());
        for entry in entries {
            if leading_integer(&entry.start_date) == DELETE_SENTINEL {
                match entry.id {
                    Some(id) if known.contains(&id) && !plan.deleted.contains(&id) => {
                        plan.deleted.push(id)
                    }
                    _ => plan.discarded += 1,
                }
            } else {
                remaining.push(entry);
            }
        }

        for entry in remaining {
            let deleted = entry.id.is_some_and(|id| plan.deleted.contains(&id));
            if deleted || leading_integer(&entry.start_date) <= 0 {
                plan.discarded += 1;
                continue;
            }

            let start_date = parse_local_timestamp(&entry.start_date, time_zone)?;
            let end_date = parse_local_timestamp(&entry.end_date, time_zone)?;
            if end_date < start_date {
                return Err(PersonError::InvalidAvailabilityRange);
            }

            let id = entry
                .id
                .filter(|id| known.contains(id))
                .unwrap_or_default();
            plan.upserts.push(Availability {
                id,
                conference_id,
                start_date,
                end_date,
            });
        }

        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.upserts.is_empty()
    }

    pub(crate) fn into_changes(self) -> Vec<PersonChange> {
        let removals = self.deleted.into_iter().map(|availability_id| {
            PersonChange::AvailabilityRemoved(AvailabilityRemovedData { availability_id })
        });
        let upserts = self.upserts.into_iter().map(|availability| {
            PersonChange::AvailabilitySet(AvailabilitySetData { availability })
        });
        removals.chain(upserts).collect()
    }
}
