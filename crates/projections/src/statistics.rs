//! Statistics derived on demand from a conference.
//!
//! These never fail: a conference without events yields an empty day
//! histogram, zeroed state buckets and zeroed language counts.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use domain::{Conference, LanguageRegistry, StateBucket};
use serde::Serialize;

/// Label of the bucket counting events without a language.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Event count for one language label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageCount {
    pub label: String,
    pub count: usize,
}

/// Submissions per local calendar day, as `(local midnight in epoch millis, count)`.
///
/// With two or more events every day between the first and the last
/// submission is present, zero-filled where nothing was submitted.
pub fn submissions_by_day(conference: &Conference) -> Vec<(i64, usize)> {
    let tz = conference.time_zone();
    let days: Vec<NaiveDate> = conference
        .events()
        .iter()
        .map(|event| event.created_at.with_timezone(&tz).date_naive())
        .collect();

    let mut histogram: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    if days.len() > 1
        && let (Some(first), Some(last)) = (days.iter().min(), days.iter().max())
    {
        for day in first.iter_days().take_while(|day| day <= last) {
            histogram.insert(day, 0);
        }
    }
    for day in days {
        *histogram.entry(day).or_insert(0) += 1;
    }

    histogram
        .into_iter()
        .map(|(day, count)| (local_midnight_millis(tz, day), count))
        .collect()
}

/// Event counts per [`StateBucket`], indexed by [`StateBucket::index`].
pub fn events_by_state(conference: &Conference) -> [usize; 4] {
    let mut counts = [0; 4];
    for event in conference.events() {
        counts[event.state.bucket().index()] += 1;
    }
    counts
}

/// Events per registered language in registration order, followed by the
/// [`UNKNOWN_LANGUAGE`] bucket for events without a language.
///
/// Events in a language the conference no longer lists are not counted.
pub fn language_breakdown(conference: &Conference, accepted_only: bool) -> Vec<LanguageCount> {
    let events: Vec<_> = conference
        .events()
        .iter()
        .filter(|event| !accepted_only || event.is_accepted())
        .collect();
    let count_of = |code: &str| events.iter().filter(|e| e.language == code).count();

    conference
        .languages()
        .iter()
        .map(|language| LanguageCount {
            label: language.code.clone(),
            count: count_of(&language.code),
        })
        .chain(std::iter::once(LanguageCount {
            label: UNKNOWN_LANGUAGE.to_string(),
            count: count_of(""),
        }))
        .collect()
}

/// Labels paired with the counts of [`events_by_state`], for charting.
pub fn state_labels() -> [(&'static str, StateBucket); 4] {
    [
        ("open", StateBucket::Open),
        ("accepted", StateBucket::Accepted),
        ("rejected", StateBucket::Rejected),
        ("withdrawn", StateBucket::Withdrawn),
    ]
}

// Zones switching at midnight have no 00:00 on that day; the first valid
// hour stands in for it.
fn local_midnight_millis(tz: Tz, day: NaiveDate) -> i64 {
    let midnight = day.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|local| local.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}
