// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and civil calendar boundaries.
//!
//! "Civil" means wall-clock time in the configured IANA timezone, daylight
//! saving included. Weeks start on Monday 00:00 civil time.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveTime, Offset, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Civil calendar date of an instant.
pub fn civil_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Civil Monday of the week containing an instant.
pub fn week_start(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    monday_of(civil_date(instant, tz))
}

/// The instant at which a civil date begins.
///
/// In zones whose DST jump skips midnight, the day begins at the first
/// instant after the gap.
pub fn civil_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&local).earliest() {
        Some(start) => start.with_timezone(&Utc),
        None => {
            let offset = tz.offset_from_utc_datetime(&local).fix();
            (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}

/// Elapsed hours between two instants (negative if `end` precedes `start`).
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}
