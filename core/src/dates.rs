//! Calendar helpers. Every comparison is done on local calendar days in the
//! timezone of the supplied `now`, never on raw UTC dates.

use crate::Fixture;
use crate::merge::fixture_order;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

pub const ALL_DAYS: &str = "All days";

/// Fixtures sharing one local calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    pub day: NaiveDate,
    pub label: String,
    pub fixtures: Vec<Fixture>,
}

/// Calendar day of `instant` in `tz`.
pub fn local_day<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// "Today", "Tomorrow", "Yesterday" or e.g. "Friday 1 Nov". `None` means no
/// date filter and yields [`ALL_DAYS`].
pub fn date_label<Tz: TimeZone>(date: Option<&DateTime<Utc>>, now: &DateTime<Tz>) -> String {
    match date {
        Some(date) => day_label(local_day(date, &now.timezone()), now.date_naive()),
        None => ALL_DAYS.to_owned(),
    }
}

pub fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    match (day - today).num_days() {
        0 => "Today".to_owned(),
        1 => "Tomorrow".to_owned(),
        -1 => "Yesterday".to_owned(),
        _ => day.format("%A %-d %b").to_string(),
    }
}

pub fn has_started<Tz: TimeZone>(fixture: &Fixture, now: &DateTime<Tz>) -> bool {
    fixture.kickoff <= now.with_timezone(&Utc)
}

/// Bucket fixtures by local kickoff day. Groups come out in calendar order,
/// fixtures inside a group in kickoff order.
pub fn group_by_date<Tz: TimeZone>(fixtures: &[Fixture], now: &DateTime<Tz>) -> Vec<DateGroup> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut days: BTreeMap<NaiveDate, Vec<Fixture>> = BTreeMap::new();
    for fixture in fixtures {
        days.entry(local_day(&fixture.kickoff, &tz))
            .or_default()
            .push(fixture.clone());
    }

    days.into_iter()
        .map(|(day, mut fixtures)| {
            fixtures.sort_by(fixture_order);
            DateGroup {
                day,
                label: day_label(day, today),
                fixtures,
            }
        })
        .collect()
}

/// Fixtures whose local kickoff day is today or later, including today's
/// matches that already kicked off.
pub fn filter_upcoming<Tz: TimeZone>(fixtures: &[Fixture], now: &DateTime<Tz>) -> Vec<Fixture> {
    let tz = now.timezone();
    let today = now.date_naive();
    fixtures
        .iter()
        .filter(|f| local_day(&f.kickoff, &tz) >= today)
        .cloned()
        .collect()
}

/// Inclusive day range check: start 00:00:00 through end 23:59:59.999 local.
pub fn within_days<Tz: TimeZone>(
    instant: &DateTime<Utc>,
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> bool {
    let day = local_day(instant, tz);
    start <= day && day <= end
}

/// "5 Nov", "5-6 Nov" or "30 Oct - 2 Nov".
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        start.format("%-d %b").to_string()
    } else if start.year() == end.year() && start.month() == end.month() {
        format!("{}-{}", start.day(), end.format("%-d %b"))
    } else {
        format!("{} - {}", start.format("%-d %b"), end.format("%-d %b"))
    }
}
