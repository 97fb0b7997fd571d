// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // ISO-8601 duration restricted to units with a fixed length.
    static ref DURATION: Regex = Regex::new(
        r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d{1,9}))?S)?)?$"
    )
    .expect("duration pattern is valid");
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a datetime literal. Forms without an offset are taken as UTC.
pub fn parse_datetime(text: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    Err(format!("invalid datetime '{text}'"))
}

fn component(caps: &regex::Captures<'_>, idx: usize) -> Result<i64, String> {
    match caps.get(idx) {
        Some(m) => m
            .as_str()
            .parse::<i64>()
            .map_err(|_| format!("duration component '{}' is out of range", m.as_str())),
        None => Ok(0),
    }
}

/// Parse an ISO-8601 duration such as `P1W2DT3H4M5.5S`.
pub fn parse_timedelta(text: &str) -> Result<TimeDelta, String> {
    let invalid = || format!("invalid timedelta '{text}'");
    if text == "P" || text.ends_with('T') {
        return Err(invalid());
    }
    let caps = DURATION.captures(text).ok_or_else(invalid)?;

    let weeks = component(&caps, 1)?;
    let days = component(&caps, 2)?;
    let hours = component(&caps, 3)?;
    let minutes = component(&caps, 4)?;
    let seconds = component(&caps, 5)?;
    let nanos = match caps.get(6) {
        Some(m) => {
            let digits = m.as_str();
            let scale = 10i64.pow(9 - digits.len() as u32);
            digits.parse::<i64>().map_err(|_| invalid())? * scale
        }
        None => 0,
    };

    [
        TimeDelta::try_weeks(weeks),
        TimeDelta::try_days(days),
        TimeDelta::try_hours(hours),
        TimeDelta::try_minutes(minutes),
        TimeDelta::try_seconds(seconds),
        Some(TimeDelta::nanoseconds(nanos)),
    ]
    .into_iter()
    .try_fold(TimeDelta::zero(), |acc, part| {
        part.and_then(|p| acc.checked_add(&p))
    })
    .ok_or_else(|| format!("timedelta '{text}' is out of range"))
}

/// Render a time delta as an ISO-8601 duration using days, hours, minutes
/// and seconds.
pub fn format_timedelta(delta: &TimeDelta) -> String {
    let sign = if *delta < TimeDelta::zero() { "-" } else { "" };
    let delta = delta.abs();
    let days = delta.num_days();
    let rest = delta - TimeDelta::days(days);
    let hours = rest.num_hours();
    let rest = rest - TimeDelta::hours(hours);
    let minutes = rest.num_minutes();
    let rest = rest - TimeDelta::minutes(minutes);
    let seconds = rest.num_seconds();
    let nanos = rest.subsec_nanos();

    let mut out = format!("{sign}P");
    if days != 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours != 0 || minutes != 0 || seconds != 0 || nanos != 0 || days == 0 {
        out.push('T');
        if hours != 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if nanos != 0 {
            let frac = format!("{nanos:09}");
            out.push_str(&format!("{seconds}.{}S", frac.trim_end_matches('0')));
        } else if seconds != 0 || (hours == 0 && minutes == 0) {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}
