//! Elapsed-time arithmetic and the hidden offset tag stored in descriptions.
//!
//! Manual adjustments ("I forgot to start the timer, add 25m") cannot be
//! expressed as Tempo intervals, so they are appended to the tracker's free
//! text description as a tag:
//!
//! ```text
//! cleevio-tempo-cli:<00:25:00><1500000>
//! ```
//!
//! The first field is for humans, the second is the signed offset in
//! milliseconds. Tags are repeatable and summed on decode. The literals are
//! shared with every other client that writes these descriptions and must not
//! change.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

use super::session::Interval;
use crate::core::config::APP_ID;

/// Matches one offset tag plus the whitespace around it.
static OFFSET_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\s*cleevio-tempo-cli:<(?P<human>.*?)><(?P<offset>[+-]?[0-9]*)>\s*")
        .expect("offset tag pattern is valid")
});

/// One term of a manually entered duration such as `1h`, `30 min` or `1.5h`.
static DURATION_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<value>[0-9]+(?:\.[0-9]+)?|\.[0-9]+)\s*(?P<unit>[a-zA-Z]*)")
        .expect("duration term pattern is valid")
});

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Sum of every offset tag in `description`, in milliseconds.
///
/// Tags whose offset field is not a number contribute nothing.
#[must_use]
pub fn decode_offset(description: Option<&str>) -> i64 {
    let Some(text) = description else {
        return 0;
    };
    OFFSET_TAG
        .captures_iter(text)
        .filter_map(|caps| caps.name("offset")?.as_str().parse::<i64>().ok())
        .fold(0_i64, i64::saturating_add)
}

/// Replace all offset tags in `description` with a single canonical tag.
///
/// A zero offset strips the tags without adding one. `None` stays `None` when
/// the offset is zero so an untouched tracker is never sent a description.
#[must_use]
pub fn encode_offset(description: Option<&str>, new_offset_ms: i64) -> Option<String> {
    if description.is_none() && new_offset_ms == 0 {
        return None;
    }

    let mut result = OFFSET_TAG
        .replace_all(description.unwrap_or_default(), "")
        .into_owned();
    if new_offset_ms != 0 {
        let human = format_duration(new_offset_ms);
        result.push_str(&format!("\n{APP_ID}:<{human}><{new_offset_ms}>\n"));
    }
    Some(result)
}

/// Strip offset tags for display.
#[must_use]
pub fn visible_description(description: Option<&str>) -> String {
    OFFSET_TAG
        .replace_all(description.unwrap_or_default(), " ")
        .trim()
        .to_string()
}

/// Total tracked time: the description offset plus every interval.
///
/// Running intervals (no end) count up to `now_ms`. Intervals whose start
/// cannot be parsed are skipped entirely.
#[must_use]
pub fn compute_elapsed(intervals: &[Interval], description: Option<&str>, now_ms: i64) -> i64 {
    intervals
        .iter()
        .filter_map(|interval| {
            let start = interval.start.as_deref().and_then(parse_timestamp)?;
            let end = interval
                .end
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(now_ms);
            Some(end - start)
        })
        .fold(decode_offset(description), i64::saturating_add)
}

/// Render milliseconds as `HH:MM:SS`, or `-HH:MM:SS` when negative.
///
/// Seconds are floored, so `-500` renders as `-00:00:01`.
#[must_use]
pub fn format_duration(ms: i64) -> String {
    let seconds = ms.div_euclid(SECOND_MS);
    let abs = seconds.unsigned_abs();
    let body = format!("{:02}:{:02}:{:02}", abs / 3600, (abs % 3600) / 60, abs % 60);
    if seconds < 0 { format!("-{body}") } else { body }
}

/// Seconds submitted when logging a tracker: `|ceil(ms / 1000)|`.
#[must_use]
pub fn logged_seconds(elapsed_ms: i64) -> u64 {
    let floor = elapsed_ms.div_euclid(SECOND_MS);
    let ceil = if elapsed_ms.rem_euclid(SECOND_MS) == 0 {
        floor
    } else {
        floor + 1
    };
    ceil.unsigned_abs()
}

/// Parse a Tempo timestamp to Unix milliseconds.
///
/// Tempo sends UTC timestamps without a zone suffix; RFC 3339 is accepted too.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc().timestamp_millis());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Parse a manual adjustment like `1h 30m`, `-15m`, `1.5h` or `250ms`.
///
/// A bare number means milliseconds. A single leading sign applies to the
/// whole expression. Returns `None` for empty or malformed input.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn parse_manual_duration(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, mut rest) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut total = 0.0_f64;
    let mut terms = 0_usize;
    while !rest.trim().is_empty() {
        let caps = DURATION_TERM.captures(rest)?;
        let value: f64 = caps.name("value")?.as_str().parse().ok()?;
        let unit = unit_ms(caps.name("unit").map_or("", |m| m.as_str()))?;
        total += value * unit as f64;
        terms += 1;
        rest = &rest[caps.get(0)?.end()..];
        // A number runs into another decimal point, as in `1.5.5h`.
        if rest.starts_with('.') {
            return None;
        }
        rest = rest.trim_start_matches([',', ' ']);
    }

    if terms == 0 || !total.is_finite() || total.abs() > i64::MAX as f64 {
        return None;
    }
    let ms = total.round() as i64;
    Some(if negative { -ms } else { ms })
}

fn unit_ms(unit: &str) -> Option<i64> {
    let ms = match unit.to_ascii_lowercase().as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND_MS,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE_MS,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR_MS,
        "d" | "day" | "days" => DAY_MS,
        "w" | "wk" | "wks" | "week" | "weeks" => WEEK_MS,
        _ => return None,
    };
    Some(ms)
}
