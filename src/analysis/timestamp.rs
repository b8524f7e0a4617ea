//! Log Timestamps
//!
//! Nextflow prefixes log lines with `MMM-DD HH:MM:SS.mmm` and never
//! writes the year there. The year is only available from the
//! `Created:` header, so stamps are kept partial until the whole file
//! has been read and then resolved in one go.

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;

/// Prefix of the header line carrying the build date.
pub const CREATED_PREFIX: &str = "Created:";

static MONTHS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    [
        ("Jan", 1),
        ("Feb", 2),
        ("Mar", 3),
        ("Apr", 4),
        ("May", 5),
        ("Jun", 6),
        ("Jul", 7),
        ("Aug", 8),
        ("Sep", 9),
        ("Oct", 10),
        ("Nov", 11),
        ("Dec", 12),
    ]
    .into_iter()
    .collect()
});

/// Looks up a three-letter month abbreviation.
pub fn month_number(abbrev: &str) -> Option<u32> {
    MONTHS.get(abbrev).copied()
}

/// A year-less timestamp as printed at the start of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogStamp {
    month: u32,
    day: u32,
    time: NaiveTime,
}

impl LogStamp {
    /// Splits the leading stamp tokens off a line.
    ///
    /// Returns `None` when the line does not start with something shaped
    /// like `Abc-12 34:56:78.901` in the first column. Continuation lines,
    /// indented task output and the header block carry no stamp.
    pub fn leading(line: &str) -> Option<(&str, &str)> {
        if line.starts_with(char::is_whitespace) {
            return None;
        }
        let mut tokens = line.split_whitespace();
        let date = tokens.next()?;
        let time = tokens.next()?;

        let date_shaped = date.len() == 6
            && date.as_bytes()[3] == b'-'
            && date[..3].chars().all(|c| c.is_ascii_alphabetic())
            && date[4..].chars().all(|c| c.is_ascii_digit());
        let time_shaped = time.len() >= 8
            && time.as_bytes()[2] == b':'
            && time.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.');

        (date_shaped && time_shaped).then_some((date, time))
    }

    /// Parses the `MMM-DD` and `HH:MM:SS.mmm` tokens.
    pub fn parse(date: &str, time: &str) -> Result<Self, String> {
        let (month_str, day_str) = date
            .split_once('-')
            .ok_or_else(|| format!("malformed date '{}'", date))?;

        let month =
            month_number(month_str).ok_or_else(|| format!("unknown month '{}'", month_str))?;

        let day: u32 = day_str
            .parse()
            .map_err(|_| format!("malformed day '{}'", day_str))?;
        if !(1..=31).contains(&day) {
            return Err(format!("day out of range '{}'", day_str));
        }

        let time = NaiveTime::parse_from_str(time, "%H:%M:%S%.f")
            .map_err(|e| format!("malformed time '{}': {}", time, e))?;

        Ok(Self { month, day, time })
    }

    /// Parses the stamp at the start of a line, if there is one.
    pub fn from_line(line: &str) -> Option<Result<Self, String>> {
        Self::leading(line).map(|(date, time)| Self::parse(date, time))
    }

    /// Attaches a year. Fails for dates that do not exist in that year.
    pub fn resolve(&self, year: i32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).map(|date| date.and_time(self.time))
    }
}

impl fmt::Display for LogStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = MONTHS
            .iter()
            .find(|(_, n)| **n == self.month)
            .map(|(name, _)| *name)
            .unwrap_or("???");
        write!(
            f,
            "{}-{:02} {:02}:{:02}:{:02}.{:03}",
            month,
            self.day,
            self.time.hour(),
            self.time.minute(),
            self.time.second(),
            self.time.nanosecond() / 1_000_000
        )
    }
}

/// Extracts the year from a `Created:` header line.
///
/// The header embeds a date whose layout has changed between engine
/// versions (`05-01-2021 10:00 UTC`, `Jan-05 2021`), so the year is taken
/// as the first four-digit token after the prefix.
pub fn parse_created_year(line: &str) -> Option<i32> {
    let rest = line.trim_start().strip_prefix(CREATED_PREFIX)?;

    rest.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}
