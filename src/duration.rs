//! Free-text medication duration parsing ("7 days", "2 weeks", "1 month").
//!
//! Prescriptions arrive with durations typed by a doctor, so the parser is
//! deliberately forgiving: case-insensitive, tolerant of surrounding text,
//! and it answers `None` rather than erroring on anything it cannot read.

use std::sync::LazyLock;

use regex::Regex;

/// Fixed day count used when a month must be reduced to days.
/// Calendar-aware month arithmetic lives in [`crate::estimate`].
const DAYS_PER_MONTH: i64 = 30;

const DAYS_PER_WEEK: i64 = 7;

static RE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(day|week|month)s?").unwrap());

/// Time unit of a parsed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Day,
    Week,
    Month,
}

impl DurationUnit {
    fn from_match(s: &str) -> Self {
        match s {
            "day" => Self::Day,
            "week" => Self::Week,
            // The regex admits nothing but the three unit words.
            _ => Self::Month,
        }
    }
}

/// A successfully parsed duration: a count and its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDuration {
    pub value: u32,
    pub unit: DurationUnit,
}

/// Parse a free-text duration into value + unit.
///
/// Returns `None` if the text contains no `<digits> <day|week|month>[s]`
/// pattern, or if the digit run overflows a `u32`.
pub fn parse_duration(text: &str) -> Option<ParsedDuration> {
    let lowered = text.to_lowercase();
    let caps = RE_DURATION.captures(&lowered)?;
    let value: u32 = caps[1].parse().ok()?;
    Some(ParsedDuration {
        value,
        unit: DurationUnit::from_match(&caps[2]),
    })
}

/// Reduce a free-text duration to a whole day count.
///
/// Weeks count 7 days, months a flat 30 — a supply-length approximation,
/// not calendar arithmetic. `None` for unparseable text.
pub fn parse_duration_to_days(text: &str) -> Option<i64> {
    let parsed = parse_duration(text)?;
    let value = i64::from(parsed.value);
    Some(match parsed.unit {
        DurationUnit::Day => value,
        DurationUnit::Week => value * DAYS_PER_WEEK,
        DurationUnit::Month => value * DAYS_PER_MONTH,
    })
}
