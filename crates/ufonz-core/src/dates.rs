//! Free-text date normalization.
//!
//! Report dates are typed by people: weekday prefixes, ordinals, abbreviated
//! months, numeric day-first forms, a time of day tacked on the end.
//! [`parse_date_text`] handles the regular shapes; everything else must be
//! listed in the curated exception table, and an unlisted failure is reported
//! rather than silently dropped.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::DateError;
use crate::tables::ResolutionTables;

/// Marker the source pages append to freshly added reports.
const NEW_MARKER: &str = "NEW";

/// How many times an exception-table replacement is substituted before
/// giving up.
const MAX_SUBSTITUTIONS: usize = 1;

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{1,4})$").expect("valid numeric date regex")
});

/// Clock times such as `9:30pm`, `10 p.m.`, `21:30` or `at 10pm`. A bare
/// `21.30` is not a time; it would collide with day-first numeric dates.
static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\bat\s+)?\b(?:\d{1,2}(?:[:.]\d{2})?\s*[ap]\.?m\b\.?|\d{1,2}:\d{2}(?::\d{2})?\b)",
    )
    .expect("valid time-of-day regex")
});

/// ISO-8601 style timestamps; only the date part is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const WEEKDAYS: &[&str] = &[
    "monday", "mon", "tuesday", "tue", "tues", "wednesday", "wed", "thursday", "thu", "thur",
    "thurs", "friday", "fri", "saturday", "sat", "sunday", "sun",
];

const FILLER: &[&str] = &["the", "of", "on"];

/// Resolves raw date text to a calendar date using the general parser and
/// the curated exception table.
#[derive(Debug, Clone, Default)]
pub struct DateNormalizer {
    exceptions: BTreeMap<String, Option<String>>,
    unknown_placeholder: Option<NaiveDate>,
}

impl DateNormalizer {
    #[must_use]
    pub fn new(exceptions: BTreeMap<String, Option<String>>) -> Self {
        Self {
            exceptions,
            unknown_placeholder: None,
        }
    }

    #[must_use]
    pub fn from_tables(tables: &ResolutionTables) -> Self {
        Self::new(tables.date_exceptions.clone())
    }

    /// Date reported for exception entries that map to "no date". Defaults to
    /// `None`; some exports prefer an earliest-possible placeholder instead.
    #[must_use]
    pub fn with_unknown_placeholder(mut self, placeholder: Option<NaiveDate>) -> Self {
        self.unknown_placeholder = placeholder;
        self
    }

    /// Normalize `raw` into a calendar date.
    ///
    /// Absent or blank input yields `Ok(None)`, as does an exception entry
    /// mapped to "no date" (unless a placeholder is configured).
    ///
    /// # Errors
    ///
    /// - [`DateError::Unrecognised`] when the text neither parses nor appears
    ///   in the exception table.
    /// - [`DateError::UnparseableReplacement`] when the table's replacement
    ///   itself does not parse.
    pub fn normalize(&self, raw: Option<&str>) -> Result<Option<NaiveDate>, DateError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let cleaned = clean_date_text(raw);
        if cleaned.is_empty() {
            return Ok(None);
        }

        let mut text = cleaned.clone();
        for substitution in 0..=MAX_SUBSTITUTIONS {
            if let Some(date) = parse_date_text(&text) {
                return Ok(Some(date));
            }
            if substitution == MAX_SUBSTITUTIONS {
                break;
            }
            match self.exceptions.get(text.as_str()) {
                None => return Err(DateError::Unrecognised { raw: text }),
                Some(None) => return Ok(self.unknown_placeholder),
                Some(Some(replacement)) => text = clean_date_text(replacement),
            }
        }

        Err(DateError::UnparseableReplacement {
            raw: cleaned,
            replacement: text,
        })
    }
}

/// Remove the "NEW" marker and non-printable characters, then collapse
/// whitespace.
#[must_use]
pub fn clean_date_text(raw: &str) -> String {
    let without_marker = raw.replace(NEW_MARKER, " ");
    let printable: String = without_marker
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// General-purpose parser for the regular date shapes found in reports.
///
/// Accepts `21 October 2014`, `Tuesday 21st Oct 2014`, `October 21, 2014`,
/// `21-Oct-2014`, `2014-10-21`, `21/10/2014`, `21.10.14` (day first), and
/// `October 2014` (taken as the first of the month). A time of day anywhere
/// in the text is ignored, as is the time part of `2014-10-21T21:30:00`.
/// Returns `None` when any remaining token is not understood rather than
/// guessing.
#[must_use]
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Some(date) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(date.date());
    }

    let without_time = TIME_OF_DAY.replace_all(text, " ");
    let text = without_time.trim().trim_end_matches(',').trim_end();
    if let Some(caps) = NUMERIC_DATE.captures(text) {
        return parse_numeric(&caps[1], &caps[2], &caps[3]);
    }
    parse_worded(text)
}

fn parse_numeric(first: &str, second: &str, third: &str) -> Option<NaiveDate> {
    let a: u32 = first.parse().ok()?;
    let b: u32 = second.parse().ok()?;
    let c: u32 = third.parse().ok()?;

    if first.len() == 4 {
        return NaiveDate::from_ymd_opt(i32::try_from(a).ok()?, b, c);
    }

    let year = match third.len() {
        4 => i32::try_from(c).ok()?,
        1 | 2 => expand_two_digit_year(c),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, b, a)
}

/// Same pivot as chrono's `%y`: 00–68 → 2000s, 69–99 → 1900s.
fn expand_two_digit_year(yy: u32) -> i32 {
    let yy = i32::try_from(yy).unwrap_or(0);
    if yy < 69 {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn parse_worded(text: &str) -> Option<NaiveDate> {
    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i32> = None;

    for token in text.split([' ', ',', '-', '/']).filter(|t| !t.is_empty()) {
        let token = token.trim_end_matches('.').to_ascii_lowercase();
        if token.is_empty() || WEEKDAYS.contains(&token.as_str()) || FILLER.contains(&token.as_str())
        {
            continue;
        }
        if let Some(m) = month_number(&token) {
            if month.replace(m).is_some() {
                return None;
            }
            continue;
        }

        let digits = strip_ordinal(&token)?;
        if digits.len() == 4 && digits == token {
            let y: i32 = digits.parse().ok()?;
            if year.replace(y).is_some() {
                return None;
            }
        } else if digits.len() <= 2 {
            let d: u32 = digits.parse().ok()?;
            if day.replace(d).is_some() {
                return None;
            }
        } else {
            return None;
        }
    }

    NaiveDate::from_ymd_opt(year?, month?, day.unwrap_or(1))
}

/// `"21st"` → `"21"`, `"21"` → `"21"`; `None` for anything else.
fn strip_ordinal(token: &str) -> Option<&str> {
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if digits_end == 0 {
        return None;
    }
    let (digits, suffix) = token.split_at(digits_end);
    match suffix {
        "" | "st" | "nd" | "rd" | "th" => Some(digits),
        _ => None,
    }
}

fn month_number(token: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    if token == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .zip(1u32..)
        .find(|(name, _)| **name == token || (token.len() == 3 && name.starts_with(token)))
        .map(|(_, n)| n)
}

#[cfg(test)]
#[path = "dates_test.rs"]
mod tests;
