//! Pure string rewrites used to build geocoder candidates.
//!
//! Every function here is total: empty, punctuation-only, or unbalanced
//! input produces an empty result or no variants, never a panic. Variant
//! functions may return empty strings or repeats; the engine tidies and
//! de-duplicates before anything is submitted.

use std::sync::LazyLock;

use regex::Regex;
use ufonz_core::Correction;

/// Leading words that introduce a place rather than name it.
pub const CONJUNCTIONS: &[&str] = &["of", "to", "and", "from", "between"];

/// Trailing qualifiers naming the island rather than the place. Nominatim
/// matches these against unrelated features, so they are dropped.
pub const ISLAND_QUALIFIERS: &[&str] = &[
    "North Island",
    "South Island",
    "Nth Island",
    "Sth Island",
    "North Is",
    "South Is",
    "NI",
    "SI",
];

const COUNTRY_SUFFIX: &str = ", New Zealand";

static BRACKET_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s+)\([\p{L}\p{N}\s]*\)").expect("valid bracket regex"));

static SLASH_COMPOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}'\-]+(?:\s*/\s*[\p{L}\p{N}'\-]+)+").expect("valid slash regex")
});

static SLASH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*/\s*").expect("valid slash separator regex"));

static AMPERSAND_COMPOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}'\-]+(?:\s*(?:&amp;|&)\s*[\p{L}\p{N}'\-]+)+")
        .expect("valid ampersand regex")
});

static AMPERSAND_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:&amp;|&)\s*").expect("valid ampersand separator regex"));

/// Drops trailing characters that are neither letters nor parentheses.
///
/// Idempotent. `"Rotorua, 3pm."` becomes `"Rotorua, 3pm"`.
#[must_use]
pub fn strip_trailing_non_alpha(text: &str) -> &str {
    text.trim_end_matches(|c: char| !(c.is_alphabetic() || c == '(' || c == ')'))
}

/// Collapses every run of Unicode whitespace (including `&nbsp;` once
/// decoded) into one ASCII space and trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes HTML character references such as `&amp;` and `&nbsp;`.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Cleans up punctuation left behind by other rewrites: doubled commas,
/// space before a comma, and leading or trailing separators.
#[must_use]
pub fn tidy(text: &str) -> String {
    let mut out = collapse_whitespace(text).replace(" ,", ",");
    while out.contains(",,") {
        out = out.replace(",,", ",");
    }
    out.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_owned()
}

/// The unmodified (trimmed) string first, then the string without a
/// leading conjunction if it starts with one.
///
/// Matching is case-insensitive on whole words, so `"Tokoroa"` keeps its
/// `"To"`.
#[must_use]
pub fn conjunction_variants(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    let mut variants = vec![trimmed.to_owned()];
    for conjunction in CONJUNCTIONS {
        if let Some(rest) = strip_leading_word(trimmed, conjunction) {
            variants.push(rest.to_owned());
        }
    }
    variants
}

fn strip_leading_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let head = text.get(..word.len())?;
    if !head.eq_ignore_ascii_case(word) {
        return None;
    }
    let rest = &text[word.len()..];
    rest.starts_with(char::is_whitespace)
        .then_some(rest.trim_start())
}

/// Removes the first parenthesised clause made only of letters, digits and
/// whitespace, together with the whitespace before it. The clause must be
/// preceded by whitespace or start the text; `Raglan(beach)` is left alone.
///
/// Returns `None` when there is no such balanced clause.
#[must_use]
pub fn remove_bracket_clause(text: &str) -> Option<String> {
    let found = BRACKET_CLAUSE.find(text)?;
    let mut out = String::with_capacity(text.len() - found.len());
    out.push_str(&text[..found.start()]);
    out.push_str(&text[found.end()..]);
    Some(out)
}

/// One candidate per side of every `a/b` compound, with the side standing
/// in for the whole compound.
#[must_use]
pub fn slash_variants(text: &str) -> Vec<String> {
    split_compounds(text, &SLASH_COMPOUND, &SLASH_SEPARATOR)
}

/// As [`slash_variants`] for `a & b` and the still-encoded `a &amp; b`.
#[must_use]
pub fn ampersand_variants(text: &str) -> Vec<String> {
    split_compounds(text, &AMPERSAND_COMPOUND, &AMPERSAND_SEPARATOR)
}

fn split_compounds(text: &str, compound: &Regex, separator: &Regex) -> Vec<String> {
    let mut variants = Vec::new();
    for found in compound.find_iter(text) {
        let before = &text[..found.start()];
        let after = &text[found.end()..];
        for side in separator.split(found.as_str()) {
            variants.push(format!("{before}{side}{after}"));
        }
    }
    variants
}

/// Keeps only title-cased tokens with at least `min_letters` letters.
///
/// Title case follows the usual rule: an upper-case letter may only follow
/// a non-letter, a lower-case letter only a letter. `"NZ"`, `"near"` and
/// `"McDonald"` are all dropped.
#[must_use]
pub fn title_case_filter(text: &str, min_letters: usize) -> String {
    text.split_whitespace()
        .filter(|token| is_title_case(token) && letter_count(token) >= min_letters)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_title_case(token: &str) -> bool {
    let mut previous_cased = false;
    let mut any_cased = false;
    for c in token.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else {
            previous_cased = false;
        }
    }
    any_cased
}

fn letter_count(token: &str) -> usize {
    token.chars().filter(|c| c.is_alphabetic()).count()
}

/// One candidate per correction whose `from` occurs in `text`, with every
/// occurrence replaced. Table order is preserved.
#[must_use]
pub fn correction_variants(text: &str, corrections: &[Correction]) -> Vec<String> {
    corrections
        .iter()
        .filter(|c| !c.from.is_empty() && text.contains(c.from.as_str()))
        .map(|c| text.replace(c.from.as_str(), &c.to))
        .collect()
}

/// Removes one trailing island qualifier, keeping a trailing
/// `", New Zealand"` if present.
///
/// The qualifier must be a whole token and something must remain before it;
/// `"South Island"` on its own is returned unchanged.
#[must_use]
pub fn strip_island_qualifier(text: &str) -> String {
    let (head, suffix) = split_country_suffix(text);
    let head = head.trim_end();

    for qualifier in ISLAND_QUALIFIERS {
        let Some(start) = head.len().checked_sub(qualifier.len()) else {
            continue;
        };
        let Some(tail) = head.get(start..) else {
            continue;
        };
        if !tail.eq_ignore_ascii_case(qualifier) {
            continue;
        }
        let before = &head[..start];
        if before.chars().next_back().is_some_and(char::is_alphanumeric) {
            continue;
        }
        let remaining = before.trim_end_matches(|c: char| c == ',' || c.is_whitespace());
        if remaining.is_empty() {
            break;
        }
        return format!("{remaining}{suffix}");
    }
    text.to_owned()
}

fn split_country_suffix(text: &str) -> (&str, &str) {
    let Some(start) = text.len().checked_sub(COUNTRY_SUFFIX.len()) else {
        return (text, "");
    };
    match text.get(start..) {
        Some(tail) if tail.eq_ignore_ascii_case(COUNTRY_SUFFIX) => (&text[..start], tail),
        _ => (text, ""),
    }
}

/// Appends `", {country}"` unless the country is already named, directly
/// or as one of `aliases`, or the text names a place outside it.
///
/// Aliases match whole words only, ignoring case and dots, so `NZ` matches
/// `Auckland, N.Z` but not `Manzanita`.
#[must_use]
pub fn with_default_country(
    text: &str,
    country: Option<&str>,
    aliases: &[String],
    foreign_places: &[String],
) -> String {
    let Some(country) = country.map(str::trim).filter(|c| !c.is_empty()) else {
        return text.to_owned();
    };
    if text.is_empty() {
        return String::new();
    }
    let lower = text.to_lowercase();
    let names_foreign = foreign_places
        .iter()
        .any(|place| !place.is_empty() && lower.contains(&place.to_lowercase()));
    if names_foreign || lower.contains(&country.to_lowercase()) || names_alias(text, aliases) {
        return text.to_owned();
    }
    format!("{text}, {country}")
}

fn names_alias(text: &str, aliases: &[String]) -> bool {
    let aliases: Vec<String> = aliases
        .iter()
        .map(|a| a.replace('.', ""))
        .filter(|a| !a.is_empty())
        .collect();
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(|word| word.replace('.', ""))
        .any(|word| aliases.iter().any(|a| a.eq_ignore_ascii_case(&word)))
}

/// Removes the first whitespace-separated token, then tidies.
#[must_use]
pub fn drop_first_word(text: &str) -> String {
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(end) => tidy(&trimmed[end..]),
        None => String::new(),
    }
}

/// Number of whitespace-separated tokens.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
