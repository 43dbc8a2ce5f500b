//! Curated lookup tables injected into the resolution engine and the date
//! normalizer.
//!
//! The shipped set lives in `config/tables.yaml` and is embedded into the
//! binary; `UFONZ_TABLES_PATH` points at a replacement file.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dates::clean_date_text;
use crate::ConfigError;

const BUILTIN_TABLES: &str = include_str!("../../../config/tables.yaml");

/// A substring rewrite applied to a location candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub from: String,
    pub to: String,
}

impl Correction {
    #[must_use]
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionTables {
    #[serde(default)]
    pub corrections: Vec<Correction>,
    #[serde(default)]
    pub foreign_places: Vec<String>,
    /// Other names for the default country, such as `NZ`.
    #[serde(default)]
    pub country_aliases: Vec<String>,
    /// Raw date text → replacement text, or `None` for "no date available".
    #[serde(default)]
    pub date_exceptions: BTreeMap<String, Option<String>>,
}

impl ResolutionTables {
    /// The curated tables compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the embedded YAML fails to parse or validate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_TABLES)
    }

    /// Parse and validate tables from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TablesFileParse`] for malformed YAML and
    /// [`ConfigError::Validation`] for inconsistent entries.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let tables: Self = serde_yaml::from_str(content)?;
        tables.validate()?;
        Ok(tables)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for correction in &self.corrections {
            if correction.from.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "correction key must be non-empty".to_string(),
                ));
            }
            if correction.from == correction.to {
                return Err(ConfigError::Validation(format!(
                    "correction '{}' maps to itself",
                    correction.from
                )));
            }
            if !seen.insert(correction.from.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate correction key: '{}'",
                    correction.from
                )));
            }
        }

        if self.foreign_places.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "foreign place names must be non-empty".to_string(),
            ));
        }

        if self
            .country_aliases
            .iter()
            .any(|a| a.trim().is_empty() || a.contains(char::is_whitespace))
        {
            return Err(ConfigError::Validation(
                "country aliases must be single non-empty words".to_string(),
            ));
        }

        for (raw, replacement) in &self.date_exceptions {
            if raw.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "date exception key must be non-empty".to_string(),
                ));
            }
            // Lookups use the cleaned text, so any other key is unreachable.
            let cleaned = clean_date_text(raw);
            if cleaned != *raw {
                return Err(ConfigError::Validation(format!(
                    "date exception key '{raw}' is not in cleaned form; use '{cleaned}'"
                )));
            }
            if replacement.as_deref() == Some(raw.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "date exception '{raw}' maps to itself"
                )));
            }
        }

        Ok(())
    }
}

/// Load the tables at `path`, or the built-in set when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tables(path: Option<&Path>) -> Result<ResolutionTables, ConfigError> {
    let Some(path) = path else {
        return ResolutionTables::builtin();
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TablesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let tables = ResolutionTables::from_yaml_str(&content)?;
    tracing::debug!(
        path = %path.display(),
        corrections = tables.corrections.len(),
        date_exceptions = tables.date_exceptions.len(),
        "loaded resolution tables"
    );
    Ok(tables)
}
