use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read resolution tables at {path}: {source}")]
    TablesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse resolution tables: {0}")]
    TablesFileParse(#[from] serde_yaml::Error),

    #[error("resolution tables validation failed: {0}")]
    Validation(String),
}

/// Failures of [`crate::DateNormalizer::normalize`].
///
/// Both variants mean the curated exception table needs a new entry; neither
/// is the same thing as "no date available".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("unrecognised date \"{raw}\": add an entry to date_exceptions")]
    Unrecognised { raw: String },

    #[error("date exception for \"{raw}\" maps to \"{replacement}\", which does not parse")]
    UnparseableReplacement { raw: String, replacement: String },
}
