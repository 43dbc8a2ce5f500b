pub mod app_config;
pub mod config;
pub mod dates;
pub mod error;
pub mod tables;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use dates::{clean_date_text, parse_date_text, DateNormalizer};
pub use error::{ConfigError, DateError};
pub use tables::{load_tables, Correction, ResolutionTables};
