//! Crate error type.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors returned by fallible entry points.
///
/// Schedule quality problems (missing mandatory seats, capacity overflow) are
/// not errors; they are reported through the result stats.
#[derive(Debug, Error)]
pub enum AgendaError {
    /// The input failed structural validation.
    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::config::AgendaConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".into(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}
