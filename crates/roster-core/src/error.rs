use thiserror::Error;

/// Top-level error type for loading roster configuration.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{var} not set")]
    MissingEnv { var: &'static str },

    #[error("{var} is not valid unicode")]
    NotUnicode { var: String },
}

pub type Result<T> = std::result::Result<T, RosterError>;
