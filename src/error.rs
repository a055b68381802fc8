// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DorkHuntError {
    #[error("Target must not be empty")]
    EmptyTarget,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    #[error("Invalid URL template for engine {engine}: {template}")]
    InvalidTemplate {
        engine: String,
        template: String,
    },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("File error: {path:?} - {message}")]
    FileError {
        path: PathBuf,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Notification error: {0}")]
    NotifyError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<anyhow::Error> for DorkHuntError {
    fn from(error: anyhow::Error) -> Self {
        DorkHuntError::UnexpectedError(error.to_string())
    }
}

pub type DorkHuntResult<T> = std::result::Result<T, DorkHuntError>;
