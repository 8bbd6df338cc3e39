//! Configuration management for the tiered routing and response engine.
//!
//! Two layers: process-wide `Settings` (env + optional file, `RECEPT_`
//! prefix) in `settings`, and per-tenant records loaded through a
//! `DocumentStore` implementation in `tenant_loader`.

pub mod settings;
pub mod tenant_loader;

pub use settings::{load_settings, GlobalSettings, ServerSettings, Settings};
pub use tenant_loader::FileDocumentStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
