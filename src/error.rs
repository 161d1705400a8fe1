//! Error types for the command engine.
//!
//! [`EngineError`] covers registration and dispatch. [`ConfigError`] covers
//! loading the shell configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::tokenizer::TokenizeError;

/// Error returned by [`Engine`](crate::engine::Engine) operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A command with this name is already registered.
    #[error("command \"{0}\" already registered")]
    AlreadyRegistered(String),

    /// Command names must be non-empty.
    #[error("command name must not be empty")]
    InvalidName,

    /// No command with this name is registered.
    #[error("command \"{0}\" not registered")]
    NotRegistered(String),

    /// The argument vector was empty.
    #[error("empty command")]
    EmptyCommand,

    /// The first argument does not name a registered command.
    #[error("command \"{0}\" not found")]
    CommandNotFound(String),

    /// The caller's level is below the command's minimum.
    #[error("command \"{command}\" requires level {required}, caller has {level}")]
    InsufficientPrivilege {
        command: String,
        level: i32,
        required: i32,
    },

    /// The raw command line could not be tokenized.
    #[error(transparent)]
    Syntax(#[from] TokenizeError),

    /// Error returned by the handler itself, passed through untouched.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl EngineError {
    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered(_) | Self::InvalidName | Self::NotRegistered(_) => {
                "Registration Error"
            }
            Self::EmptyCommand | Self::CommandNotFound(_) => "Dispatch Error",
            Self::InsufficientPrivilege { .. } => "Permission Error",
            Self::Syntax(_) => "Syntax Error",
            Self::Handler(_) => "Command Error",
        }
    }

    /// Returns the handler's error if this came from the handler.
    pub fn as_handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error in {}:\n  {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
