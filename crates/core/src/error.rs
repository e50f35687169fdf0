//! Error types for boot-core

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config evaluation error: {0}")]
    Eval(#[from] boot_lua::EvalError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Asset not found upstream: {url}")]
    NotFound { url: String },

    #[error("Transfer failed for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Archive error in '{path}': {message}")]
    Archive { path: PathBuf, message: String },

    #[error("Command '{cmd}' exited with code {code:?}\n{output}")]
    Command {
        cmd: String,
        code: Option<i32>,
        output: String,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
