//! Error types for salesboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown task, bad config)
//! - 3: Edit rejected by the editing guard
//! - 4: Operation failed (bootstrap, IO, HTTP)

use thiserror::Error;

/// Exit codes for the salesboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const EDIT_REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for salesboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Guard rejections (exit code 3)
    #[error("Edit rejected: {0}")]
    EditRejected(String),

    // Operation failures (exit code 4)
    #[error("Failed to load tasks: {0}")]
    LoadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::TaskNotFound(_) => {
                exit_codes::USER_ERROR
            }

            Error::EditRejected(_) => exit_codes::EDIT_REJECTED,

            Error::LoadFailed(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::Http(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for salesboard operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Structured details attached to machine-readable error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            _ => None,
        }
    }
}
