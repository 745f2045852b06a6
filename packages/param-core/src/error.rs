//! Error types for schema, import, export and backup operations.

use std::fmt;

use thiserror::Error;

/// Errors returned by every fallible operation in this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// File name does not end in a recognized tabular suffix
    #[error("Unsupported file format '{file_name}': expected .csv or .json")]
    UnsupportedFormat { file_name: String },

    /// Tabular or JSON content could not be decoded
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Backup document lacks a mandatory section or is not an object
    #[error("Invalid backup format: {0}")]
    InvalidBackupFormat(String),

    /// Source bytes could not be read or decoded as text
    #[error("Read failure: {0}")]
    ReadFailure(String),

    /// Page not found
    #[error("Page '{page}' not found")]
    PageNotFound { page: String },

    /// Record not found in page
    #[error("Record '{record}' not found in page '{page}'")]
    RecordNotFound { page: String, record: String },

    /// Column list violates key rules
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Page name blank after trimming
    #[error("Page name must not be empty")]
    EmptyPageName,

    /// Current session lacks the required role
    #[error("Permission denied: '{action}' requires an administrator")]
    PermissionDenied { action: &'static str },

    /// Username already taken
    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    /// Username/password pair did not match a user
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Username or password missing on account creation
    #[error("Username and password are both required")]
    IncompleteCredentials,

    /// Lock poisoned (Mutex/RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Stored value failed its checksum or shape check
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Storage device full during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse classification of a [`ParamError`], for user-facing rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    ParseFailure,
    InvalidBackupFormat,
    ReadFailure,
    NotFound,
    Validation,
    Permission,
    Authentication,
    Storage,
    Config,
}

impl ParamError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParamError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ParamError::ParseFailure(_) => ErrorKind::ParseFailure,
            ParamError::InvalidBackupFormat(_) => ErrorKind::InvalidBackupFormat,
            ParamError::ReadFailure(_) => ErrorKind::ReadFailure,
            ParamError::PageNotFound { .. } | ParamError::RecordNotFound { .. } => {
                ErrorKind::NotFound
            }
            ParamError::InvalidSchema(_)
            | ParamError::EmptyPageName
            | ParamError::UserAlreadyExists(_)
            | ParamError::IncompleteCredentials => ErrorKind::Validation,
            ParamError::PermissionDenied { .. } => ErrorKind::Permission,
            ParamError::InvalidCredentials => ErrorKind::Authentication,
            ParamError::LockPoisoned
            | ParamError::SerializationError(_)
            | ParamError::DataCorruption(_)
            | ParamError::DiskFull(_)
            | ParamError::IoError(_)
            | ParamError::TransientIoError(_) => ErrorKind::Storage,
            ParamError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Returns true for the failures an import or restore can raise
    /// before anything is written.
    pub fn is_import_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnsupportedFormat
                | ErrorKind::ParseFailure
                | ErrorKind::InvalidBackupFormat
                | ErrorKind::ReadFailure
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::ParseFailure => "ParseFailure",
            ErrorKind::InvalidBackupFormat => "InvalidBackupFormat",
            ErrorKind::ReadFailure => "ReadFailure",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Validation => "Validation",
            ErrorKind::Permission => "Permission",
            ErrorKind::Authentication => "Authentication",
            ErrorKind::Storage => "Storage",
            ErrorKind::Config => "Config",
        };
        f.write_str(name)
    }
}

impl From<serde_json::Error> for ParamError {
    fn from(err: serde_json::Error) -> Self {
        ParamError::SerializationError(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ParamError>;
