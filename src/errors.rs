//! Error types for the pabook application.
//!
//! Bad input, storage failures and configuration problems each get their own
//! variants so the CLI can tell them apart. Lookups that miss and adds that
//! collide are not errors; they come back as [`crate::Status`] values.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the pabook application.
#[derive(Error, Debug)]
pub enum PaError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Phone number does not match the accepted national format.
    #[error("Invalid phone number: {value}. Expected format: +380XXXXXXXXX or 0XXXXXXXXX")]
    InvalidPhoneNumber { value: String },

    /// Email address is empty or malformed.
    #[error("Invalid email address: {value}. Expected format: example@domain.com")]
    InvalidEmail { value: String },

    /// Birthday is not a DD.MM.YYYY date or lies in the future.
    #[error("Invalid birthday: {value}. {reason}")]
    InvalidBirthday { value: String, reason: String },

    /// A mandatory text field was left empty.
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    /// Note failed the title/content/contact checks.
    #[error("Invalid note: {message}")]
    InvalidNote { message: String },

    /// Search query or tag argument was blank.
    #[error("Search {what} cannot be empty")]
    EmptyQuery { what: &'static str },

    /// Sort order other than `asc` or `desc`.
    #[error("Invalid sort order: {value}. Must be one of: asc, desc")]
    InvalidSortOrder { value: String },

    /// A stored record could not be turned into a typed value.
    #[error("Invalid {kind} record: {message}")]
    InvalidRecord { kind: &'static str, message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    #[error("{message}")]
    EditorError { message: String },
}
