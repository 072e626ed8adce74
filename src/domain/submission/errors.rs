//! Submission Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Please choose an audio file first.")]
    MissingFile,

    #[error("Target minutes must be between {min} and {max}, got {value}")]
    InvalidTargetMinutes { value: u32, min: u32, max: u32 },

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Cannot read audio file {path}: {reason}")]
    FileRead { path: String, reason: String },
}
