//! Error Types
//!
//! The main error type [`OrreryError`] covers the failure modes callers can
//! actually observe: duplicate binding registration and malformed animation
//! chunk streams. Recoverable scene-topology inconsistencies (duplicate
//! child names, detaching an unknown child) are deliberately *not* errors;
//! they degrade to a logged warning and a no-op at the call site.

use thiserror::Error;

/// The main error type for the orrery core.
#[derive(Error, Debug)]
pub enum OrreryError {
    // ========================================================================
    // Playback Errors
    // ========================================================================
    /// A binding with the same name is already registered in the group.
    #[error("An animated binding named '{0}' is already registered in this group")]
    DuplicateBinding(String),

    // ========================================================================
    // Chunk Stream Errors
    // ========================================================================
    /// The stream contained a chunk of the wrong type.
    #[error("Unexpected chunk: expected {expected}, found '{found}'")]
    UnexpectedChunk {
        /// The chunk tag the parser was looking for
        expected: &'static str,
        /// The four-character tag that was actually read
        found: String,
    },

    /// A chunk payload was shorter or longer than its field layout requires.
    #[error("Chunk payload for {field} has {actual} bytes, expected {expected}")]
    ChunkSizeMismatch {
        /// The field being parsed when the mismatch was detected
        field: &'static str,
        /// Required payload size in bytes
        expected: usize,
        /// Actual payload size in bytes
        actual: usize,
    },

    /// The track name chunk did not hold valid UTF-8.
    #[error("Track name is not valid UTF-8: {0}")]
    InvalidTrackName(#[from] std::string::FromUtf8Error),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// Underlying stream error (includes truncation as `UnexpectedEof`).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Alias for `Result<T, OrreryError>`.
pub type Result<T> = std::result::Result<T, OrreryError>;
