//! Error types for Tallyspin

use thiserror::Error;

/// Main error type for Tallyspin operations
///
/// Nothing in the widget treats these as fatal: increment and playback
/// failures are logged and dropped, never surfaced through the UI.
#[derive(Error, Debug)]
pub enum TallyError {
    /// The store client rejected or could not complete an operation
    #[error("Store error: {0}")]
    Store(String),

    /// An optimistic transaction kept colliding with concurrent commits
    #[error("Transaction contention: gave up after {attempts} attempts")]
    TransactionContention {
        /// How many read-modify-write attempts were made before giving up
        attempts: u32,
    },

    /// An audio track could not start playback
    #[error("Playback error: {0}")]
    Playback(String),

    /// A document payload did not deserialize into the expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using TallyError
pub type TallyResult<T> = Result<T, TallyError>;
