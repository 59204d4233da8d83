//! Error types for the ledger.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level ledger error
// ---------------------------------------------------------------------------

/// Failures surfaced by [`crate::Ledger`] and its backends.
///
/// Chain integrity problems are not errors: [`crate::verify_chain`] reports
/// them as a [`crate::ChainStatus`] value.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The draft record was rejected before anything was written.
    #[error("invalid ledger record: {0}")]
    InvalidRecord(String),

    /// The SQLite layer failed.
    #[error("ledger storage error")]
    Storage(#[from] rusqlite::Error),

    /// A stored row could not be mapped back to a block.
    #[error("corrupt ledger row at index {index}: {reason}")]
    CorruptRow { index: i64, reason: String },

    /// Canonical serialization failed.
    #[error("ledger serialization error")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Whether the caller supplied bad input, as opposed to storage failing.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidRecord(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
