//! Application-level errors for the vault and CLI.

use std::io;
use std::path::PathBuf;

use cipherledger_envelope::EnvelopeError;
use cipherledger_ledger::LedgerError;
use thiserror::Error;

/// Coarse failure class, for callers that branch on the kind of problem
/// rather than its details (exit codes, retry decisions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad passphrase, algorithm name, envelope bytes, file name or size.
    Input,
    /// The AEAD tag did not verify.
    Authentication,
    /// The envelope names an algorithm id this build does not know.
    UnknownAlgorithmId,
    /// Ledger or file I/O failed.
    Storage,
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("passphrase must not be empty")]
    EmptyPassphrase,

    #[error("file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("passphrase unavailable: {0}")]
    PassphraseUnavailable(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl VaultError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPassphrase
            | Self::FileTooLarge { .. }
            | Self::InvalidFileName(_)
            | Self::PassphraseUnavailable(_) => ErrorKind::Input,
            Self::Envelope(EnvelopeError::AuthenticationFailure) => ErrorKind::Authentication,
            Self::Envelope(EnvelopeError::UnknownAlgorithmId(_)) => ErrorKind::UnknownAlgorithmId,
            Self::Envelope(e) if e.is_input_error() => ErrorKind::Input,
            Self::Envelope(_) => ErrorKind::Storage,
            Self::Ledger(e) if e.is_input_error() => ErrorKind::Input,
            Self::Ledger(_) | Self::Io { .. } => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
