//! Unified error type for cipherledger envelopes.

use thiserror::Error;

/// Everything that can go wrong while sealing or opening an envelope.
///
/// Tag mismatches are deliberately collapsed into a single
/// [`EnvelopeError::AuthenticationFailure`]: a wrong passphrase, a flipped
/// ciphertext byte and a corrupted tag all look the same to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The algorithm name is not one of the supported variants.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The first envelope byte does not map to a known variant.
    #[error("unknown algorithm id: {0}")]
    UnknownAlgorithmId(u8),

    /// The envelope header cannot be parsed.
    #[error("malformed envelope: {0}")]
    Malformed(&'static str),

    /// The AEAD tag did not verify.
    #[error("decryption failed: wrong passphrase or corrupted data")]
    AuthenticationFailure,

    /// A header field does not fit its 16-bit length prefix.
    #[error("{field} is too long for the envelope header ({len} bytes)")]
    FieldTooLong { field: &'static str, len: usize },

    /// The operating system random source failed.
    #[error("secure random source unavailable")]
    RandomSource,

    /// The cipher rejected its inputs while sealing.
    #[error("encryption failed")]
    Encryption,
}

impl EnvelopeError {
    /// Whether the failure is attributable to caller input rather than to
    /// authentication or the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAlgorithm(_) | Self::Malformed(_) | Self::FieldTooLong { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
