//! Algorithm registry: names, on-wire ids and per-variant sizes.

use core::fmt;
use core::str::FromStr;

use crate::error::EnvelopeError;

/// One of the three interchangeable AEAD variants.
///
/// The on-wire id is stable; never renumber a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Aes256Gcm,
    Blowfish256Eax,
    ChaCha20Poly1305,
}

impl Algorithm {
    /// Every variant, in id order.
    pub const ALL: [Algorithm; 3] = [
        Algorithm::Aes256Gcm,
        Algorithm::Blowfish256Eax,
        Algorithm::ChaCha20Poly1305,
    ];

    /// Display name, as recorded in the ledger.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Aes256Gcm => "AES-256-GCM",
            Algorithm::Blowfish256Eax => "Blowfish-256-EAX",
            Algorithm::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }

    /// Header byte identifying this variant.
    pub fn id(&self) -> u8 {
        match self {
            Algorithm::Aes256Gcm => 1,
            Algorithm::Blowfish256Eax => 2,
            Algorithm::ChaCha20Poly1305 => 3,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, EnvelopeError> {
        match id {
            1 => Ok(Algorithm::Aes256Gcm),
            2 => Ok(Algorithm::Blowfish256Eax),
            3 => Ok(Algorithm::ChaCha20Poly1305),
            other => Err(EnvelopeError::UnknownAlgorithmId(other)),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, EnvelopeError> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| EnvelopeError::UnsupportedAlgorithm(name.to_string()))
    }

    /// Nonce length produced at encryption time.
    pub fn nonce_len(&self) -> usize {
        match self {
            Algorithm::Aes256Gcm => crate::aead::GCM_NONCE_BYTES,
            Algorithm::Blowfish256Eax => crate::eax::NONCE_BYTES,
            Algorithm::ChaCha20Poly1305 => crate::aead::CHACHA_NONCE_BYTES,
        }
    }

    /// Detached tag length.
    pub fn tag_len(&self) -> usize {
        match self {
            Algorithm::Aes256Gcm | Algorithm::ChaCha20Poly1305 => crate::aead::TAG_BYTES,
            Algorithm::Blowfish256Eax => crate::eax::TAG_BYTES,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
