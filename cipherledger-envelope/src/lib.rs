//! # cipherledger-envelope
//!
//! Passphrase-based file encryption into a self-describing envelope.
//!
//! ## Quick Start
//!
//! ```rust
//! use cipherledger_envelope::{decrypt_file, encrypt_file};
//!
//! let sealed = encrypt_file(b"hello", b"pw", "AES-256-GCM").unwrap();
//! let opened = decrypt_file(&sealed.envelope, b"pw").unwrap();
//!
//! assert_eq!(opened.plaintext, b"hello");
//! assert_eq!(opened.algorithm.name(), "AES-256-GCM");
//! ```
//!
//! ## Construction
//!
//! - **KDF**: PBKDF2-HMAC-SHA256, 200 000 rounds, 16-byte random salt
//! - **AEAD**: AES-256-GCM, Blowfish-EAX (256-bit key) or ChaCha20-Poly1305
//! - **Uniform errors**: every tag mismatch is [`EnvelopeError::AuthenticationFailure`]
//! - **Wire format**: algorithm id, then little-endian length-prefixed salt,
//!   nonce and tag, then ciphertext (see [`wire`])
//!
//! ## What's NOT Provided
//!
//! - Streaming encryption (the whole file is held in memory)
//! - Passphrase policy (an empty passphrase is accepted here)

#![deny(unsafe_code)]

mod aead;
mod algorithm;
mod eax;
mod error;
pub mod kdf;
pub mod wire;

use std::time::Instant;

use sha2::{Digest, Sha256};

pub use algorithm::Algorithm;
pub use error::{EnvelopeError, Result};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Output of a successful encryption.
#[derive(Debug, Clone)]
pub struct Encrypted {
    /// Complete wire envelope.
    pub envelope: Vec<u8>,
    /// Milliseconds spent in key derivation and the cipher.
    pub enc_millis: f64,
    /// Lowercase hex SHA-256 of the plaintext. A content id, not a MAC.
    pub file_hash: String,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub algorithm: Algorithm,
}

/// Output of a successful decryption.
#[derive(Debug, Clone)]
pub struct Decrypted {
    pub plaintext: Vec<u8>,
    /// Milliseconds spent in key derivation and the cipher.
    pub dec_millis: f64,
    pub algorithm: Algorithm,
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

/// Encrypt under the algorithm named `algorithm_name`.
///
/// Fails with [`EnvelopeError::UnsupportedAlgorithm`] for any name other
/// than the three listed in [`Algorithm::ALL`].
pub fn encrypt_file(data: &[u8], passphrase: &[u8], algorithm_name: &str) -> Result<Encrypted> {
    encrypt(data, passphrase, Algorithm::from_name(algorithm_name)?)
}

/// Encrypt with a fresh random salt and nonce.
pub fn encrypt(data: &[u8], passphrase: &[u8], algorithm: Algorithm) -> Result<Encrypted> {
    let salt = kdf::salt()?;
    let nonce = match algorithm {
        Algorithm::Blowfish256Eax => None,
        other => Some(aead::nonce(other.nonce_len())?),
    };
    seal(data, passphrase, algorithm, &salt, nonce)
}

/// Encrypt with caller-chosen salt and nonce. Known-answer tests only.
#[cfg(feature = "kat")]
pub fn encrypt_with_parts(
    data: &[u8],
    passphrase: &[u8],
    algorithm: Algorithm,
    salt: &[u8],
    nonce: &[u8],
) -> Result<Encrypted> {
    seal(data, passphrase, algorithm, salt, Some(nonce.to_vec()))
}

fn seal(
    data: &[u8],
    passphrase: &[u8],
    algorithm: Algorithm,
    salt: &[u8],
    nonce: Option<Vec<u8>>,
) -> Result<Encrypted> {
    let started = Instant::now();
    let key = kdf::derive_key(passphrase, salt);
    let (nonce, ciphertext, tag) = match (algorithm, nonce) {
        (Algorithm::Blowfish256Eax, None) => eax::seal(&key, data)?,
        (Algorithm::Blowfish256Eax, Some(n)) => {
            let (ct, tag) = eax::seal_with_nonce(&key, &n, data)?;
            (n, ct, tag)
        }
        (Algorithm::Aes256Gcm, n) => {
            let n = n.ok_or(EnvelopeError::Malformed("missing nonce"))?;
            let (ct, tag) = aead::gcm_seal(&key, &n, data)?;
            (n, ct, tag)
        }
        (Algorithm::ChaCha20Poly1305, n) => {
            let n = n.ok_or(EnvelopeError::Malformed("missing nonce"))?;
            let (ct, tag) = aead::chacha_seal(&key, &n, data)?;
            (n, ct, tag)
        }
    };
    let enc_millis = elapsed_millis(started);

    let envelope = wire::encode_wire(algorithm.id(), salt, &nonce, &tag, &ciphertext)?;

    Ok(Encrypted {
        envelope,
        enc_millis,
        file_hash: sha256_hex(data),
        salt: salt.to_vec(),
        nonce,
        tag,
        algorithm,
    })
}

/// Parse, rederive the key and authenticate-then-decrypt.
pub fn decrypt_file(envelope: &[u8], passphrase: &[u8]) -> Result<Decrypted> {
    let first = *envelope
        .first()
        .ok_or(EnvelopeError::Malformed("empty envelope"))?;
    let algorithm = Algorithm::from_id(first)?;
    let parts = wire::decode_wire(envelope)?;

    let started = Instant::now();
    let key = kdf::derive_key(passphrase, parts.salt);
    let plaintext = match algorithm {
        Algorithm::Aes256Gcm => aead::gcm_open(&key, parts.nonce, parts.ciphertext, parts.tag)?,
        Algorithm::Blowfish256Eax => eax::open(&key, parts.nonce, parts.ciphertext, parts.tag)?,
        Algorithm::ChaCha20Poly1305 => {
            aead::chacha_open(&key, parts.nonce, parts.ciphertext, parts.tag)?
        }
    };
    let dec_millis = elapsed_millis(started);

    Ok(Decrypted {
        plaintext,
        dec_millis,
        algorithm,
    })
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn elapsed_millis(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Header metadata, readable without the passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub algorithm: Algorithm,
    pub salt_len: usize,
    pub nonce_len: usize,
    pub tag_len: usize,
    pub ciphertext_len: usize,
    pub total_len: usize,
}

impl core::fmt::Display for EnvelopeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} | salt {} | nonce {} | tag {} | {} bytes ({} ciphertext)",
            self.algorithm,
            self.salt_len,
            self.nonce_len,
            self.tag_len,
            self.total_len,
            self.ciphertext_len
        )
    }
}

/// Inspect envelope metadata without decrypting.
pub fn inspect(envelope: &[u8]) -> Result<EnvelopeInfo> {
    let parts = wire::decode_wire(envelope)?;
    let algorithm = Algorithm::from_id(parts.algorithm_id)?;
    Ok(EnvelopeInfo {
        algorithm,
        salt_len: parts.salt.len(),
        nonce_len: parts.nonce.len(),
        tag_len: parts.tag.len(),
        ciphertext_len: parts.ciphertext.len(),
        total_len: envelope.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_scenario() {
        let sealed = encrypt_file(b"hello", b"pw", "AES-256-GCM").unwrap();
        assert_eq!(sealed.envelope[0], 1);

        let parts = wire::decode_wire(&sealed.envelope).unwrap();
        assert_eq!(parts.salt.len(), kdf::SALT_BYTES);
        assert_eq!(parts.ciphertext.len(), 5);

        let opened = decrypt_file(&sealed.envelope, b"pw").unwrap();
        assert_eq!(opened.plaintext, b"hello");
        assert_eq!(opened.algorithm.name(), "AES-256-GCM");

        assert_eq!(
            decrypt_file(&sealed.envelope, b"wrong").unwrap_err(),
            EnvelopeError::AuthenticationFailure
        );
    }

    #[test]
    fn file_hash_is_plaintext_sha256() {
        let sealed = encrypt_file(b"abc", b"pw", "ChaCha20-Poly1305").unwrap();
        assert_eq!(
            sealed.file_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn returned_parts_match_envelope() {
        for alg in Algorithm::ALL {
            let sealed = encrypt(b"payload", b"pw", alg).unwrap();
            let parts = wire::decode_wire(&sealed.envelope).unwrap();
            assert_eq!(parts.salt, sealed.salt.as_slice());
            assert_eq!(parts.nonce, sealed.nonce.as_slice());
            assert_eq!(parts.tag, sealed.tag.as_slice());
            assert_eq!(parts.nonce.len(), alg.nonce_len());
            assert_eq!(parts.tag.len(), alg.tag_len());
            assert!(sealed.enc_millis >= 0.0);
        }
    }

    #[test]
    fn unsupported_name_is_rejected() {
        assert_eq!(
            encrypt_file(b"x", b"pw", "DES").unwrap_err(),
            EnvelopeError::UnsupportedAlgorithm("DES".into())
        );
    }

    #[test]
    fn unknown_id_wins_over_parse_errors() {
        assert_eq!(
            decrypt_file(&[7], b"pw").unwrap_err(),
            EnvelopeError::UnknownAlgorithmId(7)
        );
    }

    #[test]
    fn inspect_reports_layout() {
        let sealed = encrypt_file(b"twelve bytes", b"pw", "Blowfish-256-EAX").unwrap();
        let info = inspect(&sealed.envelope).unwrap();
        assert_eq!(info.algorithm, Algorithm::Blowfish256Eax);
        assert_eq!(info.salt_len, 16);
        assert_eq!(info.nonce_len, 16);
        assert_eq!(info.tag_len, 8);
        assert_eq!(info.ciphertext_len, 12);
        assert_eq!(info.total_len, sealed.envelope.len());
        assert!(info.to_string().starts_with("Blowfish-256-EAX"));
    }
}
