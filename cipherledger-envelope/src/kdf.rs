//! KDF
//!
//! key = PBKDF2-HMAC-SHA256(passphrase, salt[16], rounds = 200_000, len = 32)

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::EnvelopeError;

pub const SALT_BYTES: usize = 16;
pub const KEY_BYTES: usize = 32;
pub const PBKDF2_ROUNDS: u32 = 200_000;

/// Generate a fresh random salt. Used during encryption only.
pub fn salt() -> Result<[u8; SALT_BYTES], EnvelopeError> {
    let mut s = [0u8; SALT_BYTES];
    getrandom::getrandom(&mut s).map_err(|_| EnvelopeError::RandomSource)?;
    Ok(s)
}

/// Stretch a passphrase into a 32-byte key.
///
/// The salt is taken as a slice so envelopes written with a non-standard
/// salt length still rederive the key they were sealed under.
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_BYTES]> {
    let mut key = Zeroizing::new([0u8; KEY_BYTES]);
    pbkdf2_hmac::<Sha256>(passphrase, salt, PBKDF2_ROUNDS, key.as_mut());
    key
}
