//! AEAD: AES-256-GCM and ChaCha20-Poly1305 with detached tags.

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{consts::U16, AeadCore, AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{Aes256Gcm, AesGcm};
use chacha20poly1305::ChaCha20Poly1305;

use crate::error::EnvelopeError;
use crate::kdf::KEY_BYTES;

pub const GCM_NONCE_BYTES: usize = 12;
/// Nonce length written by older encoders; still accepted on decrypt.
pub const GCM_LEGACY_NONCE_BYTES: usize = 16;
pub const CHACHA_NONCE_BYTES: usize = 12;
pub const TAG_BYTES: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Generate a random nonce of `len` bytes. Used during encryption only.
pub fn nonce(len: usize) -> Result<Vec<u8>, EnvelopeError> {
    let mut n = vec![0u8; len];
    getrandom::getrandom(&mut n).map_err(|_| EnvelopeError::RandomSource)?;
    Ok(n)
}

pub fn gcm_seal(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), EnvelopeError> {
    match nonce.len() {
        GCM_NONCE_BYTES => seal_detached::<Aes256Gcm>(key, nonce, plaintext),
        GCM_LEGACY_NONCE_BYTES => seal_detached::<Aes256Gcm16>(key, nonce, plaintext),
        _ => Err(EnvelopeError::Malformed("AES-256-GCM nonce must be 12 or 16 bytes")),
    }
}

pub fn gcm_open(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    match nonce.len() {
        GCM_NONCE_BYTES => open_detached::<Aes256Gcm>(key, nonce, ciphertext, tag),
        GCM_LEGACY_NONCE_BYTES => open_detached::<Aes256Gcm16>(key, nonce, ciphertext, tag),
        _ => Err(EnvelopeError::Malformed("AES-256-GCM nonce must be 12 or 16 bytes")),
    }
}

pub fn chacha_seal(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), EnvelopeError> {
    seal_detached::<ChaCha20Poly1305>(key, nonce, plaintext)
}

pub fn chacha_open(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    open_detached::<ChaCha20Poly1305>(key, nonce, ciphertext, tag)
}

/// Encrypt in place and split off the tag. Returns (ciphertext, tag).
fn seal_detached<C>(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), EnvelopeError>
where
    C: KeyInit + AeadInPlace,
{
    if nonce.len() != <C as AeadCore>::NonceSize::USIZE {
        return Err(EnvelopeError::Malformed("nonce has the wrong length"));
    }
    let cipher = C::new_from_slice(key).map_err(|_| EnvelopeError::Encryption)?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(nonce), b"", &mut buffer)
        .map_err(|_| EnvelopeError::Encryption)?;
    Ok((buffer, tag.to_vec()))
}

/// Verify the tag and decrypt. Any verification failure is uniform.
fn open_detached<C>(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, EnvelopeError>
where
    C: KeyInit + AeadInPlace,
{
    if nonce.len() != <C as AeadCore>::NonceSize::USIZE {
        return Err(EnvelopeError::Malformed("nonce has the wrong length"));
    }
    if tag.len() != <C as AeadCore>::TagSize::USIZE {
        return Err(EnvelopeError::Malformed("tag has the wrong length"));
    }
    let cipher = C::new_from_slice(key).map_err(|_| EnvelopeError::AuthenticationFailure)?;
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            b"",
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| EnvelopeError::AuthenticationFailure)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; KEY_BYTES] = [0x11; KEY_BYTES];

    #[test]
    fn gcm_preserves_length_and_detaches_tag() {
        let n = nonce(GCM_NONCE_BYTES).unwrap();
        let (ct, tag) = gcm_seal(&KEY, &n, b"hello").unwrap();
        assert_eq!(ct.len(), 5);
        assert_eq!(tag.len(), TAG_BYTES);
        assert_eq!(gcm_open(&KEY, &n, &ct, &tag).unwrap(), b"hello");
    }

    #[test]
    fn gcm_accepts_legacy_nonce_length() {
        let n = nonce(GCM_LEGACY_NONCE_BYTES).unwrap();
        let (ct, tag) = gcm_seal(&KEY, &n, b"legacy").unwrap();
        assert_eq!(gcm_open(&KEY, &n, &ct, &tag).unwrap(), b"legacy");
    }

    #[test]
    fn gcm_rejects_odd_nonce_length() {
        assert!(matches!(
            gcm_open(&KEY, &[0u8; 8], b"x", &[0u8; TAG_BYTES]),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn chacha_roundtrip_and_wrong_key() {
        let n = nonce(CHACHA_NONCE_BYTES).unwrap();
        let (ct, tag) = chacha_seal(&KEY, &n, b"data").unwrap();
        assert_eq!(chacha_open(&KEY, &n, &ct, &tag).unwrap(), b"data");
        assert_eq!(
            chacha_open(&[0x22; KEY_BYTES], &n, &ct, &tag),
            Err(EnvelopeError::AuthenticationFailure)
        );
    }

    #[test]
    fn short_tag_is_malformed_not_a_panic() {
        let n = nonce(CHACHA_NONCE_BYTES).unwrap();
        assert!(matches!(
            chacha_open(&KEY, &n, b"data", &[0u8; 4]),
            Err(EnvelopeError::Malformed(_))
        ));
    }
}
