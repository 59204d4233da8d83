//! EAX mode over Blowfish.
//!
//! The `eax` crate only accepts 128-bit block ciphers, so the mode is
//! composed here from CMAC and a CTR keystream over the 64-bit Blowfish block:
//!
//! ```text
//! N' = OMAC_0(nonce)        OMAC_t(m) = CMAC(K, [0; 7] || t || m)
//! H' = OMAC_1(header)       header is always empty
//! C  = CTR_N'(M)            full-block big-endian counter starting at N'
//! T  = N' ^ H' ^ OMAC_2(C)
//! ```

use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockEncrypt, KeyInit};
use blowfish::Blowfish;
use cmac::{Cmac, Mac};
use subtle::ConstantTimeEq;

use crate::error::EnvelopeError;
use crate::kdf::KEY_BYTES;

pub const BLOCK_BYTES: usize = 8;
/// Nonce length generated at encryption time.
pub const NONCE_BYTES: usize = 16;
/// Full-block tag.
pub const TAG_BYTES: usize = BLOCK_BYTES;

type Block = [u8; BLOCK_BYTES];

/// Seal under a freshly generated nonce. Returns (nonce, ciphertext, tag).
pub fn seal(
    key: &[u8; KEY_BYTES],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), EnvelopeError> {
    let nonce = crate::aead::nonce(NONCE_BYTES)?;
    let (ciphertext, tag) = seal_with_nonce(key, &nonce, plaintext)?;
    Ok((nonce, ciphertext, tag))
}

pub(crate) fn seal_with_nonce(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), EnvelopeError> {
    if nonce.is_empty() {
        return Err(EnvelopeError::Malformed("EAX nonce must not be empty"));
    }
    let cipher = Blowfish::new_from_slice(key).map_err(|_| EnvelopeError::Encryption)?;
    let n = omac(key, 0, nonce).map_err(|_| EnvelopeError::Encryption)?;
    let h = omac(key, 1, b"").map_err(|_| EnvelopeError::Encryption)?;

    let mut ciphertext = plaintext.to_vec();
    apply_keystream(&cipher, &n, &mut ciphertext);

    let c = omac(key, 2, &ciphertext).map_err(|_| EnvelopeError::Encryption)?;
    Ok((ciphertext, combine(&n, &h, &c).to_vec()))
}

/// Verify the tag, then decrypt.
pub fn open(
    key: &[u8; KEY_BYTES],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    if nonce.is_empty() {
        return Err(EnvelopeError::Malformed("EAX nonce must not be empty"));
    }
    if tag.len() != TAG_BYTES {
        return Err(EnvelopeError::Malformed("tag has the wrong length"));
    }
    let cipher = Blowfish::new_from_slice(key).map_err(|_| EnvelopeError::AuthenticationFailure)?;
    let n = omac(key, 0, nonce)?;
    let h = omac(key, 1, b"")?;
    let c = omac(key, 2, ciphertext)?;

    let expected = combine(&n, &h, &c);
    if !bool::from(expected.ct_eq(tag)) {
        return Err(EnvelopeError::AuthenticationFailure);
    }

    let mut plaintext = ciphertext.to_vec();
    apply_keystream(&cipher, &n, &mut plaintext);
    Ok(plaintext)
}

/// CMAC with the EAX domain tweak block prepended.
fn omac(key: &[u8], tweak: u8, data: &[u8]) -> Result<Block, EnvelopeError> {
    let mut mac = <Cmac<Blowfish> as Mac>::new_from_slice(key)
        .map_err(|_| EnvelopeError::AuthenticationFailure)?;
    let mut prefix = [0u8; BLOCK_BYTES];
    prefix[BLOCK_BYTES - 1] = tweak;
    mac.update(&prefix);
    mac.update(data);

    let mut out = [0u8; BLOCK_BYTES];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn combine(n: &Block, h: &Block, c: &Block) -> Block {
    let mut tag = [0u8; BLOCK_BYTES];
    for i in 0..BLOCK_BYTES {
        tag[i] = n[i] ^ h[i] ^ c[i];
    }
    tag
}

/// XOR `data` with the CTR keystream seeded by `initial`.
fn apply_keystream(cipher: &Blowfish, initial: &Block, data: &mut [u8]) {
    let mut counter = u64::from_be_bytes(*initial);
    for chunk in data.chunks_mut(BLOCK_BYTES) {
        let mut block = GenericArray::from(counter.to_be_bytes());
        cipher.encrypt_block(&mut block);
        for (byte, k) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= k;
        }
        counter = counter.wrapping_add(1);
    }
}
