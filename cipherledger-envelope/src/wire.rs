//! Wire format
//!
//! ```text
//!   algorithm_id[1]
//!   || salt_len[2]  || salt
//!   || nonce_len[2] || nonce
//!   || tag_len[2]   || tag
//!   || ciphertext
//! ```
//!
//! Length prefixes are unsigned 16-bit **little-endian**. Every variable
//! field is explicitly sized, so parsing never guesses.

use crate::error::EnvelopeError;

pub const ALGORITHM_ID_BYTES: usize = 1;
pub const LENGTH_PREFIX_BYTES: usize = 2;

/// Header with three empty fields and no ciphertext.
pub const MIN_ENVELOPE_BYTES: usize = ALGORITHM_ID_BYTES + 3 * LENGTH_PREFIX_BYTES; // 7

/// Borrowed view of a parsed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeParts<'a> {
    pub algorithm_id: u8,
    pub salt: &'a [u8],
    pub nonce: &'a [u8],
    pub tag: &'a [u8],
    pub ciphertext: &'a [u8],
}

impl EnvelopeParts<'_> {
    /// Bytes this envelope occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        MIN_ENVELOPE_BYTES + self.salt.len() + self.nonce.len() + self.tag.len() + self.ciphertext.len()
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

pub fn decode_wire(data: &[u8]) -> Result<EnvelopeParts<'_>, EnvelopeError> {
    let (&algorithm_id, rest) = data
        .split_first()
        .ok_or(EnvelopeError::Malformed("empty envelope"))?;

    let (salt, rest) = take_field(rest, "truncated salt")?;
    let (nonce, rest) = take_field(rest, "truncated nonce")?;
    let (tag, ciphertext) = take_field(rest, "truncated tag")?;

    Ok(EnvelopeParts {
        algorithm_id,
        salt,
        nonce,
        tag,
        ciphertext,
    })
}

/// Split one length-prefixed field off the front of `data`.
fn take_field<'a>(data: &'a [u8], what: &'static str) -> Result<(&'a [u8], &'a [u8]), EnvelopeError> {
    if data.len() < LENGTH_PREFIX_BYTES {
        return Err(EnvelopeError::Malformed(what));
    }
    let (prefix, rest) = data.split_at(LENGTH_PREFIX_BYTES);
    let len = u16::from_le_bytes([prefix[0], prefix[1]]) as usize;
    if len > rest.len() {
        return Err(EnvelopeError::Malformed(what));
    }
    Ok(rest.split_at(len))
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

pub fn encode_wire(
    algorithm_id: u8,
    salt: &[u8],
    nonce: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let salt_len = prefix("salt", salt)?;
    let nonce_len = prefix("nonce", nonce)?;
    let tag_len = prefix("tag", tag)?;

    let mut out = Vec::with_capacity(
        MIN_ENVELOPE_BYTES + salt.len() + nonce.len() + tag.len() + ciphertext.len(),
    );
    out.push(algorithm_id);
    out.extend_from_slice(&salt_len);
    out.extend_from_slice(salt);
    out.extend_from_slice(&nonce_len);
    out.extend_from_slice(nonce);
    out.extend_from_slice(&tag_len);
    out.extend_from_slice(tag);
    out.extend_from_slice(ciphertext);
    Ok(out)
}

fn prefix(field: &'static str, bytes: &[u8]) -> Result<[u8; LENGTH_PREFIX_BYTES], EnvelopeError> {
    u16::try_from(bytes.len())
        .map(u16::to_le_bytes)
        .map_err(|_| EnvelopeError::FieldTooLong {
            field,
            len: bytes.len(),
        })
}
