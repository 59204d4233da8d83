//! Core types: Block, NewBlock and the hashed view of a block.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use cipherledger_envelope::{Algorithm, Encrypted};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical;
use crate::error::{LedgerError, Result};

/// `prev_hash` of the genesis block.
pub const GENESIS_PREV_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// `dec_time_ms` of a block whose file has not been decrypted yet.
pub const DEC_TIME_UNSET: f64 = 0.0;

// ---------------------------------------------------------------------------
// Stored block
// ---------------------------------------------------------------------------

/// One ledger entry, exactly as persisted.
///
/// Immutable once appended, except `dec_time_ms`, which moves once from
/// [`DEC_TIME_UNSET`] to a measured value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// RFC 3339 UTC.
    pub timestamp: String,
    pub prev_hash: String,
    pub tx_hash: String,
    pub algorithm: String,
    pub file_name: String,
    /// SHA-256 of the plaintext, lowercase hex.
    pub file_hash: String,
    pub ciphertext_path: String,
    pub nonce_b64: String,
    pub tag_b64: String,
    pub salt_b64: String,
    pub file_size_bytes: u64,
    pub enc_time_ms: f64,
    pub dec_time_ms: f64,
}

/// Every field except `tx_hash`, in key-sorted order.
#[derive(Serialize)]
struct HashedFields<'a> {
    algorithm: &'a str,
    ciphertext_path: &'a str,
    dec_time_ms: f64,
    enc_time_ms: f64,
    file_hash: &'a str,
    file_name: &'a str,
    file_size_bytes: u64,
    index: u64,
    nonce_b64: &'a str,
    prev_hash: &'a str,
    salt_b64: &'a str,
    tag_b64: &'a str,
    timestamp: &'a str,
}

impl Block {
    /// Build the successor of `prev` (or the genesis block) from `draft`.
    pub fn next(prev: Option<&Block>, draft: &NewBlock, timestamp: String) -> Result<Block> {
        let (index, prev_hash) = match prev {
            Some(p) => (p.index + 1, p.tx_hash.clone()),
            None => (0, GENESIS_PREV_HASH.to_string()),
        };

        let mut block = Block {
            index,
            timestamp,
            prev_hash,
            tx_hash: String::new(),
            algorithm: draft.algorithm.name().to_string(),
            file_name: draft.file_name.clone(),
            file_hash: draft.file_hash.clone(),
            ciphertext_path: draft.ciphertext_path.clone(),
            nonce_b64: BASE64.encode(&draft.nonce),
            tag_b64: BASE64.encode(&draft.tag),
            salt_b64: BASE64.encode(&draft.salt),
            file_size_bytes: draft.file_size_bytes,
            enc_time_ms: draft.enc_time_ms,
            dec_time_ms: draft.dec_time_ms.unwrap_or(DEC_TIME_UNSET),
        };
        block.tx_hash = block.compute_hash()?;
        Ok(block)
    }

    /// SHA-256 over the canonical serialization of every field but `tx_hash`.
    pub fn compute_hash(&self) -> Result<String> {
        self.hash_with_dec_time(self.dec_time_ms)
    }

    /// As [`Block::compute_hash`], substituting `dec_time_ms`.
    pub fn hash_with_dec_time(&self, dec_time_ms: f64) -> Result<String> {
        let fields = HashedFields {
            algorithm: &self.algorithm,
            ciphertext_path: &self.ciphertext_path,
            dec_time_ms,
            enc_time_ms: self.enc_time_ms,
            file_hash: &self.file_hash,
            file_name: &self.file_name,
            file_size_bytes: self.file_size_bytes,
            index: self.index,
            nonce_b64: &self.nonce_b64,
            prev_hash: &self.prev_hash,
            salt_b64: &self.salt_b64,
            tag_b64: &self.tag_b64,
            timestamp: &self.timestamp,
        };
        let bytes = canonical::to_vec(&fields)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    pub fn is_decrypted(&self) -> bool {
        self.dec_time_ms != DEC_TIME_UNSET
    }
}

// ---------------------------------------------------------------------------
// Draft block
// ---------------------------------------------------------------------------

/// Caller-supplied part of a block. Index, timestamp and hashes are
/// assigned by the ledger at append time.
#[derive(Clone, Debug, PartialEq)]
pub struct NewBlock {
    pub algorithm: Algorithm,
    pub file_name: String,
    pub file_hash: String,
    pub ciphertext_path: String,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub salt: Vec<u8>,
    pub file_size_bytes: u64,
    pub enc_time_ms: f64,
    /// `None` records [`DEC_TIME_UNSET`].
    pub dec_time_ms: Option<f64>,
}

impl NewBlock {
    /// Draft for a fresh encryption result.
    pub fn from_encrypted(
        sealed: &Encrypted,
        file_name: impl Into<String>,
        ciphertext_path: impl Into<String>,
        file_size_bytes: u64,
    ) -> Self {
        Self {
            algorithm: sealed.algorithm,
            file_name: file_name.into(),
            file_hash: sealed.file_hash.clone(),
            ciphertext_path: ciphertext_path.into(),
            nonce: sealed.nonce.clone(),
            tag: sealed.tag.clone(),
            salt: sealed.salt.clone(),
            file_size_bytes,
            enc_time_ms: sealed.enc_millis,
            dec_time_ms: None,
        }
    }

    /// Reject drafts that would produce a block the rest of the system
    /// cannot match or aggregate.
    pub fn validate(&self) -> Result<()> {
        if !is_sha256_hex(&self.file_hash) {
            return Err(LedgerError::InvalidRecord(format!(
                "file_hash must be 64 lowercase hex chars, got {:?}",
                self.file_hash
            )));
        }
        check_duration("enc_time_ms", self.enc_time_ms)?;
        if let Some(d) = self.dec_time_ms {
            check_decryption_time(d)?;
        }
        Ok(())
    }
}

pub(crate) fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// `-0.0` is rejected: it hashes as `-0.0` but SQLite reads it back as `0.0`.
pub(crate) fn check_duration(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && !value.is_sign_negative() {
        Ok(())
    } else {
        Err(LedgerError::InvalidRecord(format!(
            "{field} must be finite and non-negative, got {value}"
        )))
    }
}

/// A recorded decryption time must differ from [`DEC_TIME_UNSET`], or the
/// block would stay claimable.
pub(crate) fn check_decryption_time(value: f64) -> Result<()> {
    check_duration("dec_time_ms", value)?;
    if value == DEC_TIME_UNSET {
        return Err(LedgerError::InvalidRecord(
            "dec_time_ms must be greater than zero".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(content: &[u8]) -> NewBlock {
        NewBlock {
            algorithm: Algorithm::Aes256Gcm,
            file_name: "report.pdf".into(),
            file_hash: cipherledger_envelope::sha256_hex(content),
            ciphertext_path: "encrypted/report_encrypted.pdf.enc".into(),
            nonce: vec![1; 12],
            tag: vec![2; 16],
            salt: vec![3; 16],
            file_size_bytes: content.len() as u64,
            enc_time_ms: 151.25,
            dec_time_ms: None,
        }
    }

    #[test]
    fn genesis_links_to_zero_hash() {
        let b = Block::next(None, &draft(b"a"), "2024-01-01T00:00:00.000000Z".into()).unwrap();
        assert_eq!(b.index, 0);
        assert_eq!(b.prev_hash, GENESIS_PREV_HASH);
        assert_eq!(b.dec_time_ms, DEC_TIME_UNSET);
        assert_eq!(b.nonce_b64, "AQEBAQEBAQEBAQEB");
        assert_eq!(b.tx_hash, b.compute_hash().unwrap());
    }

    #[test]
    fn successor_links_to_predecessor() {
        let g = Block::next(None, &draft(b"a"), "t0".into()).unwrap();
        let n = Block::next(Some(&g), &draft(b"b"), "t1".into()).unwrap();
        assert_eq!(n.index, 1);
        assert_eq!(n.prev_hash, g.tx_hash);
        assert_ne!(n.tx_hash, g.tx_hash);
    }

    #[test]
    fn hash_matches_python_json_dumps() {
        // hashlib.sha256(json.dumps(block_data, sort_keys=True).encode()).hexdigest()
        let block = Block {
            index: 0,
            timestamp: "2024-05-01T12:00:00.123456".into(),
            prev_hash: GENESIS_PREV_HASH.into(),
            tx_hash: String::new(),
            algorithm: "AES-256-GCM".into(),
            file_name: "notes.txt".into(),
            file_hash: "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824".into(),
            ciphertext_path: "encrypted/notes_encrypted.txt.enc".into(),
            nonce_b64: "AAAAAAAAAAAAAAAAAAAAAA==".into(),
            tag_b64: "AQEBAQEBAQEBAQEBAQEBAQ==".into(),
            salt_b64: "AgICAgICAgICAgICAgICAg==".into(),
            file_size_bytes: 5,
            enc_time_ms: 152.87,
            dec_time_ms: 0.0,
        };
        assert_eq!(block.compute_hash().unwrap(), PYTHON_REFERENCE_HASH);
    }

    const PYTHON_REFERENCE_HASH: &str =
        "604d2fa989bdaf550af54d3b95682f9bf5d3d1d79f7103671b4715939048a5af";

    #[test]
    fn dec_time_substitution_changes_hash() {
        let b = Block::next(None, &draft(b"a"), "t".into()).unwrap();
        assert_eq!(b.hash_with_dec_time(0.0).unwrap(), b.tx_hash);
        assert_ne!(b.hash_with_dec_time(12.3).unwrap(), b.tx_hash);
    }

    #[test]
    fn validation_rejects_bad_drafts() {
        let mut d = draft(b"a");
        d.file_hash = d.file_hash.to_uppercase();
        assert!(d.validate().unwrap_err().is_input_error());

        let mut d = draft(b"a");
        d.enc_time_ms = f64::NAN;
        assert!(d.validate().is_err());

        let mut d = draft(b"a");
        d.dec_time_ms = Some(-1.0);
        assert!(d.validate().is_err());

        assert!(draft(b"a").validate().is_ok());
    }

    #[test]
    fn validation_rejects_negative_zero_and_unset_dec_time() {
        let mut d = draft(b"a");
        d.enc_time_ms = -0.0;
        assert!(d.validate().unwrap_err().is_input_error());

        let mut d = draft(b"a");
        d.dec_time_ms = Some(-0.0);
        assert!(d.validate().is_err());

        let mut d = draft(b"a");
        d.dec_time_ms = Some(0.0);
        assert!(d.validate().unwrap_err().is_input_error());

        let mut d = draft(b"a");
        d.enc_time_ms = 0.0;
        d.dec_time_ms = Some(0.5);
        assert!(d.validate().is_ok());
    }
}
