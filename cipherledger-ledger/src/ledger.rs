//! Ledger facade: validation, timestamps and logging over a storage backend.

use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::error::{LedgerError, Result};
use crate::stats::{compute_stats, AlgorithmStats};
use crate::storage::{InMemoryBackend, LedgerBackend, SqliteBackend};
use crate::types::{check_decryption_time, is_sha256_hex, Block, NewBlock};
use crate::verify::{verify_chain, ChainStatus};

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Append-only, hash-chained log of encryption operations.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Ledger {
    storage: Arc<dyn LedgerBackend>,
}

impl Ledger {
    /// Create a ledger over the given storage backend.
    pub fn new(storage: Arc<dyn LedgerBackend>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Open (or create) an SQLite ledger file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let backend = SqliteBackend::open(path)?;
        tracing::debug!(path = %path.display(), "ledger opened");
        Ok(Self::new(Arc::new(backend)))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Append one block for an encryption event. Returns its `tx_hash`.
    pub fn append(&self, draft: NewBlock) -> Result<String> {
        draft.validate()?;
        let block = self.storage.append(&draft, &now_rfc3339())?;
        tracing::debug!(
            index = block.index,
            algorithm = %block.algorithm,
            file_hash = %block.file_hash,
            tx_hash = %block.tx_hash,
            "block appended"
        );
        Ok(block.tx_hash)
    }

    /// Record the decryption time on the earliest block for `file_hash`
    /// that does not have one yet.
    ///
    /// Blocks are matched by plaintext hash, so when the same content was
    /// encrypted more than once each decryption fills the next unset block
    /// in index order. Returns the updated index, or `None` when every
    /// matching block already has a time (or none exists).
    pub fn update_decryption_time(&self, file_hash: &str, dec_time_ms: f64) -> Result<Option<u64>> {
        if !is_sha256_hex(file_hash) {
            return Err(LedgerError::InvalidRecord(format!(
                "file_hash must be 64 lowercase hex chars, got {file_hash:?}"
            )));
        }
        check_decryption_time(dec_time_ms)?;

        let updated = self.storage.claim_decryption(file_hash, dec_time_ms)?;
        match updated {
            Some(index) => tracing::debug!(index, file_hash, dec_time_ms, "decryption time recorded"),
            None => tracing::debug!(file_hash, "no undecrypted block for file hash"),
        }
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn last(&self) -> Result<Option<Block>> {
        self.storage.last()
    }

    /// Every block, ascending by index.
    pub fn all(&self) -> Result<Vec<Block>> {
        self.storage.all()
    }

    pub fn get(&self, index: u64) -> Result<Option<Block>> {
        self.storage.get(index)
    }

    pub fn len(&self) -> Result<u64> {
        self.storage.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn find_by_file_hash(&self, file_hash: &str) -> Result<Vec<Block>> {
        self.storage.find_by_file_hash(file_hash)
    }

    // -----------------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------------

    /// Re-verify every link and hash. Never mutates.
    pub fn verify(&self) -> Result<ChainStatus> {
        let status = verify_chain(&self.all()?)?;
        if status.is_valid() {
            tracing::info!(status = %status, "ledger verified");
        } else {
            tracing::warn!(status = %status, "ledger chain violation");
        }
        Ok(status)
    }

    pub fn stats(&self) -> Result<Vec<AlgorithmStats>> {
        Ok(compute_stats(&self.all()?))
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
