//! Chain verification: a read-only linear audit of the whole ledger.

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::types::{Block, DEC_TIME_UNSET, GENESIS_PREV_HASH};

/// Which rule a block broke.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainViolation {
    /// Block 0 does not point at [`GENESIS_PREV_HASH`].
    GenesisMismatch,
    /// `prev_hash` differs from the predecessor's `tx_hash`.
    BrokenLink,
    /// Stored `tx_hash` differs from the recomputed one.
    InvalidHash,
    /// The stored index is not the block's position.
    IndexOutOfSequence { found: u64 },
}

/// Outcome of [`verify_chain`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainStatus {
    Empty,
    Valid { blocks: u64 },
    /// First failing block; later blocks were not examined.
    Invalid { index: u64, violation: ChainViolation },
}

impl ChainStatus {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Ledger is empty"),
            Self::Valid { blocks } => write!(f, "Ledger is valid ({blocks} blocks verified)"),
            Self::Invalid { violation: ChainViolation::GenesisMismatch, .. } => {
                write!(f, "Genesis block has invalid prev_hash")
            }
            Self::Invalid { index, violation: ChainViolation::BrokenLink } => {
                write!(f, "Block {index} has broken chain link")
            }
            Self::Invalid { index, violation: ChainViolation::InvalidHash } => {
                write!(f, "Block {index} has invalid transaction hash")
            }
            Self::Invalid { index, violation: ChainViolation::IndexOutOfSequence { found } } => {
                write!(f, "Block {index} has out-of-sequence index {found}")
            }
        }
    }
}

/// Check every block in order, stopping at the first failure.
///
/// A block whose hash only matches with `dec_time_ms` reset to the unset
/// sentinel is accepted: recording the decryption time after the fact is
/// the one permitted mutation. As a consequence, once a block appended
/// with the sentinel has a recorded time, rewriting that time to another
/// non-zero value is not detected.
pub fn verify_chain(blocks: &[Block]) -> Result<ChainStatus> {
    if blocks.is_empty() {
        return Ok(ChainStatus::Empty);
    }

    let mut prev: Option<&Block> = None;
    for (position, block) in (0u64..).zip(blocks) {
        let invalid = |violation| ChainStatus::Invalid {
            index: position,
            violation,
        };

        match prev {
            None if block.prev_hash != GENESIS_PREV_HASH => {
                return Ok(invalid(ChainViolation::GenesisMismatch))
            }
            Some(p) if block.prev_hash != p.tx_hash => {
                return Ok(invalid(ChainViolation::BrokenLink))
            }
            _ => {}
        }

        if block.index != position {
            return Ok(invalid(ChainViolation::IndexOutOfSequence { found: block.index }));
        }

        if !hash_matches(block)? {
            return Ok(invalid(ChainViolation::InvalidHash));
        }
        prev = Some(block);
    }

    Ok(ChainStatus::Valid {
        blocks: blocks.len() as u64,
    })
}

fn hash_matches(block: &Block) -> Result<bool> {
    if block.compute_hash()? == block.tx_hash {
        return Ok(true);
    }
    if block.is_decrypted() {
        return Ok(block.hash_with_dec_time(DEC_TIME_UNSET)? == block.tx_hash);
    }
    Ok(false)
}
