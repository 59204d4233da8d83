//! # cipherledger-ledger
//!
//! Tamper-evident record of every encryption operation.
//!
//! Each [`Block`] stores the metadata of one encryption (algorithm, plaintext
//! hash, salt/nonce/tag, timings) plus `prev_hash`, the `tx_hash` of its
//! predecessor, so rewriting, removing or reordering any block is detected
//! by [`Ledger::verify`]. Single writer, single node: this is an audit log,
//! not a consensus protocol.
//!
//! ## Quick Start
//!
//! ```
//! use cipherledger_envelope::encrypt_file;
//! use cipherledger_ledger::{Ledger, NewBlock};
//!
//! let ledger = Ledger::in_memory();
//! let sealed = encrypt_file(b"hello", b"pw", "AES-256-GCM").unwrap();
//!
//! let draft = NewBlock::from_encrypted(&sealed, "hello.txt", "hello_encrypted.txt.enc", 5);
//! let tx_hash = ledger.append(draft).unwrap();
//!
//! assert_eq!(ledger.last().unwrap().unwrap().tx_hash, tx_hash);
//! assert!(ledger.verify().unwrap().is_valid());
//! ```

mod canonical;
pub mod error;
pub mod ledger;
pub mod stats;
pub mod storage;
pub mod types;
pub mod verify;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use stats::{compute_stats, AlgorithmStats};
pub use storage::{InMemoryBackend, LedgerBackend, SqliteBackend};
pub use types::{Block, NewBlock, DEC_TIME_UNSET, GENESIS_PREV_HASH};
pub use verify::{verify_chain, ChainStatus, ChainViolation};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
