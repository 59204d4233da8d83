//! # cipherledger
//!
//! Encrypt files under a passphrase and keep a tamper-evident record of
//! every operation.
//!
//! ## Quick Start
//!
//! ```rust
//! use cipherledger::{Algorithm, Config, Vault};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let vault = Vault::open(Config::new(dir.path())).unwrap();
//!
//! let sealed = vault.encrypt("notes.txt", b"hello", b"pw", Algorithm::Aes256Gcm).unwrap();
//! let envelope = std::fs::read(&sealed.stored_at).unwrap();
//! let opened = vault.decrypt("notes_encrypted.txt.enc", &envelope, b"pw").unwrap();
//!
//! assert_eq!(std::fs::read(opened.written_to).unwrap(), b"hello");
//! assert!(vault.verify().unwrap().is_valid());
//! ```
//!
//! ## Layers
//!
//! - [`cipherledger_envelope`]: PBKDF2 key derivation and the three AEAD
//!   variants behind a self-describing envelope
//! - [`cipherledger_ledger`]: append-only hash-chained SQLite ledger
//! - [`Vault`]: ties both to a data directory
//! - [`cli`]: the `cipherledger` command

#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod passphrase;
pub mod vault;

pub use cipherledger_envelope::Algorithm;
pub use cipherledger_ledger::{AlgorithmStats, Block, ChainStatus, ChainViolation};
pub use config::{Config, LogFormat};
pub use error::{ErrorKind, Result, VaultError};
pub use vault::{DecryptReceipt, EncryptReceipt, Vault};
