//! Runtime configuration.
//!
//! Environment variables (read through clap in the binary):
//!   CIPHERLEDGER_DATA_DIR        - ledger and file directory (default: ./cipherledger-data)
//!   CIPHERLEDGER_MAX_FILE_BYTES  - largest accepted plaintext (default: 50 MiB)
//!   CIPHERLEDGER_LOG_FORMAT      - "json" for structured logging, "pretty" for dev
//!   RUST_LOG                     - tracing filter

use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "CIPHERLEDGER_DATA_DIR";
pub const MAX_FILE_BYTES_ENV: &str = "CIPHERLEDGER_MAX_FILE_BYTES";
pub const LOG_FORMAT_ENV: &str = "CIPHERLEDGER_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./cipherledger-data";
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Where the vault keeps its state and how much it accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub max_file_bytes: u64,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.db")
    }

    pub fn encrypted_dir(&self) -> PathBuf {
        self.data_dir.join("encrypted")
    }

    pub fn decrypted_dir(&self) -> PathBuf {
        self.data_dir.join("decrypted")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

/// Log output style for the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (case-insensitive) falls back to pretty.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or(Self::Pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("./cipherledger-data"));
        assert_eq!(config.max_file_bytes, 52_428_800);
        assert_eq!(config.ledger_path(), PathBuf::from("./cipherledger-data/ledger.db"));
    }

    #[test]
    fn layout_follows_data_dir() {
        let config = Config::new("/srv/vault").with_max_file_bytes(10);
        assert_eq!(config.encrypted_dir(), PathBuf::from("/srv/vault/encrypted"));
        assert_eq!(config.decrypted_dir(), PathBuf::from("/srv/vault/decrypted"));
        assert_eq!(config.max_file_bytes, 10);
    }

    #[test]
    fn log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Pretty);
    }
}
