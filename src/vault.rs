//! Vault: file encryption and decryption recorded in the ledger.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/ledger.db        SQLite ledger
//! <data_dir>/encrypted/       <stem>_encrypted<ext>.enc envelopes
//! <data_dir>/decrypted/       recovered plaintexts
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use cipherledger_envelope::{decrypt_file, encrypt, sha256_hex, Algorithm};
use cipherledger_ledger::{AlgorithmStats, Block, ChainStatus, Ledger, NewBlock};

use crate::config::Config;
use crate::error::{Result, VaultError};

const ENCRYPTED_MARKER: &str = "_encrypted";
const ENVELOPE_EXT: &str = ".enc";

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Outcome of [`Vault::encrypt`].
#[derive(Clone, Debug)]
pub struct EncryptReceipt {
    pub tx_hash: String,
    pub algorithm: Algorithm,
    /// Sanitized name recorded in the ledger.
    pub file_name: String,
    /// Where the envelope was written.
    pub stored_at: PathBuf,
    pub enc_time_ms: f64,
    pub file_size_bytes: u64,
}

/// Outcome of [`Vault::decrypt`].
#[derive(Clone, Debug)]
pub struct DecryptReceipt {
    pub algorithm: Algorithm,
    pub written_to: PathBuf,
    pub dec_time_ms: f64,
    pub file_size_bytes: u64,
    /// Ledger block that received the decryption time, if any matched.
    pub ledger_index: Option<u64>,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

pub struct Vault {
    config: Config,
    ledger: Ledger,
}

impl Vault {
    /// Create the directory layout if needed and open the ledger.
    pub fn open(config: Config) -> Result<Self> {
        for dir in [config.data_dir.clone(), config.encrypted_dir(), config.decrypted_dir()] {
            fs::create_dir_all(&dir).map_err(|e| VaultError::io("failed to create", dir, e))?;
        }
        let ledger = Ledger::open(config.ledger_path())?;
        tracing::debug!(data_dir = %config.data_dir.display(), "vault opened");
        Ok(Self { config, ledger })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // -----------------------------------------------------------------------
    // Encryption
    // -----------------------------------------------------------------------

    /// Encrypt `data`, store the envelope and append a ledger block.
    pub fn encrypt(
        &self,
        file_name: &str,
        data: &[u8],
        passphrase: &[u8],
        algorithm: Algorithm,
    ) -> Result<EncryptReceipt> {
        if passphrase.is_empty() {
            return Err(VaultError::EmptyPassphrase);
        }
        self.check_size(data.len() as u64)?;
        let file_name = sanitize_file_name(file_name)?;

        let sealed = encrypt(data, passphrase, algorithm)?;

        let stored_name = encrypted_name(&file_name);
        let stored_at = self.config.encrypted_dir().join(&stored_name);
        fs::write(&stored_at, &sealed.envelope)
            .map_err(|e| VaultError::io("failed to write", &stored_at, e))?;

        let record_path = format!("encrypted/{stored_name}");
        let draft = NewBlock::from_encrypted(&sealed, &file_name, &record_path, data.len() as u64);
        let tx_hash = match self.ledger.append(draft) {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                // An envelope without a block is unaccounted for.
                if let Err(rm) = fs::remove_file(&stored_at) {
                    tracing::warn!(path = %stored_at.display(), error = %rm, "failed to remove unrecorded envelope");
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            file = %file_name,
            algorithm = %algorithm,
            bytes = data.len(),
            enc_ms = sealed.enc_millis,
            "file encrypted"
        );

        Ok(EncryptReceipt {
            tx_hash,
            algorithm,
            file_name,
            stored_at,
            enc_time_ms: sealed.enc_millis,
            file_size_bytes: data.len() as u64,
        })
    }

    /// Read `path` and [`encrypt`](Self::encrypt) it under its file name.
    pub fn encrypt_path(&self, path: &Path, passphrase: &[u8], algorithm: Algorithm) -> Result<EncryptReceipt> {
        let data = self.read_input(path)?;
        self.encrypt(&display_name(path)?, &data, passphrase, algorithm)
    }

    // -----------------------------------------------------------------------
    // Decryption
    // -----------------------------------------------------------------------

    /// Decrypt an envelope, write the plaintext and record the decryption
    /// time on the matching ledger block.
    pub fn decrypt(&self, file_name: &str, envelope: &[u8], passphrase: &[u8]) -> Result<DecryptReceipt> {
        if passphrase.is_empty() {
            return Err(VaultError::EmptyPassphrase);
        }
        let file_name = sanitize_file_name(file_name)?;

        let opened = decrypt_file(envelope, passphrase)?;

        let written_to = self.config.decrypted_dir().join(decrypted_name(&file_name));
        fs::write(&written_to, &opened.plaintext)
            .map_err(|e| VaultError::io("failed to write", &written_to, e))?;

        let file_hash = sha256_hex(&opened.plaintext);
        let ledger_index = self.ledger.update_decryption_time(&file_hash, opened.dec_millis)?;
        if ledger_index.is_none() {
            tracing::warn!(file = %file_name, file_hash = %file_hash, "no ledger block awaiting this decryption");
        }

        tracing::info!(
            file = %file_name,
            algorithm = %opened.algorithm,
            bytes = opened.plaintext.len(),
            dec_ms = opened.dec_millis,
            "file decrypted"
        );

        Ok(DecryptReceipt {
            algorithm: opened.algorithm,
            written_to,
            dec_time_ms: opened.dec_millis,
            file_size_bytes: opened.plaintext.len() as u64,
            ledger_index,
        })
    }

    /// Read `path` and [`decrypt`](Self::decrypt) it.
    pub fn decrypt_path(&self, path: &Path, passphrase: &[u8]) -> Result<DecryptReceipt> {
        let envelope = fs::read(path).map_err(|e| VaultError::io("failed to read", path, e))?;
        self.decrypt(&display_name(path)?, &envelope, passphrase)
    }

    // -----------------------------------------------------------------------
    // Ledger views
    // -----------------------------------------------------------------------

    pub fn verify(&self) -> Result<ChainStatus> {
        Ok(self.ledger.verify()?)
    }

    pub fn blocks(&self) -> Result<Vec<Block>> {
        Ok(self.ledger.all()?)
    }

    pub fn stats(&self) -> Result<Vec<AlgorithmStats>> {
        Ok(self.ledger.stats()?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.config.max_file_bytes {
            return Err(VaultError::FileTooLarge {
                size,
                limit: self.config.max_file_bytes,
            });
        }
        Ok(())
    }

    fn read_input(&self, path: &Path) -> Result<Vec<u8>> {
        let meta = fs::metadata(path).map_err(|e| VaultError::io("failed to read", path, e))?;
        self.check_size(meta.len())?;
        fs::read(path).map_err(|e| VaultError::io("failed to read", path, e))
    }
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

fn display_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| VaultError::InvalidFileName(path.display().to_string()))
}

/// Reduce a user-supplied name to a safe single path component.
///
/// Path separators and whitespace runs become `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, and leading or trailing `.`/`_` are trimmed.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let spaced: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return Err(VaultError::InvalidFileName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

/// `report.pdf` becomes `report_encrypted.pdf.enc`.
pub fn encrypted_name(file_name: &str) -> String {
    let (stem, ext) = split_extension(file_name);
    format!("{stem}{ENCRYPTED_MARKER}{ext}{ENVELOPE_EXT}")
}

/// Inverse of [`encrypted_name`] for `.enc` files; anything else gets a
/// `decrypted_` prefix.
pub fn decrypted_name(file_name: &str) -> String {
    if file_name.ends_with(ENVELOPE_EXT) {
        let restored = file_name.replace(ENCRYPTED_MARKER, "").replace(ENVELOPE_EXT, "");
        if !restored.is_empty() {
            return restored;
        }
    }
    format!("decrypted_{file_name}")
}

/// Split at the last `.` that is not the leading character.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(i) if i > 0 && file_name[..i].chars().any(|c| c != '.') => file_name.split_at(i),
        _ => (file_name, ""),
    }
}
