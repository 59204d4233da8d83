//! Command-line interface.
//!
//! Usage:
//!   cipherledger encrypt -i <FILE> [-a <ALGORITHM>]
//!   cipherledger decrypt -i <FILE>.enc
//!   cipherledger inspect <FILE>.enc
//!   cipherledger ledger list [--json]
//!   cipherledger ledger verify
//!   cipherledger ledger stats [--json]
//!   cipherledger algorithms
//!
//! Exit codes: 0 on success, 1 on any error, 2 when `ledger verify` finds a
//! broken chain.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cipherledger_envelope::{inspect, Algorithm};
use cipherledger_ledger::{AlgorithmStats, Block};

use crate::config::{Config, DEFAULT_MAX_FILE_BYTES};
use crate::error::{Result, VaultError};
use crate::passphrase::PassphraseReader;
use crate::vault::Vault;

/// Exit status for a ledger that failed verification.
pub const EXIT_CHAIN_INVALID: u8 = 2;

/// How a successfully executed command should end the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    ChainInvalid,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::ChainInvalid => ExitCode::from(EXIT_CHAIN_INVALID),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cipherledger")]
#[command(version)]
#[command(about = "Passphrase file encryption with a tamper-evident operations ledger.", long_about = None)]
pub struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    pub passphrase_stdin: bool,

    /// Directory holding the ledger and encrypted/decrypted files
    #[arg(long, global = true, env = "CIPHERLEDGER_DATA_DIR", default_value = "./cipherledger-data")]
    pub data_dir: PathBuf,

    /// Largest plaintext accepted for encryption, in bytes
    #[arg(long, global = true, env = "CIPHERLEDGER_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    pub max_file_bytes: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypt a file and record the operation
    #[command(alias = "e")]
    Encrypt {
        /// File to encrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// AES-256-GCM, Blowfish-256-EAX or ChaCha20-Poly1305
        #[arg(short, long, default_value = "AES-256-GCM")]
        algorithm: Algorithm,
    },

    /// Decrypt an envelope and record the decryption time
    #[command(alias = "d")]
    Decrypt {
        /// Envelope to decrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Show envelope header metadata without decrypting
    Inspect {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Inspect the operations ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },

    /// List supported algorithms
    Algorithms,
}

#[derive(Debug, Subcommand)]
pub enum LedgerCommand {
    /// Print every block
    List {
        #[arg(long)]
        json: bool,
    },
    /// Re-verify the hash chain
    Verify,
    /// Per-algorithm performance summary
    Stats {
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::new(&self.data_dir).with_max_file_bytes(self.max_file_bytes)
    }

    pub fn needs_passphrase(&self) -> bool {
        matches!(self.command, Command::Encrypt { .. } | Command::Decrypt { .. })
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Execute one parsed command, writing results to `out`.
pub fn run(cli: &Cli, passphrase: &mut dyn PassphraseReader, out: &mut dyn Write) -> Result<Outcome> {
    match &cli.command {
        Command::Encrypt { input, algorithm } => {
            let vault = Vault::open(cli.config())?;
            let pass = passphrase.read_passphrase()?;
            let receipt = vault.encrypt_path(input, &pass, *algorithm)?;
            emit(out, |w| {
                writeln!(
                    w,
                    "Encrypted {} with {} in {:.2} ms ({:.2} KB)",
                    receipt.file_name,
                    receipt.algorithm,
                    receipt.enc_time_ms,
                    kib(receipt.file_size_bytes)
                )?;
                writeln!(w, "  stored:  {}", receipt.stored_at.display())?;
                writeln!(w, "  tx_hash: {}", receipt.tx_hash)
            })?;
        }
        Command::Decrypt { input } => {
            let vault = Vault::open(cli.config())?;
            let pass = passphrase.read_passphrase()?;
            let receipt = vault.decrypt_path(input, &pass)?;
            emit(out, |w| {
                writeln!(
                    w,
                    "Decrypted with {} in {:.2} ms ({:.2} KB)",
                    receipt.algorithm,
                    receipt.dec_time_ms,
                    kib(receipt.file_size_bytes)
                )?;
                writeln!(w, "  written: {}", receipt.written_to.display())?;
                match receipt.ledger_index {
                    Some(index) => writeln!(w, "  ledger:  block {index} updated"),
                    None => writeln!(w, "  ledger:  no matching block awaiting decryption"),
                }
            })?;
        }
        Command::Inspect { file } => {
            let bytes = read(file)?;
            let info = inspect(&bytes)?;
            emit(out, |w| writeln!(w, "{info}"))?;
        }
        Command::Ledger { command } => {
            let vault = Vault::open(cli.config())?;
            return ledger_command(&vault, command, out);
        }
        Command::Algorithms => {
            emit(out, |w| {
                for alg in Algorithm::ALL {
                    writeln!(
                        w,
                        "{:<18} id {}  nonce {:>2} bytes  tag {:>2} bytes",
                        alg.name(),
                        alg.id(),
                        alg.nonce_len(),
                        alg.tag_len()
                    )?;
                }
                Ok(())
            })?;
        }
    }
    Ok(Outcome::Done)
}

fn ledger_command(vault: &Vault, command: &LedgerCommand, out: &mut dyn Write) -> Result<Outcome> {
    match command {
        LedgerCommand::List { json } => {
            let blocks = vault.blocks()?;
            if *json {
                emit_json(out, &blocks)?;
            } else {
                emit(out, |w| print_blocks(w, &blocks))?;
            }
        }
        LedgerCommand::Verify => {
            let status = vault.verify()?;
            emit(out, |w| writeln!(w, "{status}"))?;
            if !status.is_valid() {
                return Ok(Outcome::ChainInvalid);
            }
        }
        LedgerCommand::Stats { json } => {
            let stats = vault.stats()?;
            if *json {
                emit_json(out, &stats)?;
            } else {
                emit(out, |w| print_stats(w, &stats))?;
            }
        }
    }
    Ok(Outcome::Done)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_blocks(w: &mut dyn Write, blocks: &[Block]) -> io::Result<()> {
    if blocks.is_empty() {
        return writeln!(w, "Ledger is empty");
    }
    for b in blocks {
        let dec = if b.is_decrypted() {
            format!("{:.2} ms", b.dec_time_ms)
        } else {
            "-".to_string()
        };
        writeln!(
            w,
            "#{:<4} {}  {:<18} {}  {} bytes  enc {:.2} ms  dec {}",
            b.index, b.timestamp, b.algorithm, b.file_name, b.file_size_bytes, b.enc_time_ms, dec
        )?;
        writeln!(w, "      tx {}  prev {}", b.tx_hash, b.prev_hash)?;
    }
    Ok(())
}

fn print_stats(w: &mut dyn Write, stats: &[AlgorithmStats]) -> io::Result<()> {
    writeln!(
        w,
        "{:<18} {:>5} {:>12} {:>9} {:>12} {:>12}",
        "algorithm", "ops", "avg enc ms", "decrypted", "avg dec ms", "avg size KB"
    )?;
    for s in stats {
        let dec = s.avg_dec_ms.map_or_else(|| "-".to_string(), |ms| format!("{ms:.2}"));
        writeln!(
            w,
            "{:<18} {:>5} {:>12.2} {:>9} {:>12} {:>12.2}",
            s.algorithm, s.operations, s.avg_enc_ms, s.decrypted, dec, s.avg_size_kb
        )?;
    }
    Ok(())
}

fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| VaultError::io("failed to read", path, e))
}

fn emit(out: &mut dyn Write, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> Result<()> {
    f(out)
        .and_then(|()| out.flush())
        .map_err(|e| VaultError::io("failed to write", "<stdout>", e))
}

fn emit_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    emit(out, |w| {
        serde_json::to_writer_pretty(&mut *w, value)?;
        writeln!(w)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passphrase::ConstantPassphraseReader;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cipherledger").chain(args.iter().copied())).unwrap()
    }

    fn run_to_string(cli: &Cli, pass: &str) -> (Outcome, String) {
        let mut out = Vec::new();
        let code = run(cli, &mut ConstantPassphraseReader::new(pass), &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_encrypt() {
        let cli = parse(&["encrypt", "-i", "a.txt", "-a", "ChaCha20-Poly1305", "--data-dir", "/tmp/x"]);
        match &cli.command {
            Command::Encrypt { input, algorithm } => {
                assert_eq!(input, &PathBuf::from("a.txt"));
                assert_eq!(*algorithm, Algorithm::ChaCha20Poly1305);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/x"));
        assert!(cli.needs_passphrase());
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        let err = Cli::try_parse_from(["cipherledger", "encrypt", "-i", "a", "-a", "DES"]).unwrap_err();
        assert!(err.to_string().contains("unsupported algorithm"));
    }

    #[test]
    fn test_parse_ledger_subcommands() {
        let cli = parse(&["ledger", "list", "--json"]);
        assert!(matches!(
            cli.command,
            Command::Ledger { command: LedgerCommand::List { json: true } }
        ));
        assert!(!cli.needs_passphrase());
        let cli = parse(&["--passphrase-stdin", "ledger", "verify"]);
        assert!(cli.passphrase_stdin);
    }

    #[test]
    fn test_encrypt_list_verify_stats() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, b"hello").unwrap();
        let data_dir = dir.path().join("data");
        let data = data_dir.to_str().unwrap();

        let cli = parse(&["encrypt", "-i", input.to_str().unwrap(), "--data-dir", data]);
        let (code, out) = run_to_string(&cli, "pw");
        assert_eq!(code, Outcome::Done);
        assert!(out.starts_with("Encrypted notes.txt with AES-256-GCM"), "{out}");

        let (_, out) = run_to_string(&parse(&["ledger", "list", "--json", "--data-dir", data]), "");
        let blocks: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(blocks.as_array().unwrap().len(), 1);
        assert_eq!(blocks[0]["file_name"], "notes.txt");

        let (code, out) = run_to_string(&parse(&["ledger", "verify", "--data-dir", data]), "");
        assert_eq!(code, Outcome::Done);
        assert_eq!(out.trim(), "Ledger is valid (1 blocks verified)");

        let (_, out) = run_to_string(&parse(&["ledger", "stats", "--data-dir", data]), "");
        assert!(out.lines().nth(1).unwrap().starts_with("AES-256-GCM"));
    }

    #[test]
    fn test_inspect_reports_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.enc");
        let sealed = cipherledger_envelope::encrypt_file(b"hello", b"pw", "Blowfish-256-EAX").unwrap();
        fs::write(&path, &sealed.envelope).unwrap();

        let (_, out) = run_to_string(&parse(&["inspect", path.to_str().unwrap()]), "");
        assert!(out.starts_with("Blowfish-256-EAX | salt 16 | nonce 16 | tag 8"), "{out}");
    }

    #[test]
    fn test_algorithms_lists_all_three() {
        let (_, out) = run_to_string(&parse(&["algorithms"]), "");
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("Blowfish-256-EAX"));
    }
}
