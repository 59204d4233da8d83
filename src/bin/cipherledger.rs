//! cipherledger CLI: passphrase file encryption with an operations ledger.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use cipherledger::cli::{run, Cli};
use cipherledger::passphrase::{get_passphrase_reader, ConstantPassphraseReader, PassphraseReader};
use cipherledger::LogFormat;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let mut reader: Box<dyn PassphraseReader> = if cli.needs_passphrase() {
        get_passphrase_reader(cli.passphrase_stdin)
    } else {
        Box::new(ConstantPassphraseReader::new(Vec::new()))
    };

    match run(&cli, &mut *reader, &mut io::stdout().lock()) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), error = ?e, "command failed");
            eprintln!("Error: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays clean for `--json` output.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cipherledger=warn,cipherledger_ledger=warn".into());
    match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .init(),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
