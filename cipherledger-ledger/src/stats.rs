//! Per-algorithm performance aggregates over the ledger.

use std::collections::BTreeMap;

use cipherledger_envelope::Algorithm;
use serde::Serialize;

use crate::types::Block;

/// Aggregates for one algorithm name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlgorithmStats {
    pub algorithm: String,
    pub operations: u64,
    pub avg_enc_ms: f64,
    /// Blocks whose decryption time has been recorded.
    pub decrypted: u64,
    /// Mean over decrypted blocks only; `None` until one exists.
    pub avg_dec_ms: Option<f64>,
    /// Mean plaintext size in KiB.
    pub avg_size_kb: f64,
}

#[derive(Default)]
struct Acc {
    operations: u64,
    enc_ms: f64,
    decrypted: u64,
    dec_ms: f64,
    size_kb: f64,
}

/// One entry per supported algorithm (zeroed when unused), followed by any
/// other algorithm names found in the ledger, sorted by name.
pub fn compute_stats(blocks: &[Block]) -> Vec<AlgorithmStats> {
    let mut accs: BTreeMap<&str, Acc> = BTreeMap::new();
    for block in blocks {
        let acc = accs.entry(block.algorithm.as_str()).or_default();
        acc.operations += 1;
        acc.enc_ms += block.enc_time_ms;
        acc.size_kb += block.file_size_bytes as f64 / 1024.0;
        if block.is_decrypted() {
            acc.decrypted += 1;
            acc.dec_ms += block.dec_time_ms;
        }
    }

    let mut out: Vec<AlgorithmStats> = Algorithm::ALL
        .iter()
        .map(|a| finish(a.name(), accs.remove(a.name()).unwrap_or_default()))
        .collect();
    out.extend(accs.into_iter().map(|(name, acc)| finish(name, acc)));
    out
}

fn finish(name: &str, acc: Acc) -> AlgorithmStats {
    let mean = |total: f64, n: u64| if n == 0 { 0.0 } else { total / n as f64 };
    AlgorithmStats {
        algorithm: name.to_string(),
        operations: acc.operations,
        avg_enc_ms: mean(acc.enc_ms, acc.operations),
        decrypted: acc.decrypted,
        avg_dec_ms: (acc.decrypted > 0).then(|| mean(acc.dec_ms, acc.decrypted)),
        avg_size_kb: mean(acc.size_kb, acc.operations),
    }
}
