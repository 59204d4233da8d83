//! Storage backends: where blocks live.

use std::path::Path;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::error::{LedgerError, Result};
use crate::types::{Block, NewBlock, DEC_TIME_UNSET};

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Backend for persisting the chain.
///
/// `append` and `claim_decryption` each read and then write; implementations
/// must run both halves as one atomic step so concurrent callers never see
/// the same last block or claim the same row.
pub trait LedgerBackend: Send + Sync {
    /// Link `draft` after the current last block, persist it and return it.
    fn append(&self, draft: &NewBlock, timestamp: &str) -> Result<Block>;

    /// Set `dec_time_ms` on the lowest-index block with `file_hash` whose
    /// decryption time is still unset. Returns that block's index.
    fn claim_decryption(&self, file_hash: &str, dec_time_ms: f64) -> Result<Option<u64>>;

    fn last(&self) -> Result<Option<Block>>;
    /// All blocks, ascending by index.
    fn all(&self) -> Result<Vec<Block>>;
    fn get(&self, index: u64) -> Result<Option<Block>>;
    fn len(&self) -> Result<u64>;
    /// Blocks with `file_hash`, ascending by index.
    fn find_by_file_hash(&self, file_hash: &str) -> Result<Vec<Block>>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-memory storage (for testing and ephemeral use).
#[derive(Default)]
pub struct InMemoryBackend {
    blocks: RwLock<Vec<Block>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerBackend for InMemoryBackend {
    fn append(&self, draft: &NewBlock, timestamp: &str) -> Result<Block> {
        let mut blocks = self.blocks.write();
        let block = Block::next(blocks.last(), draft, timestamp.to_string())?;
        blocks.push(block.clone());
        Ok(block)
    }

    fn claim_decryption(&self, file_hash: &str, dec_time_ms: f64) -> Result<Option<u64>> {
        let mut blocks = self.blocks.write();
        Ok(blocks
            .iter_mut()
            .find(|b| b.file_hash == file_hash && b.dec_time_ms == DEC_TIME_UNSET)
            .map(|b| {
                b.dec_time_ms = dec_time_ms;
                b.index
            }))
    }

    fn last(&self) -> Result<Option<Block>> {
        Ok(self.blocks.read().last().cloned())
    }

    fn all(&self) -> Result<Vec<Block>> {
        Ok(self.blocks.read().clone())
    }

    fn get(&self, index: u64) -> Result<Option<Block>> {
        let blocks = self.blocks.read();
        Ok(usize::try_from(index).ok().and_then(|i| blocks.get(i)).cloned())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.blocks.read().len() as u64)
    }

    fn find_by_file_hash(&self, file_hash: &str) -> Result<Vec<Block>> {
        Ok(self
            .blocks
            .read()
            .iter()
            .filter(|b| b.file_hash == file_hash)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blocks (
    "index"          INTEGER PRIMARY KEY,
    timestamp        TEXT NOT NULL,
    prev_hash        TEXT NOT NULL,
    tx_hash          TEXT NOT NULL,
    algorithm        TEXT NOT NULL,
    file_name        TEXT NOT NULL,
    file_hash        TEXT NOT NULL,
    ciphertext_path  TEXT NOT NULL,
    nonce_b64        TEXT NOT NULL,
    tag_b64          TEXT NOT NULL,
    salt_b64         TEXT NOT NULL,
    file_size_bytes  INTEGER NOT NULL,
    enc_time_ms      REAL NOT NULL,
    dec_time_ms      REAL NOT NULL DEFAULT 0.0
);
CREATE INDEX IF NOT EXISTS blocks_file_hash ON blocks (file_hash);
"#;

const SELECT_COLUMNS: &str = r#"SELECT "index", timestamp, prev_hash, tx_hash, algorithm, file_name,
    file_hash, ciphertext_path, nonce_b64, tag_b64, salt_b64, file_size_bytes,
    enc_time_ms, dec_time_ms FROM blocks"#;

/// SQLite storage, one `blocks` table.
///
/// The connection is opened once and shared behind a mutex; every
/// read-then-write runs inside an `IMMEDIATE` transaction so a second
/// process holding the same file is serialized too.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_blocks(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Block>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRow::from_row)?;
        let blocks = rows
            .map(|r| r.map_err(LedgerError::from).and_then(RawRow::into_block))
            .collect();
        blocks
    }
}

impl LedgerBackend for SqliteBackend {
    fn append(&self, draft: &NewBlock, timestamp: &str) -> Result<Block> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let last = tx
            .query_row(
                &format!(r#"{SELECT_COLUMNS} ORDER BY "index" DESC LIMIT 1"#),
                [],
                RawRow::from_row,
            )
            .optional()?
            .map(RawRow::into_block)
            .transpose()?;

        let block = Block::next(last.as_ref(), draft, timestamp.to_string())?;
        tx.execute(
            "INSERT INTO blocks VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                to_sql_int(block.index)?,
                block.timestamp,
                block.prev_hash,
                block.tx_hash,
                block.algorithm,
                block.file_name,
                block.file_hash,
                block.ciphertext_path,
                block.nonce_b64,
                block.tag_b64,
                block.salt_b64,
                to_sql_int(block.file_size_bytes)?,
                block.enc_time_ms,
                block.dec_time_ms,
            ],
        )?;
        tx.commit()?;
        Ok(block)
    }

    fn claim_decryption(&self, file_hash: &str, dec_time_ms: f64) -> Result<Option<u64>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let index: Option<i64> = tx
            .query_row(
                r#"SELECT "index" FROM blocks WHERE file_hash = ?1 AND dec_time_ms = ?2
                   ORDER BY "index" ASC LIMIT 1"#,
                params![file_hash, DEC_TIME_UNSET],
                |row| row.get(0),
            )
            .optional()?;

        let Some(index) = index else {
            return Ok(None);
        };
        tx.execute(
            r#"UPDATE blocks SET dec_time_ms = ?1 WHERE "index" = ?2"#,
            params![dec_time_ms, index],
        )?;
        tx.commit()?;
        Ok(Some(from_sql_int(index, index)?))
    }

    fn last(&self) -> Result<Option<Block>> {
        let sql = format!(r#"{SELECT_COLUMNS} ORDER BY "index" DESC LIMIT 1"#);
        Ok(self.query_blocks(&sql, [])?.pop())
    }

    fn all(&self) -> Result<Vec<Block>> {
        let sql = format!(r#"{SELECT_COLUMNS} ORDER BY "index" ASC"#);
        self.query_blocks(&sql, [])
    }

    fn get(&self, index: u64) -> Result<Option<Block>> {
        let Ok(index) = i64::try_from(index) else {
            return Ok(None);
        };
        let sql = format!(r#"{SELECT_COLUMNS} WHERE "index" = ?1"#);
        Ok(self.query_blocks(&sql, [index])?.pop())
    }

    fn len(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
        from_sql_int(n, -1)
    }

    fn find_by_file_hash(&self, file_hash: &str) -> Result<Vec<Block>> {
        let sql = format!(r#"{SELECT_COLUMNS} WHERE file_hash = ?1 ORDER BY "index" ASC"#);
        self.query_blocks(&sql, [file_hash])
    }
}

/// Row as SQLite returns it, before range checks.
struct RawRow {
    index: i64,
    timestamp: String,
    prev_hash: String,
    tx_hash: String,
    algorithm: String,
    file_name: String,
    file_hash: String,
    ciphertext_path: String,
    nonce_b64: String,
    tag_b64: String,
    salt_b64: String,
    file_size_bytes: i64,
    enc_time_ms: f64,
    dec_time_ms: f64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            index: row.get(0)?,
            timestamp: row.get(1)?,
            prev_hash: row.get(2)?,
            tx_hash: row.get(3)?,
            algorithm: row.get(4)?,
            file_name: row.get(5)?,
            file_hash: row.get(6)?,
            ciphertext_path: row.get(7)?,
            nonce_b64: row.get(8)?,
            tag_b64: row.get(9)?,
            salt_b64: row.get(10)?,
            file_size_bytes: row.get(11)?,
            enc_time_ms: row.get(12)?,
            dec_time_ms: row.get(13)?,
        })
    }

    fn into_block(self) -> Result<Block> {
        Ok(Block {
            index: from_sql_int(self.index, self.index)?,
            timestamp: self.timestamp,
            prev_hash: self.prev_hash,
            tx_hash: self.tx_hash,
            algorithm: self.algorithm,
            file_name: self.file_name,
            file_hash: self.file_hash,
            ciphertext_path: self.ciphertext_path,
            nonce_b64: self.nonce_b64,
            tag_b64: self.tag_b64,
            salt_b64: self.salt_b64,
            file_size_bytes: from_sql_int(self.file_size_bytes, self.index)?,
            enc_time_ms: self.enc_time_ms,
            dec_time_ms: self.dec_time_ms,
        })
    }
}

fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| LedgerError::InvalidRecord(format!("{value} does not fit an SQLite integer")))
}

fn from_sql_int(value: i64, row: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| LedgerError::CorruptRow {
        index: row,
        reason: format!("negative integer {value}"),
    })
}
