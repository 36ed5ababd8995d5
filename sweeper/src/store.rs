//! Sweep configuration and the append-only sweep ledger.
//!
//! On disk both live in one line-oriented file:
//!
//! ```text
//! target=0x16332535E2c27da578bC2e82bEb09Ce9d3C8EB07
//! network=base
//! 2026-02-03 14:22:10 | spent: 0.1 ETH | bought: 5000 CLAW | tx: 0xabc…
//! ```
//!
//! Header lines are rewritten by [`SweepStore::save_config`]; ledger lines are
//! only ever appended.

use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use alloy::primitives::Address;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{address::to_checksummed_address, config::DEFAULT_NETWORK};

/// Entries surfaced by [`SweepSnapshot::recent`].
pub const RECENT_SWEEPS: usize = 10;

const TARGET_KEY: &str = "target";
const NETWORK_KEY: &str = "network";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sweep store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to write ledger entry that would not read back as one line: {0:?}")]
    InvalidEntry(String),
}

impl StoreError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfiguration {
    pub target_token: Option<Address>,
    pub network: String,
}

impl Default for SweepConfiguration {
    fn default() -> Self {
        Self {
            target_token: None,
            network: DEFAULT_NETWORK.to_string(),
        }
    }
}

/// One confirmed sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepLedgerEntry {
    pub timestamp: String,
    pub spent: String,
    pub bought: String,
    pub tx_hash: String,
}

impl fmt::Display for SweepLedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | spent: {} | bought: {} | tx: {}",
            self.timestamp, self.spent, self.bought, self.tx_hash
        )
    }
}

fn ledger_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| {
        Regex::new(
            r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) \| spent: ([^|]+?) \| bought: ([^|]+?) \| tx: (0x[0-9a-fA-F]+)$",
        )
        .expect("ledger line pattern is valid")
    })
}

/// Makes `value` safe to embed in a ledger line: control characters and the
/// field separator become `_`.
pub fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() || c == '|' { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

impl SweepLedgerEntry {
    /// Builds an entry from possibly untrusted text such as token symbols.
    pub fn new(
        timestamp: impl AsRef<str>,
        spent: impl AsRef<str>,
        bought: impl AsRef<str>,
        tx_hash: impl AsRef<str>,
    ) -> Self {
        Self {
            timestamp: sanitize_field(timestamp.as_ref()),
            spent: sanitize_field(spent.as_ref()),
            bought: sanitize_field(bought.as_ref()),
            tx_hash: sanitize_field(tx_hash.as_ref()),
        }
    }

    /// The entry's line, provided it parses back to the same entry.
    pub fn to_line(&self) -> Result<String, StoreError> {
        let line = self.to_string();
        let single_line = !line.contains(['\n', '\r']);
        if single_line && Self::parse(&line).as_ref() == Some(self) {
            Ok(line)
        } else {
            Err(StoreError::InvalidEntry(line))
        }
    }

    pub fn parse(line: &str) -> Option<Self> {
        let caps = ledger_line().captures(line)?;
        Some(Self {
            timestamp: caps[1].to_string(),
            spent: caps[2].to_string(),
            bought: caps[3].to_string(),
            tx_hash: caps[4].to_string(),
        })
    }
}

/// Everything read back from a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSnapshot {
    pub config: SweepConfiguration,
    /// Oldest first.
    pub entries: Vec<SweepLedgerEntry>,
    pub malformed_lines: usize,
}

impl SweepSnapshot {
    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> &[SweepLedgerEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

pub trait SweepStore: Send + Sync {
    fn load(&self) -> Result<SweepSnapshot, StoreError>;

    /// Replaces the configuration, leaving the ledger untouched.
    fn save_config(&self, config: &SweepConfiguration) -> Result<(), StoreError>;

    fn append_entry(&self, entry: &SweepLedgerEntry) -> Result<(), StoreError>;
}

fn header_lines(config: &SweepConfiguration) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if let Some(target) = config.target_token {
        lines.push(format!("{TARGET_KEY}={}", to_checksummed_address(&target)));
    }
    lines.push(format!("{NETWORK_KEY}={}", config.network));
    lines
}

/// `key=value` with a plain identifier key, both sides trimmed.
fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let plain = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    plain.then(|| (key, value.trim()))
}

fn is_header(line: &str) -> bool {
    matches!(key_value(line.trim()), Some((TARGET_KEY | NETWORK_KEY, _)))
}

/// Parses the whole file body. Unknown lines are counted, never fatal.
pub fn parse_snapshot(body: &str) -> SweepSnapshot {
    let mut snapshot = SweepSnapshot::default();
    for (index, raw) in body.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(entry) = SweepLedgerEntry::parse(line) {
            snapshot.entries.push(entry);
            continue;
        }
        match key_value(line) {
            Some((TARGET_KEY, value)) => match value.parse::<Address>() {
                Ok(address) => snapshot.config.target_token = Some(address),
                Err(e) => {
                    warn!(line = index + 1, value, error = %e, "unreadable target in sweep config");
                    snapshot.malformed_lines += 1;
                }
            },
            Some((NETWORK_KEY, value)) => snapshot.config.network = value.to_string(),
            Some((key, _)) => debug!(line = index + 1, key, "ignoring unknown sweep config key"),
            None => {
                warn!(line = index + 1, content = line, "skipping malformed sweep log line");
                snapshot.malformed_lines += 1;
            }
        }
    }
    snapshot
}

/// Line-oriented store at `<data_dir>/sweep.config`.
#[derive(Debug, Clone)]
pub struct FileSweepStore {
    path: PathBuf,
}

impl FileSweepStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(StoreError::io(dir))
            }
            _ => Ok(()),
        }
    }

    fn read_body(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path)(e)),
        }
    }
}

impl SweepStore for FileSweepStore {
    fn load(&self) -> Result<SweepSnapshot, StoreError> {
        Ok(self
            .read_body()?
            .map(|body| parse_snapshot(&body))
            .unwrap_or_default())
    }

    fn save_config(&self, config: &SweepConfiguration) -> Result<(), StoreError> {
        self.ensure_parent()?;
        let existing = self.read_body()?.unwrap_or_default();

        let mut body = header_lines(config).join("\n");
        body.push('\n');
        for line in existing.lines().filter(|line| !is_header(line)) {
            body.push_str(line);
            body.push('\n');
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(StoreError::io(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(StoreError::io(&self.path))?;
        debug!(path = %self.path.display(), "sweep config saved");
        Ok(())
    }

    fn append_entry(&self, entry: &SweepLedgerEntry) -> Result<(), StoreError> {
        let line = entry.to_line()?;
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(StoreError::io(&self.path))?;
        writeln!(file, "{line}").map_err(StoreError::io(&self.path))
    }
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemorySweepStore {
    inner: Mutex<SweepSnapshot>,
}

impl MemorySweepStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SweepConfiguration) -> Self {
        Self {
            inner: Mutex::new(SweepSnapshot {
                config,
                ..SweepSnapshot::default()
            }),
        }
    }

    fn snapshot(&self) -> std::sync::MutexGuard<'_, SweepSnapshot> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SweepStore for MemorySweepStore {
    fn load(&self) -> Result<SweepSnapshot, StoreError> {
        Ok(self.snapshot().clone())
    }

    fn save_config(&self, config: &SweepConfiguration) -> Result<(), StoreError> {
        self.snapshot().config = config.clone();
        Ok(())
    }

    fn append_entry(&self, entry: &SweepLedgerEntry) -> Result<(), StoreError> {
        entry.to_line()?;
        self.snapshot().entries.push(entry.clone());
        Ok(())
    }
}
