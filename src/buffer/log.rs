//! Durable Buffer Module
//!
//! An append-only, crash-tolerant log of pending writes awaiting replay
//! into the backing store. Records are serialized as one JSON line each;
//! an append is durable (fsync) before it returns when `durable_sync` is
//! on. Reopening the file after a crash recovers every committed record
//! and tolerates a torn final line.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::buffer::BufferRecord;
use crate::error::{CacheError, Result};

// == Durable Buffer ==
/// Append-only log of pending writes.
///
/// Pending records are mirrored in memory keyed by sequence; the file is
/// the durable source of truth and is compacted whenever a prefix is
/// acknowledged.
#[derive(Debug)]
pub struct DurableBuffer {
    /// Log file path
    path: PathBuf,
    /// Open append handle
    file: File,
    /// Pending records by sequence
    pending: BTreeMap<u64, BufferRecord>,
    /// Next sequence to assign
    next_sequence: u64,
    /// Whether appends fsync before returning
    durable_sync: bool,
    /// Test hook: force the next appends to fail
    #[cfg(test)]
    fail_appends: bool,
}

impl DurableBuffer {
    // == Open ==
    /// Opens (or creates) the buffer log at `path` and recovers any
    /// committed records.
    ///
    /// Sequence numbering resumes above the highest recovered sequence. A
    /// trailing line that fails to parse is treated as a torn write from a
    /// crash and discarded with a warning; a malformed line in the middle
    /// of the log is an error.
    pub fn open(path: impl AsRef<Path>, durable_sync: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut pending = BTreeMap::new();
        let mut next_sequence = 1;
        let mut torn_tail = false;

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
            let last = lines.len().saturating_sub(1);
            for (i, line) in lines.iter().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<BufferRecord>(line) {
                    Ok(record) => {
                        next_sequence = next_sequence.max(record.sequence + 1);
                        pending.insert(record.sequence, record);
                    }
                    Err(e) if i == last => {
                        warn!("Discarding torn record at end of buffer log: {}", e);
                        torn_tail = true;
                    }
                    Err(e) => {
                        return Err(CacheError::DurabilityWrite {
                            source: std::io::Error::new(
                                std::io::ErrorKind::InvalidData,
                                format!("corrupt buffer record at line {}: {}", i + 1, e),
                            ),
                        });
                    }
                }
            }
            debug!(
                "Recovered {} pending buffer records from {}",
                pending.len(),
                path.display()
            );
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut buffer = Self {
            path,
            file,
            pending,
            next_sequence,
            durable_sync,
            #[cfg(test)]
            fail_appends: false,
        };
        // The torn bytes must not prefix the next append
        if torn_tail {
            buffer.compact()?;
        }
        Ok(buffer)
    }

    // == Append ==
    /// Durably records a write and returns its assigned sequence.
    ///
    /// Returns only after the record is committed to the file (flushed,
    /// and fsynced when `durable_sync` is on). On failure the sequence is
    /// not consumed and no in-memory state changes.
    pub fn append(&mut self, key: &str, value: &str) -> Result<u64> {
        #[cfg(test)]
        if self.fail_appends {
            return Err(CacheError::DurabilityWrite {
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected append failure"),
            });
        }

        let sequence = self.next_sequence;
        let record = BufferRecord::new(sequence, key.to_string(), value.to_string());

        let mut line = serde_json::to_string(&record).map_err(|e| {
            CacheError::DurabilityWrite {
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        if self.durable_sync {
            self.file.sync_all()?;
        }

        self.next_sequence += 1;
        self.pending.insert(sequence, record);
        Ok(sequence)
    }

    // == Pending ==
    /// Returns all records with sequence > `since`, oldest first,
    /// de-duplicated so only the latest record per key remains.
    pub fn pending(&self, since: u64) -> Vec<BufferRecord> {
        let mut latest_by_key: BTreeMap<&str, &BufferRecord> = BTreeMap::new();
        for record in self.pending.range(since + 1..).map(|(_, r)| r) {
            latest_by_key.insert(&record.key, record);
        }
        let mut records: Vec<BufferRecord> = latest_by_key.into_values().cloned().collect();
        records.sort_by_key(|r| r.sequence);
        records
    }

    // == Ack ==
    /// Marks all records with sequence <= `upto` as safely persisted and
    /// removes them; idempotent. Compacts the log file to the surviving
    /// records.
    pub fn ack(&mut self, upto: u64) -> Result<()> {
        let before = self.pending.len();
        self.pending.retain(|&seq, _| seq > upto);
        if self.pending.len() != before {
            self.compact()?;
            debug!(
                "Acknowledged {} buffer records up to sequence {}",
                before - self.pending.len(),
                upto
            );
        }
        Ok(())
    }

    // == Truncate ==
    /// Drops every record, pending or not, and resets the replay state.
    pub fn truncate(&mut self) -> Result<()> {
        self.pending.clear();
        self.compact()
    }

    /// Rewrites the log file to contain exactly the pending records.
    ///
    /// Written to a temp file then renamed over the log so a crash during
    /// compaction leaves either the old or the new file intact.
    fn compact(&mut self) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for record in self.pending.values() {
                let mut line = serde_json::to_string(record).map_err(|e| {
                    CacheError::DurabilityWrite {
                        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                    }
                })?;
                line.push('\n');
                tmp.write_all(line.as_bytes())?;
            }
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }

    /// Keys that still have a pending record.
    pub fn pending_keys(&self) -> std::collections::HashSet<String> {
        self.pending.values().map(|r| r.key.clone()).collect()
    }

    /// Number of pending records (before de-duplication).
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no records are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forces subsequent appends to fail, for durability-failure tests.
    #[cfg(test)]
    pub fn set_fail_appends(&mut self, fail: bool) {
        self.fail_appends = fail;
    }
}
