/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! File-backed message store implementation.
//!
//! Two files per session, derived from a base path:
//! - `<base>.seq`: both sequence counters, rewritten on every change
//! - `<base>.log`: append-only record log, `seq:u64 ts:u64 len:u32 payload`
//!   in big-endian framing
//!
//! Both files are replayed on open, so unacknowledged outbound messages and
//! counters survive a process restart. A torn trailing record (from a crash
//! mid-append) is ignored on replay.

use crate::traits::{MessageStore, StoredRecord};
use async_trait::async_trait;
use bytes::Bytes;
use ferrofix_core::error::StoreError;
use ferrofix_core::types::Timestamp;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

const FRAME_HEADER_LEN: usize = 8 + 8 + 4;

#[derive(Debug)]
struct LogState {
    records: BTreeMap<u64, StoredRecord>,
    log: File,
}

/// Durable file-backed message store.
///
/// Writes block on file I/O under a lock; per the engine's resource model
/// this happens on the owning session's task only.
#[derive(Debug)]
pub struct FileStore {
    state: Mutex<LogState>,
    next_sender_seq: AtomicU64,
    next_target_seq: AtomicU64,
    seq_path: PathBuf,
    creation_time: SystemTime,
}

impl FileStore {
    /// Opens (or creates) the store at the given base path.
    ///
    /// `<base>.seq` and `<base>.log` are created if absent and replayed if
    /// present.
    ///
    /// # Errors
    /// Returns `StoreError` if the files cannot be opened or are corrupted.
    pub fn open(base: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base = base.as_ref();
        if let Some(parent) = base.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let seq_path = base.with_extension("seq");
        let log_path = base.with_extension("log");

        let (sender_seq, target_seq) = read_seq_file(&seq_path)?;

        let mut log = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&log_path)?;
        let records = replay_log(&mut log)?;

        Ok(Self {
            state: Mutex::new(LogState { records, log }),
            next_sender_seq: AtomicU64::new(sender_seq),
            next_target_seq: AtomicU64::new(target_seq),
            seq_path,
            creation_time: SystemTime::now(),
        })
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    fn persist_seqs(&self) -> Result<(), StoreError> {
        let sender = self.next_sender_seq.load(Ordering::SeqCst);
        let target = self.next_target_seq.load(Ordering::SeqCst);
        std::fs::write(&self.seq_path, format!("{sender} {target}\n"))?;
        Ok(())
    }
}

fn read_seq_file(path: &Path) -> Result<(u64, u64), StoreError> {
    if !path.exists() {
        return Ok((1, 1));
    }
    let content = std::fs::read_to_string(path)?;
    let mut parts = content.split_whitespace();
    let parse = |s: Option<&str>| {
        s.and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| StoreError::Corrupted {
                reason: format!("unparsable sequence file {}", path.display()),
            })
    };
    let sender = parse(parts.next())?;
    let target = parse(parts.next())?;
    Ok((sender, target))
}

fn replay_log(log: &mut File) -> Result<BTreeMap<u64, StoredRecord>, StoreError> {
    let mut buf = Vec::new();
    log.read_to_end(&mut buf)?;

    let mut records = BTreeMap::new();
    let mut pos = 0usize;
    while buf.len() - pos >= FRAME_HEADER_LEN {
        let seq_num = u64::from_be_bytes(buf[pos..pos + 8].try_into().expect("8-byte slice"));
        let ts_nanos =
            u64::from_be_bytes(buf[pos + 8..pos + 16].try_into().expect("8-byte slice"));
        let len =
            u32::from_be_bytes(buf[pos + 16..pos + 20].try_into().expect("4-byte slice")) as usize;
        let payload_start = pos + FRAME_HEADER_LEN;
        if buf.len() - payload_start < len {
            // Torn trailing record from an interrupted append.
            break;
        }
        let bytes = Bytes::copy_from_slice(&buf[payload_start..payload_start + len]);
        records.insert(
            seq_num,
            StoredRecord {
                seq_num,
                bytes,
                timestamp: Timestamp::from_nanos(ts_nanos),
            },
        );
        pos = payload_start + len;
    }
    Ok(records)
}

#[async_trait]
impl MessageStore for FileStore {
    async fn append(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError> {
        let record = StoredRecord::new(seq_num, Bytes::copy_from_slice(message));

        let mut state = self.state.lock();
        let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + message.len());
        frame.extend_from_slice(&seq_num.to_be_bytes());
        frame.extend_from_slice(&record.timestamp.as_nanos().to_be_bytes());
        frame.extend_from_slice(&(message.len() as u32).to_be_bytes());
        frame.extend_from_slice(message);

        state
            .log
            .write_all(&frame)
            .map_err(|e| StoreError::AppendFailed {
                seq_num,
                reason: e.to_string(),
            })?;
        state.records.insert(seq_num, record);
        Ok(())
    }

    async fn get_range(&self, begin: u64, end: u64) -> Result<Vec<StoredRecord>, StoreError> {
        let end = if end == 0 { u64::MAX } else { end };
        if begin > end {
            return Err(StoreError::RangeNotAvailable { range: begin..end });
        }

        let state = self.state.lock();
        Ok(state
            .records
            .range(begin..=end)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn allocate_sender_seq(&self) -> Result<u64, StoreError> {
        let seq = self.next_sender_seq.fetch_add(1, Ordering::SeqCst);
        self.persist_seqs()?;
        Ok(seq)
    }

    fn next_sender_seq(&self) -> u64 {
        self.next_sender_seq.load(Ordering::SeqCst)
    }

    fn next_target_seq(&self) -> u64 {
        self.next_target_seq.load(Ordering::SeqCst)
    }

    async fn set_next_sender_seq(&self, seq: u64) -> Result<(), StoreError> {
        self.next_sender_seq.store(seq, Ordering::SeqCst);
        self.persist_seqs()
    }

    async fn set_next_target_seq(&self, seq: u64) -> Result<(), StoreError> {
        self.next_target_seq.store(seq, Ordering::SeqCst);
        self.persist_seqs()
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.log.set_len(0)?;
        state.records.clear();
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
        drop(state);
        self.persist_seqs()
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let state = self.state.lock();
        state.log.sync_all()?;
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        self.creation_time
    }
}
