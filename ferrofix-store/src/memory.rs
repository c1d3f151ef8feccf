/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! In-memory message store implementation.
//!
//! Suitable for tests and sessions configured without durability. All data
//! is lost when the process exits.

use crate::traits::{MessageStore, StoredRecord};
use async_trait::async_trait;
use bytes::Bytes;
use ferrofix_core::error::StoreError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// In-memory message store.
///
/// Records live in a `BTreeMap` for efficient ascending range queries.
#[derive(Debug)]
pub struct MemoryStore {
    /// Stored records indexed by sequence number.
    records: RwLock<BTreeMap<u64, StoredRecord>>,
    /// Next sender sequence number.
    next_sender_seq: AtomicU64,
    /// Next expected target sequence number.
    next_target_seq: AtomicU64,
    /// Store creation time.
    creation_time: SystemTime,
}

impl MemoryStore {
    /// Creates a new empty memory store with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial_seqs(1, 1)
    }

    /// Creates a new memory store with initial sequence numbers.
    #[must_use]
    pub fn with_initial_seqs(sender_seq: u64, target_seq: u64) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_sender_seq: AtomicU64::new(sender_seq),
            next_target_seq: AtomicU64::new(target_seq),
            creation_time: SystemTime::now(),
        }
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }

    /// Checks if a record with the given sequence number exists.
    #[must_use]
    pub fn contains(&self, seq_num: u64) -> bool {
        self.records.read().contains_key(&seq_num)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError> {
        let record = StoredRecord::new(seq_num, Bytes::copy_from_slice(message));
        self.records.write().insert(seq_num, record);
        Ok(())
    }

    async fn get_range(&self, begin: u64, end: u64) -> Result<Vec<StoredRecord>, StoreError> {
        let end = if end == 0 { u64::MAX } else { end };
        if begin > end {
            return Err(StoreError::RangeNotAvailable { range: begin..end });
        }

        let records = self.records.read();
        Ok(records.range(begin..=end).map(|(_, r)| r.clone()).collect())
    }

    async fn allocate_sender_seq(&self) -> Result<u64, StoreError> {
        Ok(self.next_sender_seq.fetch_add(1, Ordering::SeqCst))
    }

    fn next_sender_seq(&self) -> u64 {
        self.next_sender_seq.load(Ordering::SeqCst)
    }

    fn next_target_seq(&self) -> u64 {
        self.next_target_seq.load(Ordering::SeqCst)
    }

    async fn set_next_sender_seq(&self, seq: u64) -> Result<(), StoreError> {
        self.next_sender_seq.store(seq, Ordering::SeqCst);
        Ok(())
    }

    async fn set_next_target_seq(&self, seq: u64) -> Result<(), StoreError> {
        self.next_target_seq.store(seq, Ordering::SeqCst);
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.records.write().clear();
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        self.creation_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.next_sender_seq(), 1);
        assert_eq!(store.next_target_seq(), 1);
        assert_eq!(store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_append_and_contains() {
        let store = MemoryStore::new();

        store.append(1, b"message1").await.unwrap();
        store.append(2, b"message2").await.unwrap();

        assert_eq!(store.record_count(), 2);
        assert!(store.contains(1));
        assert!(store.contains(2));
        assert!(!store.contains(3));
    }

    #[tokio::test]
    async fn test_memory_store_get_range_ascending_inclusive() {
        let store = MemoryStore::new();

        store.append(1, b"msg1").await.unwrap();
        store.append(2, b"msg2").await.unwrap();
        store.append(3, b"msg3").await.unwrap();
        store.append(5, b"msg5").await.unwrap();

        let range = store.get_range(1, 3).await.unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].seq_num, 1);
        assert_eq!(range[2].seq_num, 3);
        assert_eq!(&range[2].bytes[..], b"msg3");

        // Records 4 simply isn't there; the caller gap-fills it.
        let range = store.get_range(2, 5).await.unwrap();
        assert_eq!(
            range.iter().map(|r| r.seq_num).collect::<Vec<_>>(),
            vec![2, 3, 5]
        );
    }

    #[tokio::test]
    async fn test_memory_store_get_range_unbounded_end() {
        let store = MemoryStore::new();
        store.append(7, b"msg7").await.unwrap();
        store.append(9, b"msg9").await.unwrap();

        let range = store.get_range(8, 0).await.unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].seq_num, 9);
    }

    #[tokio::test]
    async fn test_memory_store_inverted_range() {
        let store = MemoryStore::new();
        let result = store.get_range(5, 3).await;
        assert!(matches!(result, Err(StoreError::RangeNotAvailable { .. })));
    }

    #[tokio::test]
    async fn test_memory_store_allocate_sender_seq() {
        let store = MemoryStore::new();

        assert_eq!(store.allocate_sender_seq().await.unwrap(), 1);
        assert_eq!(store.allocate_sender_seq().await.unwrap(), 2);
        assert_eq!(store.next_sender_seq(), 3);
    }

    #[tokio::test]
    async fn test_memory_store_reset() {
        let store = MemoryStore::new();

        store.append(1, b"msg1").await.unwrap();
        store.set_next_sender_seq(10).await.unwrap();
        store.set_next_target_seq(20).await.unwrap();

        store.reset().await.unwrap();

        assert_eq!(store.record_count(), 0);
        assert_eq!(store.next_sender_seq(), 1);
        assert_eq!(store.next_target_seq(), 1);
    }
}
