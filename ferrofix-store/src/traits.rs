/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Message store trait definition.
//!
//! A store holds, per session, the sequence-number counters and an
//! append-only log of sent messages replayed on resend requests. Counter
//! mutations return `StoreError` so a durability failure can force the
//! owning session to disconnect instead of risking silent sequence
//! corruption.

use async_trait::async_trait;
use bytes::Bytes;
use ferrofix_core::error::StoreError;
use ferrofix_core::types::Timestamp;

/// One persisted outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// The message sequence number.
    pub seq_num: u64,
    /// The raw encoded message bytes.
    pub bytes: Bytes,
    /// Time the record was appended.
    pub timestamp: Timestamp,
}

impl StoredRecord {
    /// Creates a new record stamped with the current time.
    #[must_use]
    pub fn new(seq_num: u64, bytes: Bytes) -> Self {
        Self {
            seq_num,
            bytes,
            timestamp: Timestamp::now(),
        }
    }
}

/// Abstract interface for FIX message storage.
///
/// Implementations provide persistence for outgoing messages to support
/// resend requests and session recovery. Records are append-only per
/// session and pruned only by [`MessageStore::reset`].
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends an outgoing message for potential resend.
    ///
    /// # Errors
    /// Returns `StoreError` if the message cannot be persisted.
    async fn append(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError>;

    /// Retrieves stored records in `[begin, end]`, ascending.
    ///
    /// # Arguments
    /// * `begin` - Begin sequence number (inclusive)
    /// * `end` - End sequence number (inclusive), or 0 for "up to latest"
    ///
    /// # Errors
    /// Returns `StoreError::RangeNotAvailable` for an inverted range.
    async fn get_range(&self, begin: u64, end: u64) -> Result<Vec<StoredRecord>, StoreError>;

    /// Atomically reads and increments the sender sequence counter,
    /// returning the value to assign to the next outbound message.
    ///
    /// # Errors
    /// Returns `StoreError` if the new counter value cannot be persisted.
    async fn allocate_sender_seq(&self) -> Result<u64, StoreError>;

    /// Returns the next sender sequence number without incrementing.
    fn next_sender_seq(&self) -> u64;

    /// Returns the next expected target sequence number.
    fn next_target_seq(&self) -> u64;

    /// Sets the next sender sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn set_next_sender_seq(&self, seq: u64) -> Result<(), StoreError>;

    /// Sets the next expected target sequence number.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn set_next_target_seq(&self, seq: u64) -> Result<(), StoreError>;

    /// Increments the target sequence number after processing an inbound
    /// message.
    ///
    /// # Errors
    /// Returns `StoreError` if the counter cannot be persisted.
    async fn increment_target_seq(&self) -> Result<(), StoreError> {
        let next = self.next_target_seq() + 1;
        self.set_next_target_seq(next).await
    }

    /// Resets the store: clears all records and sets both counters to 1.
    ///
    /// # Errors
    /// Returns `StoreError` if the reset fails.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Flushes any buffered writes to durable storage.
    ///
    /// # Errors
    /// Returns `StoreError` if the flush fails.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Returns the creation time of the store/session.
    fn creation_time(&self) -> std::time::SystemTime;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingStore {
        sender: AtomicU64,
        target: AtomicU64,
    }

    #[async_trait]
    impl MessageStore for CountingStore {
        async fn append(&self, _seq_num: u64, _message: &[u8]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get_range(&self, _begin: u64, _end: u64) -> Result<Vec<StoredRecord>, StoreError> {
            Ok(vec![])
        }

        async fn allocate_sender_seq(&self) -> Result<u64, StoreError> {
            Ok(self.sender.fetch_add(1, Ordering::SeqCst))
        }

        fn next_sender_seq(&self) -> u64 {
            self.sender.load(Ordering::SeqCst)
        }

        fn next_target_seq(&self) -> u64 {
            self.target.load(Ordering::SeqCst)
        }

        async fn set_next_sender_seq(&self, seq: u64) -> Result<(), StoreError> {
            self.sender.store(seq, Ordering::SeqCst);
            Ok(())
        }

        async fn set_next_target_seq(&self, seq: u64) -> Result<(), StoreError> {
            self.target.store(seq, Ordering::SeqCst);
            Ok(())
        }

        async fn reset(&self) -> Result<(), StoreError> {
            self.sender.store(1, Ordering::SeqCst);
            self.target.store(1, Ordering::SeqCst);
            Ok(())
        }

        fn creation_time(&self) -> std::time::SystemTime {
            std::time::SystemTime::now()
        }
    }

    #[tokio::test]
    async fn test_default_increment_target_seq() {
        let store = CountingStore {
            sender: AtomicU64::new(1),
            target: AtomicU64::new(1),
        };

        store.increment_target_seq().await.unwrap();
        store.increment_target_seq().await.unwrap();
        assert_eq!(store.next_target_seq(), 3);
    }

    #[tokio::test]
    async fn test_allocate_is_read_then_increment() {
        let store = CountingStore {
            sender: AtomicU64::new(5),
            target: AtomicU64::new(1),
        };

        assert_eq!(store.allocate_sender_seq().await.unwrap(), 5);
        assert_eq!(store.next_sender_seq(), 6);
    }
}
