/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Sequence number management.
//!
//! The session's runtime view of both counters. The authoritative copy lives
//! in the message store; the session keeps these in sync after every
//! allocation and increment.

use std::sync::atomic::{AtomicU64, Ordering};

/// Manages sequence numbers for a FIX session.
///
/// Uses atomic operations for lock-free reads from the registry while the
/// session task mutates.
#[derive(Debug)]
pub struct SequenceManager {
    /// Next outgoing sequence number.
    next_sender_seq: AtomicU64,
    /// Next expected incoming sequence number.
    next_target_seq: AtomicU64,
}

impl SequenceManager {
    /// Creates a new sequence manager with both counters at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::with_initial(1, 1)
    }

    /// Creates a new sequence manager with specified starting values.
    #[must_use]
    pub fn with_initial(sender_seq: u64, target_seq: u64) -> Self {
        Self {
            next_sender_seq: AtomicU64::new(sender_seq),
            next_target_seq: AtomicU64::new(target_seq),
        }
    }

    /// Returns the next sender sequence number without incrementing.
    #[inline]
    #[must_use]
    pub fn next_sender(&self) -> u64 {
        self.next_sender_seq.load(Ordering::SeqCst)
    }

    /// Returns the next expected target sequence number.
    #[inline]
    #[must_use]
    pub fn next_target(&self) -> u64 {
        self.next_target_seq.load(Ordering::SeqCst)
    }

    /// Sets the next sender sequence number.
    #[inline]
    pub fn set_sender(&self, seq: u64) {
        self.next_sender_seq.store(seq, Ordering::SeqCst);
    }

    /// Sets the next expected target sequence number.
    #[inline]
    pub fn set_target(&self, seq: u64) {
        self.next_target_seq.store(seq, Ordering::SeqCst);
    }

    /// Increments the expected target sequence number after processing an
    /// inbound message.
    #[inline]
    pub fn increment_target(&self) {
        self.next_target_seq.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets both counters to 1.
    #[inline]
    pub fn reset(&self) {
        self.next_sender_seq.store(1, Ordering::SeqCst);
        self.next_target_seq.store(1, Ordering::SeqCst);
    }

    /// Checks an incoming sequence number against the expected counter.
    #[must_use]
    pub fn check(&self, received: u64) -> SequenceCheck {
        let expected = self.next_target_seq.load(Ordering::SeqCst);

        if received == expected {
            SequenceCheck::InOrder
        } else if received < expected {
            SequenceCheck::TooLow { expected, received }
        } else {
            SequenceCheck::Gap { expected, received }
        }
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Verdict of an inbound sequence number check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Sequence number matches the expected counter.
    InOrder,
    /// Sequence number is lower than expected: duplicate, or fatal without
    /// PossDup.
    TooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
    /// Sequence number is higher than expected: messages were missed.
    Gap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
}

impl SequenceCheck {
    /// Returns true if the sequence number is as expected.
    #[must_use]
    pub const fn is_in_order(&self) -> bool {
        matches!(self, Self::InOrder)
    }

    /// Returns true if a gap was detected.
    #[must_use]
    pub const fn is_gap(&self) -> bool {
        matches!(self, Self::Gap { .. })
    }

    /// Returns true if the sequence number is too low.
    #[must_use]
    pub const fn is_too_low(&self) -> bool {
        matches!(self, Self::TooLow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_manager_new() {
        let mgr = SequenceManager::new();
        assert_eq!(mgr.next_sender(), 1);
        assert_eq!(mgr.next_target(), 1);
    }

    #[test]
    fn test_increment_target() {
        let mgr = SequenceManager::new();

        mgr.increment_target();
        assert_eq!(mgr.next_target(), 2);

        mgr.increment_target();
        assert_eq!(mgr.next_target(), 3);
    }

    #[test]
    fn test_check_verdicts() {
        let mgr = SequenceManager::new();

        assert!(mgr.check(1).is_in_order());

        mgr.set_target(5);
        assert!(mgr.check(4).is_too_low());
        assert!(mgr.check(5).is_in_order());
        assert!(mgr.check(10).is_gap());

        assert_eq!(
            mgr.check(10),
            SequenceCheck::Gap {
                expected: 5,
                received: 10
            }
        );
    }

    #[test]
    fn test_reset() {
        let mgr = SequenceManager::with_initial(100, 200);
        assert_eq!(mgr.next_sender(), 100);
        assert_eq!(mgr.next_target(), 200);

        mgr.reset();
        assert_eq!(mgr.next_sender(), 1);
        assert_eq!(mgr.next_target(), 1);
    }
}
