/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Core identity and scalar types for FIX session operations.
//!
//! This module provides:
//! - [`SeqNum`]: Sequence number wrapper
//! - [`Timestamp`]: FIX-formatted timestamp with nanosecond precision
//! - [`CompId`]: Component identifier (SenderCompID, TargetCompID)
//! - [`SessionId`]: The immutable tuple identifying a logical FIX connection

use arrayvec::ArrayString;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length for CompID strings in bytes.
pub const COMP_ID_MAX_LEN: usize = 32;

/// FIX message sequence number.
///
/// Sequence numbers are unsigned 64-bit integers that identify messages
/// within a FIX session. They start at 1 and increment for each message sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Checks if this sequence number is valid (>= 1).
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SeqNum> for u64 {
    fn from(seq: SeqNum) -> Self {
        seq.0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// FIX protocol timestamp with nanosecond precision.
///
/// Timestamps in FIX are formatted as `YYYYMMDD-HH:MM:SS.sss` (milliseconds)
/// or with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
    nanos_since_epoch: u64,
}

impl Timestamp {
    /// Creates a timestamp from nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            nanos_since_epoch: nanos,
        }
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos_since_epoch: millis * 1_000_000,
        }
    }

    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        let dt = Utc::now();
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }

    /// Returns nanoseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.nanos_since_epoch
    }

    /// Returns milliseconds since Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.nanos_since_epoch / 1_000_000
    }

    /// Converts to a chrono `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.nanos_since_epoch as i64)
    }

    /// Formats the timestamp in FIX format with millisecond precision.
    ///
    /// Format: `YYYYMMDD-HH:MM:SS.sss`
    #[must_use]
    pub fn format_millis(self) -> ArrayString<21> {
        let dt = self.to_datetime();
        let mut buf = ArrayString::new();
        let _ = std::fmt::write(
            &mut buf,
            format_args!("{}", dt.format("%Y%m%d-%H:%M:%S%.3f")),
        );
        buf
    }

    /// Parses a FIX-formatted timestamp (`YYYYMMDD-HH:MM:SS` with optional
    /// fractional seconds), as found in SendingTime and OrigSendingTime.
    #[must_use]
    pub fn parse_fix(s: &str) -> Option<Self> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y%m%d-%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y%m%d-%H:%M:%S"))
            .ok()?;
        let nanos = naive.and_utc().timestamp_nanos_opt()?;
        Some(Self {
            nanos_since_epoch: nanos as u64,
        })
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            nanos_since_epoch: dt.timestamp_nanos_opt().unwrap_or(0) as u64,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_millis())
    }
}

/// Component identifier for FIX sessions.
///
/// Used for SenderCompID (tag 49), TargetCompID (tag 56), and related fields.
/// Maximum length is 32 characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CompId(ArrayString<COMP_ID_MAX_LEN>);

impl CompId {
    /// Creates a new CompId from a string slice.
    ///
    /// # Returns
    /// `Some(CompId)` if the string fits within the maximum length, `None` otherwise.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the CompId as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the length of the CompId in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the CompId is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for CompId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompId {
    type Err = arrayvec::CapacityError<()>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArrayString::try_from(s)
            .map(Self)
            .map_err(|_| arrayvec::CapacityError::new(()))
    }
}

/// Immutable identity tuple for a logical FIX connection.
///
/// The identity key for session lookup: {BeginString, SenderCompID,
/// TargetCompID} plus optional sub and location qualifiers. Never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    /// BeginString (FIX version).
    pub begin_string: String,
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56).
    pub target_comp_id: CompId,
    /// Optional sender sub ID (tag 50).
    pub sender_sub_id: Option<String>,
    /// Optional target sub ID (tag 57).
    pub target_sub_id: Option<String>,
    /// Optional sender location ID (tag 142).
    pub sender_location_id: Option<String>,
    /// Optional target location ID (tag 143).
    pub target_location_id: Option<String>,
}

impl SessionId {
    /// Creates a new session ID from the mandatory tuple members.
    #[must_use]
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: CompId,
        target_comp_id: CompId,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id,
            target_comp_id,
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            target_location_id: None,
        }
    }

    /// Sets the sender sub ID.
    #[must_use]
    pub fn with_sender_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sender_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the target sub ID.
    #[must_use]
    pub fn with_target_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.target_sub_id = Some(sub_id.into());
        self
    }

    /// Sets the sender location ID.
    #[must_use]
    pub fn with_sender_location_id(mut self, loc_id: impl Into<String>) -> Self {
        self.sender_location_id = Some(loc_id.into());
        self
    }

    /// Sets the target location ID.
    #[must_use]
    pub fn with_target_location_id(mut self, loc_id: impl Into<String>) -> Self {
        self.target_location_id = Some(loc_id.into());
        self
    }

    /// Returns the identity as seen by the counterparty (sender and target
    /// swapped), used to match inbound headers against a local session.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            begin_string: self.begin_string.clone(),
            sender_comp_id: self.target_comp_id.clone(),
            target_comp_id: self.sender_comp_id.clone(),
            sender_sub_id: self.target_sub_id.clone(),
            target_sub_id: self.sender_sub_id.clone(),
            sender_location_id: self.target_location_id.clone(),
            target_location_id: self.sender_location_id.clone(),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_operations() {
        let seq = SeqNum::new(5);
        assert_eq!(seq.value(), 5);
        assert_eq!(seq.next().value(), 6);
        assert!(seq.is_valid());
        assert!(!SeqNum::new(0).is_valid());
    }

    #[test]
    fn test_seq_num_default() {
        let seq = SeqNum::default();
        assert_eq!(seq.value(), 1);
    }

    #[test]
    fn test_timestamp_conversions() {
        let ts = Timestamp::from_millis(1000);
        assert_eq!(ts.as_millis(), 1000);
        assert_eq!(ts.as_nanos(), 1_000_000_000);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = Timestamp::from_millis(0);
        let formatted = ts.format_millis();
        assert!(formatted.starts_with("19700101-00:00:00"));
    }

    #[test]
    fn test_timestamp_parse_fix_roundtrip() {
        let ts = Timestamp::from_millis(1_700_000_000_123);
        let formatted = ts.format_millis();
        let parsed = Timestamp::parse_fix(&formatted).unwrap();
        assert_eq!(parsed.as_millis(), ts.as_millis());
    }

    #[test]
    fn test_timestamp_parse_fix_no_fraction() {
        let parsed = Timestamp::parse_fix("19700101-00:00:01").unwrap();
        assert_eq!(parsed.as_millis(), 1000);
        assert!(Timestamp::parse_fix("not a timestamp").is_none());
    }

    #[test]
    fn test_comp_id() {
        let id = CompId::new("SENDER").unwrap();
        assert_eq!(id.as_str(), "SENDER");
        assert_eq!(id.len(), 6);
        assert!(!id.is_empty());
    }

    #[test]
    fn test_comp_id_too_long() {
        let long_str = "A".repeat(COMP_ID_MAX_LEN + 1);
        assert!(CompId::new(&long_str).is_none());
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new(
            "FIX.4.4",
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        );
        assert_eq!(id.to_string(), "FIX.4.4:SENDER->TARGET");
    }

    #[test]
    fn test_session_id_reversed() {
        let id = SessionId::new(
            "FIX.4.4",
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        )
        .with_sender_sub_id("DESK");

        let rev = id.reversed();
        assert_eq!(rev.sender_comp_id.as_str(), "TARGET");
        assert_eq!(rev.target_comp_id.as_str(), "SENDER");
        assert_eq!(rev.target_sub_id.as_deref(), Some("DESK"));
        assert_eq!(rev.reversed(), id);
    }
}
