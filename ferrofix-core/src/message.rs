/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Message types for the FIX session layer.
//!
//! This module provides:
//! - [`AdminMsgType`]: The closed set of administrative message types the
//!   engine handles itself
//! - [`MsgType`]: Tagged union over the admin set plus an open extension
//!   point for application message kinds
//! - [`RawMessage`]: Zero-copy view into a FIX message buffer
//! - [`OwnedMessage`]: Owned message for storage and cross-thread transfer

use crate::error::DecodeError;
use crate::field::FieldRef;
use crate::tags;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// Administrative message types, handled entirely by the session engine.
///
/// Every other MsgType is forwarded to the application callback interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminMsgType {
    /// Heartbeat (0).
    Heartbeat,
    /// Test Request (1).
    TestRequest,
    /// Resend Request (2).
    ResendRequest,
    /// Reject (3).
    Reject,
    /// Sequence Reset (4), plain or gap-fill.
    SequenceReset,
    /// Logout (5).
    Logout,
    /// Logon (A).
    Logon,
}

impl AdminMsgType {
    /// Parses an administrative message type from its wire value.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "0" => Some(Self::Heartbeat),
            "1" => Some(Self::TestRequest),
            "2" => Some(Self::ResendRequest),
            "3" => Some(Self::Reject),
            "4" => Some(Self::SequenceReset),
            "5" => Some(Self::Logout),
            "A" => Some(Self::Logon),
            _ => None,
        }
    }

    /// Returns the wire representation of this message type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::Logon => "A",
        }
    }
}

impl fmt::Display for AdminMsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// FIX message type: a closed administrative set plus an open application set.
///
/// Dispatch on inbound messages is a match over this union rather than a
/// string-comparison cascade; unknown application types still flow through
/// as [`MsgType::App`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MsgType {
    /// Session-level message, consumed by the engine.
    Admin(AdminMsgType),
    /// Application-level message, forwarded to the callback interface.
    App(String),
}

impl MsgType {
    /// Parses a message type from its wire value.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match AdminMsgType::from_wire(s) {
            Some(admin) => Self::Admin(admin),
            None => Self::App(s.to_string()),
        }
    }

    /// Returns the wire representation of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin(a) => a.as_str(),
            Self::App(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative message.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Returns true if this is an application message.
    #[must_use]
    pub const fn is_app(&self) -> bool {
        matches!(self, Self::App(_))
    }

    /// Returns the admin kind, if this is an administrative message.
    #[must_use]
    pub const fn admin(&self) -> Option<AdminMsgType> {
        match self {
            Self::Admin(a) => Some(*a),
            Self::App(_) => None,
        }
    }
}

impl std::str::FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_wire(s))
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for MsgType {
    fn default() -> Self {
        Self::Admin(AdminMsgType::Heartbeat)
    }
}

/// One decoded repeating group: the counting tag and its entries.
///
/// Entries are field lists in wire order; the instance count always equals
/// the value of the preceding counting field, enforced at decode time.
#[derive(Debug, Clone)]
pub struct GroupRef<'a> {
    /// The NoXXX counting tag that introduced the group.
    pub count_tag: u32,
    /// Decoded group entries, each a list of fields in template order.
    pub entries: Vec<Vec<FieldRef<'a>>>,
}

/// Zero-copy view into a FIX message buffer.
///
/// Holds references into the original message buffer, avoiding allocation
/// during parsing. Fields are stored as references into the buffer; decoded
/// repeating groups additionally appear in [`RawMessage::groups`].
#[derive(Debug, Clone)]
pub struct RawMessage<'a> {
    /// The complete message buffer.
    buffer: &'a [u8],
    /// Range of the BeginString field value.
    begin_string: Range<usize>,
    /// Range of the message body (after BodyLength, before checksum).
    body: Range<usize>,
    /// The parsed message type.
    msg_type: MsgType,
    /// Parsed field references (tag and value ranges).
    fields: SmallVec<[FieldRef<'a>; 32]>,
    /// Decoded repeating groups, when a group dictionary was supplied.
    groups: Vec<GroupRef<'a>>,
}

impl<'a> RawMessage<'a> {
    /// Creates a new RawMessage from parsed components.
    #[must_use]
    pub fn new(
        buffer: &'a [u8],
        begin_string: Range<usize>,
        body: Range<usize>,
        msg_type: MsgType,
        fields: SmallVec<[FieldRef<'a>; 32]>,
        groups: Vec<GroupRef<'a>>,
    ) -> Self {
        Self {
            buffer,
            begin_string,
            body,
            msg_type,
            fields,
            groups,
        }
    }

    /// Returns the complete message buffer.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns the BeginString value (e.g., "FIX.4.4").
    #[must_use]
    pub fn begin_string(&self) -> &'a str {
        std::str::from_utf8(&self.buffer[self.begin_string.clone()]).unwrap_or("")
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Returns an iterator over all fields.
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldRef<'a>> {
        self.fields.iter()
    }

    /// Returns the number of fields in the message.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Gets the first field with the given tag, or `None`.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&FieldRef<'a>> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Gets a field value as a string, or `None` if absent or invalid UTF-8.
    #[must_use]
    pub fn get_field_str(&self, tag: u32) -> Option<&'a str> {
        self.get_field(tag).and_then(|f| f.as_str().ok())
    }

    /// Gets a field value parsed as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is not found or cannot be parsed.
    pub fn get_field_as<T: std::str::FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        self.get_field(tag)
            .ok_or(DecodeError::MissingRequiredField { tag })?
            .parse()
    }

    /// Returns the MsgSeqNum (tag 34) header value.
    ///
    /// # Errors
    /// Returns `DecodeError::MissingRequiredField` if the header is absent.
    pub fn msg_seq_num(&self) -> Result<u64, DecodeError> {
        self.get_field_as(tags::MSG_SEQ_NUM)
    }

    /// Returns true if the message carries PossDupFlag=Y (tag 43).
    #[must_use]
    pub fn poss_dup(&self) -> bool {
        self.get_field(tags::POSS_DUP_FLAG)
            .is_some_and(|f| f.value == b"Y")
    }

    /// Returns the decoded group for the given counting tag, if any.
    #[must_use]
    pub fn group(&self, count_tag: u32) -> Option<&GroupRef<'a>> {
        self.groups.iter().find(|g| g.count_tag == count_tag)
    }

    /// Returns all decoded repeating groups.
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[GroupRef<'a>] {
        &self.groups
    }

    /// Returns the message body range.
    #[inline]
    #[must_use]
    pub fn body_range(&self) -> &Range<usize> {
        &self.body
    }

    /// Returns the message length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the message is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Converts this borrowed message to an owned message.
    #[must_use]
    pub fn to_owned(&self) -> OwnedMessage {
        OwnedMessage::from_raw(self)
    }
}

/// Owned FIX message for storage and cross-thread transfer.
///
/// Unlike [`RawMessage`], this struct owns its data and can be safely sent
/// across threads, buffered while a gap fills, or handed to a reply channel.
#[derive(Debug, Clone)]
pub struct OwnedMessage {
    /// The complete message buffer.
    buffer: Bytes,
    /// The parsed message type.
    msg_type: MsgType,
    /// Field offsets: (tag, value_range).
    field_offsets: Vec<(u32, Range<usize>)>,
}

impl OwnedMessage {
    /// Creates an OwnedMessage from a RawMessage.
    #[must_use]
    pub fn from_raw(raw: &RawMessage<'_>) -> Self {
        let buffer = Bytes::copy_from_slice(raw.buffer);
        let field_offsets = raw
            .fields
            .iter()
            .map(|f| {
                let start = f.value.as_ptr() as usize - raw.buffer.as_ptr() as usize;
                let end = start + f.value.len();
                (f.tag, start..end)
            })
            .collect();

        Self {
            buffer,
            msg_type: raw.msg_type.clone(),
            field_offsets,
        }
    }

    /// Creates an OwnedMessage from raw parts.
    #[must_use]
    pub fn new(buffer: Bytes, msg_type: MsgType, field_offsets: Vec<(u32, Range<usize>)>) -> Self {
        Self {
            buffer,
            msg_type,
            field_offsets,
        }
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Returns the message bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the message length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the message is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Gets the first field value with the given tag, or `None`.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&[u8]> {
        self.field_offsets
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, range)| &self.buffer[range.clone()])
    }

    /// Gets a field value as a string, or `None` if absent or invalid UTF-8.
    #[must_use]
    pub fn get_field_str(&self, tag: u32) -> Option<&str> {
        self.get_field(tag)
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_offsets.len()
    }

    /// Consumes the message and returns the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_msg_type_wire() {
        assert_eq!(AdminMsgType::from_wire("0"), Some(AdminMsgType::Heartbeat));
        assert_eq!(AdminMsgType::from_wire("A"), Some(AdminMsgType::Logon));
        assert_eq!(AdminMsgType::from_wire("2"), Some(AdminMsgType::ResendRequest));
        assert_eq!(AdminMsgType::from_wire("D"), None);
        assert_eq!(AdminMsgType::Logout.as_str(), "5");
    }

    #[test]
    fn test_msg_type_split() {
        let logon = MsgType::from_wire("A");
        assert!(logon.is_admin());
        assert_eq!(logon.admin(), Some(AdminMsgType::Logon));

        let order = MsgType::from_wire("D");
        assert!(order.is_app());
        assert_eq!(order.as_str(), "D");
        assert_eq!(order.admin(), None);

        let custom = MsgType::from_wire("UASQ");
        assert!(custom.is_app());
        assert_eq!(custom.as_str(), "UASQ");
    }

    #[test]
    fn test_msg_type_from_str() {
        let parsed: MsgType = "4".parse().unwrap();
        assert_eq!(parsed, MsgType::Admin(AdminMsgType::SequenceReset));
    }

    #[test]
    fn test_owned_message_field_access() {
        // Buffer: "8=FIX.4.4\x0135=D\x0149=SENDER\x01"
        // FIX.4.4 is at 2..9, D is at 13..14, SENDER is at 18..24
        let buffer = Bytes::from_static(b"8=FIX.4.4\x0135=D\x0149=SENDER\x01");
        let field_offsets = vec![(8, 2..9), (35, 13..14), (49, 18..24)];
        let msg = OwnedMessage::new(buffer, MsgType::from_wire("D"), field_offsets);

        assert_eq!(msg.get_field_str(8), Some("FIX.4.4"));
        assert_eq!(msg.get_field_str(35), Some("D"));
        assert_eq!(msg.get_field_str(49), Some("SENDER"));
        assert_eq!(msg.get_field_str(999), None);
    }
}
