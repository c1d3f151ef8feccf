/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! FIX message encoder.
//!
//! Outbound messages are assembled in two parts: a [`MessageBuilder`] holds
//! the mutable application body, and a [`MessageHeader`] carries the session
//! header the engine fills in at send time (identity, MsgSeqNum, SendingTime,
//! PossDup markers). [`encode`] joins them, computing BodyLength over the
//! body after tag 9 and the checksum trailer over everything before tag 10.

use crate::checksum::{checksum, write_trailer};
use bytes::{BufMut, BytesMut};
use ferrofix_core::message::{AdminMsgType, MsgType};
use ferrofix_core::tags;
use ferrofix_core::types::Timestamp;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

#[inline]
fn put_field(buf: &mut BytesMut, tag: u32, value: &[u8]) {
    let mut tag_buf = itoa::Buffer::new();
    buf.put_slice(tag_buf.format(tag).as_bytes());
    buf.put_u8(b'=');
    buf.put_slice(value);
    buf.put_u8(SOH);
}

#[inline]
fn put_uint_field(buf: &mut BytesMut, tag: u32, value: u64) {
    let mut val_buf = itoa::Buffer::new();
    put_field(buf, tag, val_buf.format(value).as_bytes());
}

/// One entry of a repeating group, encoded incrementally.
///
/// Fields must be added in the group template's wire order; the count
/// written for the group always equals the number of entries supplied,
/// holding the count/instance invariant by construction.
#[derive(Debug, Default)]
pub struct GroupEntry {
    fields: BytesMut,
}

impl GroupEntry {
    /// Creates an empty group entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field with a string value.
    #[inline]
    #[must_use]
    pub fn with_str(mut self, tag: u32, value: &str) -> Self {
        put_field(&mut self.fields, tag, value.as_bytes());
        self
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    #[must_use]
    pub fn with_uint(mut self, tag: u32, value: u64) -> Self {
        put_uint_field(&mut self.fields, tag, value);
        self
    }

    /// Appends a field with a single character value.
    #[inline]
    #[must_use]
    pub fn with_char(mut self, tag: u32, value: char) -> Self {
        let mut buf = [0u8; 4];
        let s = value.encode_utf8(&mut buf);
        put_field(&mut self.fields, tag, s.as_bytes());
        self
    }

    /// Returns the encoded entry bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.fields
    }

    /// Returns true if no fields were added.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Mutable builder for the application body of a FIX message.
///
/// The builder carries the MsgType and body fields only; header and trailer
/// are supplied at encode time by the session.
#[derive(Debug)]
pub struct MessageBuilder {
    msg_type: MsgType,
    body: BytesMut,
}

impl MessageBuilder {
    /// Creates a builder for the given message type.
    #[must_use]
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            msg_type,
            body: BytesMut::with_capacity(256),
        }
    }

    /// Creates a builder for an administrative message.
    #[must_use]
    pub fn admin(kind: AdminMsgType) -> Self {
        Self::new(MsgType::Admin(kind))
    }

    /// Creates a builder for an application message.
    #[must_use]
    pub fn app(msg_type: &str) -> Self {
        Self::new(MsgType::from_wire(msg_type))
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        put_field(&mut self.body, tag, value.as_bytes());
    }

    /// Appends a field with an integer value.
    #[inline]
    pub fn put_int(&mut self, tag: u32, value: i64) {
        let mut buf = itoa::Buffer::new();
        put_field(&mut self.body, tag, buf.format(value).as_bytes());
    }

    /// Appends a field with an unsigned integer value.
    #[inline]
    pub fn put_uint(&mut self, tag: u32, value: u64) {
        put_uint_field(&mut self.body, tag, value);
    }

    /// Appends a field with a boolean value (Y/N).
    #[inline]
    pub fn put_bool(&mut self, tag: u32, value: bool) {
        put_field(&mut self.body, tag, if value { b"Y" } else { b"N" });
    }

    /// Appends a field with a single character value.
    #[inline]
    pub fn put_char(&mut self, tag: u32, value: char) {
        let mut buf = [0u8; 4];
        let s = value.encode_utf8(&mut buf);
        put_field(&mut self.body, tag, s.as_bytes());
    }

    /// Appends a field with raw bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        put_field(&mut self.body, tag, value);
    }

    /// Appends a repeating group: the counting field followed by each entry.
    ///
    /// The written count is `entries.len()`.
    pub fn put_group(&mut self, count_tag: u32, entries: &[GroupEntry]) {
        put_uint_field(&mut self.body, count_tag, entries.len() as u64);
        for entry in entries {
            self.body.put_slice(entry.as_bytes());
        }
    }

    /// Returns the current body bytes.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Clears the body for reuse, keeping the message type.
    #[inline]
    pub fn clear(&mut self) {
        self.body.clear();
    }
}

/// Session header fields filled in at send time.
#[derive(Debug, Clone)]
pub struct MessageHeader<'a> {
    /// BeginString (tag 8).
    pub begin_string: &'a str,
    /// SenderCompID (tag 49).
    pub sender_comp_id: &'a str,
    /// TargetCompID (tag 56).
    pub target_comp_id: &'a str,
    /// MsgSeqNum (tag 34).
    pub msg_seq_num: u64,
    /// SendingTime (tag 52).
    pub sending_time: Timestamp,
    /// PossDupFlag (tag 43), set on retransmissions.
    pub poss_dup: bool,
    /// OrigSendingTime (tag 122), set alongside PossDupFlag.
    pub orig_sending_time: Option<Timestamp>,
    /// SenderSubID (tag 50).
    pub sender_sub_id: Option<&'a str>,
    /// TargetSubID (tag 57).
    pub target_sub_id: Option<&'a str>,
    /// SenderLocationID (tag 142).
    pub sender_location_id: Option<&'a str>,
    /// TargetLocationID (tag 143).
    pub target_location_id: Option<&'a str>,
}

impl<'a> MessageHeader<'a> {
    /// Creates a header with the mandatory fields, stamped with the current time.
    #[must_use]
    pub fn new(
        begin_string: &'a str,
        sender_comp_id: &'a str,
        target_comp_id: &'a str,
        msg_seq_num: u64,
    ) -> Self {
        Self {
            begin_string,
            sender_comp_id,
            target_comp_id,
            msg_seq_num,
            sending_time: Timestamp::now(),
            poss_dup: false,
            orig_sending_time: None,
            sender_sub_id: None,
            target_sub_id: None,
            sender_location_id: None,
            target_location_id: None,
        }
    }

    /// Marks the message as a possible duplicate retransmission.
    #[must_use]
    pub fn with_poss_dup(mut self, orig_sending_time: Option<Timestamp>) -> Self {
        self.poss_dup = true;
        self.orig_sending_time = orig_sending_time;
        self
    }

    /// Overrides the SendingTime stamp.
    #[must_use]
    pub const fn with_sending_time(mut self, sending_time: Timestamp) -> Self {
        self.sending_time = sending_time;
        self
    }
}

/// Encodes a complete FIX message from header and body.
///
/// Produces `8=...|9=len|35=...|<header>|<body>|10=xxx|` where BodyLength
/// covers everything after the tag 9 field up to the checksum trailer.
#[must_use]
pub fn encode(header: &MessageHeader<'_>, builder: &MessageBuilder) -> BytesMut {
    let mut body = BytesMut::with_capacity(builder.body_len() + 128);

    put_field(&mut body, tags::MSG_TYPE, builder.msg_type().as_str().as_bytes());
    put_field(
        &mut body,
        tags::SENDER_COMP_ID,
        header.sender_comp_id.as_bytes(),
    );
    put_field(
        &mut body,
        tags::TARGET_COMP_ID,
        header.target_comp_id.as_bytes(),
    );
    put_uint_field(&mut body, tags::MSG_SEQ_NUM, header.msg_seq_num);
    put_field(
        &mut body,
        tags::SENDING_TIME,
        header.sending_time.format_millis().as_bytes(),
    );
    if header.poss_dup {
        put_field(&mut body, tags::POSS_DUP_FLAG, b"Y");
        if let Some(orig) = header.orig_sending_time {
            put_field(
                &mut body,
                tags::ORIG_SENDING_TIME,
                orig.format_millis().as_bytes(),
            );
        }
    }
    if let Some(sub) = header.sender_sub_id {
        put_field(&mut body, tags::SENDER_SUB_ID, sub.as_bytes());
    }
    if let Some(sub) = header.target_sub_id {
        put_field(&mut body, tags::TARGET_SUB_ID, sub.as_bytes());
    }
    if let Some(loc) = header.sender_location_id {
        put_field(&mut body, tags::SENDER_LOCATION_ID, loc.as_bytes());
    }
    if let Some(loc) = header.target_location_id {
        put_field(&mut body, tags::TARGET_LOCATION_ID, loc.as_bytes());
    }
    body.put_slice(builder.body());

    let mut message = BytesMut::with_capacity(body.len() + 32);
    put_field(
        &mut message,
        tags::BEGIN_STRING,
        header.begin_string.as_bytes(),
    );
    put_uint_field(&mut message, tags::BODY_LENGTH, body.len() as u64);
    message.put_slice(&body);

    let sum = checksum(&message);
    write_trailer(&mut message, sum);

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields_of(message: &[u8]) -> Vec<(String, String)> {
        message
            .split(|&b| b == SOH)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let text = std::str::from_utf8(part).unwrap();
                let (tag, value) = text.split_once('=').unwrap();
                (tag.to_string(), value.to_string())
            })
            .collect()
    }

    #[test]
    fn test_encode_header_fields() {
        let mut builder = MessageBuilder::admin(AdminMsgType::Heartbeat);
        builder.put_str(112, "TEST1");

        let header = MessageHeader::new("FIX.4.4", "SENDER", "TARGET", 7)
            .with_sending_time(Timestamp::from_millis(0));
        let message = encode(&header, &builder);
        let fields = fields_of(&message);

        assert_eq!(fields[0], ("8".to_string(), "FIX.4.4".to_string()));
        assert_eq!(fields[1].0, "9");
        assert_eq!(fields[2], ("35".to_string(), "0".to_string()));
        assert_eq!(fields[3], ("49".to_string(), "SENDER".to_string()));
        assert_eq!(fields[4], ("56".to_string(), "TARGET".to_string()));
        assert_eq!(fields[5], ("34".to_string(), "7".to_string()));
        assert!(fields.iter().any(|(t, v)| t == "112" && v == "TEST1"));
        assert_eq!(fields.last().unwrap().0, "10");
    }

    #[test]
    fn test_encode_body_length_is_exact() {
        let mut builder = MessageBuilder::app("D");
        builder.put_str(11, "ORDER1");

        let header = MessageHeader::new("FIX.4.4", "A", "B", 1);
        let message = encode(&header, &builder);

        // BodyLength must cover from after "9=N|" to the start of "10=".
        let text = message.to_vec();
        let nine_start = text.windows(3).position(|w| w == b"\x019=").unwrap() + 1;
        let nine_end = nine_start + text[nine_start..].iter().position(|&b| b == SOH).unwrap();
        let declared: usize = std::str::from_utf8(&text[nine_start + 2..nine_end])
            .unwrap()
            .parse()
            .unwrap();
        let trailer_start = text.len() - 7;
        assert_eq!(&text[trailer_start..trailer_start + 3], b"10=");
        assert_eq!(declared, trailer_start - (nine_end + 1));
    }

    #[test]
    fn test_encode_checksum_is_valid() {
        let mut builder = MessageBuilder::app("D");
        builder.put_str(11, "ORDER1");
        builder.put_uint(38, 100);

        let header = MessageHeader::new("FIX.4.4", "A", "B", 2);
        let message = encode(&header, &builder);

        let trailer_start = message.len() - 7;
        let declared =
            crate::checksum::parse_declared(&message[trailer_start + 3..trailer_start + 6])
                .unwrap();
        assert_eq!(checksum(&message[..trailer_start]), declared);
    }

    #[test]
    fn test_encode_poss_dup() {
        let builder = MessageBuilder::app("D");
        let header = MessageHeader::new("FIX.4.4", "A", "B", 3)
            .with_poss_dup(Some(Timestamp::from_millis(0)));
        let message = encode(&header, &builder);
        let fields = fields_of(&message);

        assert!(fields.iter().any(|(t, v)| t == "43" && v == "Y"));
        assert!(fields.iter().any(|(t, _)| t == "122"));
    }

    #[test]
    fn test_put_group_counts_entries() {
        let mut builder = MessageBuilder::app("V");
        builder.put_str(262, "REQ1");
        builder.put_group(
            267,
            &[
                GroupEntry::new().with_char(269, '0'),
                GroupEntry::new().with_char(269, '1'),
            ],
        );

        let header = MessageHeader::new("FIX.4.4", "A", "B", 1);
        let message = encode(&header, &builder);
        let fields = fields_of(&message);

        assert!(fields.iter().any(|(t, v)| t == "267" && v == "2"));
        assert_eq!(fields.iter().filter(|(t, _)| t == "269").count(), 2);
    }

    #[test]
    fn test_builder_clear() {
        let mut builder = MessageBuilder::app("D");
        builder.put_str(11, "X");
        assert!(builder.body_len() > 0);

        builder.clear();
        assert_eq!(builder.body_len(), 0);
        assert_eq!(builder.msg_type().as_str(), "D");
    }
}
