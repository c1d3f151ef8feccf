/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Zero-copy FIX message decoder.
//!
//! Parses FIX messages without allocating for field values: fields are
//! returned as references into the original buffer. Decoding validates the
//! structural envelope (BeginString, BodyLength against the actual body
//! span, checksum) and optionally extracts repeating groups positionally
//! from a [`GroupDict`].

use crate::checksum::{checksum, parse_declared};
use crate::groups::GroupDict;
use ferrofix_core::error::DecodeError;
use ferrofix_core::field::FieldRef;
use ferrofix_core::message::{GroupRef, MsgType, RawMessage};
use memchr::memchr;
use smallvec::SmallVec;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Zero-copy FIX message decoder.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Input buffer.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Whether to validate checksums.
    validate_checksum: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given input buffer.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
        }
    }

    /// Sets whether to validate checksums during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Decodes a complete FIX message from the buffer.
    ///
    /// # Errors
    /// Returns `DecodeError` if the message is malformed or incomplete.
    pub fn decode(&mut self) -> Result<RawMessage<'a>, DecodeError> {
        self.decode_grouped(None)
    }

    /// Decodes a complete FIX message, extracting repeating groups from the
    /// supplied dictionary.
    ///
    /// # Errors
    /// Returns `DecodeError::UnknownGroup` when a declared counting tag has
    /// no registered template, `DecodeError::GroupCountMismatch` when the
    /// entry count disagrees with the counting field, and the structural
    /// errors of [`Decoder::decode`].
    pub fn decode_grouped(
        &mut self,
        dict: Option<&GroupDict>,
    ) -> Result<RawMessage<'a>, DecodeError> {
        let start_offset = self.offset;

        // Envelope: BeginString (8), BodyLength (9), then the body starting
        // with MsgType (35).
        let begin_string_field = self.next_field().ok_or(DecodeError::Incomplete)?;
        if begin_string_field.tag != 8 {
            return Err(DecodeError::InvalidBeginString);
        }
        let begin_string_start =
            begin_string_field.value.as_ptr() as usize - self.input.as_ptr() as usize;
        let begin_string = begin_string_start..begin_string_start + begin_string_field.value.len();

        let body_length_field = self.next_field().ok_or(DecodeError::MissingBodyLength)?;
        if body_length_field.tag != 9 {
            return Err(DecodeError::MissingBodyLength);
        }
        let body_length: usize = body_length_field
            .as_str()?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;

        let body_start = self.offset;

        let msg_type_field = self.next_field().ok_or(DecodeError::MissingMsgType)?;
        if msg_type_field.tag != 35 {
            return Err(DecodeError::MissingMsgType);
        }
        let msg_type = MsgType::from_wire(msg_type_field.as_str()?);

        let mut fields: SmallVec<[FieldRef<'a>; 32]> = SmallVec::new();
        fields.push(begin_string_field);
        fields.push(body_length_field);
        fields.push(msg_type_field);

        let mut checksum_field: Option<FieldRef<'a>> = None;
        while let Some(field) = self.next_field() {
            if field.tag == 10 {
                checksum_field = Some(field);
                break;
            }
            fields.push(field);
        }
        let checksum_field = checksum_field.ok_or(DecodeError::Incomplete)?;

        // The trailer starts at "10="; everything before it is covered by
        // BodyLength (after tag 9) and the checksum (from the start).
        let trailer_start =
            checksum_field.value.as_ptr() as usize - self.input.as_ptr() as usize - 3;

        let actual_body = trailer_start - body_start;
        if actual_body != body_length {
            return Err(DecodeError::BodyLengthMismatch {
                declared: body_length,
                actual: actual_body,
            });
        }

        if self.validate_checksum {
            let declared = parse_declared(checksum_field.value).ok_or_else(|| {
                DecodeError::InvalidFieldValue {
                    tag: 10,
                    reason: "invalid checksum format".to_string(),
                }
            })?;
            let calculated = checksum(&self.input[start_offset..trailer_start]);
            if calculated != declared {
                return Err(DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        let groups = match dict {
            Some(dict) => extract_groups(&fields, dict)?,
            None => Vec::new(),
        };

        Ok(RawMessage::new(
            &self.input[start_offset..self.offset],
            begin_string,
            body_start..body_start + body_length,
            msg_type,
            fields,
            groups,
        ))
    }

    /// Parses the next `tag=value` field, or `None` if the buffer is exhausted.
    #[inline]
    pub fn next_field(&mut self) -> Option<FieldRef<'a>> {
        if self.offset >= self.input.len() {
            return None;
        }

        let remaining = &self.input[self.offset..];
        let eq_pos = memchr(EQUALS, remaining)?;
        let tag = parse_tag(&remaining[..eq_pos])?;

        let value_start = eq_pos + 1;
        let soh_pos = memchr(SOH, &remaining[value_start..])?;
        let value = &remaining[value_start..value_start + soh_pos];

        self.offset += value_start + soh_pos + 1;

        Some(FieldRef::new(tag, value))
    }

    /// Returns the current offset in the buffer.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the remaining bytes in the buffer.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    /// Returns true if the buffer has been fully consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }

    /// Resets the decoder to the beginning of the buffer.
    #[inline]
    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Walks the flat field list, materializing repeating groups positionally.
///
/// An entry begins at the template's delimiter tag and accepts member tags
/// until the next delimiter (new entry) or a non-member tag (group end).
fn extract_groups<'a>(
    fields: &SmallVec<[FieldRef<'a>; 32]>,
    dict: &GroupDict,
) -> Result<Vec<GroupRef<'a>>, DecodeError> {
    let mut groups = Vec::new();
    // Skip the envelope fields 8, 9, 35.
    let mut i = 3;
    while i < fields.len() {
        let field = fields[i];
        if !dict.is_counting(field.tag) {
            i += 1;
            continue;
        }
        let template = dict
            .template(field.tag)
            .ok_or(DecodeError::UnknownGroup {
                count_tag: field.tag,
            })?;
        let expected: u32 = field.parse()?;

        let mut entries: Vec<Vec<FieldRef<'a>>> = Vec::new();
        let mut j = i + 1;
        while j < fields.len() && fields[j].tag == template.delimiter() {
            let mut entry = vec![fields[j]];
            j += 1;
            while j < fields.len()
                && fields[j].tag != template.delimiter()
                && template.contains(fields[j].tag)
            {
                entry.push(fields[j]);
                j += 1;
            }
            entries.push(entry);
        }

        if entries.len() as u32 != expected {
            return Err(DecodeError::GroupCountMismatch {
                count_tag: field.tag,
                expected,
                actual: entries.len() as u32,
            });
        }
        groups.push(GroupRef {
            count_tag: field.tag,
            entries,
        });
        i = j;
    }
    Ok(groups)
}

/// Parses a tag number from ASCII bytes.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{GroupEntry, MessageBuilder, MessageHeader, encode};
    use crate::groups::GroupTemplate;

    fn sample_message() -> bytes::BytesMut {
        let mut builder = MessageBuilder::app("D");
        builder.put_str(11, "ORDER1");
        builder.put_uint(38, 100);
        builder.put_char(54, '1');
        let header = MessageHeader::new("FIX.4.4", "SENDER", "TARGET", 42);
        encode(&header, &builder)
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"35"), Some(35));
        assert_eq!(parse_tag(b"20020"), Some(20020));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"abc"), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_next_field() {
        let input = b"8=FIX.4.4\x019=5\x0135=0\x01";
        let mut decoder = Decoder::new(input);

        let field1 = decoder.next_field().unwrap();
        assert_eq!(field1.tag, 8);
        assert_eq!(field1.as_str().unwrap(), "FIX.4.4");

        let field2 = decoder.next_field().unwrap();
        assert_eq!(field2.tag, 9);
        assert_eq!(field2.as_str().unwrap(), "5");

        let field3 = decoder.next_field().unwrap();
        assert_eq!(field3.tag, 35);
        assert_eq!(field3.as_str().unwrap(), "0");

        assert!(decoder.next_field().is_none());
    }

    #[test]
    fn test_decode_roundtrip() {
        let encoded = sample_message();
        let raw = Decoder::new(&encoded).decode().unwrap();

        assert_eq!(raw.begin_string(), "FIX.4.4");
        assert_eq!(raw.msg_type().as_str(), "D");
        assert_eq!(raw.msg_seq_num().unwrap(), 42);
        assert_eq!(raw.get_field_str(49), Some("SENDER"));
        assert_eq!(raw.get_field_str(56), Some("TARGET"));
        assert_eq!(raw.get_field_str(11), Some("ORDER1"));
        assert_eq!(raw.get_field_as::<u64>(38).unwrap(), 100);
        assert!(!raw.poss_dup());
    }

    #[test]
    fn test_decode_flipped_body_byte_fails_checksum() {
        let encoded = sample_message();
        // Flip a single bit in every body position; the checksum must catch each.
        let body_end = encoded.len() - 7;
        for pos in 20..body_end {
            let mut corrupted = encoded.to_vec();
            corrupted[pos] ^= 0x01;
            let result = Decoder::new(&corrupted).decode();
            assert!(result.is_err(), "corruption at byte {} went undetected", pos);
        }
    }

    #[test]
    fn test_decode_body_length_mismatch() {
        // Declared 5, actual body is "35=0|112=X|" (11 bytes).
        let mut message = b"8=FIX.4.4\x019=5\x0135=0\x01112=X\x01".to_vec();
        let sum = checksum(&message);
        message.extend_from_slice(b"10=");
        message.push(b'0' + sum / 100);
        message.push(b'0' + (sum / 10) % 10);
        message.push(b'0' + sum % 10);
        message.push(SOH);

        let result = Decoder::new(&message).decode();
        assert!(matches!(
            result,
            Err(DecodeError::BodyLengthMismatch {
                declared: 5,
                actual: 11
            })
        ));
    }

    #[test]
    fn test_decode_incomplete() {
        let result = Decoder::new(b"8=FIX.4.4\x019=20\x0135=0\x01").decode();
        assert!(matches!(result, Err(DecodeError::Incomplete)));
    }

    #[test]
    fn test_decode_invalid_begin_string() {
        let result = Decoder::new(b"9=5\x0135=0\x0110=000\x01").decode();
        assert!(matches!(result, Err(DecodeError::InvalidBeginString)));
    }

    #[test]
    fn test_decode_groups() {
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
        let encoded = encode(&header, &builder);

        let mut dict = GroupDict::new();
        dict.register(GroupTemplate::new(267, vec![269]));

        let raw = Decoder::new(&encoded).decode_grouped(Some(&dict)).unwrap();
        let group = raw.group(267).unwrap();
        assert_eq!(group.entries.len(), 2);
        assert_eq!(group.entries[0][0].as_str().unwrap(), "0");
        assert_eq!(group.entries[1][0].as_str().unwrap(), "1");
    }

    #[test]
    fn test_decode_group_multi_field_entries() {
        let mut builder = MessageBuilder::app("W");
        builder.put_group(
            268,
            &[
                GroupEntry::new()
                    .with_char(269, '0')
                    .with_str(270, "1.25")
                    .with_uint(271, 500),
                GroupEntry::new().with_char(269, '1').with_str(270, "1.26"),
            ],
        );
        let header = MessageHeader::new("FIX.4.4", "A", "B", 1);
        let encoded = encode(&header, &builder);

        let mut dict = GroupDict::new();
        dict.register(GroupTemplate::new(268, vec![269, 270, 271]));

        let raw = Decoder::new(&encoded).decode_grouped(Some(&dict)).unwrap();
        let group = raw.group(268).unwrap();
        assert_eq!(group.entries.len(), 2);
        assert_eq!(group.entries[0].len(), 3);
        assert_eq!(group.entries[1].len(), 2);
        assert_eq!(group.entries[0][1].as_str().unwrap(), "1.25");
    }

    #[test]
    fn test_decode_unknown_group() {
        let mut builder = MessageBuilder::app("V");
        builder.put_uint(146, 1);
        builder.put_str(55, "EUR/USD");
        let header = MessageHeader::new("FIX.4.4", "A", "B", 1);
        let encoded = encode(&header, &builder);

        let mut dict = GroupDict::new();
        dict.declare_counting(146);

        let result = Decoder::new(&encoded).decode_grouped(Some(&dict));
        assert!(matches!(
            result,
            Err(DecodeError::UnknownGroup { count_tag: 146 })
        ));
    }

    #[test]
    fn test_decode_group_count_mismatch() {
        // Declares 3 entries but only encodes 2.
        let mut builder = MessageBuilder::app("V");
        builder.put_uint(267, 3);
        builder.put_char(269, '0');
        builder.put_char(269, '1');
        let header = MessageHeader::new("FIX.4.4", "A", "B", 1);
        let encoded = encode(&header, &builder);

        let mut dict = GroupDict::new();
        dict.register(GroupTemplate::new(267, vec![269]));

        let result = Decoder::new(&encoded).decode_grouped(Some(&dict));
        assert!(matches!(
            result,
            Err(DecodeError::GroupCountMismatch {
                count_tag: 267,
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_decode_without_dict_leaves_fields_flat() {
        let mut builder = MessageBuilder::app("V");
        builder.put_group(267, &[GroupEntry::new().with_char(269, '0')]);
        let header = MessageHeader::new("FIX.4.4", "A", "B", 1);
        let encoded = encode(&header, &builder);

        let raw = Decoder::new(&encoded).decode().unwrap();
        assert!(raw.groups().is_empty());
        assert_eq!(raw.get_field_str(269), Some("0"));
    }
}
