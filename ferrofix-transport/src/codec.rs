/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Tokio codec for FIX message framing.
//!
//! Splits complete FIX messages out of a byte stream using the BodyLength
//! arithmetic of the envelope, validating BeginString and (by default) the
//! checksum so corrupt frames never reach the session layer.

use bytes::{BufMut, BytesMut};
use ferrofix_tagvalue::checksum::{checksum, parse_declared};
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// SOH delimiter.
const SOH: u8 = 0x01;

/// Length of the `10=XXX<SOH>` trailer.
const TRAILER_LEN: usize = 7;

/// Errors that can occur during framing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stream does not start with a BeginString field.
    #[error("invalid begin string: message must start with 8=")]
    InvalidBeginString,

    /// Missing BodyLength field.
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Checksum mismatch.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum.
        calculated: u8,
        /// Declared checksum in message.
        declared: u8,
    },

    /// Message exceeds maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Tokio codec for FIX message framing.
#[derive(Debug, Clone)]
pub struct FixCodec {
    /// Maximum message size in bytes.
    max_message_size: usize,
    /// Whether to validate checksums.
    validate_checksum: bool,
}

impl FixCodec {
    /// Creates a new codec with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: 1024 * 1024, // 1MB
            validate_checksum: true,
        }
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets whether to validate checksums.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the total frame length from the envelope, or `None` if more
/// bytes are needed.
fn frame_length(src: &[u8]) -> Result<Option<usize>, CodecError> {
    // Shortest useful prefix: "8=F<SOH>9=N<SOH>".
    if src.len() < 8 {
        return Ok(None);
    }
    if &src[0..2] != b"8=" {
        return Err(CodecError::InvalidBeginString);
    }

    let Some(first_soh) = memchr(SOH, src) else {
        return Ok(None);
    };

    let len_field = first_soh + 1;
    if src.len() < len_field + 3 {
        return Ok(None);
    }
    if &src[len_field..len_field + 2] != b"9=" {
        return Err(CodecError::MissingBodyLength);
    }

    let Some(len_soh) = memchr(SOH, &src[len_field..]) else {
        return Ok(None);
    };
    let len_soh = len_field + len_soh;

    let body_length: usize = std::str::from_utf8(&src[len_field + 2..len_soh])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CodecError::InvalidBodyLength)?;

    // Body starts after "9=N<SOH>"; the trailer follows the body.
    Ok(Some(len_soh + 1 + body_length + TRAILER_LEN))
}

impl Decoder for FixCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(total) = frame_length(src)? else {
            return Ok(None);
        };

        if total > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: total,
                max_size: self.max_message_size,
            });
        }
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        if self.validate_checksum {
            let trailer_start = total - TRAILER_LEN;
            let declared = parse_declared(&src[trailer_start + 3..trailer_start + 6])
                .ok_or(CodecError::InvalidBodyLength)?;
            let calculated = checksum(&src[..trailer_start]);
            if calculated != declared {
                return Err(CodecError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(Some(src.split_to(total)))
    }
}

impl Encoder<&[u8]> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(item);
        Ok(())
    }
}

impl Encoder<BytesMut> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: BytesMut, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}
