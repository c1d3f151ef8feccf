/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! # FerroFix Tag-Value
//!
//! Zero-copy FIX tag=value encoding and decoding for the FerroFix engine.
//!
//! This crate provides high-performance parsing and serialization of FIX
//! messages using the standard tag=value format with SOH (0x01) delimiters.
//!
//! ## Features
//!
//! - **Zero-copy parsing**: Field values reference the original buffer
//! - **Structural validation**: BodyLength is cross-checked against the
//!   actual body span and the checksum against the message bytes
//! - **Repeating groups**: Decoded positionally from caller-registered
//!   field-order templates

pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod groups;

pub use checksum::checksum;
pub use decoder::Decoder;
pub use encoder::{GroupEntry, MessageBuilder, MessageHeader, encode};
pub use ferrofix_core::message::RawMessage;
pub use groups::{GroupDict, GroupTemplate};
