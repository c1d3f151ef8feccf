/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! # FerroFix Core
//!
//! Core types, traits, and error definitions for the FerroFix FIX session engine.
//!
//! This crate provides the fundamental building blocks used across all FerroFix crates:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field types**: `FieldTag`, `FieldValue`, and the zero-copy `FieldRef`
//! - **Message types**: `RawMessage`, `OwnedMessage`, and the admin/app `MsgType` split
//! - **Identity types**: `SessionId`, `CompId`, `SeqNum`, `Timestamp`
//!
//! ## Zero-Copy Design
//!
//! The core abstractions support both zero-copy borrowed views (for hot-path processing)
//! and owned representations (for storage and cross-thread transfer).

pub mod error;
pub mod field;
pub mod message;
pub mod tags;
pub mod types;

pub use error::{DecodeError, EncodeError, FixError, Result, SessionError, StoreError};
pub use field::{FieldRef, FieldTag, FieldValue};
pub use message::{AdminMsgType, MsgType, OwnedMessage, RawMessage};
pub use types::{CompId, SeqNum, SessionId, Timestamp};
