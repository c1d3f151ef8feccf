/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! # FerroFix Transport
//!
//! Byte-stream framing for the FerroFix FIX session engine.
//!
//! The engine is transport-agnostic beyond requiring ordered, reliable
//! delivery; this crate provides the tokio codec that frames FIX messages
//! out of any `AsyncRead + AsyncWrite` stream (a TCP socket in practice).

pub mod codec;

pub use codec::{CodecError, FixCodec};
