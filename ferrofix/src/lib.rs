/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! # FerroFix
//!
//! A FIX session protocol engine for Rust.
//!
//! FerroFix implements the session layer mechanics any FIX application runs
//! on top of: tag=value wire codec, per-session message persistence, the
//! logon/active/logout state machine with strict sequence tracking,
//! resend/gap-fill recovery, heartbeat supervision, and a registry routing
//! multiple concurrent sessions. Administrative messages are handled by the
//! engine; everything else flows through the application callback
//! interface.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferrofix::prelude::*;
//!
//! let registry = EngineBuilder::new()
//!     .with_application(MyApplication)
//!     .add_session(
//!         SessionConfig::new(SessionId::new(
//!             "FIX.4.4",
//!             CompId::new("SENDER").unwrap(),
//!             CompId::new("TARGET").unwrap(),
//!         ))
//!         .with_reset_on_logon(true),
//!     )
//!     .build()
//!     .await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Fundamental types, traits, and error definitions
//! - [`tagvalue`]: Zero-copy tag=value encoding and decoding
//! - [`store`]: Message persistence and sequence-number storage
//! - [`session`]: Session layer protocol implementation
//! - [`transport`]: Byte-stream framing layer
//! - [`engine`]: Session registry and high-level facade

pub mod core {
    //! Core types, traits, and error definitions.
    pub use ferrofix_core::*;
}

pub mod tagvalue {
    //! Zero-copy tag=value encoding and decoding.
    pub use ferrofix_tagvalue::*;
}

pub mod store {
    //! Message persistence and sequence-number storage.
    pub use ferrofix_store::*;
}

pub mod session {
    //! Session layer protocol implementation.
    pub use ferrofix_session::*;
}

pub mod transport {
    //! Byte-stream framing layer.
    pub use ferrofix_transport::*;
}

pub mod engine {
    //! Session registry and high-level facade.
    pub use ferrofix_engine::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ferrofix_core::{
        AdminMsgType, CompId, DecodeError, EncodeError, FieldRef, FieldTag, FieldValue, FixError,
        MsgType, OwnedMessage, RawMessage, Result, SeqNum, SessionError, SessionId, StoreError,
        Timestamp,
    };

    // Tag-value encoding
    pub use ferrofix_tagvalue::{
        Decoder, GroupDict, GroupEntry, GroupTemplate, MessageBuilder, MessageHeader, checksum,
        encode,
    };

    // Session
    pub use ferrofix_session::{
        Application, HeartbeatManager, NoOpApplication, RejectReason, SequenceCheck,
        SequenceManager, Session, SessionConfig, SessionConfigBuilder, SessionRole, SessionState,
    };

    // Store
    pub use ferrofix_store::{FileStore, MemoryStore, MessageStore, StoredRecord};

    // Transport
    pub use ferrofix_transport::{CodecError, FixCodec};

    // Engine
    pub use ferrofix_engine::{
        BoundedSubscription, EngineBuilder, ReplyRouter, SessionHandle, SessionRegistry,
    };
}
