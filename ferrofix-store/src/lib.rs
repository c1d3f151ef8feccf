/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! # FerroFix Store
//!
//! Message persistence and sequence-number storage for the FerroFix engine.
//!
//! This crate provides:
//! - **MessageStore trait**: Abstract interface for per-session persistence
//! - **MemoryStore**: In-memory store for testing and non-durable sessions
//! - **FileStore**: File-backed store surviving process restart

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::{MessageStore, StoredRecord};
