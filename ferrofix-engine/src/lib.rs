/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! # FerroFix Engine
//!
//! Session registry and high-level facade for the FerroFix engine.
//!
//! This crate provides:
//! - **SessionRegistry**: Maps session identities to live sessions and
//!   routes inbound bytes and outbound application messages
//! - **ReplyRouter**: Explicit request-id to response-channel mapping for
//!   request/response application flows
//! - **Builder API**: Fluent configuration for engine setup

pub mod builder;
pub mod registry;
pub mod router;

pub use builder::EngineBuilder;
pub use ferrofix_session::application::{Application, NoOpApplication, RejectReason};
pub use registry::{SessionHandle, SessionRegistry};
pub use router::{BoundedSubscription, ReplyRouter};
