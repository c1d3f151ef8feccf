/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Application callback interface.
//!
//! The boundary between the session engine and the business layer, following
//! the QuickFIX hook pattern. Hooks are invoked by the session state machine
//! on the session's own task; a slow handler delays further inbound
//! processing for that session only.

use async_trait::async_trait;
use ferrofix_core::message::RawMessage;
use ferrofix_core::types::SessionId;
use ferrofix_tagvalue::encoder::MessageBuilder;

/// Reason for rejecting an inbound message.
///
/// Returned from the `from_*` hooks; the engine answers the peer with a
/// session-level Reject and continues processing.
#[derive(Debug, Clone)]
pub struct RejectReason {
    /// SessionRejectReason code (tag 373).
    pub code: u32,
    /// Human-readable rejection text (tag 58).
    pub text: String,
    /// Reference tag that caused the rejection (tag 371).
    pub ref_tag: Option<u32>,
}

impl RejectReason {
    /// Creates a new rejection reason.
    #[must_use]
    pub fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            ref_tag: None,
        }
    }

    /// Creates a "required tag missing" rejection (code 1).
    #[must_use]
    pub fn missing_field(tag: u32) -> Self {
        Self {
            code: 1,
            text: format!("required tag {tag} missing"),
            ref_tag: Some(tag),
        }
    }

    /// Sets the reference tag.
    #[must_use]
    pub const fn with_ref_tag(mut self, tag: u32) -> Self {
        self.ref_tag = Some(tag);
        self
    }
}

/// Application callback interface for handling FIX messages.
///
/// Implement this trait to receive session lifecycle events and messages.
/// Transport and codec failures never arrive here as errors; they manifest
/// as state transitions observed through `on_logout`.
#[async_trait]
pub trait Application: Send + Sync {
    /// Called when a session is created.
    async fn on_create(&self, session_id: &SessionId);

    /// Called on successful logon.
    async fn on_logon(&self, session_id: &SessionId);

    /// Called when the session goes down, whether by logout or disconnect.
    async fn on_logout(&self, session_id: &SessionId);

    /// Called before sending an admin message, allowing enrichment.
    ///
    /// The Logon message passes through here so credentials (e.g. the
    /// Password field) can be injected.
    async fn to_admin(&self, message: &mut MessageBuilder, session_id: &SessionId);

    /// Called when an admin message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, `Err(RejectReason)` to reject.
    #[allow(clippy::wrong_self_convention)]
    async fn from_admin(
        &self,
        message: &RawMessage<'_>,
        session_id: &SessionId,
    ) -> Result<(), RejectReason>;

    /// Called before sending an application message, allowing enrichment.
    async fn to_app(&self, message: &mut MessageBuilder, session_id: &SessionId);

    /// Called when an application message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, `Err(RejectReason)` to answer with a session-level
    /// Reject while processing continues.
    #[allow(clippy::wrong_self_convention)]
    async fn from_app(
        &self,
        message: &RawMessage<'_>,
        session_id: &SessionId,
    ) -> Result<(), RejectReason>;
}

/// Default no-op application implementation.
#[derive(Debug, Default)]
pub struct NoOpApplication;

#[async_trait]
impl Application for NoOpApplication {
    async fn on_create(&self, _session_id: &SessionId) {}

    async fn on_logon(&self, _session_id: &SessionId) {}

    async fn on_logout(&self, _session_id: &SessionId) {}

    async fn to_admin(&self, _message: &mut MessageBuilder, _session_id: &SessionId) {}

    async fn from_admin(
        &self,
        _message: &RawMessage<'_>,
        _session_id: &SessionId,
    ) -> Result<(), RejectReason> {
        Ok(())
    }

    async fn to_app(&self, _message: &mut MessageBuilder, _session_id: &SessionId) {}

    async fn from_app(
        &self,
        _message: &RawMessage<'_>,
        _session_id: &SessionId,
    ) -> Result<(), RejectReason> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofix_core::types::CompId;

    #[test]
    fn test_reject_reason() {
        let reason = RejectReason::new(5, "value out of range").with_ref_tag(38);
        assert_eq!(reason.code, 5);
        assert_eq!(reason.text, "value out of range");
        assert_eq!(reason.ref_tag, Some(38));
    }

    #[test]
    fn test_reject_reason_missing_field() {
        let reason = RejectReason::missing_field(55);
        assert_eq!(reason.code, 1);
        assert_eq!(reason.ref_tag, Some(55));
        assert!(reason.text.contains("55"));
    }

    #[tokio::test]
    async fn test_noop_application() {
        let app = NoOpApplication;
        let session_id = SessionId::new(
            "FIX.4.4",
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        );

        app.on_create(&session_id).await;
        app.on_logon(&session_id).await;
        app.on_logout(&session_id).await;
    }
}
