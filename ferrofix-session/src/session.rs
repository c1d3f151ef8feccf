/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! The session driver.
//!
//! One [`Session`] owns one logical connection: logon/logout handshakes,
//! inbound sequence validation, resend requests and their servicing,
//! heartbeat/TestRequest timing, and the callback hooks into the
//! application layer. All methods run on the session's own task; encoded
//! outbound frames accumulate in an internal queue drained by the
//! transport driver.

use crate::application::{Application, RejectReason};
use crate::config::{SessionConfig, SessionRole};
use crate::heartbeat::{HeartbeatManager, generate_test_req_id};
use crate::sequence::{SequenceCheck, SequenceManager};
use crate::state::SessionState;
use bytes::{Bytes, BytesMut};
use ferrofix_core::error::{DecodeError, Result, SessionError, StoreError};
use ferrofix_core::message::{AdminMsgType, MsgType, RawMessage};
use ferrofix_core::tags;
use ferrofix_core::types::{SeqNum, SessionId, Timestamp};
use ferrofix_store::traits::{MessageStore, StoredRecord};
use ferrofix_tagvalue::decoder::Decoder;
use ferrofix_tagvalue::encoder::{MessageBuilder, MessageHeader, encode};
use ferrofix_tagvalue::groups::GroupDict;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Vendor tag asking the counterparty to cancel working orders when the
/// connection drops, carried on Logon.
const CANCEL_ON_DISCONNECT: u32 = 10001;

/// Header tags owned by the engine; stripped when a stored message is
/// rebuilt for retransmission.
const fn is_header_tag(tag: u32) -> bool {
    matches!(
        tag,
        tags::BEGIN_STRING
            | tags::BODY_LENGTH
            | tags::CHECK_SUM
            | tags::MSG_TYPE
            | tags::MSG_SEQ_NUM
            | tags::SENDER_COMP_ID
            | tags::TARGET_COMP_ID
            | tags::SENDING_TIME
            | tags::POSS_DUP_FLAG
            | tags::ORIG_SENDING_TIME
            | tags::SENDER_SUB_ID
            | tags::TARGET_SUB_ID
            | tags::SENDER_LOCATION_ID
            | tags::TARGET_LOCATION_ID
    )
}

fn reject_reason_for(defect: &DecodeError) -> RejectReason {
    match defect {
        DecodeError::MissingRequiredField { tag } => RejectReason::missing_field(*tag),
        DecodeError::UnknownGroup { count_tag } => {
            RejectReason::new(16, format!("no template registered for group {count_tag}"))
                .with_ref_tag(*count_tag)
        }
        DecodeError::GroupCountMismatch { count_tag, .. } => {
            RejectReason::new(16, "incorrect NumInGroup count").with_ref_tag(*count_tag)
        }
        DecodeError::InvalidFieldValue { tag, reason } => {
            RejectReason::new(5, reason.clone()).with_ref_tag(*tag)
        }
        other => RejectReason::new(99, other.to_string()),
    }
}

/// A single FIX session state machine.
///
/// Inbound entries held while a gap fills: the original frame bytes, or
/// `None` for a message consumed at receipt (the Logon that revealed the
/// gap), which only advances the expected counter on release.
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    sequences: SequenceManager,
    heartbeat: HeartbeatManager,
    store: Arc<dyn MessageStore>,
    app: Arc<dyn Application>,
    group_dict: Option<Arc<GroupDict>>,
    pending: BTreeMap<u64, Option<Bytes>>,
    outbound: VecDeque<BytesMut>,
    disconnect_requested: bool,
    state_entered_at: Instant,
}

impl Session {
    /// Creates a session in the `Disconnected` state.
    ///
    /// Sequence counters are taken over from the store, so a durable store
    /// resumes numbering across restarts.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn MessageStore>,
        app: Arc<dyn Application>,
    ) -> Self {
        let sequences =
            SequenceManager::with_initial(store.next_sender_seq(), store.next_target_seq());
        let heartbeat =
            HeartbeatManager::new(config.heartbeat_interval, config.heartbeat_tolerance);
        Self {
            config,
            state: SessionState::Disconnected,
            sequences,
            heartbeat,
            store,
            app,
            group_dict: None,
            pending: BTreeMap::new(),
            outbound: VecDeque::new(),
            disconnect_requested: false,
            state_entered_at: Instant::now(),
        }
    }

    /// Attaches a repeating-group dictionary used for inbound decoding.
    #[must_use]
    pub fn with_group_dict(mut self, dict: Arc<GroupDict>) -> Self {
        self.group_dict = Some(dict);
        self
    }

    /// Returns the session identity.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.config.session_id
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true if the session is logged on.
    #[must_use]
    pub const fn is_logged_on(&self) -> bool {
        self.state.is_active()
    }

    /// Returns the next expected inbound sequence number.
    #[must_use]
    pub fn next_target_seq(&self) -> u64 {
        self.sequences.next_target()
    }

    /// Returns the next outbound sequence number.
    #[must_use]
    pub fn next_sender_seq(&self) -> u64 {
        self.sequences.next_sender()
    }

    /// True once the session wants the transport closed (after logout or a
    /// fatal error). The driver closes the socket when it sees this.
    #[must_use]
    pub const fn disconnect_requested(&self) -> bool {
        self.disconnect_requested
    }

    /// Pops the next encoded outbound frame, if any.
    pub fn poll_outbound(&mut self) -> Option<BytesMut> {
        self.outbound.pop_front()
    }

    /// Drains all queued outbound frames.
    pub fn drain_outbound(&mut self) -> Vec<BytesMut> {
        self.outbound.drain(..).collect()
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            info!(
                session = %self.config.session_id,
                from = %self.state,
                to = %next,
                "session state transition"
            );
            self.state = next;
            self.state_entered_at = Instant::now();
        }
    }

    /// Initiates the session: resets counters when configured, sends Logon,
    /// and moves to `LogonPending`.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless currently disconnected,
    /// or `SessionError::Configuration` for acceptor sessions.
    pub async fn connect(&mut self) -> Result<()> {
        if !self.state.is_disconnected() {
            return Err(SessionError::InvalidState {
                expected: "Disconnected".to_string(),
                current: self.state.name().to_string(),
            }
            .into());
        }
        if self.config.role != SessionRole::Initiator {
            return Err(SessionError::Configuration(
                "acceptor sessions wait for the counterparty logon".to_string(),
            )
            .into());
        }

        self.disconnect_requested = false;
        if self.config.reset_on_logon {
            if let Err(e) = self.store.reset().await {
                return self.fail_store(e).await;
            }
            self.sequences.reset();
        }

        let mut logon = MessageBuilder::admin(AdminMsgType::Logon);
        logon.put_uint(tags::ENCRYPT_METHOD, 0);
        logon.put_uint(tags::HEART_BT_INT, self.config.heartbeat_interval_secs());
        if self.config.reset_on_logon {
            logon.put_bool(tags::RESET_SEQ_NUM_FLAG, true);
        }
        if let Some(password) = self.config.password.clone() {
            logon.put_str(tags::PASSWORD, &password);
        }
        if self.config.cancel_on_disconnect {
            logon.put_bool(CANCEL_ON_DISCONNECT, true);
        }

        self.send_admin(logon).await?;
        self.heartbeat.reset();
        self.set_state(SessionState::LogonPending);
        Ok(())
    }

    /// Arms an acceptor session for an established inbound connection; the
    /// session then waits in `LogonPending` for the counterparty's Logon.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidState` unless currently disconnected.
    pub fn accept(&mut self) -> Result<()> {
        if !self.state.is_disconnected() {
            return Err(SessionError::InvalidState {
                expected: "Disconnected".to_string(),
                current: self.state.name().to_string(),
            }
            .into());
        }
        self.disconnect_requested = false;
        self.heartbeat.reset();
        self.set_state(SessionState::LogonPending);
        Ok(())
    }

    /// Sends an application message, assigning the next outbound sequence
    /// number and persisting a copy for resend.
    ///
    /// # Errors
    /// Returns `SessionError::NotConnected` unless the session is Active
    /// (resend in progress counts as Active for outbound traffic).
    pub async fn send(&mut self, mut builder: MessageBuilder) -> Result<SeqNum> {
        if !self.state.is_active() {
            return Err(SessionError::NotConnected.into());
        }

        let session_id = self.config.session_id.clone();
        if builder.msg_type().is_admin() {
            self.app.to_admin(&mut builder, &session_id).await;
        } else {
            self.app.to_app(&mut builder, &session_id).await;
        }

        let seq = match self.store.allocate_sender_seq().await {
            Ok(seq) => seq,
            Err(e) => return self.fail_store(e).await,
        };
        self.sequences.set_sender(seq + 1);

        let frame = self.encode_frame(&builder, seq, false, None);
        if builder.msg_type().is_app()
            && let Err(e) = self.store.append(seq, &frame).await
        {
            return self.fail_store(e).await;
        }

        debug!(session = %session_id, seq, msg_type = %builder.msg_type(), "> app message");
        self.outbound.push_back(frame);
        self.heartbeat.on_message_sent();
        Ok(SeqNum::new(seq))
    }

    /// Sends a Logout and moves to `LogoutPending`.
    ///
    /// # Errors
    /// Returns `SessionError::NotConnected` if the session is neither logged
    /// on nor awaiting logon.
    pub async fn logout(&mut self, reason: Option<&str>) -> Result<()> {
        if !self.state.is_active() && self.state != SessionState::LogonPending {
            return Err(SessionError::NotConnected.into());
        }
        let mut builder = MessageBuilder::admin(AdminMsgType::Logout);
        if let Some(text) = reason {
            builder.put_str(tags::TEXT, text);
        }
        self.send_admin(builder).await?;
        self.set_state(SessionState::LogoutPending);
        Ok(())
    }

    /// Processes one framed inbound message.
    ///
    /// Malformed bytes force a disconnect; recoverable field/group defects
    /// answer the peer with a session-level Reject; sequence gaps trigger
    /// the resend protocol. Application messages reach the business layer
    /// through the `from_app` hook.
    ///
    /// # Errors
    /// Fatal conditions (malformed input, hard sequence violations, store
    /// failures) are returned after the state transition they caused.
    pub async fn process_inbound(&mut self, bytes: &[u8]) -> Result<()> {
        if self.state.is_disconnected() {
            warn!(session = %self.config.session_id, "dropping inbound bytes while disconnected");
            return Ok(());
        }
        if bytes.len() > self.config.max_message_size {
            let err = DecodeError::MessageTooLarge {
                size: bytes.len(),
                max_size: self.config.max_message_size,
            };
            self.fail_decode(&err).await;
            return Err(err.into());
        }

        let dict = self.group_dict.clone();
        let grouped = Decoder::new(bytes)
            .with_checksum_validation(self.config.validate_checksum)
            .decode_grouped(dict.as_deref());

        match grouped {
            Ok(raw) => self.handle_message(&raw, None).await,
            Err(e) if e.is_recoverable() => {
                // Framing is intact; fall back to the flat view and let the
                // sequenced path answer with a Reject.
                let flat = Decoder::new(bytes)
                    .with_checksum_validation(self.config.validate_checksum)
                    .decode();
                match flat {
                    Ok(raw) => self.handle_message(&raw, Some(e)).await,
                    Err(fatal) => {
                        self.fail_decode(&fatal).await;
                        Err(fatal.into())
                    }
                }
            }
            Err(e) => {
                self.fail_decode(&e).await;
                Err(e.into())
            }
        }
    }

    /// Drives timers: logon/logout timeouts, heartbeats, TestRequests, and
    /// the post-TestRequest dead-peer timeout.
    ///
    /// # Errors
    /// Returns `SessionError::HeartbeatTimeout` when the peer went silent
    /// past the TestRequest window (the session is already disconnected).
    pub async fn tick(&mut self) -> Result<()> {
        match self.state {
            SessionState::LogonPending => {
                if self.state_entered_at.elapsed() >= self.config.logon_timeout {
                    error!(session = %self.config.session_id, "logon timed out");
                    self.force_disconnect("logon timeout").await;
                }
            }
            SessionState::LogoutPending => {
                if self.state_entered_at.elapsed() >= self.config.logout_timeout {
                    warn!(session = %self.config.session_id, "logout unacknowledged, closing");
                    self.force_disconnect("logout timeout").await;
                }
            }
            SessionState::Active | SessionState::AwaitingResend { .. } => {
                if self.heartbeat.is_timed_out() {
                    let elapsed_ms = self.heartbeat.time_since_last_received().as_millis() as u64;
                    error!(
                        session = %self.config.session_id,
                        elapsed_ms,
                        "no answer to TestRequest, forcing disconnect"
                    );
                    self.force_disconnect("heartbeat timeout").await;
                    return Err(SessionError::HeartbeatTimeout { elapsed_ms }.into());
                }
                if self.heartbeat.should_send_test_request() {
                    let test_req_id = generate_test_req_id();
                    let mut builder = MessageBuilder::admin(AdminMsgType::TestRequest);
                    builder.put_str(tags::TEST_REQ_ID, &test_req_id);
                    self.send_admin(builder).await?;
                    self.heartbeat.on_test_request_sent(test_req_id);
                } else if self.heartbeat.should_send_heartbeat() {
                    let builder = MessageBuilder::admin(AdminMsgType::Heartbeat);
                    self.send_admin(builder).await?;
                }
            }
            SessionState::Disconnected => {}
        }
        Ok(())
    }

    /// Notifies the session that its transport closed.
    ///
    /// The store is flushed and preserved (unless `reset_on_disconnect`),
    /// so a reconnect resumes sequencing.
    pub async fn on_transport_closed(&mut self) {
        if self.state.is_disconnected() {
            return;
        }
        let was_established =
            self.state.is_active() || self.state == SessionState::LogoutPending;
        info!(session = %self.config.session_id, "transport closed");
        self.set_state(SessionState::Disconnected);
        self.pending.clear();
        self.outbound.clear();
        self.disconnect_requested = false;

        if self.config.reset_on_disconnect {
            if let Err(e) = self.store.reset().await {
                error!(session = %self.config.session_id, error = %e, "store reset failed");
            }
            self.sequences.reset();
        }
        if let Err(e) = self.store.flush().await {
            error!(session = %self.config.session_id, error = %e, "store flush failed");
        }

        if was_established {
            let session_id = self.config.session_id.clone();
            self.app.on_logout(&session_id).await;
        }
    }

    // ---- internals ----

    async fn send_admin(&mut self, mut builder: MessageBuilder) -> Result<()> {
        let session_id = self.config.session_id.clone();
        self.app.to_admin(&mut builder, &session_id).await;

        let seq = match self.store.allocate_sender_seq().await {
            Ok(seq) => seq,
            Err(e) => return self.fail_store(e).await,
        };
        self.sequences.set_sender(seq + 1);

        let frame = self.encode_frame(&builder, seq, false, None);
        if builder.msg_type() == &MsgType::Admin(AdminMsgType::Heartbeat) {
            debug!(session = %session_id, seq, "> heartbeat");
        } else {
            info!(session = %session_id, seq, msg_type = %builder.msg_type(), "> admin message");
        }
        self.outbound.push_back(frame);
        self.heartbeat.on_message_sent();
        Ok(())
    }

    fn encode_frame(
        &self,
        builder: &MessageBuilder,
        seq: u64,
        poss_dup: bool,
        orig_sending_time: Option<Timestamp>,
    ) -> BytesMut {
        let sid = &self.config.session_id;
        let mut header = MessageHeader::new(
            &sid.begin_string,
            sid.sender_comp_id.as_str(),
            sid.target_comp_id.as_str(),
            seq,
        );
        if poss_dup {
            header = header.with_poss_dup(orig_sending_time);
        }
        header.sender_sub_id = sid.sender_sub_id.as_deref();
        header.target_sub_id = sid.target_sub_id.as_deref();
        header.sender_location_id = sid.sender_location_id.as_deref();
        header.target_location_id = sid.target_location_id.as_deref();
        encode(&header, builder)
    }

    async fn handle_message(
        &mut self,
        raw: &RawMessage<'_>,
        defect: Option<DecodeError>,
    ) -> Result<()> {
        let is_heartbeat = raw.msg_type() == &MsgType::Admin(AdminMsgType::Heartbeat);
        self.heartbeat
            .on_message_received(is_heartbeat, raw.get_field_str(tags::TEST_REQ_ID));

        if raw.msg_type() == &MsgType::Admin(AdminMsgType::Logon) && !self.state.is_active() {
            return self.handle_logon(raw).await;
        }

        // A SequenceReset-Reset rewrites the expected counter outside the
        // normal sequencing rules; gap-fill mode goes through them.
        if raw.msg_type() == &MsgType::Admin(AdminMsgType::SequenceReset) && !gap_fill(raw) {
            return self.handle_hard_reset(raw).await;
        }

        let seq = match raw.msg_seq_num() {
            Ok(seq) => seq,
            Err(e) => {
                self.fail_decode(&e).await;
                return Err(e.into());
            }
        };

        match self.sequences.check(seq) {
            SequenceCheck::InOrder => {
                self.apply_in_order(raw, defect).await?;
                self.release_pending().await?;
                self.maybe_resume_active();
                Ok(())
            }
            SequenceCheck::TooLow { expected, received } => {
                if raw.poss_dup() {
                    debug!(
                        session = %self.config.session_id,
                        received,
                        expected,
                        "ignoring PossDup retransmission below expectation"
                    );
                    return Ok(());
                }
                error!(
                    session = %self.config.session_id,
                    received,
                    expected,
                    "sequence number too low without PossDup, forcing logout"
                );
                self.logout(Some("MsgSeqNum too low")).await?;
                self.disconnect_requested = true;
                Err(SessionError::SequenceTooLow { expected, received }.into())
            }
            SequenceCheck::Gap { expected, received } => {
                self.pending
                    .insert(received, Some(Bytes::copy_from_slice(raw.buffer())));
                if self.state.is_awaiting_resend() {
                    debug!(
                        session = %self.config.session_id,
                        received,
                        "buffering message while resend in progress"
                    );
                } else {
                    warn!(
                        session = %self.config.session_id,
                        expected,
                        received,
                        "sequence gap detected, requesting resend"
                    );
                    self.request_resend(expected, received - 1).await?;
                }
                Ok(())
            }
        }
    }

    /// Processes a message whose sequence number matched expectations and
    /// advances the expected counter.
    async fn apply_in_order(
        &mut self,
        raw: &RawMessage<'_>,
        defect: Option<DecodeError>,
    ) -> Result<()> {
        let next = self.sequences.next_target() + 1;

        if let Some(defect) = defect {
            warn!(
                session = %self.config.session_id,
                error = %defect,
                "rejecting inbound message"
            );
            let reason = reject_reason_for(&defect);
            self.send_reject(raw, reason).await?;
            return self.set_target(next).await;
        }

        if raw.msg_type() == &MsgType::Admin(AdminMsgType::SequenceReset) {
            // Gap-fill: jump the expected counter to NewSeqNo.
            let new_seq = match raw.get_field_as::<u64>(tags::NEW_SEQ_NO) {
                Ok(new_seq) => new_seq,
                Err(_) => {
                    let reason = RejectReason::missing_field(tags::NEW_SEQ_NO);
                    self.send_reject(raw, reason).await?;
                    return self.set_target(next).await;
                }
            };
            debug!(session = %self.config.session_id, new_seq, "gap fill");
            return self.set_target(new_seq.max(next)).await;
        }

        self.dispatch(raw).await?;
        self.set_target(next).await
    }

    async fn dispatch(&mut self, raw: &RawMessage<'_>) -> Result<()> {
        let session_id = self.config.session_id.clone();
        match raw.msg_type().clone() {
            MsgType::Admin(kind) => {
                if let Err(reason) = self.app.from_admin(raw, &session_id).await {
                    warn!(
                        session = %session_id,
                        msg_type = %kind,
                        text = %reason.text,
                        "admin message rejected by application"
                    );
                    return self.send_reject(raw, reason).await;
                }
                match kind {
                    AdminMsgType::Heartbeat => {
                        debug!(session = %session_id, "< heartbeat");
                    }
                    AdminMsgType::TestRequest => {
                        let mut builder = MessageBuilder::admin(AdminMsgType::Heartbeat);
                        if let Some(id) = raw.get_field_str(tags::TEST_REQ_ID) {
                            builder.put_str(tags::TEST_REQ_ID, id);
                        }
                        self.send_admin(builder).await?;
                    }
                    AdminMsgType::ResendRequest => {
                        let begin = raw.get_field_as::<u64>(tags::BEGIN_SEQ_NO);
                        let end = raw.get_field_as::<u64>(tags::END_SEQ_NO);
                        match (begin, end) {
                            (Ok(begin), Ok(end)) => self.service_resend(begin, end).await?,
                            _ => {
                                let reason = RejectReason::missing_field(tags::BEGIN_SEQ_NO);
                                self.send_reject(raw, reason).await?;
                            }
                        }
                    }
                    AdminMsgType::Reject => {
                        warn!(
                            session = %session_id,
                            ref_seq = raw.get_field_str(tags::REF_SEQ_NUM).unwrap_or("?"),
                            text = raw.get_field_str(tags::TEXT).unwrap_or(""),
                            "session-level reject received"
                        );
                    }
                    AdminMsgType::Logout => self.handle_logout_msg().await?,
                    AdminMsgType::Logon => {
                        warn!(session = %session_id, state = %self.state, "unexpected Logon");
                    }
                    // Intercepted before dispatch.
                    AdminMsgType::SequenceReset => {}
                }
            }
            MsgType::App(msg_type) => {
                debug!(session = %session_id, msg_type = %msg_type, "< app message");
                if let Err(reason) = self.app.from_app(raw, &session_id).await {
                    self.send_reject(raw, reason).await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_logon(&mut self, raw: &RawMessage<'_>) -> Result<()> {
        let seq = match raw.msg_seq_num() {
            Ok(seq) => seq,
            Err(e) => {
                self.fail_decode(&e).await;
                return Err(e.into());
            }
        };
        if self.state != SessionState::LogonPending {
            warn!(session = %self.config.session_id, state = %self.state, "ignoring Logon");
            return Ok(());
        }

        let session_id = self.config.session_id.clone();
        if let Err(reason) = self.app.from_admin(raw, &session_id).await {
            warn!(session = %session_id, text = %reason.text, "logon rejected by application");
            self.logout(Some(&reason.text)).await?;
            return Err(SessionError::LogonRejected {
                reason: reason.text,
            }
            .into());
        }

        let reset_flag = raw
            .get_field(tags::RESET_SEQ_NUM_FLAG)
            .is_some_and(|f| f.value == b"Y");

        if self.config.role == SessionRole::Acceptor {
            if reset_flag || self.config.reset_on_logon {
                if let Err(e) = self.store.reset().await {
                    return self.fail_store(e).await;
                }
                self.sequences.reset();
            }
            // Adopt the initiator's heartbeat interval for the session.
            let hb_secs = raw
                .get_field_as::<u64>(tags::HEART_BT_INT)
                .unwrap_or(self.config.heartbeat_interval_secs());
            self.heartbeat = HeartbeatManager::new(
                Duration::from_secs(hb_secs),
                self.config.heartbeat_tolerance,
            );

            let mut ack = MessageBuilder::admin(AdminMsgType::Logon);
            ack.put_uint(tags::ENCRYPT_METHOD, 0);
            ack.put_uint(tags::HEART_BT_INT, hb_secs);
            if reset_flag {
                ack.put_bool(tags::RESET_SEQ_NUM_FLAG, true);
            }
            self.send_admin(ack).await?;
        }

        // The Logon's own sequence number decides whether the session comes
        // up clean or already owing a resend request, which must go out
        // before the transition completes.
        let post_state = match self.sequences.check(seq) {
            SequenceCheck::InOrder => {
                self.set_target(seq + 1).await?;
                SessionState::Active
            }
            SequenceCheck::Gap { expected, received } => {
                warn!(
                    session = %session_id,
                    expected,
                    received,
                    "logon ahead of expected sequence, requesting resend"
                );
                // Logon itself is consumed; only the counter advance is owed.
                self.pending.insert(seq, None);
                let mut builder = MessageBuilder::admin(AdminMsgType::ResendRequest);
                builder.put_uint(tags::BEGIN_SEQ_NO, expected);
                builder.put_uint(tags::END_SEQ_NO, received - 1);
                self.send_admin(builder).await?;
                SessionState::AwaitingResend {
                    begin: expected,
                    end: received - 1,
                }
            }
            SequenceCheck::TooLow { expected, received } => {
                error!(
                    session = %session_id,
                    expected,
                    received,
                    "logon sequence number too low, forcing logout"
                );
                self.logout(Some("MsgSeqNum too low on Logon")).await?;
                self.disconnect_requested = true;
                return Err(SessionError::SequenceTooLow { expected, received }.into());
            }
        };

        self.set_state(post_state);
        self.heartbeat.reset();
        info!(session = %session_id, "logon complete");
        self.app.on_logon(&session_id).await;
        Ok(())
    }

    async fn handle_hard_reset(&mut self, raw: &RawMessage<'_>) -> Result<()> {
        let new_seq = match raw.get_field_as::<u64>(tags::NEW_SEQ_NO) {
            Ok(new_seq) => new_seq,
            Err(_) => {
                let reason = RejectReason::missing_field(tags::NEW_SEQ_NO);
                return self.send_reject(raw, reason).await;
            }
        };
        let expected = self.sequences.next_target();
        if new_seq < expected {
            warn!(
                session = %self.config.session_id,
                new_seq,
                expected,
                "rejecting SequenceReset that would rewind the expected counter"
            );
            let reason =
                RejectReason::new(5, "NewSeqNo below expected sequence").with_ref_tag(tags::NEW_SEQ_NO);
            return self.send_reject(raw, reason).await;
        }
        info!(session = %self.config.session_id, new_seq, "sequence reset");
        self.set_target(new_seq).await?;
        self.release_pending().await?;
        self.maybe_resume_active();
        Ok(())
    }

    async fn handle_logout_msg(&mut self) -> Result<()> {
        match self.state {
            SessionState::LogoutPending => {
                info!(session = %self.config.session_id, "logout confirmed by peer");
            }
            _ => {
                info!(session = %self.config.session_id, "logout requested by peer");
                let builder = MessageBuilder::admin(AdminMsgType::Logout);
                self.send_admin(builder).await?;
                self.set_state(SessionState::LogoutPending);
            }
        }
        self.disconnect_requested = true;
        Ok(())
    }

    async fn request_resend(&mut self, begin: u64, end: u64) -> Result<()> {
        let mut builder = MessageBuilder::admin(AdminMsgType::ResendRequest);
        builder.put_uint(tags::BEGIN_SEQ_NO, begin);
        builder.put_uint(tags::END_SEQ_NO, end);
        self.send_admin(builder).await?;
        self.set_state(SessionState::AwaitingResend { begin, end });
        Ok(())
    }

    /// Answers a peer ResendRequest: stored application messages are
    /// replayed PossDup-flagged with their original SendingTime; ranges
    /// with no stored record (admin traffic) collapse into
    /// SequenceReset-GapFill messages.
    async fn service_resend(&mut self, begin: u64, end: u64) -> Result<()> {
        let last_sent = self.sequences.next_sender().saturating_sub(1);
        let end = if end == 0 { last_sent } else { end.min(last_sent) };
        if begin == 0 || begin > end {
            warn!(
                session = %self.config.session_id,
                begin,
                end,
                "ignoring resend request with empty range"
            );
            return Ok(());
        }
        info!(session = %self.config.session_id, begin, end, "servicing resend request");

        let records = match self.store.get_range(begin, end).await {
            Ok(records) => records,
            Err(e) => return self.fail_store(e).await,
        };
        let by_seq: BTreeMap<u64, &StoredRecord> =
            records.iter().map(|r| (r.seq_num, r)).collect();

        let mut frames: Vec<BytesMut> = Vec::new();
        let mut gap_start: Option<u64> = None;
        for seq in begin..=end {
            match by_seq.get(&seq) {
                Some(record) => {
                    if let Some(start) = gap_start.take() {
                        frames.push(self.gap_fill_frame(start, seq));
                    }
                    match self.replay_frame(record) {
                        Some(frame) => frames.push(frame),
                        None => {
                            warn!(
                                session = %self.config.session_id,
                                seq,
                                "stored record unparsable, gap-filling"
                            );
                            gap_start = Some(seq);
                        }
                    }
                }
                None => {
                    gap_start.get_or_insert(seq);
                }
            }
        }
        if let Some(start) = gap_start {
            frames.push(self.gap_fill_frame(start, end + 1));
        }

        self.outbound.extend(frames);
        self.heartbeat.on_message_sent();
        Ok(())
    }

    fn gap_fill_frame(&self, seq: u64, new_seq: u64) -> BytesMut {
        let mut builder = MessageBuilder::admin(AdminMsgType::SequenceReset);
        builder.put_bool(tags::GAP_FILL_FLAG, true);
        builder.put_uint(tags::NEW_SEQ_NO, new_seq);
        self.encode_frame(&builder, seq, true, None)
    }

    /// Rebuilds a stored application message for retransmission: original
    /// body and sequence number, PossDupFlag=Y, OrigSendingTime preserved.
    fn replay_frame(&self, record: &StoredRecord) -> Option<BytesMut> {
        let raw = Decoder::new(&record.bytes)
            .with_checksum_validation(false)
            .decode()
            .ok()?;
        if raw.msg_type().is_admin() {
            return None;
        }

        let orig_sending_time = raw
            .get_field_str(tags::SENDING_TIME)
            .and_then(Timestamp::parse_fix);
        let mut builder = MessageBuilder::new(raw.msg_type().clone());
        for field in raw.fields() {
            if !is_header_tag(field.tag) {
                builder.put_raw(field.tag, field.value);
            }
        }
        Some(self.encode_frame(&builder, record.seq_num, true, orig_sending_time))
    }

    async fn send_reject(&mut self, raw: &RawMessage<'_>, reason: RejectReason) -> Result<()> {
        let mut builder = MessageBuilder::admin(AdminMsgType::Reject);
        if let Ok(ref_seq) = raw.msg_seq_num() {
            builder.put_uint(tags::REF_SEQ_NUM, ref_seq);
        }
        builder.put_str(tags::REF_MSG_TYPE, raw.msg_type().as_str());
        if let Some(tag) = reason.ref_tag {
            builder.put_uint(tags::REF_TAG_ID, u64::from(tag));
        }
        builder.put_uint(tags::SESSION_REJECT_REASON, u64::from(reason.code));
        builder.put_str(tags::TEXT, &reason.text);
        self.send_admin(builder).await
    }

    /// Releases buffered messages that became in-order after the expected
    /// counter advanced.
    async fn release_pending(&mut self) -> Result<()> {
        loop {
            let expected = self.sequences.next_target();
            let Some(entry) = self.pending.remove(&expected) else {
                break;
            };
            match entry {
                Some(bytes) => {
                    debug!(
                        session = %self.config.session_id,
                        seq = expected,
                        "releasing buffered message"
                    );
                    // Checksums were validated on first receipt.
                    let dict = self.group_dict.clone();
                    let grouped = Decoder::new(&bytes)
                        .with_checksum_validation(false)
                        .decode_grouped(dict.as_deref());
                    match grouped {
                        Ok(raw) => self.apply_in_order(&raw, None).await?,
                        Err(e) if e.is_recoverable() => {
                            let raw = Decoder::new(&bytes)
                                .with_checksum_validation(false)
                                .decode()?;
                            self.apply_in_order(&raw, Some(e)).await?;
                        }
                        Err(e) => {
                            self.fail_decode(&e).await;
                            return Err(e.into());
                        }
                    }
                }
                None => {
                    // Placeholder for a message consumed at receipt.
                    self.set_target(expected + 1).await?;
                }
            }
        }
        Ok(())
    }

    fn maybe_resume_active(&mut self) {
        if let SessionState::AwaitingResend { end, .. } = self.state
            && self.sequences.next_target() > end
        {
            info!(session = %self.config.session_id, "resend complete");
            self.set_state(SessionState::Active);
        }
    }

    async fn set_target(&mut self, seq: u64) -> Result<()> {
        self.sequences.set_target(seq);
        if let Err(e) = self.store.set_next_target_seq(seq).await {
            return self.fail_store(e).await;
        }
        Ok(())
    }

    async fn fail_decode(&mut self, err: &DecodeError) {
        error!(
            session = %self.config.session_id,
            error = %err,
            "malformed inbound message, dropping connection"
        );
        self.force_disconnect("malformed inbound message").await;
    }

    async fn fail_store<T>(&mut self, err: StoreError) -> Result<T> {
        error!(
            session = %self.config.session_id,
            error = %err,
            "store unavailable, forcing disconnect"
        );
        self.force_disconnect("store unavailable").await;
        Err(err.into())
    }

    async fn force_disconnect(&mut self, reason: &str) {
        if self.state.is_disconnected() {
            return;
        }
        let was_established =
            self.state.is_active() || self.state == SessionState::LogoutPending;
        warn!(session = %self.config.session_id, reason, "disconnecting");
        self.set_state(SessionState::Disconnected);
        self.pending.clear();
        self.disconnect_requested = true;

        if let Err(e) = self.store.flush().await {
            error!(session = %self.config.session_id, error = %e, "store flush failed");
        }
        if was_established {
            let session_id = self.config.session_id.clone();
            self.app.on_logout(&session_id).await;
        }
    }
}

fn gap_fill(raw: &RawMessage<'_>) -> bool {
    raw.get_field(tags::GAP_FILL_FLAG)
        .is_some_and(|f| f.value == b"Y")
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.config.session_id.to_string())
            .field("state", &self.state)
            .field("next_sender_seq", &self.sequences.next_sender())
            .field("next_target_seq", &self.sequences.next_target())
            .field("pending", &self.pending.len())
            .field("outbound", &self.outbound.len())
            .finish()
    }
}
