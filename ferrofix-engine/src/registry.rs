/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Session registry.
//!
//! The single piece of cross-session state: maps session identities to live
//! sessions, routes inbound bytes, gates outbound application sends on
//! connectivity, and quiesces everything on shutdown. Registration and
//! lookup are serialized behind a lock; each session's processing stays
//! serial behind its own async mutex (one task per session).

use bytes::BytesMut;
use ferrofix_core::error::{Result, SessionError};
use ferrofix_core::types::{SeqNum, SessionId};
use ferrofix_session::application::Application;
use ferrofix_session::config::{SessionConfig, SessionRole};
use ferrofix_session::session::Session;
use ferrofix_session::state::SessionState;
use ferrofix_store::file::FileStore;
use ferrofix_store::memory::MemoryStore;
use ferrofix_store::traits::MessageStore;
use ferrofix_tagvalue::encoder::MessageBuilder;
use ferrofix_tagvalue::groups::GroupDict;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Cloneable handle to one registered session.
///
/// All operations lock the session, so inbound processing, timers, and
/// sends for one session never interleave.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Initiates the session (initiator role), returning the frames to write.
    ///
    /// # Errors
    /// Propagates session state and store errors.
    pub async fn connect(&self) -> Result<Vec<BytesMut>> {
        let mut session = self.inner.lock().await;
        session.connect().await?;
        Ok(session.drain_outbound())
    }

    /// Arms an acceptor session for an established inbound connection.
    ///
    /// # Errors
    /// Propagates session state errors.
    pub async fn accept(&self) -> Result<()> {
        self.inner.lock().await.accept()
    }

    /// Processes one framed inbound message, returning the frames to write.
    ///
    /// # Errors
    /// Propagates fatal session errors after the state transition they
    /// caused; queued frames (e.g. a forced Logout) remain available via
    /// [`SessionHandle::drain_outbound`].
    pub async fn process_inbound(&self, bytes: &[u8]) -> Result<Vec<BytesMut>> {
        let mut session = self.inner.lock().await;
        session.process_inbound(bytes).await?;
        Ok(session.drain_outbound())
    }

    /// Drives the session's timers, returning the frames to write.
    ///
    /// # Errors
    /// Returns the heartbeat timeout that disconnected the session.
    pub async fn tick(&self) -> Result<Vec<BytesMut>> {
        let mut session = self.inner.lock().await;
        session.tick().await?;
        Ok(session.drain_outbound())
    }

    /// Sends an application message.
    ///
    /// # Errors
    /// Returns `SessionError::NotConnected` unless the session is Active.
    pub async fn send(&self, builder: MessageBuilder) -> Result<SeqNum> {
        self.inner.lock().await.send(builder).await
    }

    /// Sends a Logout, returning the frames to write.
    ///
    /// # Errors
    /// Propagates session state errors.
    pub async fn logout(&self, reason: Option<&str>) -> Result<Vec<BytesMut>> {
        let mut session = self.inner.lock().await;
        session.logout(reason).await?;
        Ok(session.drain_outbound())
    }

    /// Drains queued outbound frames.
    pub async fn drain_outbound(&self) -> Vec<BytesMut> {
        self.inner.lock().await.drain_outbound()
    }

    /// Notifies the session that its transport closed.
    pub async fn on_transport_closed(&self) {
        self.inner.lock().await.on_transport_closed().await;
    }

    /// Returns the current session state.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }

    /// Returns true if the session is logged on.
    pub async fn is_logged_on(&self) -> bool {
        self.inner.lock().await.is_logged_on()
    }

    /// True once the session wants its transport closed.
    pub async fn disconnect_requested(&self) -> bool {
        self.inner.lock().await.disconnect_requested()
    }

    /// Returns the session identity.
    pub async fn session_id(&self) -> SessionId {
        self.inner.lock().await.session_id().clone()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

/// Maps session identities to live sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    app: Arc<dyn Application>,
    group_dict: Option<Arc<GroupDict>>,
    acceptor_template: RwLock<Option<SessionConfig>>,
}

impl SessionRegistry {
    /// Creates an empty registry sharing one application handler across
    /// sessions.
    #[must_use]
    pub fn new(app: Arc<dyn Application>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            app,
            group_dict: None,
            acceptor_template: RwLock::new(None),
        }
    }

    /// Attaches a repeating-group dictionary applied to every session.
    #[must_use]
    pub fn with_group_dict(mut self, dict: Arc<GroupDict>) -> Self {
        self.group_dict = Some(dict);
        self
    }

    /// Installs the acceptor template used to create sessions for inbound
    /// logons whose identity matches.
    pub fn set_acceptor_template(&self, config: SessionConfig) {
        *self.acceptor_template.write() = Some(config);
    }

    /// Registers a session, creating its message store.
    ///
    /// A `store_path` in the config selects a durable [`FileStore`] under
    /// that directory; otherwise the session runs on a [`MemoryStore`].
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` for duplicate registration, or
    /// a store error if the file store cannot be opened.
    pub async fn register(&self, config: SessionConfig) -> Result<SessionHandle> {
        let session_id = config.session_id.clone();
        if self.sessions.read().contains_key(&session_id) {
            return Err(SessionError::Configuration(format!(
                "session {session_id} already registered"
            ))
            .into());
        }

        let store: Arc<dyn MessageStore> = match &config.store_path {
            Some(dir) => {
                let base = dir.join(store_base_name(&session_id));
                Arc::new(FileStore::open(base)?)
            }
            None => Arc::new(MemoryStore::new()),
        };

        let mut session = Session::new(config, store, Arc::clone(&self.app));
        if let Some(dict) = &self.group_dict {
            session = session.with_group_dict(Arc::clone(dict));
        }
        let handle = SessionHandle::new(session);

        self.sessions
            .write()
            .insert(session_id.clone(), handle.clone());
        info!(session = %session_id, "session registered");
        self.app.on_create(&session_id).await;
        Ok(handle)
    }

    /// Looks up a registered session.
    #[must_use]
    pub fn lookup(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Routes one framed inbound message to its session, returning the
    /// frames to write back.
    ///
    /// An unknown identity matching the acceptor template creates the
    /// session on the fly; anything else is dropped with a warning, since
    /// unsolicited traffic must not create unbounded sessions.
    ///
    /// # Errors
    /// Propagates the routed session's fatal errors.
    pub async fn route_inbound(
        &self,
        session_id: &SessionId,
        bytes: &[u8],
    ) -> Result<Vec<BytesMut>> {
        let handle = match self.lookup(session_id) {
            Some(handle) => handle,
            None => match self.acceptor_session_for(session_id).await? {
                Some(handle) => handle,
                None => {
                    warn!(session = %session_id, "dropping bytes for unknown session");
                    return Ok(Vec::new());
                }
            },
        };
        handle.process_inbound(bytes).await
    }

    /// Sends an application message on a registered session.
    ///
    /// # Errors
    /// Returns `SessionError::NotConnected` when the session is unknown or
    /// not Active; the message is never queued.
    pub async fn send(&self, session_id: &SessionId, builder: MessageBuilder) -> Result<SeqNum> {
        let Some(handle) = self.lookup(session_id) else {
            return Err(SessionError::NotConnected.into());
        };
        handle.send(builder).await
    }

    /// Quiesces all sessions: logs out active ones, flushes their stores,
    /// and releases their transports.
    pub async fn shutdown(&self) {
        let handles: Vec<(SessionId, SessionHandle)> = self
            .sessions
            .read()
            .iter()
            .map(|(id, h)| (id.clone(), h.clone()))
            .collect();

        for (session_id, handle) in handles {
            if handle.is_logged_on().await
                && let Err(e) = handle.logout(Some("shutting down")).await
            {
                warn!(session = %session_id, error = %e, "logout on shutdown failed");
            }
            handle.on_transport_closed().await;
        }
        info!("registry shut down");
    }

    /// Removes a session from the registry.
    pub fn remove(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.write().remove(session_id)
    }

    /// Returns the number of registered sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns the identities of all registered sessions.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }

    async fn acceptor_session_for(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SessionHandle>> {
        let template = self.acceptor_template.read().clone();
        let Some(template) = template else {
            return Ok(None);
        };
        if template.role != SessionRole::Acceptor || &template.session_id != session_id {
            return Ok(None);
        }

        info!(session = %session_id, "creating acceptor session from template");
        let handle = self.register(template).await?;
        handle.accept().await?;
        Ok(Some(handle))
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.session_count())
            .finish_non_exhaustive()
    }
}

/// Builds a filesystem-safe store base name from the identity tuple.
fn store_base_name(session_id: &SessionId) -> String {
    let mut name = format!(
        "{}-{}-{}",
        session_id.begin_string, session_id.sender_comp_id, session_id.target_comp_id
    );
    name.retain(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrofix_core::types::CompId;
    use ferrofix_session::application::NoOpApplication;

    fn config(sender: &str, target: &str) -> SessionConfig {
        SessionConfig::new(SessionId::new(
            "FIX.4.4",
            CompId::new(sender).unwrap(),
            CompId::new(target).unwrap(),
        ))
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(NoOpApplication))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = registry();
        let config = config("SENDER", "TARGET");
        let session_id = config.session_id.clone();

        registry.register(config).await.unwrap();
        assert_eq!(registry.session_count(), 1);
        assert!(registry.lookup(&session_id).is_some());

        let other = SessionId::new(
            "FIX.4.4",
            CompId::new("OTHER").unwrap(),
            CompId::new("TARGET").unwrap(),
        );
        assert!(registry.lookup(&other).is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_fails() {
        let registry = registry();
        registry.register(config("SENDER", "TARGET")).await.unwrap();

        let result = registry.register(config("SENDER", "TARGET")).await;
        assert!(result.is_err());
        assert_eq!(registry.session_count(), 1);
    }

    #[tokio::test]
    async fn test_send_on_unknown_session_not_connected() {
        let registry = registry();
        let session_id = SessionId::new(
            "FIX.4.4",
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        );

        let result = registry.send(&session_id, MessageBuilder::app("D")).await;
        assert!(matches!(
            result,
            Err(ferrofix_core::error::FixError::Session(
                SessionError::NotConnected
            ))
        ));
    }

    #[tokio::test]
    async fn test_route_inbound_unknown_session_dropped() {
        let registry = registry();
        let session_id = SessionId::new(
            "FIX.4.4",
            CompId::new("NOBODY").unwrap(),
            CompId::new("KNOWS").unwrap(),
        );

        let frames = registry.route_inbound(&session_id, b"garbage").await.unwrap();
        assert!(frames.is_empty());
        assert_eq!(registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_durable_registration_creates_store_files() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        let mut config = config("SENDER", "TARGET");
        config.store_path = Some(dir.path().to_path_buf());

        registry.register(config).await.unwrap();
        assert!(dir.path().join("FIX.4.4-SENDER-TARGET.log").exists());
    }

    #[test]
    fn test_store_base_name_is_sanitized() {
        let session_id = SessionId::new(
            "FIX.4.4",
            CompId::new("A/B").unwrap(),
            CompId::new("C D").unwrap(),
        );
        assert_eq!(store_base_name(&session_id), "FIX.4.4-AB-CD");
    }
}
