/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Session configuration.

use ferrofix_core::types::{CompId, SessionId};
use std::path::PathBuf;
use std::time::Duration;

/// Whether the session dials out or answers inbound connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Client side: connects and sends the first Logon.
    Initiator,
    /// Server side: waits for the counterparty's Logon.
    Acceptor,
}

/// Configuration for a FIX session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identity tuple for this session.
    pub session_id: SessionId,
    /// Initiator or acceptor role.
    pub role: SessionRole,
    /// Heartbeat interval (tag 108).
    pub heartbeat_interval: Duration,
    /// Tolerance added to the heartbeat interval before a TestRequest is sent.
    pub heartbeat_tolerance: Duration,
    /// Whether to reset sequence numbers on logon.
    pub reset_on_logon: bool,
    /// Whether to reset sequence numbers on logout.
    pub reset_on_logout: bool,
    /// Whether to reset sequence numbers on disconnect.
    pub reset_on_disconnect: bool,
    /// Maximum message size in bytes.
    pub max_message_size: usize,
    /// Logon timeout duration.
    pub logon_timeout: Duration,
    /// Logout timeout duration.
    pub logout_timeout: Duration,
    /// Whether to validate incoming message checksums.
    pub validate_checksum: bool,
    /// Message store base path; `None` keeps the session in memory.
    pub store_path: Option<PathBuf>,
    /// Password injected into the Logon message (tag 554).
    pub password: Option<String>,
    /// Ask the counterparty to cancel working orders on disconnect.
    pub cancel_on_disconnect: bool,
}

impl SessionConfig {
    /// Creates a new initiator configuration with defaults.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            role: SessionRole::Initiator,
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_tolerance: Duration::from_secs(1),
            reset_on_logon: false,
            reset_on_logout: false,
            reset_on_disconnect: false,
            max_message_size: 1024 * 1024, // 1MB
            logon_timeout: Duration::from_secs(10),
            logout_timeout: Duration::from_secs(10),
            validate_checksum: true,
            store_path: None,
            password: None,
            cancel_on_disconnect: false,
        }
    }

    /// Sets the session role.
    #[must_use]
    pub const fn with_role(mut self, role: SessionRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the tolerance margin added before a TestRequest is sent.
    #[must_use]
    pub const fn with_heartbeat_tolerance(mut self, tolerance: Duration) -> Self {
        self.heartbeat_tolerance = tolerance;
        self
    }

    /// Sets whether to reset sequence numbers on logon.
    #[must_use]
    pub const fn with_reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the logon timeout.
    #[must_use]
    pub const fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.logon_timeout = timeout;
        self
    }

    /// Sets the store base path, making the session durable.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Sets the Logon password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns the heartbeat interval in seconds.
    #[must_use]
    pub fn heartbeat_interval_secs(&self) -> u64 {
        self.heartbeat_interval.as_secs()
    }
}

/// Builder for session configuration.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    begin_string: Option<String>,
    sender_comp_id: Option<CompId>,
    target_comp_id: Option<CompId>,
    role: Option<SessionRole>,
    heartbeat_interval: Option<Duration>,
    reset_on_logon: bool,
    store_path: Option<PathBuf>,
    password: Option<String>,
}

impl SessionConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the FIX version.
    #[must_use]
    pub fn begin_string(mut self, version: impl Into<String>) -> Self {
        self.begin_string = Some(version.into());
        self
    }

    /// Sets the sender CompID.
    #[must_use]
    pub fn sender_comp_id(mut self, id: CompId) -> Self {
        self.sender_comp_id = Some(id);
        self
    }

    /// Sets the target CompID.
    #[must_use]
    pub fn target_comp_id(mut self, id: CompId) -> Self {
        self.target_comp_id = Some(id);
        self
    }

    /// Sets the session role.
    #[must_use]
    pub const fn role(mut self, role: SessionRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Sets whether to reset on logon.
    #[must_use]
    pub const fn reset_on_logon(mut self, reset: bool) -> Self {
        self.reset_on_logon = reset;
        self
    }

    /// Sets the store base path.
    #[must_use]
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Sets the Logon password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    /// Panics if sender or target CompID is not set.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        let sender = self.sender_comp_id.expect("sender_comp_id is required");
        let target = self.target_comp_id.expect("target_comp_id is required");
        let begin_string = self.begin_string.unwrap_or_else(|| "FIX.4.4".to_string());

        let mut config = SessionConfig::new(SessionId::new(begin_string, sender, target));
        if let Some(role) = self.role {
            config.role = role;
        }
        if let Some(interval) = self.heartbeat_interval {
            config.heartbeat_interval = interval;
        }
        config.reset_on_logon = self.reset_on_logon;
        config.store_path = self.store_path;
        config.password = self.password;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_id() -> SessionId {
        SessionId::new(
            "FIX.4.4",
            CompId::new("SENDER").unwrap(),
            CompId::new("TARGET").unwrap(),
        )
    }

    #[test]
    fn test_session_config_new() {
        let config = SessionConfig::new(session_id());

        assert_eq!(config.session_id.sender_comp_id.as_str(), "SENDER");
        assert_eq!(config.session_id.target_comp_id.as_str(), "TARGET");
        assert_eq!(config.role, SessionRole::Initiator);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfigBuilder::new()
            .begin_string("FIX.4.2")
            .sender_comp_id(CompId::new("SENDER").unwrap())
            .target_comp_id(CompId::new("TARGET").unwrap())
            .role(SessionRole::Acceptor)
            .heartbeat_interval(Duration::from_secs(60))
            .reset_on_logon(true)
            .password("hunter2")
            .build();

        assert_eq!(config.session_id.begin_string, "FIX.4.2");
        assert_eq!(config.role, SessionRole::Acceptor);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert!(config.reset_on_logon);
        assert_eq!(config.password.as_deref(), Some("hunter2"));
    }
}
