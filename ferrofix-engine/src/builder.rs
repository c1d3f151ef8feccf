/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Engine builder for fluent configuration.

use crate::registry::SessionRegistry;
use ferrofix_core::error::Result;
use ferrofix_session::application::{Application, NoOpApplication};
use ferrofix_session::config::{SessionConfig, SessionRole};
use ferrofix_tagvalue::groups::GroupDict;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring a FerroFix engine.
#[derive(Debug)]
pub struct EngineBuilder<A: Application = NoOpApplication> {
    /// Application callback handler.
    application: Arc<A>,
    /// Session configurations.
    sessions: Vec<SessionConfig>,
    /// Repeating-group dictionary shared by all sessions.
    group_dict: Option<Arc<GroupDict>>,
    /// Connection timeout.
    connect_timeout: Duration,
    /// Reconnect interval.
    reconnect_interval: Duration,
    /// Maximum reconnect attempts.
    max_reconnect_attempts: u32,
}

impl Default for EngineBuilder<NoOpApplication> {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder<NoOpApplication> {
    /// Creates a new engine builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            application: Arc::new(NoOpApplication),
            sessions: Vec::new(),
            group_dict: None,
            connect_timeout: Duration::from_secs(30),
            reconnect_interval: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }
}

impl<A: Application + 'static> EngineBuilder<A> {
    /// Sets the application callback handler.
    #[must_use]
    pub fn with_application<B: Application>(self, application: B) -> EngineBuilder<B> {
        EngineBuilder {
            application: Arc::new(application),
            sessions: self.sessions,
            group_dict: self.group_dict,
            connect_timeout: self.connect_timeout,
            reconnect_interval: self.reconnect_interval,
            max_reconnect_attempts: self.max_reconnect_attempts,
        }
    }

    /// Adds a session configuration.
    #[must_use]
    pub fn add_session(mut self, config: SessionConfig) -> Self {
        self.sessions.push(config);
        self
    }

    /// Sets the repeating-group dictionary.
    #[must_use]
    pub fn with_group_dict(mut self, dict: GroupDict) -> Self {
        self.group_dict = Some(Arc::new(dict));
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reconnect interval.
    #[must_use]
    pub const fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Sets the maximum reconnect attempts.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Returns the configured sessions.
    #[must_use]
    pub fn sessions(&self) -> &[SessionConfig] {
        &self.sessions
    }

    /// Returns the connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the reconnect interval.
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Returns the maximum reconnect attempts.
    #[must_use]
    pub const fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts
    }

    /// Returns the application handler.
    #[must_use]
    pub fn application(&self) -> Arc<A> {
        Arc::clone(&self.application)
    }

    /// Builds the registry, registering every configured session.
    ///
    /// Initiator sessions are registered directly; the first acceptor
    /// config additionally becomes the template for inbound-created
    /// sessions.
    ///
    /// # Errors
    /// Propagates registration failures (duplicate identities, store
    /// open errors).
    pub async fn build(self) -> Result<SessionRegistry> {
        let mut registry = SessionRegistry::new(self.application);
        if let Some(dict) = self.group_dict {
            registry = registry.with_group_dict(dict);
        }
        for config in self.sessions {
            if config.role == SessionRole::Acceptor {
                registry.set_acceptor_template(config);
            } else {
                registry.register(config).await?;
            }
        }
        Ok(registry)
    }
}
