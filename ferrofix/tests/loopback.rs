/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Initiator/acceptor loopback.
//!
//! Two registries wired back to back through their frame queues: the
//! initiator logs on to the acceptor, trades flow one way, and shutdown
//! tears both sides down cleanly. No sockets involved; the registries'
//! byte-level interface is the transport.

use ferrofix::prelude::*;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Default)]
struct RecordingApp {
    received: Mutex<Vec<String>>,
}

impl RecordingApp {
    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Application for RecordingApp {
    async fn on_create(&self, _session_id: &SessionId) {}

    async fn on_logon(&self, session_id: &SessionId) {
        info!(session = %session_id, "logged on");
    }

    async fn on_logout(&self, session_id: &SessionId) {
        info!(session = %session_id, "logged out");
    }

    async fn to_admin(&self, _message: &mut MessageBuilder, _session_id: &SessionId) {}

    async fn from_admin(
        &self,
        _message: &RawMessage<'_>,
        _session_id: &SessionId,
    ) -> std::result::Result<(), RejectReason> {
        Ok(())
    }

    async fn to_app(&self, _message: &mut MessageBuilder, _session_id: &SessionId) {}

    async fn from_app(
        &self,
        message: &RawMessage<'_>,
        _session_id: &SessionId,
    ) -> std::result::Result<(), RejectReason> {
        self.received
            .lock()
            .unwrap()
            .push(message.msg_type().as_str().to_string());
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_test_writer()
        .try_init();
}

fn initiator_id() -> SessionId {
    SessionId::new(
        "FIX.4.4",
        CompId::new("BUYSIDE").unwrap(),
        CompId::new("GATEWAY").unwrap(),
    )
}

fn acceptor_id() -> SessionId {
    initiator_id().reversed()
}

/// Shuttles frames between the two registries until both sides go quiet.
async fn pump(
    initiator: &SessionRegistry,
    acceptor: &SessionRegistry,
    mut to_acceptor: Vec<bytes::BytesMut>,
) {
    let init_id = initiator_id();
    let acc_id = acceptor_id();
    loop {
        let mut to_initiator = Vec::new();
        for frame in to_acceptor.drain(..) {
            to_initiator.extend(acceptor.route_inbound(&acc_id, &frame).await.unwrap());
        }
        if to_initiator.is_empty() {
            break;
        }
        for frame in to_initiator.drain(..) {
            to_acceptor.extend(initiator.route_inbound(&init_id, &frame).await.unwrap());
        }
        if to_acceptor.is_empty() {
            break;
        }
    }
}

#[tokio::test]
async fn test_initiator_acceptor_loopback() {
    init_tracing();

    let initiator_registry = EngineBuilder::new()
        .add_session(SessionConfig::new(initiator_id()).with_reset_on_logon(true))
        .build()
        .await
        .unwrap();

    let app = Arc::new(RecordingApp::default());
    let acceptor_registry = SessionRegistry::new(app.clone());
    acceptor_registry
        .set_acceptor_template(SessionConfig::new(acceptor_id()).with_role(SessionRole::Acceptor));

    let initiator = initiator_registry.lookup(&initiator_id()).unwrap();
    let logon_frames = initiator.connect().await.unwrap();
    pump(&initiator_registry, &acceptor_registry, logon_frames).await;

    // The acceptor session was created from the template on first logon.
    let acceptor = acceptor_registry.lookup(&acceptor_id()).unwrap();
    assert!(initiator.is_logged_on().await);
    assert!(acceptor.is_logged_on().await);

    // Application traffic reaches the far side's business layer.
    let mut order = MessageBuilder::app("D");
    order.put_str(11, "ORDER1");
    order.put_str(55, "EUR/USD");
    let seq = initiator_registry
        .send(&initiator_id(), order)
        .await
        .unwrap();
    assert_eq!(seq.value(), 2);

    let frames = initiator.drain_outbound().await;
    pump(&initiator_registry, &acceptor_registry, frames).await;
    assert_eq!(app.received(), vec!["D".to_string()]);

    // Shutdown quiesces the initiator; further sends are refused.
    initiator_registry.shutdown().await;
    let result = initiator_registry
        .send(&initiator_id(), MessageBuilder::app("D"))
        .await;
    assert!(matches!(
        result,
        Err(FixError::Session(SessionError::NotConnected))
    ));
}
