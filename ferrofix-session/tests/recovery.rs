/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Durable session recovery.
//!
//! A session backed by a file store must resume its sequence numbers after
//! a restart and still be able to service resend requests for messages
//! sent before the process went down.

use ferrofix_core::message::AdminMsgType;
use ferrofix_core::tags;
use ferrofix_core::types::CompId;
use ferrofix_session::application::NoOpApplication;
use ferrofix_session::config::{SessionConfig, SessionConfigBuilder};
use ferrofix_session::session::Session;
use ferrofix_store::file::FileStore;
use ferrofix_tagvalue::decoder::Decoder;
use ferrofix_tagvalue::encoder::{MessageBuilder, MessageHeader, encode};
use std::path::Path;
use std::sync::Arc;

fn config() -> SessionConfig {
    SessionConfigBuilder::new()
        .begin_string("FIX.4.4")
        .sender_comp_id(CompId::new("SENDER").unwrap())
        .target_comp_id(CompId::new("TARGET").unwrap())
        .build()
}

fn open_session(base: &Path) -> Session {
    let store = Arc::new(FileStore::open(base).unwrap());
    Session::new(config(), store, Arc::new(NoOpApplication))
}

fn peer_frame(builder: &MessageBuilder, seq: u64) -> bytes::BytesMut {
    let header = MessageHeader::new("FIX.4.4", "TARGET", "SENDER", seq);
    encode(&header, builder)
}

fn peer_logon(seq: u64) -> bytes::BytesMut {
    let mut builder = MessageBuilder::admin(AdminMsgType::Logon);
    builder.put_uint(tags::ENCRYPT_METHOD, 0);
    builder.put_uint(tags::HEART_BT_INT, 30);
    peer_frame(&builder, seq)
}

#[tokio::test]
async fn test_sequencing_resumes_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("session");

    // First run: logon, one order, then the process goes away.
    {
        let mut session = open_session(&base);
        session.connect().await.unwrap();
        session.process_inbound(&peer_logon(1)).await.unwrap();
        assert!(session.is_logged_on());

        let mut order = MessageBuilder::app("D");
        order.put_str(11, "A1");
        assert_eq!(session.send(order).await.unwrap().value(), 2);
        session.on_transport_closed().await;
    }

    // Second run: counters continue where the store left them.
    let mut session = open_session(&base);
    assert_eq!(session.next_sender_seq(), 3);
    assert_eq!(session.next_target_seq(), 2);

    session.connect().await.unwrap();
    let frames = session.drain_outbound();
    let logon = Decoder::new(&frames[0]).decode().unwrap();
    assert_eq!(logon.msg_type().as_str(), "A");
    assert_eq!(logon.msg_seq_num().unwrap(), 3);

    session.process_inbound(&peer_logon(2)).await.unwrap();
    assert!(session.is_logged_on());

    // The peer never got the pre-restart order; it asks for it back and
    // receives the stored copy, PossDup-flagged.
    let mut resend = MessageBuilder::admin(AdminMsgType::ResendRequest);
    resend.put_uint(tags::BEGIN_SEQ_NO, 2);
    resend.put_uint(tags::END_SEQ_NO, 2);
    session
        .process_inbound(&peer_frame(&resend, 3))
        .await
        .unwrap();

    let frames = session.drain_outbound();
    assert_eq!(frames.len(), 1);
    let replay = Decoder::new(&frames[0]).decode().unwrap();
    assert_eq!(replay.msg_type().as_str(), "D");
    assert_eq!(replay.msg_seq_num().unwrap(), 2);
    assert!(replay.poss_dup());
    assert_eq!(replay.get_field_str(11), Some("A1"));
}
