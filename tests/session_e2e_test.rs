mod common;

use common::*;
use quassel_rust::client::ClientConfig;
use quassel_rust::handshake::ACK_SSL_BIT;
use quassel_rust::request::sync_frame;
use quassel_rust::session::SessionPhase;
use quassel_rust::types::events::{NetworkChange, SessionEvent};
use quassel_rust::types::{
    BufferId, BufferType, MessageFlags, MessageType, MsgId, NetworkId, WireMessage,
};
use quassel_rust::value::Value;

fn test_config() -> ClientConfig {
    ClientConfig {
        user: "testuser".into(),
        password: "hunter2".into(),
        ..Default::default()
    }
}

fn wire_message(
    id: i32,
    info: quassel_rust::types::BufferInfo,
    sender: &str,
    content: &str,
) -> Value {
    Value::Message(WireMessage {
        id: MsgId(id),
        timestamp: chrono::Utc::now(),
        msg_type: MessageType::PLAIN,
        flags: MessageFlags::empty(),
        buffer: info,
        sender: sender.into(),
        content: content.into(),
    })
}

#[tokio::test]
async fn preamble_and_client_init_are_sent_in_order() {
    let harness = Harness::start(test_config()).await;

    // The raw preamble went out before any typed frame.
    let sent = harness.transport.sent.lock().unwrap().clone();
    assert_eq!(sent[0].len(), 12);
    assert_eq!(&sent[0][0..4], &0x42b3_3f00u32.to_be_bytes());

    let outbound = harness.outbound();
    assert_eq!(msg_type_of(&outbound[0]).as_deref(), Some("ClientInit"));
}

#[tokio::test]
async fn tls_upgrade_happens_between_ack_and_client_init() {
    let config = ClientConfig {
        use_tls: true,
        ..test_config()
    };
    let harness = Harness::start_with_ack(config, ACK_SSL_BIT).await;

    assert!(*harness.transport.tls_upgraded.lock().unwrap());
    // TLS-requesting preamble has bit 0 set in the magic word.
    let sent = harness.transport.sent.lock().unwrap().clone();
    assert_eq!(&sent[0][0..4], &0x42b3_3f01u32.to_be_bytes());
    let outbound = harness.outbound();
    assert_eq!(msg_type_of(&outbound[0]).as_deref(), Some("ClientInit"));
}

#[tokio::test]
async fn configured_core_gets_login_with_credentials() {
    let harness = Harness::start(test_config()).await;
    let mut ack = quassel_rust::value::VariantMap::new();
    ack.insert("Configured".into(), Value::Bool(true));
    harness.push_frame(tagged_map("ClientInitAck", ack)).await;

    harness
        .wait_until(|| {
            harness
                .outbound()
                .iter()
                .any(|f| msg_type_of(f).as_deref() == Some("ClientLogin"))
        })
        .await;
    let outbound = harness.outbound();
    let login = outbound
        .iter()
        .find(|f| msg_type_of(f).as_deref() == Some("ClientLogin"))
        .unwrap();
    let map = login.as_map().unwrap();
    assert_eq!(map.get("User").unwrap().as_text().unwrap(), "testuser");
    assert_eq!(map.get("Password").unwrap().as_text().unwrap(), "hunter2");
    assert_eq!(
        harness.client.state().await.phase,
        SessionPhase::AwaitingLoginAck
    );
}

#[tokio::test]
async fn unconfigured_core_emits_setup_event() {
    let harness = Harness::start(test_config()).await;
    let mut rx = harness.client.events.session.subscribe();
    let mut ack = quassel_rust::value::VariantMap::new();
    ack.insert("Configured".into(), Value::Bool(false));
    harness.push_frame(tagged_map("ClientInitAck", ack)).await;

    let event = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.name(), "setup");
    assert_eq!(harness.client.state().await.phase, SessionPhase::Setup);
}

#[tokio::test]
async fn session_init_bootstraps_networks_buffers_and_requests() {
    let harness = Harness::start(test_config()).await;
    let mut network_rx = harness.client.events.network.subscribe();
    harness
        .login_and_bootstrap(
            &[1],
            &[buffer_info(10, 1, BufferType::Channel, "#test")],
        )
        .await;

    {
        let state = harness.client.state().await;
        assert_eq!(state.phase, SessionPhase::Synchronized);
        let network = state.networks.get(NetworkId(1)).expect("network created");
        let buffer = network.buffers.by_id(BufferId(10)).expect("buffer attached");
        assert_eq!(buffer.name(), "#test");
        assert!(network.buffers.by_name("#TEST").is_some());
    }

    let outbound = harness.outbound();
    assert!(outbound.iter().any(|f| is_init_request(f, "Network", "1")));
    assert!(
        outbound
            .iter()
            .any(|f| is_init_request(f, "IrcChannel", "1/#test"))
    );
    for class in [
        "BufferSyncer",
        "BufferViewManager",
        "IgnoreListManager",
        "AliasManager",
    ] {
        assert!(
            outbound.iter().any(|f| is_init_request(f, class, "")),
            "missing init request for {class}"
        );
    }
    // One seeded backlog request for the known buffer.
    assert!(outbound.iter().any(|f| {
        f.as_list().is_some_and(|items| {
            items.first().and_then(Value::as_i64) == Some(1)
                && items.get(3).and_then(Value::as_text).as_deref()
                    == Some("requestBacklog")
                && items.get(4).and_then(Value::as_i64) == Some(10)
        })
    }));

    // network.new then network.addbuffer(1, 10) fired.
    let mut saw_new = false;
    let mut saw_addbuffer = false;
    while let Ok(event) = network_rx.try_recv() {
        match &event.change {
            NetworkChange::New if event.network == NetworkId(1) => saw_new = true,
            NetworkChange::AddBuffer(buffer)
                if event.network == NetworkId(1) && *buffer == BufferId(10) =>
            {
                saw_addbuffer = true;
            }
            _ => {}
        }
    }
    assert!(saw_new && saw_addbuffer);
}

#[tokio::test]
async fn display_msg_reindexes_pending_buffer_instead_of_duplicating() {
    let harness = Harness::start(test_config()).await;
    harness.login_and_bootstrap(&[1], &[]).await;

    // A channel known only by name (no id assigned yet).
    harness
        .push_frame(sync_frame(
            "Network",
            "1",
            "addIrcChannel",
            vec![Value::from("#pending")],
        ))
        .await;
    harness
        .wait_until(|| {
            harness
                .outbound()
                .iter()
                .any(|f| is_init_request(f, "IrcChannel", "1/#pending"))
        })
        .await;

    let info = buffer_info(42, 1, BufferType::Channel, "#pending");
    harness
        .push_frame(Value::List(vec![
            Value::Int(2),
            Value::Bytes(b"2displayMsg(Message)".to_vec()),
            wire_message(7, info, "bob!b@host", "hello"),
        ]))
        .await;

    harness
        .wait_until(|| {
            harness
                .client
                .try_state()
                .map(|state| {
                    state
                        .networks
                        .get(NetworkId(1))
                        .and_then(|n| n.buffers.by_id(BufferId(42)))
                        .is_some()
                })
                .unwrap_or(false)
        })
        .await;

    let state = harness.client.state().await;
    let network = state.networks.get(NetworkId(1)).unwrap();
    assert_eq!(network.buffers.len(), 1, "re-indexed, not duplicated");
    let buffer = network.buffers.by_id(BufferId(42)).unwrap();
    assert_eq!(buffer.name(), "#pending");
    assert_eq!(buffer.message(MsgId(7)).unwrap().content, "hello");
    assert_eq!(buffer.message(MsgId(7)).unwrap().buffer, BufferId(42));
}

#[tokio::test]
async fn display_msg_highlights_own_nick_on_word_boundary() {
    let harness = Harness::start(test_config()).await;
    harness
        .login_and_bootstrap(&[1], &[buffer_info(10, 1, BufferType::Channel, "#test")])
        .await;
    harness
        .push_frame(sync_frame(
            "Network",
            "1",
            "setMyNick",
            vec![Value::from("alice")],
        ))
        .await;

    let highlighted = wire_message(
        1,
        buffer_info(10, 1, BufferType::Channel, "#test"),
        "bob!b@host",
        "hey alice!",
    );
    let plain = wire_message(
        2,
        buffer_info(10, 1, BufferType::Channel, "#test"),
        "bob!b@host",
        "hey alicebob",
    );
    for message in [highlighted, plain] {
        harness
            .push_frame(Value::List(vec![
                Value::Int(2),
                Value::Bytes(b"2displayMsg(Message)".to_vec()),
                message,
            ]))
            .await;
    }

    harness
        .wait_until(|| {
            harness
                .client
                .try_state()
                .and_then(|state| {
                    Some(
                        state
                            .networks
                            .buffer(BufferId(10))?
                            .message(MsgId(2))
                            .is_some(),
                    )
                })
                .unwrap_or(false)
        })
        .await;

    let state = harness.client.state().await;
    let buffer = state.networks.buffer(BufferId(10)).unwrap();
    assert!(buffer.message(MsgId(1)).unwrap().is_highlighted());
    assert!(!buffer.message(MsgId(2)).unwrap().is_highlighted());
}

#[tokio::test]
async fn heartbeat_is_echoed_immediately() {
    let harness = Harness::start(test_config()).await;
    harness
        .push_frame(Value::List(vec![Value::Int(5), Value::Time(12_345)]))
        .await;
    harness
        .wait_until(|| {
            harness.outbound().iter().any(|f| {
                f.as_list().is_some_and(|items| {
                    items.first().and_then(Value::as_i64) == Some(6)
                        && items.get(1) == Some(&Value::Time(12_345))
                })
            })
        })
        .await;
}

#[tokio::test]
async fn unknown_frames_are_reported_and_never_fatal() {
    let harness = Harness::start(test_config()).await;
    harness.login_and_bootstrap(&[1], &[]).await;
    let mut rx = harness.client.events.session.subscribe();

    harness
        .push_frame(sync_frame("NoSuchClass", "", "whatever", Vec::new()))
        .await;
    let event = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(&*event, SessionEvent::Unhandled(_)));

    // The dispatcher keeps going: a later frame still lands.
    harness
        .push_frame(sync_frame(
            "Network",
            "1",
            "setNetworkName",
            vec![Value::from("libera")],
        ))
        .await;
    harness
        .wait_until(|| {
            harness
                .client
                .try_state()
                .map(|state| {
                    state
                        .networks
                        .get(NetworkId(1))
                        .is_some_and(|n| n.name == "libera")
                })
                .unwrap_or(false)
        })
        .await;
}
