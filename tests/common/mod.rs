//! Shared harness: a client wired to the recording transport and the
//! in-memory codec, driven through the same run loop as production.
#![allow(dead_code)]

use quassel_rust::client::{Client, ClientConfig};
use quassel_rust::codec::stub::{StubCodecFactory, StubWire};
use quassel_rust::transport::TransportEvent;
use quassel_rust::transport::mock::{MockTransport, MockTransportFactory};
use quassel_rust::types::{BufferId, BufferInfo, BufferType, NetworkId};
use quassel_rust::value::{Value, VariantMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct Harness {
    pub client: Arc<Client>,
    pub wire: StubWire,
    pub transport: Arc<MockTransport>,
    pub event_tx: mpsc::Sender<TransportEvent>,
}

impl Harness {
    /// Connect, start the run loop and complete the magic-ack exchange.
    pub async fn start(config: ClientConfig) -> Harness {
        Self::start_with_ack(config, 0).await
    }

    pub async fn start_with_ack(config: ClientConfig, ack_word: u32) -> Harness {
        let factory = Arc::new(MockTransportFactory::new());
        let event_tx = factory.event_tx.clone();
        let transport = factory.transport();
        let wire = StubWire::new();
        let codec_factory = Arc::new(StubCodecFactory::new(wire.clone()));
        let client = Client::new(config, factory, codec_factory);

        client.connect().await.expect("connect");
        let run_client = client.clone();
        tokio::spawn(async move {
            let _ = run_client.run().await;
        });

        let harness = Harness {
            client,
            wire,
            transport,
            event_tx,
        };
        harness.send_raw(ack_word.to_be_bytes().to_vec()).await;
        // ClientInit is the first typed frame after the ack.
        harness
            .wait_until(|| !harness.wire.outbound().is_empty())
            .await;
        harness
    }

    pub async fn send_raw(&self, data: Vec<u8>) {
        self.event_tx
            .send(TransportEvent::DataReceived(data))
            .await
            .expect("run loop alive");
    }

    /// Queue a decoded frame and nudge the run loop.
    pub async fn push_frame(&self, frame: Value) {
        self.wire.push_inbound(frame);
        self.send_raw(Vec::new()).await;
    }

    pub async fn wait_until(&self, cond: impl Fn() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within timeout");
    }

    /// Drive the handshake through login and session init with one network
    /// and the given buffers.
    pub async fn login_and_bootstrap(&self, networks: &[i32], buffers: &[BufferInfo]) {
        let mut init_ack = VariantMap::new();
        init_ack.insert("Configured".into(), Value::Bool(true));
        init_ack.insert("LoginEnabled".into(), Value::Bool(true));
        self.push_frame(tagged_map("ClientInitAck", init_ack)).await;
        self.push_frame(tagged_map("ClientLoginAck", VariantMap::new()))
            .await;
        self.push_frame(session_init(networks, buffers)).await;
        self.wait_until(|| {
            self.wire
                .outbound()
                .iter()
                .any(|f| is_init_request(f, "BufferSyncer", ""))
        })
        .await;
    }

    pub fn outbound(&self) -> Vec<Value> {
        self.wire.outbound()
    }
}

pub fn tagged_map(msg_type: &str, mut fields: VariantMap) -> Value {
    fields.insert("MsgType".into(), Value::from(msg_type));
    Value::Map(fields)
}

pub fn buffer_info(id: i32, network: i32, buffer_type: BufferType, name: &str) -> BufferInfo {
    BufferInfo {
        id: BufferId(id),
        network: NetworkId(network),
        buffer_type,
        group: 0,
        name: name.to_owned(),
    }
}

pub fn session_init(networks: &[i32], buffers: &[BufferInfo]) -> Value {
    let mut session_state = VariantMap::new();
    session_state.insert(
        "NetworkIds".into(),
        Value::List(networks.iter().map(|id| Value::from(*id)).collect()),
    );
    session_state.insert(
        "BufferInfos".into(),
        Value::List(
            buffers
                .iter()
                .map(|info| Value::BufferInfo(info.clone()))
                .collect(),
        ),
    );
    session_state.insert("Identities".into(), Value::List(Vec::new()));
    let mut map = VariantMap::new();
    map.insert("SessionState".into(), Value::Map(session_state));
    tagged_map("SessionInit", map)
}

pub fn init_data(class_name: &str, object_id: &str, data: VariantMap) -> Value {
    Value::List(vec![
        Value::Int(4),
        Value::Bytes(class_name.as_bytes().to_vec()),
        Value::Bytes(object_id.as_bytes().to_vec()),
        Value::Map(data),
    ])
}

pub fn is_init_request(frame: &Value, class_name: &str, object_id: &str) -> bool {
    let Some(items) = frame.as_list() else {
        return false;
    };
    items.len() == 3
        && items[0].as_i64() == Some(3)
        && items[1].as_text().as_deref() == Some(class_name)
        && items[2].as_text().as_deref() == Some(object_id)
}

pub fn msg_type_of(frame: &Value) -> Option<String> {
    frame
        .as_map()?
        .get("MsgType")
        .and_then(Value::as_text)
        .map(|s| s.into_owned())
}
