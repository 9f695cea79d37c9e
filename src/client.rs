use crate::codec::{FrameCodec, FrameCodecFactory};
use crate::error::ClientError;
use crate::handlers::{self, router::ClassRouter};
use crate::handshake::{self, CoreCapabilities};
use crate::model::HighlightMode;
use crate::registry::TypeRegistry;
use crate::session::{SessionPhase, SessionState};
use crate::transport::{Transport, TransportEvent, TransportFactory};
use crate::types::events::{
    BufferChange, BufferEvent, BufferViewChange, BufferViewEvent, ChannelChange, ChannelEvent,
    EventBus, IdentityEvent, NetworkChange, NetworkEvent, RuleEvent, SessionEvent, UserChange,
    UserEvent,
};
use crate::types::{BufferId, NetworkId};
use crate::value::Value;

use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user: String,
    pub password: String,
    /// Request TLS in the preamble and upgrade once the core confirms.
    pub use_tls: bool,
    pub use_compression: bool,
    /// Messages requested per buffer right after session bootstrap.
    pub initial_backlog_limit: i32,
    /// Messages per subsequent explicit backlog request.
    pub backlog_limit: i32,
    pub highlight_mode: HighlightMode,
    pub client_version: String,
    pub client_date: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            user: String::new(),
            password: String::new(),
            use_tls: false,
            use_compression: false,
            initial_backlog_limit: 100,
            backlog_limit: 100,
            highlight_mode: HighlightMode::CurrentNick,
            client_version: concat!("quassel-rust ", env!("CARGO_PKG_VERSION")).to_owned(),
            client_date: String::new(),
        }
    }
}

/// The session client: owns the synchronized state, the dispatcher routing
/// tables, and the connection plumbing. All entity mutation happens on the
/// single `run` loop, one frame at a time.
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) state: Mutex<SessionState>,
    pub events: EventBus,
    pub(crate) registry: TypeRegistry,

    pub(crate) transport_factory: Arc<dyn TransportFactory>,
    pub(crate) codec_factory: Arc<dyn FrameCodecFactory>,
    pub(crate) transport: Mutex<Option<Arc<dyn Transport>>>,
    pub(crate) transport_events: Mutex<Option<mpsc::Receiver<TransportEvent>>>,
    pub(crate) codec: Mutex<Option<Box<dyn FrameCodec>>>,

    pub(crate) router: ClassRouter,
    pub(crate) is_connected: AtomicBool,
    pub(crate) heartbeat_started: AtomicBool,
    pub(crate) shutdown_notifier: Notify,
    pub(crate) core_caps: Mutex<Option<CoreCapabilities>>,
    pub(crate) last_heartbeat: Mutex<Option<Instant>>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        transport_factory: Arc<dyn TransportFactory>,
        codec_factory: Arc<dyn FrameCodecFactory>,
    ) -> Arc<Self> {
        let highlight_mode = config.highlight_mode;
        Arc::new(Client {
            config,
            state: Mutex::new(SessionState::new(highlight_mode)),
            events: EventBus::new(),
            registry: TypeRegistry::session_default(),
            transport_factory,
            codec_factory,
            transport: Mutex::new(None),
            transport_events: Mutex::new(None),
            codec: Mutex::new(None),
            router: handlers::build_router(),
            is_connected: AtomicBool::new(false),
            heartbeat_started: AtomicBool::new(false),
            shutdown_notifier: Notify::new(),
            core_caps: Mutex::new(None),
            last_heartbeat: Mutex::new(None),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::Acquire)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Read access to the synchronized session state.
    pub async fn state(&self) -> tokio::sync::MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Non-blocking state access; `None` while a frame is being dispatched.
    pub fn try_state(&self) -> Option<tokio::sync::MutexGuard<'_, SessionState>> {
        self.state.try_lock().ok()
    }

    /// What the core advertised in its magic acknowledgment, once received.
    pub async fn core_capabilities(&self) -> Option<CoreCapabilities> {
        *self.core_caps.lock().await
    }

    /// Create the transport, send the connect preamble and prime the codec.
    /// The connection is then driven by [`Client::run`].
    pub async fn connect(&self) -> Result<(), ClientError> {
        if self.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }
        let (transport, events) = self
            .transport_factory
            .create_transport()
            .await
            .map_err(ClientError::Transport)?;

        *self.codec.lock().await = Some(self.codec_factory.create_codec(&self.registry));
        *self.transport_events.lock().await = Some(events);
        *self.transport.lock().await = Some(transport.clone());
        self.state.lock().await.phase = SessionPhase::AwaitingMagicAck;

        let preamble =
            handshake::build_preamble(self.config.use_tls, self.config.use_compression);
        transport
            .send(&preamble)
            .await
            .map_err(ClientError::Transport)?;
        self.is_connected.store(true, Ordering::Release);
        info!(target: "Client", "Connected, magic preamble sent");
        Ok(())
    }

    /// Consume transport events until disconnect or shutdown. Frames are
    /// dispatched strictly in arrival order; each frame's mutation completes
    /// before the next frame is looked at.
    pub async fn run(self: &Arc<Self>) -> Result<(), ClientError> {
        if !self.is_connected() {
            self.connect().await?;
        }
        let mut events = self
            .transport_events
            .lock()
            .await
            .take()
            .ok_or(ClientError::NotConnected)?;
        let mut magic_buf: Vec<u8> = Vec::new();

        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(TransportEvent::DataReceived(data)) => {
                        if let Err(e) = self.handle_data(&mut magic_buf, data).await {
                            warn!(target: "Client", "Connection error: {e}");
                            self.emit_session(SessionEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    Some(TransportEvent::Connected) => continue,
                    Some(TransportEvent::Error(message)) => {
                        warn!(target: "Client", "Transport error: {message}");
                        self.emit_session(SessionEvent::Error(message));
                    }
                    Some(TransportEvent::Disconnected) | None => {
                        debug!(target: "Client", "Transport closed");
                        break;
                    }
                },
                _ = self.shutdown_notifier.notified() => {
                    debug!(target: "Client", "Shutdown signaled, leaving run loop");
                    break;
                }
            }
        }
        self.is_connected.store(false, Ordering::Release);
        Ok(())
    }

    /// Raw bytes from the transport. Until the magic acknowledgment arrives
    /// these are interpreted directly; afterwards everything goes through
    /// the codec.
    pub(crate) async fn handle_data(
        self: &Arc<Self>,
        magic_buf: &mut Vec<u8>,
        data: Vec<u8>,
    ) -> Result<(), ClientError> {
        let mut payload = data;
        let awaiting_magic =
            { self.state.lock().await.phase == SessionPhase::AwaitingMagicAck };
        if awaiting_magic {
            magic_buf.extend_from_slice(&payload);
            if magic_buf.len() < 4 {
                return Ok(());
            }
            let caps = handshake::parse_ack(magic_buf)?;
            payload = magic_buf.split_off(4);
            magic_buf.clear();
            debug!(
                target: "Client",
                "Magic ack: ssl={}, compression={}", caps.ssl, caps.compression
            );
            *self.core_caps.lock().await = Some(caps);

            if self.config.use_tls {
                if !caps.ssl {
                    return Err(ClientError::Handshake(
                        crate::handshake::HandshakeError::TlsUnavailable,
                    ));
                }
                let transport = self.transport.lock().await.clone();
                if let Some(transport) = transport {
                    transport
                        .upgrade_tls()
                        .await
                        .map_err(ClientError::Transport)?;
                    debug!(target: "Client", "Stream upgraded to TLS");
                }
            }

            self.state.lock().await.phase = SessionPhase::AwaitingClientInitAck;
            self.send_frame(handshake::client_init_frame(
                &self.config.client_version,
                &self.config.client_date,
                self.config.use_tls,
                self.config.use_compression,
            ))
            .await?;
            if payload.is_empty() {
                return Ok(());
            }
        }

        let frames = {
            let mut guard = self.codec.lock().await;
            let codec = guard.as_mut().ok_or(ClientError::NotConnected)?;
            codec.feed(&payload);
            let mut frames = Vec::new();
            while let Some(frame) = codec.next_frame().map_err(ClientError::Codec)? {
                frames.push(frame);
            }
            frames
        };
        for frame in frames {
            handlers::dispatch_frame(self, frame).await;
        }
        Ok(())
    }

    /// Send the login frame. Called automatically once the core confirms it
    /// is configured; also the continuation after a successful core setup.
    pub async fn login(&self) -> Result<(), ClientError> {
        self.state.lock().await.phase = SessionPhase::AwaitingLoginAck;
        self.send_frame(handshake::client_login_frame(
            &self.config.user,
            &self.config.password,
        ))
        .await
    }

    /// Encode and write one outbound frame.
    pub async fn send_frame(&self, frame: Value) -> Result<(), ClientError> {
        let bytes = {
            let mut guard = self.codec.lock().await;
            let codec = guard.as_mut().ok_or(ClientError::NotConnected)?;
            codec.encode_frame(&frame).map_err(ClientError::Codec)?
        };
        let transport = self
            .transport
            .lock()
            .await
            .clone()
            .ok_or(ClientError::NotConnected)?;
        transport.send(&bytes).await.map_err(ClientError::Transport)
    }

    /// Fire-and-forget variant for reactions to inbound frames, where a send
    /// failure must not abort the dispatch of the triggering frame.
    pub(crate) async fn send_frame_logged(&self, frame: Value) {
        if let Err(e) = self.send_frame(frame).await {
            warn!(target: "Client", "Failed to send frame: {e}");
        }
    }

    /// Stop the heartbeat, close the transport and abandon in-flight
    /// requests. No reconnection is attempted.
    pub async fn disconnect(&self) {
        self.shutdown_notifier.notify_waiters();
        if let Some(transport) = self.transport.lock().await.take() {
            transport.disconnect().await;
        }
        *self.codec.lock().await = None;
        self.is_connected.store(false, Ordering::Release);
        self.heartbeat_started.store(false, Ordering::Release);
        info!(target: "Client", "Disconnected");
    }

    // --- event emission ---

    pub(crate) fn emit_session(&self, event: SessionEvent) {
        let _ = self.events.session.send(Arc::new(event));
    }

    pub(crate) fn emit_network(&self, network: NetworkId, change: NetworkChange) {
        let _ = self
            .events
            .network
            .send(Arc::new(NetworkEvent { network, change }));
    }

    pub(crate) fn emit_buffer(&self, buffer: BufferId, change: BufferChange) {
        let _ = self
            .events
            .buffer
            .send(Arc::new(BufferEvent { buffer, change }));
    }

    pub(crate) fn emit_buffer_view(&self, view: i32, change: BufferViewChange) {
        let _ = self
            .events
            .buffer_view
            .send(Arc::new(BufferViewEvent { view, change }));
    }

    pub(crate) fn emit_user(&self, network: NetworkId, nick: String, change: UserChange) {
        let _ = self.events.user.send(Arc::new(UserEvent {
            network,
            nick,
            change,
        }));
    }

    pub(crate) fn emit_channel(&self, network: NetworkId, channel: String, change: ChannelChange) {
        let _ = self.events.channel.send(Arc::new(ChannelEvent {
            network,
            channel,
            change,
        }));
    }

    pub(crate) fn emit_identity(&self, event: IdentityEvent) {
        let _ = self.events.identity.send(Arc::new(event));
    }

    pub(crate) fn emit_rules(&self, event: RuleEvent) {
        let _ = self.events.rules.send(Arc::new(event));
    }
}
