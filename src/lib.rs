//! Client-side session synchronization for the Quassel core protocol.
//!
//! The crate keeps a live mirror of a remote core's state — networks,
//! buffers, users, messages, identities, rules and chat-list views — by
//! interpreting the core's tagged frame stream, and builds the outbound
//! frames for user actions. The byte-level typed-value codec and the
//! transport are injected behind traits; see [`codec::FrameCodec`] and
//! [`transport::Transport`].

pub mod client;
pub mod codec;
pub mod error;
pub mod handlers;
pub mod handshake;
pub mod heartbeat;
pub mod model;
pub mod registry;
pub mod request;
pub mod session;
pub mod transport;
pub mod types;
pub mod value;

pub use client::{Client, ClientConfig};
pub use error::{ClientError, ProtocolError};
pub use registry::TypeRegistry;
pub use session::{SessionPhase, SessionState};
pub use value::{Value, VariantMap};
