//! Boundary to the external typed-value codec.
//!
//! The codec owns the byte-level framing and the tagged value format; this
//! crate only hands it [`Value`] trees and receives [`Value`] trees back. A
//! codec is constructed against an explicit [`TypeRegistry`] naming the
//! user-types it must understand.

use crate::registry::TypeRegistry;
use crate::value::Value;

/// Stream codec between wire bytes and decoded frames.
///
/// `feed`/`next_frame` follow the buffering decoder shape: raw transport
/// chunks go in, complete decoded frames come out once available.
pub trait FrameCodec: Send {
    /// Buffer a chunk of raw transport bytes.
    fn feed(&mut self, data: &[u8]);

    /// Decode the next complete frame, if one is buffered.
    fn next_frame(&mut self) -> Result<Option<Value>, anyhow::Error>;

    /// Encode one outbound frame into length-prefixed wire bytes.
    fn encode_frame(&mut self, frame: &Value) -> Result<Vec<u8>, anyhow::Error>;
}

/// Constructs a codec for one session against the session's type registry.
pub trait FrameCodecFactory: Send + Sync {
    fn create_codec(&self, registry: &TypeRegistry) -> Box<dyn FrameCodec>;
}

pub mod stub {
    //! In-memory codec used by the integration tests: frames cross the
    //! boundary as `Value` trees carried through a queue, no real wire format.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Shared handle tests use to inject inbound frames and inspect outbound
    /// ones.
    #[derive(Default, Clone)]
    pub struct StubWire {
        inbound: Arc<Mutex<VecDeque<Value>>>,
        outbound: Arc<Mutex<Vec<Value>>>,
    }

    impl StubWire {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_inbound(&self, frame: Value) {
            self.inbound.lock().unwrap().push_back(frame);
        }

        pub fn outbound(&self) -> Vec<Value> {
            self.outbound.lock().unwrap().clone()
        }

        pub fn take_outbound(&self) -> Vec<Value> {
            let mut outbound = self.outbound.lock().unwrap();
            std::mem::take(&mut *outbound)
        }
    }

    pub struct StubCodec {
        wire: StubWire,
    }

    impl StubCodec {
        pub fn new(wire: StubWire) -> Self {
            Self { wire }
        }
    }

    impl FrameCodec for StubCodec {
        fn feed(&mut self, _data: &[u8]) {}

        fn next_frame(&mut self) -> Result<Option<Value>, anyhow::Error> {
            Ok(self.wire.inbound.lock().unwrap().pop_front())
        }

        fn encode_frame(&mut self, frame: &Value) -> Result<Vec<u8>, anyhow::Error> {
            self.wire.outbound.lock().unwrap().push(frame.clone());
            Ok(Vec::new())
        }
    }

    pub struct StubCodecFactory {
        wire: StubWire,
    }

    impl StubCodecFactory {
        pub fn new(wire: StubWire) -> Self {
            Self { wire }
        }
    }

    impl FrameCodecFactory for StubCodecFactory {
        fn create_codec(&self, _registry: &TypeRegistry) -> Box<dyn FrameCodec> {
            Box::new(StubCodec::new(self.wire.clone()))
        }
    }
}
