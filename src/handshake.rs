//! Connect-time byte preamble and handshake frame builders.
//!
//! Before any typed frames, both sides exchange raw 32-bit big-endian words:
//! the client sends the magic word (with the TLS-request bit) plus two
//! protocol/feature words; the core answers with one acknowledgment word
//! whose high bits advertise SSL and compression support. Everything after
//! that is typed frames through the codec — and if TLS was negotiated, the
//! upgrade happens strictly between the ack and the ClientInit frame.

use crate::value::{Value, VariantMap};
use bytes::{BufMut, BytesMut};
use thiserror::Error;

pub const MAGIC: u32 = 0x42b3_3f00;
pub const MAGIC_TLS_BIT: u32 = 0x01;
pub const MAGIC_COMPRESSION_BIT: u32 = 0x02;

const PROTOCOL_WORD: u32 = 0x0000_0001;
const FEATURE_END_WORD: u32 = 0x8000_0000;

pub const ACK_SSL_BIT: u32 = 0x0100_0000;
pub const ACK_COMPRESSION_BIT: u32 = 0x0200_0000;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("core does not support TLS, but TLS was requested")]
    TlsUnavailable,
    #[error("magic acknowledgment truncated ({0} bytes)")]
    TruncatedAck(usize),
}

/// What the core advertised in its magic acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreCapabilities {
    pub ssl: bool,
    pub compression: bool,
}

/// The 12-byte connect preamble: magic word (with option bits) followed by
/// the protocol negotiation words.
pub fn build_preamble(request_tls: bool, request_compression: bool) -> Vec<u8> {
    let mut magic = MAGIC;
    if request_tls {
        magic |= MAGIC_TLS_BIT;
    }
    if request_compression {
        magic |= MAGIC_COMPRESSION_BIT;
    }
    let mut buf = BytesMut::with_capacity(12);
    buf.put_u32(magic);
    buf.put_u32(PROTOCOL_WORD);
    buf.put_u32(FEATURE_END_WORD);
    buf.to_vec()
}

/// Parse the core's acknowledgment word.
pub fn parse_ack(bytes: &[u8]) -> Result<CoreCapabilities, HandshakeError> {
    if bytes.len() < 4 {
        return Err(HandshakeError::TruncatedAck(bytes.len()));
    }
    let word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    Ok(CoreCapabilities {
        ssl: word & ACK_SSL_BIT != 0,
        compression: word & ACK_COMPRESSION_BIT != 0,
    })
}

pub fn client_init_frame(
    client_version: &str,
    client_date: &str,
    use_ssl: bool,
    use_compression: bool,
) -> Value {
    let mut map = VariantMap::new();
    map.insert("MsgType".into(), Value::from("ClientInit"));
    map.insert("ClientVersion".into(), Value::from(client_version));
    map.insert("ClientDate".into(), Value::from(client_date));
    map.insert("ProtocolVersion".into(), Value::Int(10));
    map.insert("UseSsl".into(), Value::Bool(use_ssl));
    map.insert("UseCompression".into(), Value::Bool(use_compression));
    Value::Map(map)
}

pub fn client_login_frame(user: &str, password: &str) -> Value {
    let mut map = VariantMap::new();
    map.insert("MsgType".into(), Value::from("ClientLogin"));
    map.insert("User".into(), Value::from(user));
    map.insert("Password".into(), Value::from(password));
    Value::Map(map)
}

pub fn core_setup_frame(setup_data: VariantMap) -> Value {
    let mut map = VariantMap::new();
    map.insert("MsgType".into(), Value::from("CoreSetupData"));
    map.insert("SetupData".into(), Value::Map(setup_data));
    Value::Map(map)
}
