//! Language-native model of the wire's tagged value format.
//!
//! The external codec decodes every inbound frame into a [`Value`] and encodes
//! every outbound [`Value`] back into wire bytes. The dispatcher only ever
//! sees this representation.

use crate::types::{BufferId, BufferInfo, IdentityId, MsgId, NetworkId, WireMessage};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::collections::HashMap;
use thiserror::Error;

pub type VariantMap = HashMap<String, Value>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected {expected}, got {got}")]
    Mismatch {
        expected: &'static str,
        got: &'static str,
    },
    #[error("required key '{0}' not found")]
    MissingKey(String),
    #[error("frame argument {0} missing")]
    MissingArg(usize),
}

pub type Result<T> = std::result::Result<T, ValueError>;

/// One decoded wire value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    String(String),
    Bytes(Vec<u8>),
    StringList(Vec<String>),
    List(Vec<Value>),
    Map(VariantMap),
    DateTime(DateTime<Utc>),
    /// Time of day in milliseconds since midnight.
    Time(u32),
    BufferInfo(BufferInfo),
    Message(WireMessage),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytearray",
            Value::StringList(_) => "stringlist",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::BufferInfo(_) => "bufferinfo",
            Value::Message(_) => "message",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// String view over both `String` and `Bytes` values. Class names, object
    /// ids and buffer names arrive as raw byte arrays on the wire.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Bytes(b) => Some(String::from_utf8_lossy(b)),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::String(s) => Some(s),
            Value::Bytes(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&VariantMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<VariantMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Value::StringList(l) => Some(l.clone()),
            Value::List(l) => l
                .iter()
                .map(|v| v.as_text().map(Cow::into_owned))
                .collect(),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_buffer_info(&self) -> Option<&BufferInfo> {
        match self {
            Value::BufferInfo(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&WireMessage> {
        match self {
            Value::Message(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_network_id(&self) -> Option<NetworkId> {
        self.as_i64().map(|i| NetworkId(i as i32))
    }

    pub fn as_identity_id(&self) -> Option<IdentityId> {
        self.as_i64().map(|i| IdentityId(i as i32))
    }

    pub fn as_buffer_id(&self) -> Option<BufferId> {
        self.as_i64().map(|i| BufferId(i as i32))
    }

    pub fn as_msg_id(&self) -> Option<MsgId> {
        self.as_i64().map(|i| MsgId(i as i32))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<NetworkId> for Value {
    fn from(id: NetworkId) -> Self {
        Value::Int(id.0 as i64)
    }
}

impl From<IdentityId> for Value {
    fn from(id: IdentityId) -> Self {
        Value::Int(id.0 as i64)
    }
}

impl From<BufferId> for Value {
    fn from(id: BufferId) -> Self {
        Value::Int(id.0 as i64)
    }
}

impl From<MsgId> for Value {
    fn from(id: MsgId) -> Self {
        Value::Int(id.0 as i64)
    }
}

/// Error-accumulating reader over a [`VariantMap`].
///
/// Required getters record the miss and return a default so a handler can
/// finish parsing the whole map before deciding whether to drop the frame.
pub struct MapReader<'a> {
    map: &'a VariantMap,
    pub errors: Vec<ValueError>,
}

impl<'a> MapReader<'a> {
    pub fn new(map: &'a VariantMap) -> Self {
        Self {
            map,
            errors: Vec::new(),
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(first),
        }
    }

    fn get_raw(&mut self, key: &str, require: bool) -> Option<&'a Value> {
        let val = self.map.get(key);
        if require && val.is_none() {
            self.errors.push(ValueError::MissingKey(key.to_owned()));
        }
        val
    }

    pub fn optional(&mut self, key: &str) -> Option<&'a Value> {
        self.get_raw(key, false)
    }

    pub fn string(&mut self, key: &str) -> String {
        let val = self.get_raw(key, true).and_then(Value::as_text);
        match val {
            Some(s) => s.into_owned(),
            None => String::new(),
        }
    }

    pub fn optional_string(&mut self, key: &str) -> Option<String> {
        self.get_raw(key, false)
            .and_then(Value::as_text)
            .map(Cow::into_owned)
    }

    pub fn i64(&mut self, key: &str) -> i64 {
        self.get_raw(key, true).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn optional_i64(&mut self, key: &str) -> Option<i64> {
        self.get_raw(key, false).and_then(Value::as_i64)
    }

    pub fn bool(&mut self, key: &str) -> bool {
        self.get_raw(key, true)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn optional_bool(&mut self, key: &str) -> Option<bool> {
        self.get_raw(key, false).and_then(Value::as_bool)
    }

    pub fn optional_map(&mut self, key: &str) -> Option<&'a VariantMap> {
        self.get_raw(key, false).and_then(Value::as_map)
    }

    pub fn optional_list(&mut self, key: &str) -> Option<&'a [Value]> {
        self.get_raw(key, false).and_then(Value::as_list)
    }

    pub fn optional_string_list(&mut self, key: &str) -> Option<Vec<String>> {
        self.get_raw(key, false).and_then(Value::as_string_list)
    }
}

/// Cursor over the positional arguments of a session frame.
///
/// Typed getters record a [`ValueError`] on shape mismatch; callers check
/// [`ArgReader::finish`] once and treat any error as a malformed frame.
pub struct ArgReader<'a> {
    args: &'a [Value],
    pos: usize,
    pub errors: Vec<ValueError>,
}

impl<'a> ArgReader<'a> {
    pub fn new(args: &'a [Value]) -> Self {
        Self {
            args,
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(first),
        }
    }

    pub fn remaining(&self) -> &'a [Value] {
        &self.args[self.pos.min(self.args.len())..]
    }

    fn next_raw(&mut self) -> Option<&'a Value> {
        let val = self.args.get(self.pos);
        if val.is_none() {
            self.errors.push(ValueError::MissingArg(self.pos));
        }
        self.pos += 1;
        val
    }

    fn expect<T>(&mut self, expected: &'static str, get: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        let val = self.next_raw()?;
        let parsed = get(val);
        if parsed.is_none() {
            self.errors.push(ValueError::Mismatch {
                expected,
                got: val.kind(),
            });
        }
        parsed
    }

    pub fn value(&mut self) -> Option<&'a Value> {
        self.next_raw()
    }

    pub fn text(&mut self) -> String {
        self.expect("string", |v| v.as_text())
            .map(Cow::into_owned)
            .unwrap_or_default()
    }

    pub fn i64(&mut self) -> i64 {
        self.expect("int", Value::as_i64).unwrap_or(0)
    }

    pub fn bool(&mut self) -> bool {
        self.expect("bool", Value::as_bool).unwrap_or(false)
    }

    pub fn map(&mut self) -> VariantMap {
        self.expect("map", |v| v.as_map().cloned()).unwrap_or_default()
    }

    pub fn string_list(&mut self) -> Vec<String> {
        self.expect("stringlist", Value::as_string_list)
            .unwrap_or_default()
    }

    pub fn list(&mut self) -> Vec<Value> {
        self.expect("list", |v| v.as_list().map(<[Value]>::to_vec))
            .unwrap_or_default()
    }

    pub fn buffer_info(&mut self) -> BufferInfo {
        self.expect("bufferinfo", |v| v.as_buffer_info().cloned())
            .unwrap_or_default()
    }

    pub fn message(&mut self) -> Option<WireMessage> {
        self.expect("message", |v| v.as_message().cloned())
    }

    pub fn network_id(&mut self) -> NetworkId {
        NetworkId(self.i64() as i32)
    }

    pub fn identity_id(&mut self) -> IdentityId {
        IdentityId(self.i64() as i32)
    }

    pub fn buffer_id(&mut self) -> BufferId {
        BufferId(self.i64() as i32)
    }

    pub fn msg_id(&mut self) -> MsgId {
        MsgId(self.i64() as i32)
    }

    pub fn datetime(&mut self) -> Option<DateTime<Utc>> {
        self.expect("datetime", Value::as_datetime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_reads_strings_and_byte_arrays() {
        assert_eq!(Value::from("#chan").as_text().unwrap(), "#chan");
        assert_eq!(
            Value::Bytes(b"#chan".to_vec()).as_text().unwrap(),
            "#chan"
        );
        assert!(Value::Int(4).as_text().is_none());
    }

    #[test]
    fn map_reader_accumulates_misses() {
        let mut map = VariantMap::new();
        map.insert("name".into(), Value::from("quassel"));
        let mut reader = MapReader::new(&map);
        assert_eq!(reader.string("name"), "quassel");
        assert_eq!(reader.i64("latency"), 0);
        assert!(!reader.ok());
        assert!(matches!(
            reader.finish(),
            Err(ValueError::MissingKey(k)) if k == "latency"
        ));
    }

    #[test]
    fn arg_reader_reports_shape_mismatch() {
        let args = vec![Value::from(1), Value::from("two")];
        let mut reader = ArgReader::new(&args);
        assert_eq!(reader.i64(), 1);
        assert_eq!(reader.i64(), 0);
        assert!(matches!(
            reader.finish(),
            Err(ValueError::Mismatch { expected: "int", got: "string" })
        ));
    }
}
