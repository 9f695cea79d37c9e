//! Explicit registry of the named wire user-types and their field layouts.
//!
//! The external typed-value codec is constructed against one of these values
//! instead of a process-wide type table, so two sessions with different codec
//! configurations can coexist.

/// Primitive wire tag a user-type field is serialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Bool,
    Int,
    UInt,
    Short,
    ByteArray,
    String,
    Map,
    UserType(&'static str),
}

/// Ordered field layout of one named user-type. Field order is part of the
/// wire contract and must not be changed.
#[derive(Debug, Clone)]
pub struct UserTypeLayout {
    pub name: &'static str,
    pub fields: &'static [(&'static str, WireType)],
}

/// The set of user-types this session declares to the codec.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    layouts: Vec<UserTypeLayout>,
}

impl TypeRegistry {
    /// Registry covering every user-type the session protocol exchanges.
    pub fn session_default() -> Self {
        let mut registry = TypeRegistry::default();
        for name in ["NetworkId", "IdentityId", "BufferId", "MsgId"] {
            registry.register(UserTypeLayout {
                name,
                fields: &[("id", WireType::Int)],
            });
        }
        registry.register(UserTypeLayout {
            name: "Identity",
            fields: &[("data", WireType::Map)],
        });
        registry.register(UserTypeLayout {
            name: "NetworkInfo",
            fields: &[("data", WireType::Map)],
        });
        registry.register(UserTypeLayout {
            name: "Network::Server",
            fields: &[("data", WireType::Map)],
        });
        registry.register(UserTypeLayout {
            name: "BufferInfo",
            fields: &[
                ("id", WireType::Int),
                ("network", WireType::Int),
                ("type", WireType::Short),
                ("group", WireType::UInt),
                ("name", WireType::ByteArray),
            ],
        });
        registry.register(UserTypeLayout {
            name: "Message",
            fields: &[
                ("id", WireType::Int),
                ("timestamp", WireType::UInt),
                ("type", WireType::UInt),
                ("flags", WireType::Bool),
                ("bufferInfo", WireType::UserType("BufferInfo")),
                ("sender", WireType::ByteArray),
                ("content", WireType::ByteArray),
            ],
        });
        registry
    }

    pub fn register(&mut self, layout: UserTypeLayout) {
        debug_assert!(
            self.lookup(layout.name).is_none(),
            "user-type '{}' registered twice",
            layout.name
        );
        self.layouts.push(layout);
    }

    pub fn lookup(&self, name: &str) -> Option<&UserTypeLayout> {
        self.layouts.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserTypeLayout> {
        self.layouts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_session_types() {
        let registry = TypeRegistry::session_default();
        for name in [
            "NetworkId",
            "IdentityId",
            "BufferId",
            "MsgId",
            "Identity",
            "NetworkInfo",
            "Network::Server",
            "BufferInfo",
            "Message",
        ] {
            assert!(registry.lookup(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn buffer_info_field_order_is_stable() {
        let registry = TypeRegistry::session_default();
        let layout = registry.lookup("BufferInfo").unwrap();
        let names: Vec<_> = layout.fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["id", "network", "type", "group", "name"]);
    }
}
