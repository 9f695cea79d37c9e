use crate::value::{Value, VariantMap};

/// A command alias: `/name` expands to `expansion`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alias {
    pub name: String,
    pub expansion: String,
}

/// The session's alias set, converted between the wire's struct-of-arrays
/// shape and rows.
#[derive(Debug, Clone, Default)]
pub struct AliasManager {
    aliases: Vec<Alias>,
}

impl AliasManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    pub fn push(&mut self, alias: Alias) {
        self.aliases.push(alias);
    }

    pub fn get(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn from_wire_map(map: &VariantMap) -> Self {
        let Some(columns) = map.get("Aliases").and_then(Value::as_map) else {
            return AliasManager::default();
        };
        let names = columns
            .get("names")
            .and_then(Value::as_string_list)
            .unwrap_or_default();
        let expansions = columns
            .get("expansions")
            .and_then(Value::as_string_list)
            .unwrap_or_default();
        let mut manager = AliasManager::default();
        for (row, name) in names.into_iter().enumerate() {
            manager.push(Alias {
                name,
                expansion: expansions.get(row).cloned().unwrap_or_default(),
            });
        }
        manager
    }

    pub fn to_wire_map(&self) -> VariantMap {
        let mut columns = VariantMap::new();
        columns.insert(
            "names".into(),
            Value::List(
                self.aliases
                    .iter()
                    .map(|a| Value::from(a.name.clone()))
                    .collect(),
            ),
        );
        columns.insert(
            "expansions".into(),
            Value::List(
                self.aliases
                    .iter()
                    .map(|a| Value::from(a.expansion.clone()))
                    .collect(),
            ),
        );
        let mut map = VariantMap::new();
        map.insert("Aliases".into(), Value::Map(columns));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columnar_round_trip_preserves_row_pairing() {
        let mut manager = AliasManager::new();
        manager.push(Alias {
            name: "j".into(),
            expansion: "/join $0".into(),
        });
        manager.push(Alias {
            name: "ns".into(),
            expansion: "/msg NickServ $0".into(),
        });
        let restored = AliasManager::from_wire_map(&manager.to_wire_map());
        assert_eq!(restored.aliases(), manager.aliases());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut manager = AliasManager::new();
        manager.push(Alias {
            name: "J".into(),
            expansion: "/join $0".into(),
        });
        assert!(manager.get("j").is_some());
    }
}
