//! Stream catalog and schema types.
//!
//! A [`Catalog`] is the set of [`CatalogEntry`]s the tap exposes. Each entry
//! carries a JSON-Schema [`Schema`] whose root and properties hold the
//! selection metadata (`inclusion`, `selected`, `selected-by-default`) that
//! decides what gets replicated.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// How a stream or property participates in replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    /// Always replicated, regardless of selection flags.
    Automatic,
    /// Replicated when selected (explicitly or by default).
    Available,
    /// Never replicated.
    Unsupported,
    /// Any value this tap does not recognise. Never selected.
    #[serde(other)]
    Unknown,
}

/// JSON-Schema fragment with selection metadata.
///
/// Only the keywords the tap reasons about are typed; everything else is
/// preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// JSON-Schema `type` (a string or an array such as `["null", "string"]`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub json_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,
    /// `None` when the key is absent, `Some(None)` when it is `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected: Option<Option<bool>>,
    #[serde(
        rename = "selected-by-default",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_by_default: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Some)
}

impl Schema {
    /// Selection gate.
    ///
    /// `automatic` is always selected; `available` follows `selected` when the
    /// key is present (a `null` value is not selected), falling back to
    /// `selected-by-default` and then to `false`. Anything else is not
    /// selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        match self.inclusion {
            Some(Inclusion::Automatic) => true,
            Some(Inclusion::Available) => match self.selected {
                Some(flag) => flag == Some(true),
                None => self.selected_by_default == Some(true),
            },
            _ => false,
        }
    }

    /// Names of the selected top-level properties, in name order.
    #[must_use]
    pub fn selected_properties(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|(_, prop)| prop.is_selected())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Mark the schema and all of its top-level properties selected.
    pub fn select_all(&mut self) {
        self.selected = Some(Some(true));
        for prop in self.properties.values_mut() {
            prop.selected = Some(Some(true));
        }
    }

    /// Shape a record to the selected properties of this schema.
    ///
    /// A schema without declared properties passes the record through.
    #[must_use]
    pub fn project(&self, record: &Map<String, Value>) -> Map<String, Value> {
        if self.properties.is_empty() {
            return record.clone();
        }
        record
            .iter()
            .filter(|(name, _)| {
                self.properties
                    .get(name.as_str())
                    .is_some_and(Schema::is_selected)
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// One replicable stream in a catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream name (e.g. `"email"`, `"data_extension.customers"`).
    pub stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_stream_id: Option<String>,
    #[serde(default)]
    pub key_properties: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    pub schema: Schema,
}

impl CatalogEntry {
    /// Whether this stream passes the selection gate.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.schema.is_selected()
    }
}

/// Catalog document: `{"streams": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Look up an entry by stream name.
    #[must_use]
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|entry| entry.stream == stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn schema(inclusion: Inclusion, selected: Option<bool>, by_default: Option<bool>) -> Schema {
        Schema {
            inclusion: Some(inclusion),
            selected: selected.map(Some),
            selected_by_default: by_default,
            ..Schema::default()
        }
    }

    #[test]
    fn available_defaults_to_unselected() {
        assert!(!schema(Inclusion::Available, None, None).is_selected());
    }

    #[test]
    fn explicit_selected_overrides_default() {
        assert!(!schema(Inclusion::Available, Some(false), Some(true)).is_selected());
        assert!(schema(Inclusion::Available, Some(true), Some(false)).is_selected());
    }

    #[test]
    fn unsupported_and_missing_inclusion_never_selected() {
        assert!(!schema(Inclusion::Unsupported, Some(true), Some(true)).is_selected());
        let bare = Schema {
            selected: Some(Some(true)),
            ..Schema::default()
        };
        assert!(!bare.is_selected());
    }

    #[test]
    fn unknown_inclusion_parses_and_is_unselected() {
        let s: Schema =
            serde_json::from_value(json!({"inclusion": "sometimes", "selected": true})).unwrap();
        assert_eq!(s.inclusion, Some(Inclusion::Unknown));
        assert!(!s.is_selected());
    }

    #[test]
    fn null_selected_is_not_selected() {
        let s: Schema = serde_json::from_value(json!({
            "inclusion": "available",
            "selected": null,
            "selected-by-default": true
        }))
        .unwrap();
        assert_eq!(s.selected, Some(None));
        assert!(!s.is_selected());
        assert_eq!(serde_json::to_value(&s).unwrap()["selected"], Value::Null);

        let absent: Schema = serde_json::from_value(json!({
            "inclusion": "available",
            "selected-by-default": true
        }))
        .unwrap();
        assert_eq!(absent.selected, None);
        assert!(absent.is_selected());
    }

    #[test]
    fn selected_by_default_uses_dashed_key() {
        let s: Schema = serde_json::from_value(json!({
            "type": "object",
            "inclusion": "available",
            "selected-by-default": true
        }))
        .unwrap();
        assert_eq!(s.selected_by_default, Some(true));
        assert!(s.is_selected());

        let back = serde_json::to_value(&s).unwrap();
        assert_eq!(back["selected-by-default"], true);
    }

    #[test]
    fn unknown_keywords_survive_roundtrip() {
        let raw = json!({
            "type": ["null", "string"],
            "maxLength": 64,
            "inclusion": "available"
        });
        let s: Schema = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(s.extra["maxLength"], 64);
        assert_eq!(serde_json::to_value(&s).unwrap(), raw);
    }

    #[test]
    fn project_keeps_only_selected_properties() {
        let s: Schema = serde_json::from_value(json!({
            "inclusion": "automatic",
            "properties": {
                "ID": {"inclusion": "automatic"},
                "Name": {"inclusion": "available", "selected": true},
                "Subject": {"inclusion": "available"}
            }
        }))
        .unwrap();
        let record = json!({"ID": 1, "Name": "n", "Subject": "s", "Extra": true});
        let projected = s.project(record.as_object().unwrap());
        assert_eq!(Value::Object(projected), json!({"ID": 1, "Name": "n"}));
        assert_eq!(s.selected_properties(), vec!["ID", "Name"]);
    }

    #[test]
    fn select_all_marks_root_and_properties() {
        let mut s: Schema = serde_json::from_value(json!({
            "inclusion": "available",
            "properties": {"A": {"inclusion": "available"}}
        }))
        .unwrap();
        s.select_all();
        assert!(s.is_selected());
        assert_eq!(s.selected_properties(), vec!["A"]);
    }

    #[test]
    fn catalog_lookup_by_stream() {
        let catalog: Catalog = serde_json::from_value(json!({
            "streams": [
                {"stream": "email", "schema": {"inclusion": "automatic"}},
                {"stream": "list", "schema": {}}
            ]
        }))
        .unwrap();
        assert!(catalog.get("email").unwrap().is_selected());
        assert!(!catalog.get("list").unwrap().is_selected());
        assert!(catalog.get("send").is_none());
    }

    proptest! {
        #[test]
        fn automatic_ignores_flags(selected in any::<Option<bool>>(), by_default in any::<Option<bool>>()) {
            prop_assert!(schema(Inclusion::Automatic, selected, by_default).is_selected());
        }

        #[test]
        fn available_follows_selected_then_default(selected in any::<Option<bool>>(), by_default in any::<Option<bool>>()) {
            let expected = selected.unwrap_or(by_default.unwrap_or(false));
            prop_assert_eq!(schema(Inclusion::Available, selected, by_default).is_selected(), expected);
        }
    }
}
