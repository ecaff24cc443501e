//! Catalog entry construction for discovery.

use std::collections::BTreeMap;

use exacttap_types::catalog::{CatalogEntry, Inclusion, Schema};
use serde_json::{json, Value};

/// Field types exposed in discovered schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
    Object,
}

impl FieldType {
    fn json_type(self) -> Value {
        let base = match self {
            Self::String | Self::DateTime => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        };
        json!(["null", base])
    }
}

/// `(name, type)` pair describing one upstream field.
pub type FieldSpec = (&'static str, FieldType);

/// Schema for a single property.
///
/// Key properties and the replication key are `automatic`; everything else
/// is `available` and selected by default.
#[must_use]
pub fn property(ty: FieldType, automatic: bool) -> Schema {
    let (inclusion, selected_by_default) = if automatic {
        (Inclusion::Automatic, None)
    } else {
        (Inclusion::Available, Some(true))
    };
    Schema {
        json_type: Some(ty.json_type()),
        format: (ty == FieldType::DateTime).then(|| "date-time".to_string()),
        inclusion: Some(inclusion),
        selected_by_default,
        ..Schema::default()
    }
}

/// Build a catalog entry. The stream itself is `available` and left
/// unselected until the catalog says otherwise.
#[must_use]
pub fn catalog_entry<'a>(
    stream: &str,
    fields: impl IntoIterator<Item = (&'a str, FieldType)>,
    key_properties: &[&str],
    replication_key: Option<&str>,
) -> CatalogEntry {
    let properties: BTreeMap<String, Schema> = fields
        .into_iter()
        .map(|(name, ty)| {
            let automatic =
                key_properties.iter().any(|k| *k == name) || replication_key == Some(name);
            (name.to_string(), property(ty, automatic))
        })
        .collect();

    CatalogEntry {
        stream: stream.to_string(),
        tap_stream_id: Some(stream.to_string()),
        key_properties: key_properties.iter().map(ToString::to_string).collect(),
        replication_key: replication_key.map(str::to_string),
        schema: Schema {
            json_type: Some(json!("object")),
            properties,
            inclusion: Some(Inclusion::Available),
            ..Schema::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_replication_key_are_automatic() {
        let entry = catalog_entry(
            "email",
            [
                ("ID", FieldType::Integer),
                ("ModifiedDate", FieldType::DateTime),
                ("Subject", FieldType::String),
            ],
            &["ID"],
            Some("ModifiedDate"),
        );
        let props = &entry.schema.properties;
        assert_eq!(props["ID"].inclusion, Some(Inclusion::Automatic));
        assert_eq!(props["ModifiedDate"].inclusion, Some(Inclusion::Automatic));
        assert_eq!(props["ModifiedDate"].format.as_deref(), Some("date-time"));
        assert_eq!(props["Subject"].inclusion, Some(Inclusion::Available));
        assert!(props["Subject"].is_selected());
        assert!(!entry.is_selected());
        assert_eq!(entry.tap_stream_id.as_deref(), Some("email"));
    }

    #[test]
    fn property_types_are_nullable() {
        assert_eq!(
            property(FieldType::Boolean, false).json_type,
            Some(json!(["null", "boolean"]))
        );
    }
}
