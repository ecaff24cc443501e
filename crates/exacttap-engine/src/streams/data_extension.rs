//! Data extension streams: one `data_extension.<CustomerKey>` stream per
//! upstream data extension, with a schema built from its field list.

use std::collections::BTreeMap;

use exacttap_types::catalog::{CatalogEntry, Schema};
use exacttap_types::error::AccessorError;
use exacttap_types::state::StateScope;
use serde_json::Value;

use crate::client::{MarketingApi, RetrieveRequest, Row};
use crate::context::SyncContext;
use crate::streams::object::{replicate, requested_properties};
use crate::streams::schema::{catalog_entry, FieldType};

pub const STREAM_PREFIX: &str = "data_extension.";
/// Added to every row so records stay attributable after fan-in.
pub const CUSTOMER_KEY_FIELD: &str = "_CustomerKey";
const REPLICATION_KEY: &str = "ModifiedDate";

#[derive(Debug, Default)]
struct Extension {
    fields: Vec<(String, FieldType)>,
    primary_keys: Vec<String>,
}

/// Map an upstream data extension field type onto a schema type.
#[must_use]
pub fn field_type(upstream: &str) -> FieldType {
    match upstream.to_ascii_lowercase().as_str() {
        "boolean" => FieldType::Boolean,
        "number" => FieldType::Integer,
        "decimal" => FieldType::Number,
        "date" => FieldType::DateTime,
        _ => FieldType::String,
    }
}

fn str_field<'r>(row: &'r Row, name: &str) -> Option<&'r str> {
    row.get(name).and_then(Value::as_str)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// One catalog entry per data extension, ordered by customer key.
///
/// # Errors
///
/// Returns an [`AccessorError`] if either discovery call fails.
pub async fn discover<A: MarketingApi>(api: &A) -> Result<Vec<CatalogEntry>, AccessorError> {
    let extensions = api
        .retrieve(&RetrieveRequest::new(
            "DataExtension",
            vec!["ObjectID".into(), "CustomerKey".into(), "Name".into()],
        ))
        .await?;

    let mut by_key: BTreeMap<String, Extension> = extensions
        .iter()
        .filter_map(|row| str_field(row, "CustomerKey"))
        .map(|key| (key.to_string(), Extension::default()))
        .collect();

    let fields = api
        .retrieve(&RetrieveRequest::new(
            "DataExtensionField",
            vec![
                "Name".into(),
                "FieldType".into(),
                "IsPrimaryKey".into(),
                "DataExtension.CustomerKey".into(),
            ],
        ))
        .await?;

    for row in &fields {
        let (Some(owner), Some(name)) = (
            str_field(row, "DataExtension.CustomerKey"),
            str_field(row, "Name"),
        ) else {
            continue;
        };
        let Some(extension) = by_key.get_mut(owner) else {
            tracing::debug!(data_extension = owner, field = name, "Field of unknown data extension");
            continue;
        };
        let ty = str_field(row, "FieldType").map_or(FieldType::String, field_type);
        extension.fields.push((name.to_string(), ty));
        if truthy(row.get("IsPrimaryKey")) {
            extension.primary_keys.push(name.to_string());
        }
    }

    tracing::info!(data_extensions = by_key.len(), "Discovered data extensions");
    Ok(by_key
        .into_iter()
        .map(|(key, extension)| build_entry(&key, &extension))
        .collect())
}

fn build_entry(customer_key: &str, extension: &Extension) -> CatalogEntry {
    let replication_key = extension
        .fields
        .iter()
        .any(|(name, _)| name == REPLICATION_KEY)
        .then_some(REPLICATION_KEY);
    let keys: Vec<&str> = extension.primary_keys.iter().map(String::as_str).collect();
    let fields = extension
        .fields
        .iter()
        .map(|(name, ty)| (name.as_str(), *ty))
        .chain(std::iter::once((CUSTOMER_KEY_FIELD, FieldType::String)));

    catalog_entry(
        &format!("{STREAM_PREFIX}{customer_key}"),
        fields,
        &keys,
        replication_key,
    )
}

/// Upstream data extension values arrive as strings; retype the ones whose
/// schema says otherwise. Values that do not parse are left as they are.
fn coerce(row: &mut Row, schema: &Schema) {
    for (name, value) in row.iter_mut() {
        let Value::String(raw) = value else { continue };
        let Some(Value::Array(types)) = schema.properties.get(name).and_then(|p| p.json_type.as_ref())
        else {
            continue;
        };
        let has = |t: &str| types.iter().any(|v| v == t);

        let coerced = if raw.is_empty() {
            (!has("string")).then_some(Value::Null)
        } else if has("boolean") {
            match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            }
        } else if has("integer") {
            raw.parse::<i64>().ok().map(Value::from)
        } else if has("number") {
            raw.parse::<f64>().ok().map(Value::from)
        } else {
            None
        };

        if let Some(coerced) = coerced {
            *value = coerced;
        }
    }
}

pub async fn sync<A: MarketingApi>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    scope: &mut StateScope,
) -> Result<u64, AccessorError> {
    let customer_key = entry
        .stream
        .strip_prefix(STREAM_PREFIX)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            AccessorError::config(
                "BAD_STREAM_NAME",
                format!("`{}` does not name a data extension", entry.stream),
            )
        })?
        .to_string();

    let properties: Vec<String> = requested_properties(entry, [])
        .into_iter()
        .filter(|p| p != CUSTOMER_KEY_FIELD)
        .collect();
    if properties.is_empty() {
        return Err(AccessorError::config(
            "NO_PROPERTIES",
            format!("`{}` selects no data extension fields", entry.stream),
        ));
    }

    ctx.write_schema(entry)?;

    replicate(
        ctx,
        entry,
        &format!("DataExtensionObject[{customer_key}]"),
        properties,
        entry.replication_key.as_deref(),
        scope,
        |row| {
            coerce(row, &entry.schema);
            row.insert(
                CUSTOMER_KEY_FIELD.to_string(),
                Value::String(customer_key.clone()),
            );
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_types_map() {
        assert_eq!(field_type("Boolean"), FieldType::Boolean);
        assert_eq!(field_type("Number"), FieldType::Integer);
        assert_eq!(field_type("Decimal"), FieldType::Number);
        assert_eq!(field_type("Date"), FieldType::DateTime);
        assert_eq!(field_type("EmailAddress"), FieldType::String);
    }

    #[test]
    fn entry_carries_primary_keys_and_customer_key() {
        let extension = Extension {
            fields: vec![
                ("Email".into(), FieldType::String),
                ("ModifiedDate".into(), FieldType::DateTime),
            ],
            primary_keys: vec!["Email".into()],
        };
        let entry = build_entry("customers", &extension);
        assert_eq!(entry.stream, "data_extension.customers");
        assert_eq!(entry.key_properties, vec!["Email"]);
        assert_eq!(entry.replication_key.as_deref(), Some("ModifiedDate"));
        assert!(entry.schema.properties.contains_key(CUSTOMER_KEY_FIELD));
    }

    #[test]
    fn entry_without_modified_date_is_full_table() {
        let extension = Extension {
            fields: vec![("Email".into(), FieldType::String)],
            primary_keys: vec![],
        };
        assert!(build_entry("k", &extension).replication_key.is_none());
    }

    #[test]
    fn coerce_retypes_by_schema() {
        let extension = Extension {
            fields: vec![
                ("Active".into(), FieldType::Boolean),
                ("Age".into(), FieldType::Integer),
                ("Score".into(), FieldType::Number),
                ("Name".into(), FieldType::String),
            ],
            primary_keys: vec![],
        };
        let entry = build_entry("k", &extension);
        let mut row = json!({
            "Active": "True",
            "Age": "",
            "Score": "2.5",
            "Name": "7"
        })
        .as_object()
        .cloned()
        .unwrap();

        coerce(&mut row, &entry.schema);
        assert_eq!(
            Value::Object(row),
            json!({"Active": true, "Age": null, "Score": 2.5, "Name": "7"})
        );
    }
}
