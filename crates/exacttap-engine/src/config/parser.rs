//! Config and catalog file parsing with environment variable substitution.

use std::path::Path;
use std::sync::LazyLock;

use exacttap_types::catalog::Catalog;
use regex::Regex;
use serde_json::Value;

use crate::config::types::TapConfig;
use crate::config::validator;
use crate::errors::ConfigError;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

/// Substitute `${VAR_NAME}` patterns inside every string value of a parsed
/// document with environment variable values.
///
/// Substitution happens after parsing so that values are taken verbatim,
/// whatever characters they contain.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] naming every referenced variable that
/// is not set.
pub fn substitute_env_vars(value: &mut Value) -> Result<(), ConfigError> {
    let mut missing = Vec::new();
    substitute_value(value, &mut missing);

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnv(missing));
    }
    Ok(())
}

fn substitute_value(value: &mut Value, missing: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(replaced) = substitute_str(s, missing) {
                *s = replaced;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| substitute_value(v, missing)),
        Value::Object(map) => map.values_mut().for_each(|v| substitute_value(v, missing)),
        _ => {}
    }
}

fn substitute_str(input: &str, missing: &mut Vec<String>) -> Option<String> {
    if !ENV_VAR_RE.is_match(input) {
        return None;
    }
    let replaced = ENV_VAR_RE.replace_all(input, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        std::env::var(var_name).unwrap_or_else(|_| {
            if !missing.iter().any(|m| m == var_name) {
                missing.push(var_name.to_string());
            }
            String::new()
        })
    });
    Some(replaced.into_owned())
}

/// Parse a config document, substitute env vars and validate it.
///
/// # Errors
///
/// Returns an error if the JSON is invalid, substitution fails, or the
/// document fails validation.
pub fn parse_config_str(json_str: &str, path: &Path) -> Result<TapConfig, ConfigError> {
    let mut raw: Value = serde_json::from_str(json_str).map_err(|source| ConfigError::Decode {
        what: "config",
        path: path.to_path_buf(),
        source,
    })?;
    substitute_env_vars(&mut raw)?;

    validator::validate_required_keys(&raw)?;

    let config: TapConfig = serde_json::from_value(raw)
        .map_err(|e| ConfigError::Invalid(vec![format!("Config is malformed: {e}")]))?;
    validator::validate_config(&config)?;
    Ok(config)
}

/// Read, parse and validate the config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the config is invalid.
pub fn load_config(path: &Path) -> Result<TapConfig, ConfigError> {
    let content = read_file("config", path)?;
    parse_config_str(&content, path)
}

/// Parse a catalog document.
///
/// # Errors
///
/// Returns [`ConfigError::Decode`] if the JSON is not a catalog document.
pub fn parse_catalog_str(json_str: &str, path: &Path) -> Result<Catalog, ConfigError> {
    serde_json::from_str(json_str).map_err(|source| ConfigError::Decode {
        what: "catalog",
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse the catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a catalog document.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = read_file("catalog", path)?;
    let catalog = parse_catalog_str(&content, path)?;
    tracing::debug!(
        path = %path.display(),
        streams = catalog.streams.len(),
        "Loaded catalog"
    );
    Ok(catalog)
}

fn read_file(what: &'static str, path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        what,
        path: path.to_path_buf(),
        source,
    })
}
