//! Semantic validation for config documents.

use serde_json::Value;

use crate::config::types::{TapConfig, REQUIRED_KEYS};
use crate::errors::ConfigError;

/// Check that every required key is present and non-null.
///
/// Missing and null keys are reported separately, all at once.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] listing every problem found.
pub fn validate_required_keys(raw: &Value) -> Result<(), ConfigError> {
    let Some(object) = raw.as_object() else {
        return Err(ConfigError::Invalid(vec![
            "Config must be a JSON object".to_string(),
        ]));
    };

    let mut missing = Vec::new();
    let mut null = Vec::new();
    for key in REQUIRED_KEYS {
        match object.get(key) {
            None => missing.push(key),
            Some(Value::Null) => null.push(key),
            Some(_) => {}
        }
    }

    let mut errors = Vec::new();
    if !missing.is_empty() {
        errors.push(format!("Config is missing keys: {}", missing.join(", ")));
    }
    if !null.is_empty() {
        errors.push(format!("Config has null keys: {}", null.join(", ")));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

/// Validate a typed config.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] listing every problem found.
pub fn validate_config(config: &TapConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.client_id.trim().is_empty() {
        errors.push("client_id must not be empty".to_string());
    }
    if config.client_secret.trim().is_empty() {
        errors.push("client_secret must not be empty".to_string());
    }
    if let Some(subdomain) = &config.tenant_subdomain {
        if subdomain.trim().is_empty() || subdomain.contains(['/', ':', '.']) {
            errors.push(format!(
                "tenant_subdomain '{subdomain}' must be a bare subdomain"
            ));
        }
    }
    if config.request_timeout_secs == 0 {
        errors.push("request_timeout_secs must be > 0".to_string());
    }
    if config.batch_size == 0 {
        errors.push("batch_size must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages(err: ConfigError) -> Vec<String> {
        match err {
            ConfigError::Invalid(errors) => errors,
            other => panic!("expected Invalid, got {other}"),
        }
    }

    #[test]
    fn test_valid_required_keys_pass() {
        assert!(validate_required_keys(&json!({"client_id": "x", "client_secret": "y"})).is_ok());
    }

    #[test]
    fn test_missing_and_null_reported_separately() {
        let errors = messages(
            validate_required_keys(&json!({"client_secret": null})).unwrap_err(),
        );
        assert_eq!(
            errors,
            vec![
                "Config is missing keys: client_id".to_string(),
                "Config has null keys: client_secret".to_string(),
            ]
        );
    }

    #[test]
    fn test_all_missing_listed_together() {
        let errors = messages(validate_required_keys(&json!({})).unwrap_err());
        assert_eq!(errors, vec!["Config is missing keys: client_id, client_secret"]);
    }

    #[test]
    fn test_non_object_rejected() {
        let errors = messages(validate_required_keys(&json!(["client_id"])).unwrap_err());
        assert_eq!(errors, vec!["Config must be a JSON object"]);
    }

    #[test]
    fn test_typed_config_checks() {
        let mut config = TapConfig::for_tests();
        assert!(validate_config(&config).is_ok());

        config.client_id = " ".into();
        config.batch_size = 0;
        config.tenant_subdomain = Some("mc.example.com".into());
        let errors = messages(validate_config(&config).unwrap_err());
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("client_id"));
        assert!(errors[1].contains("tenant_subdomain"));
        assert!(errors[2].contains("batch_size"));
    }
}
