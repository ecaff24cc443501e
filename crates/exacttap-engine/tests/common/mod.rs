//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use exacttap_engine::client::{ApiError, FilterOperator, MarketingApi, RetrieveRequest, Row};
use exacttap_engine::config::parser;
use exacttap_engine::config::TapConfig;
use exacttap_engine::streams::bookmark::parse_timestamp;
use exacttap_types::catalog::Catalog;
use serde_json::Value;

/// In-process upstream: canned rows per object type, honouring the
/// filters accessors send, with a log of every request.
#[derive(Default)]
pub struct FakeApi {
    rows: BTreeMap<String, Vec<Row>>,
    failing: BTreeSet<String>,
    requests: RefCell<Vec<RetrieveRequest>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, object_type: &str, rows: Value) -> Self {
        let rows = rows
            .as_array()
            .expect("rows fixture must be an array")
            .iter()
            .map(|r| r.as_object().cloned().expect("row must be an object"))
            .collect();
        self.rows.insert(object_type.to_string(), rows);
        self
    }

    pub fn failing(mut self, object_type: &str) -> Self {
        self.failing.insert(object_type.to_string());
        self
    }

    pub fn requests(&self) -> Vec<RetrieveRequest> {
        self.requests.borrow().clone()
    }

    pub fn requests_for(&self, object_type: &str) -> Vec<RetrieveRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.object_type == object_type)
            .cloned()
            .collect()
    }

    pub fn object_types(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| r.object_type.clone())
            .collect()
    }
}

fn keep(row: &Row, request: &RetrieveRequest) -> bool {
    let Some(filter) = &request.filter else {
        return true;
    };
    let Some(actual) = row.get(&filter.property) else {
        return false;
    };
    match filter.operator {
        FilterOperator::In => filter
            .value
            .as_array()
            .is_some_and(|values| values.contains(actual)),
        FilterOperator::GreaterThanOrEqual => {
            let lhs = actual.as_str().and_then(parse_timestamp);
            let rhs = filter.value.as_str().and_then(parse_timestamp);
            matches!((lhs, rhs), (Some(l), Some(r)) if l >= r)
        }
    }
}

impl MarketingApi for FakeApi {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Vec<Row>, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        if self.failing.contains(&request.object_type) {
            return Err(ApiError::Status {
                status: 503,
                body: format!("{} unavailable", request.object_type),
                retry_after_ms: None,
            });
        }
        Ok(self
            .rows
            .get(&request.object_type)
            .map(|rows| rows.iter().filter(|r| keep(r, request)).cloned().collect())
            .unwrap_or_default())
    }
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
        .join(name)
}

pub fn config(json: &str) -> TapConfig {
    parser::parse_config_str(json, Path::new("config.json")).expect("test config must be valid")
}

pub fn minimal_config() -> TapConfig {
    config(r#"{"client_id": "x", "client_secret": "y"}"#)
}

pub fn catalog(json: Value) -> Catalog {
    serde_json::from_value(json).expect("test catalog must parse")
}
