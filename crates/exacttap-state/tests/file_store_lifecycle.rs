//! Integration tests for the JSON file state store across runs.

use exacttap_state::{JsonFileStateStore, StateStore};
use exacttap_types::state::{State, StreamName};
use serde_json::json;

/// A second run sees exactly what the first run persisted, and merging a new
/// bookmark keeps the untouched ones.
#[test]
fn test_state_survives_between_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    // First run: nothing on disk yet.
    let store = JsonFileStateStore::new(&path);
    let mut state = store.load().expect("load empty");
    assert!(state.is_empty());

    let mut email = state.scope(&StreamName::new("email"));
    email.set_bookmark(json!("2024-05-01T00:00:00Z"));
    state.apply(email);
    store.save(&state).expect("save first run");

    // Second run: resume and advance another stream.
    let store = JsonFileStateStore::new(&path);
    let mut state = store.load().expect("load persisted");
    assert_eq!(
        state.bookmark(&StreamName::new("email")),
        Some(&json!("2024-05-01T00:00:00Z"))
    );

    let mut list = state.scope(&StreamName::new("list"));
    list.set_bookmark(json!("2024-06-01T00:00:00Z"));
    state.apply(list);
    store.save(&state).expect("save second run");

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        on_disk,
        json!({
            "email": "2024-05-01T00:00:00Z",
            "list": "2024-06-01T00:00:00Z"
        })
    );
}

#[test]
fn test_unreadable_state_path_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the file should be.
    let target = dir.path().join("state.json");
    std::fs::create_dir(&target).expect("mkdir");
    let store = JsonFileStateStore::new(&target);
    assert!(store.load().is_err());
    assert!(store.save(&State::new()).is_err());
}
