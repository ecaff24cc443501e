pub mod discover;
pub mod sync;

use std::path::Path;

use exacttap_state::{JsonFileStateStore, MemoryStateStore, StateStore};

/// File-backed store when a state path is given, otherwise a throwaway
/// in-memory one (bookmarks then only reach the caller via STATE messages).
pub(crate) fn state_store(path: Option<&Path>) -> Box<dyn StateStore> {
    match path {
        Some(path) => Box::new(JsonFileStateStore::new(path)),
        None => Box::new(MemoryStateStore::default()),
    }
}
