//! In-memory implementation of [`StateStore`].

use std::sync::{Mutex, MutexGuard};

use exacttap_types::state::State;

use crate::backend::StateStore;
use crate::error::{self, StateError};

/// Keeps the document in memory and counts saves. Intended for tests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: State,
    saves: usize,
}

impl MemoryStateStore {
    /// Create a store pre-seeded with `state`.
    #[must_use]
    pub fn with_state(state: State) -> Self {
        Self {
            inner: Mutex::new(Inner { state, saves: 0 }),
        }
    }

    fn lock(&self) -> error::Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StateError::LockPoisoned)
    }

    /// Last saved (or seeded) document.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::LockPoisoned`] if a writer panicked.
    pub fn snapshot(&self) -> error::Result<State> {
        Ok(self.lock()?.state.clone())
    }

    /// Number of [`StateStore::save`] calls so far.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::LockPoisoned`] if a writer panicked.
    pub fn save_count(&self) -> error::Result<usize> {
        Ok(self.lock()?.saves)
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> error::Result<State> {
        self.snapshot()
    }

    fn save(&self, state: &State) -> error::Result<()> {
        let mut inner = self.lock()?;
        inner.state = state.clone();
        inner.saves += 1;
        Ok(())
    }
}
