//! State store trait definition.
//!
//! [`StateStore`] defines the load/save contract for the bookmark document.
//! The model type lives in [`exacttap_types::state`].

use exacttap_types::state::State;

use crate::error;

/// Storage contract for the bookmark document.
///
/// The document is loaded once at run start and saved once at run end.
pub trait StateStore {
    /// Load the current document.
    ///
    /// Returns an empty [`State`] when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage or decode
    /// failure.
    fn load(&self) -> error::Result<State>;

    /// Replace the persisted document with `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn save(&self, state: &State) -> error::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the trait is object-safe (can be used as `dyn StateStore`).
    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn StateStore) {}
    }
}
