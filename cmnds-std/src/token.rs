//! Removal tokens.

use std::fmt;

/// Undoes one registration.
///
/// Returned by every registering call. [`remove`](Self::remove) deletes
/// exactly the entry that produced the token, by identity: registering an
/// equal callable again, or redefining the hook, is never undone by an
/// older token. Dropping the token keeps the registration.
pub struct RemovalToken {
    revoke: Box<dyn FnOnce() -> bool + Send + Sync>,
}

impl RemovalToken {
    pub(crate) fn new<F>(revoke: F) -> Self
    where
        F: FnOnce() -> bool + Send + Sync + 'static,
    {
        Self {
            revoke: Box::new(revoke),
        }
    }

    /// Removes the registration.
    ///
    /// Returns `false` if it was already gone (removed by name, reset, or its
    /// owner dropped).
    pub fn remove(self) -> bool {
        (self.revoke)()
    }
}

impl fmt::Debug for RemovalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemovalToken").finish_non_exhaustive()
    }
}
