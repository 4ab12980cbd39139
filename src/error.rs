//! Errors raised when wiring stores together.

use std::fmt;

use thiserror::Error;

use crate::store::Store;

/// Error returned when a `from` or `to` link is attempted twice between the
/// same pair of stores.
///
/// The offending parent handle is carried so callers can identify which link
/// was rejected (compare with [`Store::ptr_eq`]). The store graph is left
/// untouched when this error is returned.
#[derive(Error)]
pub enum InheritError<P> {
    /// `.from()` was called twice with the same parent store.
    #[error(".from() called twice with the same store")]
    DuplicateFrom { parent: Store<P> },
    /// `.to()` was called twice with the same parent store.
    #[error(".to() called twice with the same store")]
    DuplicateTo { parent: Store<P> },
}

impl<P> InheritError<P> {
    /// The parent store the rejected link pointed at.
    pub fn parent(&self) -> &Store<P> {
        match self {
            Self::DuplicateFrom { parent } => parent,
            Self::DuplicateTo { parent } => parent,
        }
    }
}

// Hand-written so `P` does not need to implement `Debug`.
impl<P> fmt::Debug for InheritError<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, parent) = match self {
            Self::DuplicateFrom { parent } => ("DuplicateFrom", parent),
            Self::DuplicateTo { parent } => ("DuplicateTo", parent),
        };
        f.debug_struct(kind).field("parent", parent).finish()
    }
}
