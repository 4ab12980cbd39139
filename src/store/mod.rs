//! Reactive value containers.
//!
//! A [`Store`] owns a value, a setter chain, and a listener list, and can be
//! composed with other stores: `from` derives this store's state from a
//! parent, `to` pushes local writes back up into one.

mod store;

pub use store::{Detect, FromBinding, Store, Subscription, ToBinding};

pub(crate) use store::{Listener, SetterLink, StoreInner};
