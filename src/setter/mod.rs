//! Value mutation.
//!
//! A [`Setter`] is a cloneable write handle for a store. Writes go through
//! the store's setter chain: links prepended by `to` inheritance run first,
//! forwarding the mapped value to parent stores, and the terminal link
//! commits the value and notifies listeners.

mod setter;

pub use setter::{Mutation, Setter};
