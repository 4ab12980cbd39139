//! # Tributary
//!
//! Composable reactive state containers for Rust.
//!
//! ## Stores
//!
//! A [`Store<S>`] is a mutable value cell with subscribable change
//! notification:
//! - `Store<S>` - owns a value and notifies listeners on every commit
//! - [`Setter<S>`] - cloneable write handle, with synchronous, updater, and
//!   async forms
//! - [`Detector`] - memoized gate that drops notifications whose derived
//!   dependency keys are unchanged
//!
//! ## Inheritance
//!
//! Stores compose into a graph:
//! - `store.from(&parent)?.map(f)` - derive this store's state from a parent
//!   whenever the parent changes
//! - `store.to(&parent)?.map(f)` - push mapped local writes up into a parent
//! - Repeated links to the same parent are rejected with [`InheritError`];
//!   a write that travels up a `to` link will not loop back down its
//!   matching `from` link
//!
//! ```
//! use tributary::Store;
//!
//! let parent = Store::new(0);
//! let child = Store::new(0)
//!     .from(&parent).unwrap().map(|p, c| p + c)
//!     .to(&parent).unwrap().map(|c, _p| *c);
//!
//! parent.setter().set(5);
//! assert_eq!(child.get(), 5);
//!
//! child.setter().set(9);
//! assert_eq!(parent.get(), 9);
//! ```

pub mod detector;
pub mod error;
pub mod setter;
pub mod store;

// Re-export main types for convenience
pub use detector::Detector;
pub use error::InheritError;
pub use setter::{Mutation, Setter};
pub use store::{Store, Subscription};
