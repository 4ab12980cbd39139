//! Memoized change detection.
//!
//! A detector gates a listener behind a dependency-key comparison: the
//! listener only fires when the key sequence derived from the state differs
//! from the one seen on the previous invocation.

mod detector;

pub use detector::Detector;
