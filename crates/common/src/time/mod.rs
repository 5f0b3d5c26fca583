//! Time sources
//!
//! Code that compares against token expiry takes a [`Clock`] so tests can
//! swap in a [`MockClock`].

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
