//! Specialized data structures
//!
//! - **[`rolling_window`]**: fixed-capacity sample window with a running mean

pub mod rolling_window;

pub use rolling_window::RollingWindow;
