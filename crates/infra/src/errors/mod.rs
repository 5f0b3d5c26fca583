//! Error conversions for infrastructure libraries

pub mod conversions;

pub use conversions::IntoTransportError;
