//! Session and authentication lifecycle

pub mod discovery;
pub mod manager;
pub mod state;

pub use discovery::{IssuerConfiguration, OpenIdConfiguration, TokenResponse};
pub use manager::{SessionManager, SessionManagerBuilder};
pub use state::SessionPhase;
