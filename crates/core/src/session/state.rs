//! Session lifecycle phases

use std::fmt;

/// Where a session is in its authentication lifecycle.
///
/// ```text
/// Uninitialized -> Discovering -> NotRequired
///                              -> NeedsAuth -> Authenticated <-> Refreshing
/// any -> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Discovering,
    /// The server answered discovery with 404; requests go out unauthenticated.
    NotRequired,
    NeedsAuth,
    Authenticated,
    Refreshing,
    Closed,
}

impl SessionPhase {
    /// Phases in which requests may be sent.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::NotRequired | Self::NeedsAuth | Self::Authenticated)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Discovering => "discovering",
            Self::NotRequired => "not_required",
            Self::NeedsAuth => "needs_auth",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Mutable token bookkeeping guarded by the session lock.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) phase: SessionPhase,
    pub(crate) auth_required: bool,
    pub(crate) bearer_token: Option<String>,
    /// Zero until the first token is installed.
    pub(crate) token_expiry_epoch_seconds: i64,
    pub(crate) refresh_token: Option<String>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            auth_required: false,
            bearer_token: None,
            token_expiry_epoch_seconds: 0,
            refresh_token: None,
        }
    }

    /// A token is reused until its expiry is strictly in the past.
    pub(crate) fn token_expired(&self, now: i64) -> bool {
        self.bearer_token.is_none() || self.token_expiry_epoch_seconds < now
    }
}
