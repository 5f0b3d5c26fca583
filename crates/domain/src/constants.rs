//! Domain constants
//!
//! Centralized location for protocol paths, defaults and token bookkeeping
//! values shared by the session and batch layers.

// REST API
pub const API_VERSION_PATH: &str = "/v1";
pub const OPENID_CONFIGURATION_PATH: &str = "/.well-known/openid-configuration";
pub const READY_PATH: &str = "/.well-known/ready";
pub const LIVE_PATH: &str = "/.well-known/live";
pub const META_PATH: &str = "/meta";
pub const JSON_CONTENT_TYPE: &str = "application/json";

// Timeouts
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

// Token bookkeeping
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 2;
pub const DEFAULT_BEARER_LIFETIME_SECS: u64 = 60;
pub const MICROSOFT_LOGIN_PREFIX: &str = "https://login.microsoftonline.com";
pub const MICROSOFT_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_PASSWORD_SCOPE: &str = "offline_access";

// Batching
pub const DEFAULT_TARGET_LATENCY_SECS: f64 = 10.0;
pub const DEFAULT_ROLLING_WINDOW_SIZE: usize = 5;
pub const BEACON_PREFIX: &str = "weaviate://localhost";
