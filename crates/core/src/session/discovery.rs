//! OpenID discovery and token endpoint payloads

use serde::{Deserialize, Serialize};

/// Server-side discovery document (`/v1/.well-known/openid-configuration`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    #[serde(rename = "clientId")]
    pub client_id: String,
    /// Issuer's own discovery document.
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// Issuer discovery document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssuerConfiguration {
    #[serde(default)]
    pub grant_types_supported: Vec<String>,
    pub token_endpoint: String,
}

impl IssuerConfiguration {
    pub fn supports(&self, grant_type: &str) -> bool {
        self.grant_types_supported.iter().any(|supported| supported == grant_type)
    }
}

/// OAuth token response (RFC 6749).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
