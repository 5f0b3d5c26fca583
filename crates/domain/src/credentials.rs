//! OAuth2-style credentials accepted by the session manager
//!
//! A [`Credential`] is produced once by the caller and turned into a
//! token-endpoint request by [`Credential::token_request`]. Secrets are
//! redacted from `Debug` output.

use std::fmt;

use serde::Deserialize;

use crate::constants::{DEFAULT_PASSWORD_SCOPE, MICROSOFT_DEFAULT_SCOPE, MICROSOFT_LOGIN_PREFIX};

/// OAuth2 grant used against the issuer's token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    ClientCredentials,
    Password,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form-encoded token request for one grant.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    pub form: Vec<(String, String)>,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.form.iter().map(|(key, _)| key.as_str()).collect();
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("fields", &keys)
            .finish()
    }
}

/// Credential used to authenticate against an OIDC-protected server.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credential {
    /// Client-credentials grant with a client secret.
    ClientCredentials {
        client_secret: String,
        #[serde(default)]
        scope: Option<String>,
    },
    /// Resource-owner password grant.
    ClientPassword {
        username: String,
        password: String,
        #[serde(default)]
        scope: Option<String>,
    },
    /// Pre-obtained access token, optionally renewable.
    BearerToken {
        access_token: String,
        #[serde(default)]
        expires_in: Option<u64>,
        #[serde(default)]
        refresh_token: Option<String>,
    },
}

impl Credential {
    pub fn client_credentials(client_secret: impl Into<String>) -> Self {
        Self::ClientCredentials { client_secret: client_secret.into(), scope: None }
    }

    pub fn client_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::ClientPassword { username: username.into(), password: password.into(), scope: None }
    }

    pub fn bearer_token(access_token: impl Into<String>) -> Self {
        Self::BearerToken { access_token: access_token.into(), expires_in: None, refresh_token: None }
    }

    /// Sets the scope of a client-credentials or password grant.
    ///
    /// Has no effect on bearer tokens.
    #[must_use]
    pub fn with_scope(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::ClientCredentials { scope, .. } | Self::ClientPassword { scope, .. } => {
                *scope = Some(value.into());
            }
            Self::BearerToken { .. } => {}
        }
        self
    }

    /// Sets the lifetime of a bearer token.
    #[must_use]
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        if let Self::BearerToken { expires_in, .. } = &mut self {
            *expires_in = Some(seconds);
        }
        self
    }

    /// Sets the refresh token of a bearer token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        if let Self::BearerToken { refresh_token, .. } = &mut self {
            *refresh_token = Some(token.into());
        }
        self
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientCredentials { .. } => "client_credentials",
            Self::ClientPassword { .. } => "client_password",
            Self::BearerToken { .. } => "bearer_token",
        }
    }

    /// Builds the token-endpoint request for this credential.
    ///
    /// Client-credentials and password credentials always re-run their own
    /// grant. A bearer token renews through the `refresh_token` grant, using
    /// `refresh_token` (remembered from an earlier response) before its own.
    /// Returns `None` for a bearer token that has nothing to refresh with.
    pub fn token_request(
        &self,
        client_id: &str,
        token_endpoint: &str,
        refresh_token: Option<&str>,
    ) -> Option<TokenRequest> {
        match self {
            Self::ClientCredentials { client_secret, scope } => {
                let mut form = vec![
                    pair("grant_type", GrantType::ClientCredentials.as_str()),
                    pair("client_secret", client_secret),
                    pair("client_id", client_id),
                ];
                let scope = scope.as_deref().or_else(|| {
                    token_endpoint
                        .starts_with(MICROSOFT_LOGIN_PREFIX)
                        .then_some(MICROSOFT_DEFAULT_SCOPE)
                });
                if let Some(scope) = scope {
                    form.push(pair("scope", scope));
                }
                Some(TokenRequest { grant_type: GrantType::ClientCredentials, form })
            }
            Self::ClientPassword { username, password, scope } => Some(TokenRequest {
                grant_type: GrantType::Password,
                form: vec![
                    pair("grant_type", GrantType::Password.as_str()),
                    pair("username", username),
                    pair("password", password),
                    pair("client_id", client_id),
                    pair("scope", scope.as_deref().unwrap_or(DEFAULT_PASSWORD_SCOPE)),
                ],
            }),
            Self::BearerToken { refresh_token: own, .. } => {
                refresh_token.or(own.as_deref()).map(|token| TokenRequest {
                    grant_type: GrantType::RefreshToken,
                    form: vec![
                        pair("grant_type", GrantType::RefreshToken.as_str()),
                        pair("refresh_token", token),
                        pair("client_id", client_id),
                    ],
                })
            }
        }
    }
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials { scope, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_secret", &"<redacted>")
                .field("scope", scope)
                .finish(),
            Self::ClientPassword { username, scope, .. } => f
                .debug_struct("ClientPassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("scope", scope)
                .finish(),
            Self::BearerToken { expires_in, refresh_token, .. } => f
                .debug_struct("BearerToken")
                .field("access_token", &"<redacted>")
                .field("expires_in", expires_in)
                .field("refresh_token", &refresh_token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}
