//! Session manager
//!
//! Owns the base URL, the per-call timeout and the bearer-token state. Every
//! outbound call asks the manager for headers, which lazily refreshes the
//! token when it has expired. Concurrent callers serialize on the token
//! state, so at most one token round-trip is in flight per session.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;
use weavelink_common::time::{Clock, SystemClock};
use weavelink_domain::constants::{
    API_VERSION_PATH, DEFAULT_BEARER_LIFETIME_SECS, JSON_CONTENT_TYPE, OPENID_CONFIGURATION_PATH,
    TOKEN_EXPIRY_SKEW_SECS,
};
use weavelink_domain::{Credential, GrantType, ProxyConfig, Result, TimeoutConfig, WeaveError};

use super::discovery::{IssuerConfiguration, OpenIdConfiguration, TokenResponse};
use super::state::{SessionPhase, SessionState};
use crate::ports::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError};

const WEAVIATE_UNREACHABLE: &str = "Cannot connect to weaviate.";
const AUTH_SERVICE_UNREACHABLE: &str =
    "Can't connect to the third party authentication service. Check that it is running.";

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder {
    base_url: String,
    transport: Arc<dyn Transport>,
    credential: Option<Credential>,
    clock: Option<Arc<dyn Clock>>,
    timeout: TimeoutConfig,
    proxy: ProxyConfig,
    additional_headers: Vec<(String, String)>,
}

impl SessionManagerBuilder {
    #[must_use]
    pub fn credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Overrides the wall clock used for token expiry.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    /// Proxy the transport was built with. Kept for reporting only.
    #[must_use]
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn additional_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.additional_headers =
            headers.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        self
    }

    /// Builds the manager in the `Uninitialized` phase.
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidInput`] when the base URL is not an
    /// absolute http(s) URL.
    pub fn build(self) -> Result<SessionManager> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            WeaveError::InvalidInput(format!("Invalid url '{}': {e}", self.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(WeaveError::InvalidInput(format!(
                "Url must use http or https, given: {}",
                self.base_url
            )));
        }

        Ok(SessionManager {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            transport: self.transport,
            credential: self.credential,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            timeout: RwLock::new(self.timeout),
            proxy: self.proxy,
            additional_headers: self.additional_headers,
            state: Mutex::new(SessionState::new()),
        })
    }
}

/// Authenticated request session against one server.
pub struct SessionManager {
    base_url: String,
    transport: Arc<dyn Transport>,
    credential: Option<Credential>,
    clock: Arc<dyn Clock>,
    timeout: RwLock<TimeoutConfig>,
    proxy: ProxyConfig,
    additional_headers: Vec<(String, String)>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn builder(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> SessionManagerBuilder {
        SessionManagerBuilder {
            base_url: base_url.into(),
            transport,
            credential: None,
            clock: None,
            timeout: TimeoutConfig::default(),
            proxy: ProxyConfig::none(),
            additional_headers: Vec::new(),
        }
    }

    /// Runs OpenID discovery and, when the server requires it, fetches the
    /// first token.
    ///
    /// A failed initialization leaves the session `Uninitialized` so it can
    /// be retried.
    ///
    /// # Errors
    /// - [`WeaveError::MissingCredentials`] when the server requires
    ///   authentication and no credential was given
    /// - [`WeaveError::UnexpectedStatus`] for discovery statuses other than
    ///   200 and 404
    /// - any error of the first token fetch
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        ensure_open(&state)?;
        state.phase = SessionPhase::Discovering;

        let outcome = self.discover(&mut state).await;
        if outcome.is_err() {
            state.phase = SessionPhase::Uninitialized;
            state.auth_required = false;
        }
        outcome
    }

    async fn discover(&self, state: &mut SessionState) -> Result<()> {
        if self.fetch_open_id_configuration().await?.is_none() {
            if self.credential.is_some() {
                warn!(
                    "The client was configured to use authentication, but the server is \
                     configured without authentication. Are you sure this is correct?"
                );
            }
            state.phase = SessionPhase::NotRequired;
            state.auth_required = false;
            info!("server does not require authentication");
            return Ok(());
        }

        let Some(credential) = &self.credential else {
            return Err(WeaveError::MissingCredentials(format!(
                "No login credentials provided. The weaviate instance at {} requires login \
                 credentials.",
                self.base_url
            )));
        };

        state.auth_required = true;
        state.phase = SessionPhase::NeedsAuth;
        info!(credential = credential.kind(), "server requires authentication");

        if let Credential::BearerToken { access_token, expires_in, .. } = credential {
            let lifetime = expires_in.unwrap_or(DEFAULT_BEARER_LIFETIME_SECS);
            let lifetime = i64::try_from(lifetime).unwrap_or(i64::MAX);
            let expiry = self.install_token(state, access_token.clone(), lifetime);
            debug!(token_expiry = expiry, "installed caller-supplied bearer token");
            return Ok(());
        }

        self.refresh_locked(state).await
    }

    /// Fetches a new token if the current one has expired.
    ///
    /// Issues no HTTP call while the token is valid or when the server does
    /// not require authentication.
    ///
    /// # Errors
    /// Returns [`WeaveError::Authentication`] when the issuer rejects the
    /// request, does not support the credential's grant or cannot be reached.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        ensure_ready(&state)?;
        self.refresh_locked(&mut state).await
    }

    async fn refresh_locked(&self, state: &mut SessionState) -> Result<()> {
        if !state.auth_required {
            return Ok(());
        }
        let now = self.clock.epoch_seconds();
        if !state.token_expired(now) {
            return Ok(());
        }

        state.phase = SessionPhase::Refreshing;
        match self.fetch_token(state).await {
            Ok(expiry) => {
                state.phase = SessionPhase::Authenticated;
                info!(token_expiry = expiry, "bearer token refreshed");
                Ok(())
            }
            Err(err) => {
                state.phase = SessionPhase::NeedsAuth;
                Err(err)
            }
        }
    }

    #[instrument(skip(self, state), fields(base_url = %self.base_url))]
    async fn fetch_token(&self, state: &mut SessionState) -> Result<i64> {
        let credential = self.credential.as_ref().ok_or_else(|| {
            WeaveError::MissingCredentials("No login credentials provided.".to_string())
        })?;

        let open_id = self.fetch_open_id_configuration().await?.ok_or_else(|| {
            WeaveError::Authentication(
                "The server no longer publishes an OpenID configuration.".to_string(),
            )
        })?;

        let issuer = self.fetch_issuer_configuration(&open_id.href).await?;

        let request = credential
            .token_request(&open_id.client_id, &issuer.token_endpoint, state.refresh_token.as_deref())
            .ok_or_else(|| {
                WeaveError::Authentication(
                    "The bearer token expired and no refresh token is available to renew it."
                        .to_string(),
                )
            })?;
        let grant_type = request.grant_type;

        if !issuer.supports(grant_type.as_str()) {
            return Err(WeaveError::Authentication(format!(
                "The grant_types supported by the third-party authentication service are \
                 insufficient. Please add the '{grant_type}' grant type. Supported: {:?}",
                issuer.grant_types_supported
            )));
        }

        debug!(grant_type = %grant_type, token_endpoint = %issuer.token_endpoint, "requesting token");
        let http_request = HttpRequest::new(Method::Post, issuer.token_endpoint.clone(), self.timeout())
            .body(RequestBody::Form(request.form));
        let response = self.transport.execute(http_request).await.map_err(auth_service_error);

        let token = match response.and_then(parse_token_response) {
            Ok(token) => token,
            Err(err) => {
                if grant_type == GrantType::RefreshToken && state.refresh_token.take().is_some() {
                    debug!("dropped rejected refresh token");
                }
                return Err(err);
            }
        };

        if let Some(refresh_token) = token.refresh_token {
            state.refresh_token = Some(refresh_token);
        }
        Ok(self.install_token(state, token.access_token, token.expires_in))
    }

    fn install_token(&self, state: &mut SessionState, token: String, expires_in: i64) -> i64 {
        let expiry = self
            .clock
            .epoch_seconds()
            .saturating_add(expires_in)
            .saturating_sub(TOKEN_EXPIRY_SKEW_SECS);
        state.bearer_token = Some(token);
        state.token_expiry_epoch_seconds = expiry;
        state.phase = SessionPhase::Authenticated;
        expiry
    }

    async fn fetch_issuer_configuration(&self, href: &str) -> Result<IssuerConfiguration> {
        let request = HttpRequest::new(Method::Get, href, self.timeout())
            .headers(vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())]);
        let response = self.transport.execute(request).await.map_err(auth_service_error)?;
        if response.status != 200 {
            return Err(WeaveError::Authentication(format!(
                "Failed to get the OpenID configuration from {href}. Status: {}, body: {}",
                response.status, response.body
            )));
        }
        response.json().map_err(|e| {
            WeaveError::Authentication(format!("Malformed OpenID configuration from {href}: {e}"))
        })
    }

    async fn fetch_open_id_configuration(&self) -> Result<Option<OpenIdConfiguration>> {
        let request = HttpRequest::new(Method::Get, self.url(OPENID_CONFIGURATION_PATH), self.timeout())
            .headers(self.base_headers());
        let response = self.transport.execute(request).await.map_err(server_error)?;
        match response.status {
            200 => Ok(Some(response.json()?)),
            404 => Ok(None),
            status => Err(WeaveError::UnexpectedStatus { status, body: response.body }),
        }
    }

    /// The server's OpenID discovery document, `None` when authentication is
    /// disabled.
    ///
    /// # Errors
    /// Returns [`WeaveError::UnexpectedStatus`] for statuses other than 200
    /// and 404.
    pub async fn open_id_configuration(&self) -> Result<Option<OpenIdConfiguration>> {
        ensure_open(&*self.state.lock().await)?;
        self.fetch_open_id_configuration().await
    }

    /// Header set for the next outbound call, refreshing the token first
    /// when needed.
    ///
    /// # Errors
    /// Returns [`WeaveError::Config`] before `initialize` or after `close`,
    /// or any error of the token refresh.
    pub async fn headers(&self) -> Result<Vec<(String, String)>> {
        let mut state = self.state.lock().await;
        ensure_ready(&state)?;

        let mut headers = self.base_headers();
        if state.auth_required {
            self.refresh_locked(&mut state).await?;
            if let Some(token) = &state.bearer_token {
                headers.push(("authorization".to_string(), format!("Bearer {token}")));
            }
        }
        Ok(headers)
    }

    fn base_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(self.additional_headers.len() + 2);
        headers.push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
        headers.extend(self.additional_headers.iter().cloned());
        headers
    }

    /// `<base>/v1<path>`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{API_VERSION_PATH}{path}", self.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<HttpResponse> {
        self.send(Method::Get, path, params, RequestBody::Empty).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<HttpResponse> {
        self.send(Method::Post, path, &[], RequestBody::Json(body.clone())).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<HttpResponse> {
        self.send(Method::Put, path, &[], RequestBody::Json(body.clone())).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<HttpResponse> {
        self.send(Method::Patch, path, &[], RequestBody::Json(body.clone())).await
    }

    pub async fn delete(&self, path: &str, body: Option<&Value>) -> Result<HttpResponse> {
        let body = body.cloned().map_or(RequestBody::Empty, RequestBody::Json);
        self.send(Method::Delete, path, &[], body).await
    }

    pub async fn head(&self, path: &str) -> Result<HttpResponse> {
        self.send(Method::Head, path, &[], RequestBody::Empty).await
    }

    /// Sends one request through the transport and returns the raw
    /// response. Never retries.
    ///
    /// # Errors
    /// - [`WeaveError::Timeout`] when the call exceeded its timeout
    /// - [`WeaveError::Connection`] for any other transport failure
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: RequestBody,
    ) -> Result<HttpResponse> {
        let headers = self.headers().await?;
        let url = self.url_with_params(path, params)?;

        let request = HttpRequest::new(method, url, self.timeout()).headers(headers).body(body);
        let response = self.transport.execute(request).await.map_err(server_error)?;
        debug!(status = response.status, "response received");
        Ok(response)
    }

    fn url_with_params(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let url = self.url(path);
        if params.is_empty() {
            return Ok(url);
        }
        let mut parsed = Url::parse(&url)
            .map_err(|e| WeaveError::InvalidInput(format!("Invalid request url '{url}': {e}")))?;
        parsed.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(parsed.into())
    }

    /// Timeout applied to subsequent calls.
    pub fn set_timeout(&self, timeout: TimeoutConfig) {
        *self.timeout.write() = timeout;
    }

    pub fn timeout(&self) -> TimeoutConfig {
        *self.timeout.read()
    }

    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn auth_required(&self) -> bool {
        self.state.lock().await.auth_required
    }

    /// Expiry of the current token in epoch seconds, 0 when none was fetched.
    pub async fn token_expiry(&self) -> i64 {
        self.state.lock().await.token_expiry_epoch_seconds
    }

    /// Releases the transport. Further calls fail with a configuration error.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.phase == SessionPhase::Closed {
            return;
        }
        state.phase = SessionPhase::Closed;
        state.bearer_token = None;
        state.refresh_token = None;
        self.transport.close().await;
        info!(base_url = %self.base_url, "session closed");
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .field("timeout", &self.timeout())
            .field("proxy", &self.proxy)
            .finish_non_exhaustive()
    }
}

fn ensure_open(state: &SessionState) -> Result<()> {
    if state.phase == SessionPhase::Closed {
        return Err(WeaveError::Config("The session is closed.".to_string()));
    }
    Ok(())
}

fn ensure_ready(state: &SessionState) -> Result<()> {
    ensure_open(state)?;
    if state.phase == SessionPhase::Uninitialized {
        return Err(WeaveError::Config(
            "The session is not initialized; call initialize() first.".to_string(),
        ));
    }
    Ok(())
}

fn parse_token_response(response: HttpResponse) -> Result<TokenResponse> {
    match response.status {
        200 => response.json().map_err(|e| {
            WeaveError::Authentication(format!("Malformed token response: {e}"))
        }),
        401 => Err(WeaveError::Authentication(format!(
            "access denied. Status: 401, body: {}",
            response.body
        ))),
        status => Err(WeaveError::Authentication(format!(
            "Failed to get a token. Status: {status}, body: {}",
            response.body
        ))),
    }
}

fn server_error(err: TransportError) -> WeaveError {
    match err {
        TransportError::Timeout(msg) => WeaveError::Timeout(msg),
        TransportError::Connect(msg) | TransportError::Other(msg) => {
            WeaveError::Connection(format!("{WEAVIATE_UNREACHABLE} {msg}"))
        }
    }
}

fn auth_service_error(err: TransportError) -> WeaveError {
    WeaveError::Authentication(format!("{AUTH_SERVICE_UNREACHABLE} {err}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weavelink_common::time::MockClock;

    use super::*;
    use crate::test_support::ScriptedTransport;

    const BASE: &str = "http://localhost:8080";
    const T0: i64 = 1_700_000_000;

    fn auth_transport(expires_in: i64) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport::new(move |request| {
            let response = if request.url.ends_with("/v1/.well-known/openid-configuration") {
                HttpResponse::new(200, json!({"clientId": "wcs", "href": "http://issuer/.well-known"}).to_string())
            } else if request.url == "http://issuer/.well-known" {
                HttpResponse::new(
                    200,
                    json!({
                        "grant_types_supported": ["client_credentials", "password", "refresh_token"],
                        "token_endpoint": "http://issuer/token"
                    })
                    .to_string(),
                )
            } else if request.url == "http://issuer/token" {
                HttpResponse::new(
                    200,
                    json!({"access_token": "tok", "expires_in": expires_in, "refresh_token": "rt"})
                        .to_string(),
                )
            } else {
                HttpResponse::new(200, "{}")
            };
            Ok(response)
        }))
    }

    fn session(transport: Arc<ScriptedTransport>, credential: Option<Credential>, clock: &MockClock) -> SessionManager {
        SessionManager::builder(BASE, transport)
            .credential(credential)
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn discovery_404_means_no_auth() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(404, ""))));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport.clone(), Some(Credential::client_credentials("s")), &clock);

        manager.initialize().await.unwrap();

        assert_eq!(manager.phase().await, SessionPhase::NotRequired);
        let headers = manager.headers().await.unwrap();
        assert_eq!(headers, vec![("content-type".to_string(), "application/json".to_string())]);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn discovery_200_without_credentials_fails() {
        let transport = auth_transport(20);
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport, None, &clock);

        let err = manager.initialize().await.unwrap_err();

        assert!(matches!(err, WeaveError::MissingCredentials(_)));
        assert_eq!(manager.phase().await, SessionPhase::Uninitialized);
    }

    #[tokio::test]
    async fn unexpected_discovery_status_is_reported() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(503, "down"))));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport, None, &clock);

        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(err, WeaveError::UnexpectedStatus { status: 503, .. }));
    }

    /// Validates token bookkeeping across the expiry boundary.
    ///
    /// Assertions:
    /// - Confirms expiry is `now + expires_in - 2`.
    /// - Confirms a call at the expiry second reuses the token.
    /// - Confirms a call after expiry performs exactly one more round-trip.
    #[tokio::test]
    async fn token_is_reused_until_expired() {
        let transport = auth_transport(20);
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport.clone(), Some(Credential::client_password("u", "p")), &clock);

        manager.initialize().await.unwrap();
        assert_eq!(manager.token_expiry().await, T0 + 18);
        assert_eq!(transport.request_count(), 4);

        clock.advance(std::time::Duration::from_secs(18));
        let headers = manager.headers().await.unwrap();
        assert!(headers.contains(&("authorization".to_string(), "Bearer tok".to_string())));
        assert_eq!(transport.request_count(), 4);

        clock.advance(std::time::Duration::from_secs(2));
        manager.refresh().await.unwrap();
        assert_eq!(transport.request_count(), 7);
        assert_eq!(manager.token_expiry().await, T0 + 20 + 18);

        let token_body = transport.requests().last().map(|r| r.body.clone()).unwrap();
        let RequestBody::Form(fields) = token_body else { panic!("expected form body") };
        assert!(fields.contains(&("grant_type".to_string(), "password".to_string())));
        assert!(!fields.iter().any(|(key, _)| key == "refresh_token"));
    }

    /// Validates that a refresh token in the token response does not switch
    /// a client-credentials session to a grant the issuer never advertised.
    ///
    /// Assertions:
    /// - Confirms the expired token is renewed with `client_credentials`.
    /// - Confirms the new token is used in the headers.
    #[tokio::test]
    async fn client_credentials_renew_with_own_grant() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            let response = if request.url.ends_with("/v1/.well-known/openid-configuration") {
                HttpResponse::new(200, json!({"clientId": "wcs", "href": "http://issuer/.well-known"}).to_string())
            } else if request.url == "http://issuer/.well-known" {
                HttpResponse::new(
                    200,
                    json!({
                        "grant_types_supported": ["client_credentials"],
                        "token_endpoint": "http://issuer/token"
                    })
                    .to_string(),
                )
            } else {
                HttpResponse::new(
                    200,
                    json!({"access_token": "tok", "expires_in": 20, "refresh_token": "rt"}).to_string(),
                )
            };
            Ok(response)
        }));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport.clone(), Some(Credential::client_credentials("s")), &clock);
        manager.initialize().await.unwrap();

        clock.advance(std::time::Duration::from_secs(30));
        let headers = manager.headers().await.unwrap();

        assert!(headers.contains(&("authorization".to_string(), "Bearer tok".to_string())));
        assert_eq!(manager.token_expiry().await, T0 + 30 + 18);
        let token_body = transport.requests().last().map(|r| r.body.clone()).unwrap();
        let RequestBody::Form(fields) = token_body else { panic!("expected form body") };
        assert!(fields.contains(&("grant_type".to_string(), "client_credentials".to_string())));
        assert!(!fields.iter().any(|(key, _)| key == "refresh_token"));
    }

    #[tokio::test]
    async fn unsupported_grant_is_an_authentication_error() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            Ok(if request.url.starts_with(BASE) {
                HttpResponse::new(200, r#"{"clientId": "c", "href": "http://issuer/cfg"}"#)
            } else {
                HttpResponse::new(
                    200,
                    r#"{"grant_types_supported": ["authorization_code"], "token_endpoint": "http://issuer/token"}"#,
                )
            })
        }));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport, Some(Credential::client_credentials("s")), &clock);

        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(&err, WeaveError::Authentication(msg) if msg.contains("client_credentials")));
    }

    #[tokio::test]
    async fn bearer_token_is_installed_without_token_call() {
        let transport = auth_transport(20);
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(
            transport.clone(),
            Some(Credential::bearer_token("given").with_expires_in(100)),
            &clock,
        );

        manager.initialize().await.unwrap();

        assert_eq!(manager.token_expiry().await, T0 + 98);
        assert_eq!(transport.request_count(), 1);
        let headers = manager.headers().await.unwrap();
        assert!(headers.contains(&("authorization".to_string(), "Bearer given".to_string())));

        clock.advance(std::time::Duration::from_secs(99));
        let err = manager.headers().await.unwrap_err();
        assert!(matches!(err, WeaveError::Authentication(_)));
    }

    #[tokio::test]
    async fn transport_failures_are_wrapped() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Err(TransportError::Connect("refused".to_string()))
        }));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport, None, &clock);

        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(&err, WeaveError::Connection(msg) if msg.starts_with("Cannot connect to weaviate.")));
    }

    #[tokio::test]
    async fn headers_before_initialize_and_after_close_are_rejected() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(404, ""))));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = session(transport.clone(), None, &clock);

        assert!(matches!(manager.headers().await, Err(WeaveError::Config(_))));

        manager.initialize().await.unwrap();
        manager.close().await;
        manager.close().await;

        assert_eq!(manager.phase().await, SessionPhase::Closed);
        assert!(matches!(manager.get("/meta", &[]).await, Err(WeaveError::Config(_))));
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn requests_carry_params_headers_and_timeout() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            Ok(if request.url.contains("openid") {
                HttpResponse::new(404, "")
            } else {
                HttpResponse::new(200, "[]")
            })
        }));
        let clock = MockClock::at_epoch_seconds(T0);
        let manager = SessionManager::builder(format!("{BASE}/"), transport.clone())
            .clock(Arc::new(clock))
            .additional_headers([("X-OpenAI-Api-Key", "k")])
            .build()
            .unwrap();
        manager.initialize().await.unwrap();
        manager.set_timeout(TimeoutConfig::from_secs(5));

        manager.get("/objects", &[("limit", "2".to_string())]).await.unwrap();

        let sent = transport.requests().pop().unwrap();
        assert_eq!(sent.method, Method::Get);
        assert_eq!(sent.url, "http://localhost:8080/v1/objects?limit=2");
        assert!(sent.headers.contains(&("X-OpenAI-Api-Key".to_string(), "k".to_string())));
        assert_eq!(sent.timeout, TimeoutConfig::from_secs(5));
    }

    #[test]
    fn builder_rejects_non_http_urls() {
        let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(404, ""))));
        assert!(SessionManager::builder("ftp://host", transport.clone()).build().is_err());
        assert!(SessionManager::builder("not a url", transport).build().is_err());
    }
}
