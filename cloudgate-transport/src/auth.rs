//! Authenticating connection: lazy token bootstrap and endpoint discovery.
//!
//! The first request on an [`AuthConnection`] exchanges the account credentials
//! at the auth host for a session token and a service endpoint URL. Both are
//! cached until the session is invalidated (explicitly, or by a `401`).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderName, HeaderValue};
use tokio::sync::Mutex;
use url::Url;

use crate::config::ConnectionConfig;
use crate::connection::{Connection, Requester};
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use crate::utils::log_sanitizer::redact;

/// Header carrying the account user on the bootstrap request.
pub const AUTH_USER_HEADER: &str = "x-auth-user";
/// Header carrying the account key on the bootstrap request.
pub const AUTH_KEY_HEADER: &str = "x-auth-key";
/// Header carrying the session token on every authenticated request.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Long-lived account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: Option<String>,
}

impl Credentials {
    /// Key plus secret (user name and API key for Rackspace).
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: Some(secret.into()),
        }
    }

    /// Key-only credentials.
    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: None,
        }
    }

    /// Account key / user name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Account secret, if any.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &self.secret.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Rewrites the discovered service URL (e.g. to a sibling API host).
pub type EndpointRewrite = Arc<dyn Fn(&Url) -> Result<Url> + Send + Sync>;

/// Where and how to bootstrap a session.
#[derive(Clone)]
pub struct AuthScheme {
    /// Auth endpoint root, e.g. `https://auth.api.rackspacecloud.com`.
    pub auth_url: Url,
    /// API version path requested on the auth host (`GET /<version>`).
    pub version: String,
    /// Status the auth host answers with on success.
    pub success_status: StatusCode,
    /// Response header holding the service endpoint URL.
    pub service_url_header: String,
    /// Response header holding an auxiliary management URL, required when set.
    pub management_url_header: Option<String>,
    /// Response header holding the session token.
    pub token_header: String,
    /// Query parameters appended to every request unless already present.
    pub default_params: Vec<(String, String)>,
    /// Applied to the service URL before it is used.
    pub endpoint_rewrite: Option<EndpointRewrite>,
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthScheme")
            .field("auth_url", &self.auth_url.as_str())
            .field("version", &self.version)
            .field("service_url_header", &self.service_url_header)
            .field("management_url_header", &self.management_url_header)
            .field("rewrites_endpoint", &self.endpoint_rewrite.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthScheme {
    /// v1.0 header auth: `204 No Content`, token in `x-auth-token`.
    pub fn v1(auth_url: Url, service_url_header: impl Into<String>) -> Self {
        Self {
            auth_url,
            version: "v1.0".to_string(),
            success_status: StatusCode::NO_CONTENT,
            service_url_header: service_url_header.into(),
            management_url_header: None,
            token_header: AUTH_TOKEN_HEADER.to_string(),
            default_params: Vec::new(),
            endpoint_rewrite: None,
        }
    }

    /// Also require this management URL header.
    #[must_use]
    pub fn management_url_header(mut self, header: impl Into<String>) -> Self {
        self.management_url_header = Some(header.into());
        self
    }

    /// Add a default query parameter.
    #[must_use]
    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_params.push((key.into(), value.into()));
        self
    }

    /// Rewrite the discovered service URL.
    #[must_use]
    pub fn endpoint_rewrite(mut self, rewrite: EndpointRewrite) -> Self {
        self.endpoint_rewrite = Some(rewrite);
        self
    }
}

/// Bootstrap state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No session; the next request bootstraps.
    Unauthenticated,
    /// A bootstrap request is in flight.
    Authenticating,
    /// A session is cached.
    Authenticated,
}

impl AuthPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Authenticating,
            2 => Self::Authenticated,
            _ => Self::Unauthenticated,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Unauthenticated => 0,
            Self::Authenticating => 1,
            Self::Authenticated => 2,
        }
    }
}

/// What the bootstrap discovered.
pub struct Session {
    /// Service endpoint, after any rewrite.
    pub service_url: Url,
    /// Auxiliary management URL (CDN for Cloud Files).
    pub management_url: Option<Url>,
    token: String,
    request_path: String,
    connection: Connection,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("service_url", &self.service_url.as_str())
            .field("management_url", &self.management_url.as_ref().map(Url::as_str))
            .field("token", &redact(&self.token))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Path prefix applied to every request.
    pub fn request_path(&self) -> &str {
        &self.request_path
    }
}

/// Connection that authenticates on first use.
///
/// Concurrent first callers share one bootstrap: the session slot is guarded
/// by an async mutex held across the bootstrap request.
pub struct AuthConnection {
    credentials: Credentials,
    scheme: AuthScheme,
    secure: bool,
    config: ConnectionConfig,
    phase: AtomicU8,
    session: Mutex<Option<Arc<Session>>>,
}

impl fmt::Debug for AuthConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConnection")
            .field("credentials", &self.credentials)
            .field("scheme", &self.scheme)
            .field("secure", &self.secure)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl AuthConnection {
    /// `secure` is the security mode the discovered endpoint must use.
    pub fn new(
        credentials: Credentials,
        scheme: AuthScheme,
        secure: bool,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            credentials,
            scheme,
            secure,
            config,
            phase: AtomicU8::new(AuthPhase::Unauthenticated.as_u8()),
            session: Mutex::new(None),
        }
    }

    /// Current bootstrap state.
    pub fn phase(&self) -> AuthPhase {
        AuthPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: AuthPhase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    /// Cached session, bootstrapping first if needed.
    pub async fn session(&self) -> Result<Arc<Session>> {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        self.set_phase(AuthPhase::Authenticating);
        match self.bootstrap().await {
            Ok(session) => {
                let session = Arc::new(session);
                *slot = Some(Arc::clone(&session));
                self.set_phase(AuthPhase::Authenticated);
                Ok(session)
            }
            Err(e) => {
                self.set_phase(AuthPhase::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Drop the cached session; the next request bootstraps again.
    pub async fn invalidate(&self) {
        let mut slot = self.session.lock().await;
        if slot.take().is_some() {
            info!("[auth] Session for {} invalidated", self.credentials.key);
        }
        self.set_phase(AuthPhase::Unauthenticated);
    }

    async fn invalidate_if_current(&self, used: &Arc<Session>) {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, used)) {
            *slot = None;
            self.set_phase(AuthPhase::Unauthenticated);
            warn!("[auth] 401 from service endpoint, session dropped");
        }
    }

    async fn bootstrap(&self) -> Result<Session> {
        let secret = self.credentials.secret().ok_or_else(|| {
            Error::InvalidCredentials("Credentials have no secret key".to_string())
        })?;
        let user = HeaderValue::from_str(&self.credentials.key)
            .map_err(|e| Error::InvalidCredentials(format!("Invalid user name: {e}")))?;
        let mut key = HeaderValue::from_str(secret)
            .map_err(|e| Error::InvalidCredentials(format!("Invalid API key: {e}")))?;
        key.set_sensitive(true);

        let auth = Connection::from_url(&self.scheme.auth_url, self.config.clone())?;
        debug!(
            "[auth] Bootstrapping session for {} at {}",
            self.credentials.key,
            auth.base_url()
        );

        let request = Request::get(format!("/{}", self.scheme.version.trim_start_matches('/')))
            .header(HeaderName::from_static(AUTH_USER_HEADER), user)
            .header(HeaderName::from_static(AUTH_KEY_HEADER), key);
        let response = auth.request(request).await?;

        if response.status() != self.scheme.success_status {
            warn!(
                "[auth] Bootstrap returned HTTP {} (expected {})",
                response.status(),
                self.scheme.success_status
            );
            return Err(Error::InvalidCredentials(format!(
                "Auth endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let service_url = parse_url_header(&response, &self.scheme.service_url_header)?;
        let management_url = self
            .scheme
            .management_url_header
            .as_deref()
            .map(|header| parse_url_header(&response, header))
            .transpose()?;
        let token = required_header(&response, &self.scheme.token_header)?.to_string();

        let service_url = match &self.scheme.endpoint_rewrite {
            Some(rewrite) => rewrite(&service_url)?,
            None => service_url,
        };

        let endpoint_secure = service_url.scheme() == "https";
        if endpoint_secure != self.secure {
            return Err(Error::Configuration(format!(
                "Connection requested {} but the discovered endpoint is {}",
                if self.secure { "https" } else { "http" },
                service_url
            )));
        }

        let mut token_value = HeaderValue::from_str(&token)
            .map_err(|e| Error::MalformedResponse(format!("Unusable auth token: {e}")))?;
        token_value.set_sensitive(true);

        let connection = Connection::from_url(&service_url, self.config.clone())?
            .with_default_header(HeaderName::from_static(AUTH_TOKEN_HEADER), token_value)
            .with_default_header(ACCEPT, HeaderValue::from_static("application/json"));

        let session = Session {
            request_path: service_url.path().trim_end_matches('/').to_string(),
            service_url,
            management_url,
            token,
            connection,
        };
        info!(
            "[auth] Authenticated {}, endpoint {}",
            self.credentials.key, session.service_url
        );
        Ok(session)
    }
}

fn required_header<'a>(response: &'a Response, name: &str) -> Result<&'a str> {
    response
        .header(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            warn!("[auth] Bootstrap response lacks {name}");
            Error::InvalidCredentials(format!("Auth response is missing the {name} header"))
        })
}

fn parse_url_header(response: &Response, name: &str) -> Result<Url> {
    let value = required_header(response, name)?;
    Url::parse(value).map_err(|e| Error::MalformedResponse(format!("{name} is not a URL ({e})")))
}

#[async_trait]
impl Requester for AuthConnection {
    async fn request(&self, mut request: Request) -> Result<Response> {
        let session = self.session().await?;

        request.path = format!("{}{}", session.request_path, request.path);
        for (key, value) in &self.scheme.default_params {
            if !request.has_param(key) {
                request.params.push((key.clone(), value.clone()));
            }
        }

        let response = session.connection.request(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.invalidate_if_current(&session).await;
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = Credentials::new("account", "super-secret-key");
        let text = format!("{creds:?}");
        assert!(text.contains("account"));
        assert!(!text.contains("super-secret-key"));
    }

    #[test]
    fn v1_scheme_defaults() {
        let scheme = AuthScheme::v1(
            Url::parse("https://auth.api.rackspacecloud.com").unwrap(),
            "x-storage-url",
        )
        .management_url_header("x-cdn-management-url")
        .default_param("format", "json");
        assert_eq!(scheme.version, "v1.0");
        assert_eq!(scheme.success_status, StatusCode::NO_CONTENT);
        assert_eq!(scheme.token_header, "x-auth-token");
        assert_eq!(scheme.default_params.len(), 1);
    }

    #[test]
    fn phase_round_trips_through_atomic() {
        for phase in [
            AuthPhase::Unauthenticated,
            AuthPhase::Authenticating,
            AuthPhase::Authenticated,
        ] {
            assert_eq!(AuthPhase::from_u8(phase.as_u8()), phase);
        }
    }

    #[tokio::test]
    async fn missing_secret_is_invalid_credentials() {
        let conn = AuthConnection::new(
            Credentials::key_only("account"),
            AuthScheme::v1(Url::parse("http://127.0.0.1:9").unwrap(), "x-storage-url"),
            false,
            ConnectionConfig::default(),
        );
        let result = conn.request(Request::get("")).await;
        assert!(matches!(result, Err(Error::InvalidCredentials(_))));
        assert_eq!(conn.phase(), AuthPhase::Unauthenticated);
    }
}
