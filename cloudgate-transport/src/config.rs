//! Connection configuration

use std::path::PathBuf;
use std::time::Duration;

use log::warn;
use url::Url;

/// Environment variable naming a PEM bundle of extra trust roots.
pub const CA_BUNDLE_ENV: &str = "CLOUDGATE_CA_CERTS_PATH";

/// Proxy variables for secure targets, in lookup order.
const HTTPS_PROXY_ENV: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];
/// Proxy variables for plain targets, in lookup order.
const HTTP_PROXY_ENV: [&str; 4] = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];
/// Hosts that bypass the environment proxy.
const NO_PROXY_ENV: [&str; 2] = ["NO_PROXY", "no_proxy"];

/// Default connect timeout (seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default request timeout (seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings shared by every [`Connection`](crate::Connection) built from it.
///
/// ```rust
/// use std::time::Duration;
/// use cloudgate_transport::ConnectionConfig;
///
/// let config = ConnectionConfig::default()
///     .request_timeout(Duration::from_secs(60))
///     .ca_bundle("/etc/ssl/private-ca.pem");
/// assert_eq!(config.request_timeout, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// TCP connect timeout, also bounds the TLS handshake.
    pub connect_timeout: Duration,
    /// Whole-request timeout. Raw (streamed) bodies are bounded by it too.
    pub request_timeout: Duration,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// PEM bundle added to the built-in web PKI roots.
    pub ca_bundle: Option<PathBuf>,
    /// Headers applied to every request unless the request overrides them.
    pub default_headers: Vec<(String, String)>,
    /// `http://` proxy for every request; secure targets are tunnelled with
    /// `CONNECT`. Unset, the `HTTPS_PROXY` / `HTTP_PROXY` / `ALL_PROXY` and
    /// `NO_PROXY` environment variables apply.
    pub proxy: Option<Url>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: format!("cloudgate/{}", env!("CARGO_PKG_VERSION")),
            ca_bundle: None,
            default_headers: Vec::new(),
            proxy: None,
        }
    }
}

impl ConnectionConfig {
    /// Set the TCP connect timeout (default: 10s).
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout (default: 30s).
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Trust the certificates in this PEM file in addition to the web PKI roots.
    #[must_use]
    pub fn ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Route requests through this proxy (credentials may be embedded in the URL).
    #[must_use]
    pub fn proxy(mut self, proxy: Url) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Proxy for `host`: the explicit setting wins over the environment.
    pub(crate) fn effective_proxy(&self, host: &str, secure: bool) -> Option<Url> {
        self.proxy
            .clone()
            .or_else(|| proxy_from_env(|name| std::env::var(name).ok(), host, secure))
    }

    /// CA bundle to load: the explicit setting wins over [`CA_BUNDLE_ENV`].
    pub(crate) fn effective_ca_bundle(&self) -> Option<PathBuf> {
        self.ca_bundle.clone().or_else(|| {
            std::env::var_os(CA_BUNDLE_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
    }
}

/// Resolve the environment proxy for `host` through `lookup`.
fn proxy_from_env(
    lookup: impl Fn(&str) -> Option<String>,
    host: &str,
    secure: bool,
) -> Option<Url> {
    if first_set(&lookup, &NO_PROXY_ENV).is_some_and(|list| bypasses_proxy(&list, host)) {
        return None;
    }
    let names = if secure { HTTPS_PROXY_ENV } else { HTTP_PROXY_ENV };
    let value = first_set(&lookup, &names)?;
    match Url::parse(value.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Ignoring unparsable proxy setting: {e}");
            None
        }
    }
}

fn first_set(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
}

/// `NO_PROXY` matching: `*`, exact hosts, and domain suffixes (`.example.com`
/// or `example.com` both cover `api.example.com`).
fn bypasses_proxy(no_proxy: &str, host: &str) -> bool {
    let host = host.trim_matches(['[', ']']).to_ascii_lowercase();
    no_proxy
        .split(',')
        .map(|entry| entry.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .any(|entry| {
            entry == "*"
                || host == entry
                || host
                    .strip_suffix(entry.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_timeouts() {
        let config = ConnectionConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("cloudgate/"));
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn explicit_bundle_wins_over_environment() {
        let config = ConnectionConfig::default().ca_bundle("/tmp/explicit.pem");
        assert_eq!(
            config.effective_ca_bundle(),
            Some(PathBuf::from("/tmp/explicit.pem"))
        );
    }

    #[test]
    fn default_headers_accumulate() {
        let config = ConnectionConfig::default()
            .default_header("X-One", "1")
            .default_header("X-Two", "2");
        assert_eq!(config.default_headers.len(), 2);
        assert_eq!(config.default_headers[1].0, "X-Two");
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let pairs = pairs.to_vec();
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn explicit_proxy_wins() {
        let proxy = Url::parse("http://proxy.internal:3128").unwrap();
        let config = ConnectionConfig::default().proxy(proxy.clone());
        assert_eq!(config.effective_proxy("auth.api.rackspacecloud.com", true), Some(proxy));
    }

    #[test]
    fn environment_proxy_follows_target_scheme() {
        let lookup = env(&[
            ("https_proxy", "http://secure-proxy:3128"),
            ("HTTP_PROXY", "http://plain-proxy:8080"),
        ]);
        let secure = proxy_from_env(&lookup, "dns.api.rackspacecloud.com", true).unwrap();
        assert_eq!(secure.host_str(), Some("secure-proxy"));
        let plain = proxy_from_env(&lookup, "dns.api.rackspacecloud.com", false).unwrap();
        assert_eq!(plain.host_str(), Some("plain-proxy"));
    }

    #[test]
    fn all_proxy_is_the_fallback() {
        let lookup = env(&[("ALL_PROXY", "http://any-proxy:3128")]);
        let proxy = proxy_from_env(&lookup, "storage101.lon3.clouddrive.com", true).unwrap();
        assert_eq!(proxy.host_str(), Some("any-proxy"));
        assert!(proxy_from_env(env(&[]), "storage101.lon3.clouddrive.com", true).is_none());
    }

    #[test]
    fn no_proxy_bypasses_matching_hosts() {
        let lookup = env(&[
            ("HTTPS_PROXY", "http://proxy:3128"),
            ("NO_PROXY", "localhost, .rackspacecloud.com"),
        ]);
        assert!(proxy_from_env(&lookup, "localhost", true).is_none());
        assert!(proxy_from_env(&lookup, "lon.auth.api.rackspacecloud.com", true).is_none());
        assert!(proxy_from_env(&lookup, "rackspacecloud.com", true).is_none());
        assert!(proxy_from_env(&lookup, "notrackspacecloud.com", true).is_some());
        assert!(bypasses_proxy("*", "anything.example"));
    }
}
