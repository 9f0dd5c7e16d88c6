//! Base connection: one endpoint, one `request()` entry point.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use log::{debug, trace, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rustls_pki_types::ServerName;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use url::Url;

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use crate::tls::{client_config, find_tls_error};
use crate::utils::log_sanitizer::truncate_bytes_for_log;

/// Upper bound on a proxy's `CONNECT` response head.
const MAX_PROXY_HEAD: usize = 8 * 1024;

/// Anything that can dispatch a [`Request`].
///
/// Implemented by [`Connection`], [`AuthConnection`](crate::AuthConnection) and
/// [`AsyncConnection`](crate::AsyncConnection), so layers compose and
/// drivers can be tested against scripted requesters.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Issue one request. Non-2xx statuses come back as `Ok(Response)`.
    async fn request(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Requester + ?Sized> Requester for Arc<T> {
    async fn request(&self, request: Request) -> Result<Response> {
        (**self).request(request).await
    }
}

/// A plain or TLS-verified connection to a single host.
///
/// The transport is established lazily (or by an explicit [`connect`](Self::connect)):
/// a TCP connect, plus for secure connections a full TLS handshake through the
/// hostname verifier. Only after that succeeds is the pooled HTTP client
/// built, with the same TLS configuration, so every later connection to the
/// host is verified the same way.
///
/// When a proxy applies (see [`ConnectionConfig::proxy`]) both the check and
/// the client go through it: secure targets are reached via a `CONNECT`
/// tunnel, and the TLS handshake runs end to end inside it.
pub struct Connection {
    host: String,
    port: u16,
    secure: bool,
    config: ConnectionConfig,
    default_headers: HeaderMap,
    client: OnceCell<reqwest::Client>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("established", &self.client.initialized())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Connection to `host:port`; nothing is opened until first use.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        secure: bool,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::Configuration("Connection host is empty".to_string()));
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Configuration(format!("Invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Configuration(format!("Invalid value for {name}: {e}")))?;
            default_headers.insert(name, value);
        }

        Ok(Self {
            host,
            port,
            secure,
            config,
            default_headers,
            client: OnceCell::new(),
        })
    }

    /// Connection to the scheme, host and port of `url` (path is ignored).
    pub fn from_url(url: &Url, config: ConnectionConfig) -> Result<Self> {
        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(Error::Configuration(format!(
                    "Unsupported URL scheme {other} in {url}"
                )));
            }
        };
        let host = url
            .host_str()
            .ok_or_else(|| Error::Configuration(format!("URL has no host: {url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::Configuration(format!("URL has no port: {url}")))?;
        Self::new(host.trim_matches(['[', ']']), port, secure, config)
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the connection uses TLS.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Whether the transport has been established.
    pub fn is_established(&self) -> bool {
        self.client.initialized()
    }

    /// `scheme://host:port` of this connection.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        if self.host.contains(':') {
            format!("{scheme}://[{}]:{}", self.host, self.port)
        } else {
            format!("{scheme}://{}:{}", self.host, self.port)
        }
    }

    /// Establish the transport once; later calls are no-ops.
    ///
    /// For secure connections the TLS handshake must pass certificate chain
    /// and hostname verification, otherwise [`Error::TlsVerification`].
    pub async fn connect(&self) -> Result<()> {
        self.client().await.map(|_| ())
    }

    async fn client(&self) -> Result<&reqwest::Client> {
        self.client.get_or_try_init(|| self.establish()).await
    }

    async fn establish(&self) -> Result<reqwest::Client> {
        trace!("[{}] Establishing transport", self.host);
        let proxy = self.config.effective_proxy(&self.host, self.secure);

        let builder = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.request_timeout)
            .user_agent(self.config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none());

        let (stream, builder) = match &proxy {
            Some(proxy) => {
                if proxy.scheme() != "http" {
                    return Err(Error::Configuration(format!(
                        "Unsupported proxy scheme {:?}, expected http",
                        proxy.scheme()
                    )));
                }
                let proxy_host = proxy
                    .host_str()
                    .unwrap_or_default()
                    .trim_matches(['[', ']'])
                    .to_string();
                if proxy_host.is_empty() {
                    return Err(Error::Configuration(format!("Proxy {proxy} has no host")));
                }
                let proxy_port = proxy.port_or_known_default().unwrap_or(80);
                debug!("[{}] Using proxy {proxy_host}:{proxy_port}", self.host);

                let stream = self.tcp_connect(&proxy_host, proxy_port).await?;
                let stream = if self.secure {
                    self.tunnel(stream, proxy).await?
                } else {
                    stream
                };
                let route = reqwest::Proxy::all(proxy.as_str())
                    .map_err(|e| Error::Configuration(format!("Invalid proxy {proxy_host}: {e}")))?;
                (stream, builder.proxy(route))
            }
            None => (
                self.tcp_connect(&self.host, self.port).await?,
                builder.no_proxy(),
            ),
        };

        let builder = if self.secure {
            let tls = Arc::new(client_config(&self.config)?);
            self.handshake(stream, Arc::clone(&tls)).await?;
            builder.use_preconfigured_tls((*tls).clone())
        } else {
            drop(stream);
            builder
        };

        debug!("[{}] Transport established ({})", self.host, self.base_url());
        builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))
    }

    async fn tcp_connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        match timeout(self.config.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => {
                warn!("[{}] TCP connection to {host}:{port} failed: {e}", self.host);
                Err(Error::Connection {
                    host: self.host.clone(),
                    detail: e.to_string(),
                })
            }
            Err(_) => Err(Error::Timeout {
                host: self.host.clone(),
                detail: format!(
                    "TCP connect timed out after {}s",
                    self.config.connect_timeout.as_secs()
                ),
            }),
        }
    }

    /// Ask the proxy for a raw tunnel to the target.
    async fn tunnel(&self, mut stream: TcpStream, proxy: &Url) -> Result<TcpStream> {
        let authority = if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        };
        let mut head = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
        if let Some(credentials) = proxy_authorization(proxy) {
            head.push_str(&format!("Proxy-Authorization: Basic {credentials}\r\n"));
        }
        head.push_str("\r\n");

        trace!("[{}] Opening CONNECT tunnel", self.host);
        let exchange = async {
            stream.write_all(head.as_bytes()).await?;
            read_response_head(&mut stream).await
        };
        let status_line = match timeout(self.config.connect_timeout, exchange).await {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                return Err(Error::Connection {
                    host: self.host.clone(),
                    detail: format!("Proxy tunnel failed: {e}"),
                });
            }
            Err(_) => {
                return Err(Error::Timeout {
                    host: self.host.clone(),
                    detail: format!(
                        "Proxy CONNECT timed out after {}s",
                        self.config.connect_timeout.as_secs()
                    ),
                });
            }
        };

        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse::<u16>().ok());
        match status {
            Some(200..=299) => {
                trace!("[{}] Tunnel open: {status_line}", self.host);
                Ok(stream)
            }
            _ => {
                warn!("[{}] Proxy refused tunnel: {status_line}", self.host);
                Err(Error::Connection {
                    host: self.host.clone(),
                    detail: format!("Proxy refused CONNECT: {status_line}"),
                })
            }
        }
    }

    async fn handshake(&self, stream: TcpStream, tls: Arc<rustls::ClientConfig>) -> Result<()> {
        let server_name = ServerName::try_from(self.host.clone()).map_err(|e| {
            Error::Configuration(format!("Invalid TLS server name {}: {e}", self.host))
        })?;

        trace!("[{}] Performing TLS handshake", self.host);
        match timeout(
            self.config.connect_timeout,
            TlsConnector::from(tls).connect(server_name, stream),
        )
        .await
        {
            Ok(Ok(_stream)) => {
                trace!("[{}] TLS handshake succeeded", self.host);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("[{}] TLS handshake failed: {e}", self.host);
                Err(match find_tls_error(&e) {
                    Some(tls) => Error::TlsVerification {
                        host: self.host.clone(),
                        detail: tls.to_string(),
                    },
                    None => Error::Connection {
                        host: self.host.clone(),
                        detail: e.to_string(),
                    },
                })
            }
            Err(_) => Err(Error::Timeout {
                host: self.host.clone(),
                detail: format!(
                    "TLS handshake timed out after {}s",
                    self.config.connect_timeout.as_secs()
                ),
            }),
        }
    }

    fn url_for(&self, request: &Request) -> Result<Url> {
        let mut url = Url::parse(&self.base_url())
            .map_err(|e| Error::Configuration(format!("Invalid endpoint {}: {e}", self.host)))?;
        if let Some(segment) = request.path.split('/').find(|s| is_dot_segment(s)) {
            return Err(Error::Configuration(format!(
                "Request path {} contains the dot segment {segment:?}",
                request.path
            )));
        }
        url.set_path(&request.path);
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        Ok(url)
    }

    fn transport_error(&self, err: &reqwest::Error) -> Error {
        let host = self.host.clone();
        if let Some(tls) = find_tls_error(err) {
            return Error::TlsVerification {
                host,
                detail: tls.to_string(),
            };
        }
        let detail = error_chain(err);
        if err.is_timeout() {
            Error::Timeout { host, detail }
        } else {
            Error::Connection { host, detail }
        }
    }
}

#[async_trait]
impl Requester for Connection {
    async fn request(&self, request: Request) -> Result<Response> {
        let client = self.client().await?;
        let url = self.url_for(&request)?;

        let mut headers = self.default_headers.clone();
        headers.extend(request.headers);

        debug!("[{}] {} {}", self.host, request.method, url);

        let mut builder = client.request(request.method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        debug!("[{}] Response Status: {status}", self.host);

        if request.raw {
            return Ok(Response::streaming(response));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;
        debug!(
            "[{}] Response Body: {}",
            self.host,
            truncate_bytes_for_log(&body)
        );

        Ok(Response::new(status, headers, body))
    }
}

/// Display an error together with its sources.
/// Base64 `user:password` from the proxy URL, if it carries credentials.
fn proxy_authorization(proxy: &Url) -> Option<String> {
    if proxy.username().is_empty() {
        return None;
    }
    let decode = |part: &str| {
        urlencoding::decode(part).map_or_else(|_| part.to_string(), |value| value.into_owned())
    };
    let user = decode(proxy.username());
    let password = decode(proxy.password().unwrap_or_default());
    Some(STANDARD.encode(format!("{user}:{password}")))
}

/// Read up to the blank line ending a response head; returns the status line.
///
/// Reads byte by byte so nothing past the head (the tunnelled stream) is consumed.
async fn read_response_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut head = Vec::with_capacity(256);
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_PROXY_HEAD {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "proxy response head too large",
            ));
        }
        if stream.read(&mut byte).await? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "proxy closed the connection",
            ));
        }
        head.push(byte[0]);
    }
    let text = String::from_utf8_lossy(&head);
    Ok(text.lines().next().unwrap_or_default().trim().to_string())
}

/// Segments URL parsing would resolve against the parent path.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        text.push_str(": ");
        text.push_str(&e.to_string());
        source = e.source();
    }
    text
}
