//! # cloudgate-transport
//!
//! HTTP plumbing shared by the cloud drivers in `cloudgate-provider`.
//!
//! ## Layers
//!
//! | Type | Role |
//! |------|------|
//! | [`Connection`] | One endpoint (host, port, scheme) with default headers and hostname-verified TLS |
//! | [`AuthConnection`] | Lazily exchanges credentials for a token and service endpoint, then prefixes every request |
//! | [`AsyncConnection`] | Issues a request and polls the resulting job until it completes, fails or runs out of budget |
//! | [`Response`] | Status, headers and a body parsed on demand by content type |
//! | [`ChunkStream`] | Single-pass chunked reader over a raw body, with [`save_to_file`] for downloads |
//!
//! All of them dispatch through the [`Requester`] trait, so a driver only
//! needs to hold one `Arc<dyn Requester>`-like value.
//!
//! ## TLS
//!
//! Secure connections verify the certificate chain against the bundled
//! Mozilla roots plus an optional PEM bundle (see [`ConnectionConfig::ca_bundle`]
//! and [`CA_BUNDLE_ENV`]), then check the requested host against the
//! certificate's common name and subject alternative names with single-label
//! wildcard matching ([`verify_hostname`]).
//!
//! ## Proxies
//!
//! An `http://` proxy set with [`ConnectionConfig::proxy`], or taken from
//! `HTTPS_PROXY` / `HTTP_PROXY` / `ALL_PROXY` (minus `NO_PROXY` hosts), carries
//! both the connect check and every request. Secure targets are tunnelled with
//! `CONNECT`, so hostname verification still runs against the target.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudgate_transport::{AuthConnection, AuthScheme, ConnectionConfig, Credentials, Request, Requester, Url};
//!
//! # async fn run() -> cloudgate_transport::Result<()> {
//! let scheme = AuthScheme::v1(
//!     Url::parse("https://auth.api.rackspacecloud.com").map_err(|e| {
//!         cloudgate_transport::Error::Configuration(e.to_string())
//!     })?,
//!     "x-storage-url",
//! )
//! .default_param("format", "json");
//!
//! let conn = AuthConnection::new(
//!     Credentials::new("user", "api-key"),
//!     scheme,
//!     true,
//!     ConnectionConfig::default(),
//! );
//!
//! // First request bootstraps the session; later ones reuse it.
//! let response = conn.request(Request::get("")).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

mod auth;
mod config;
mod connection;
mod error;
mod polling;
mod request;
mod response;
mod stream;
mod tls;
pub mod utils;

pub use auth::{
    AUTH_KEY_HEADER, AUTH_TOKEN_HEADER, AUTH_USER_HEADER, AuthConnection, AuthPhase, AuthScheme,
    Credentials, EndpointRewrite, Session,
};
pub use config::{CA_BUNDLE_ENV, ConnectionConfig};
pub use connection::{Connection, Requester};
pub use error::{Error, Result};
pub use polling::{AsyncConnection, AsyncJob, JobPoller, PollPolicy, StatusEndpointPoller};
pub use request::{JSON_CONTENT_TYPE, Request};
pub use response::{ApiError, Outcome, ParsedBody, Response};
pub use stream::{CHUNK_SIZE, ChunkStream, DownloadOptions, save_to_file};
pub use tls::{
    CertIdentity, CertificateParseError, HostnameMismatch, HostnameVerifier, is_wildcard_name,
    verify_hostname, wildcard_to_regex,
};

pub use reqwest::{Method, StatusCode, header};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;
