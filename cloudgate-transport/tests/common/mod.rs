//! Shared helpers for transport integration tests

#![allow(dead_code, clippy::panic)]

use cloudgate_transport::{AuthScheme, ConnectionConfig, Url};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Assert an `Option` is `Some` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Assert a `Result` is `Ok` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

pub const TEST_USER: &str = "tester";
pub const TEST_KEY: &str = "0123456789abcdef";
pub const TEST_TOKEN: &str = "tok-abc";

/// Config with short timeouts for local mock servers.
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::default()
        .connect_timeout(std::time::Duration::from_secs(2))
        .request_timeout(std::time::Duration::from_secs(5))
}

/// Parse a URL that is known to be valid.
pub fn url(s: &str) -> Url {
    match Url::parse(s) {
        Ok(url) => url,
        Err(e) => panic!("bad test url {s}: {e}"),
    }
}

/// v1.0 scheme against `server`, discovering the storage URL header.
pub fn storage_scheme(server: &MockServer) -> AuthScheme {
    AuthScheme::v1(url(&server.uri()), "x-storage-url").default_param("format", "json")
}

/// Mount a successful v1.0 bootstrap that hands out `service_url`.
///
/// `expected` bounds how many times the endpoint may be hit.
pub async fn mount_bootstrap(server: &MockServer, service_url: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/v1.0"))
        .and(header("x-auth-user", TEST_USER))
        .and(header("x-auth-key", TEST_KEY))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("x-auth-token", TEST_TOKEN)
                .insert_header("x-storage-url", service_url),
        )
        .expect(expected)
        .mount(server)
        .await;
}
