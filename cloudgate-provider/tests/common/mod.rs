//! Shared helpers for driver integration tests

#![allow(dead_code, clippy::panic)]

use std::time::Duration;

use cloudgate_provider::{ConnectionConfig, DriverOptions, PollPolicy, Url};
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

/// Storage account path announced by the bootstrap
pub const STORAGE_PATH: &str = "/v1/AUTH_acct";
/// Compute / DNS account path announced by the bootstrap
pub const ACCOUNT_PATH: &str = "/v1.0/123456";

/// Parse a URL that is known to be valid.
pub fn url(s: &str) -> Url {
    match Url::parse(s) {
        Ok(url) => url,
        Err(e) => panic!("bad test url {s}: {e}"),
    }
}

/// Options pointing every endpoint at `server`, plain HTTP, fast polling.
pub fn options(server: &MockServer) -> DriverOptions {
    DriverOptions::default()
        .secure(false)
        .auth_url(url(&server.uri()))
        .service_host("127.0.0.1")
        .connection(
            ConnectionConfig::default()
                .connect_timeout(Duration::from_secs(2))
                .request_timeout(Duration::from_secs(5)),
        )
        .poll_policy(
            PollPolicy::default()
                .interval(Duration::from_millis(10))
                .max_attempts(20),
        )
}

/// Mount a Cloud Files bootstrap announcing storage and CDN URLs.
pub async fn mount_storage_auth(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1.0"))
        .and(header("x-auth-user", TEST_USER))
        .and(header("x-auth-key", TEST_KEY))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("x-auth-token", TEST_TOKEN)
                .insert_header(
                    "x-storage-url",
                    format!("{}{STORAGE_PATH}", server.uri()).as_str(),
                )
                .insert_header(
                    "x-cdn-management-url",
                    format!("{}/cdn/AUTH_acct", server.uri()).as_str(),
                ),
        )
        .mount(server)
        .await;
}

/// Mount a bootstrap announcing the server management URL (DNS, compute).
pub async fn mount_server_auth(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1.0"))
        .and(header("x-auth-user", TEST_USER))
        .and(header("x-auth-key", TEST_KEY))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("x-auth-token", TEST_TOKEN)
                .insert_header(
                    "x-server-management-url",
                    format!("{}{ACCOUNT_PATH}", server.uri()).as_str(),
                ),
        )
        .mount(server)
        .await;
}

/// `ACCOUNT_PATH` + `suffix`
pub fn account(suffix: &str) -> String {
    format!("{ACCOUNT_PATH}{suffix}")
}

/// `STORAGE_PATH` + `suffix`
pub fn storage(suffix: &str) -> String {
    format!("{STORAGE_PATH}{suffix}")
}
