//! Rackspace Cloud DNS driver

mod error;
mod http;
mod provider;
mod types;

use std::sync::Arc;

use cloudgate_transport::{
    AsyncConnection, AuthConnection, AuthScheme, Credentials, Error as TransportError, Url,
};

use crate::error::Result;
use crate::providers::common::{auth_connection, auth_url};
use crate::types::{DriverOptions, Region};

/// Bootstrap header whose URL carries the account number
pub(crate) const SERVER_URL_HEADER: &str = "x-server-management-url";
/// DNS API host, US accounts
pub(crate) const DNS_HOST_US: &str = "dns.api.rackspacecloud.com";
/// DNS API host, UK accounts
pub(crate) const DNS_HOST_UK: &str = "lon.dns.api.rackspacecloud.com";
/// DNS API version path
pub(crate) const DNS_API_VERSION: &str = "v1.0";

/// Rackspace Cloud DNS driver
///
/// Mutations are asynchronous on the API side: the driver submits them and
/// polls the job until it completes, within the options' poll policy.
pub struct RackspaceDnsDriver {
    pub(crate) connection: AsyncConnection<AuthConnection>,
    pub(crate) region: Region,
}

impl RackspaceDnsDriver {
    pub fn new(credentials: Credentials, options: &DriverOptions) -> Result<Self> {
        let host = options
            .service_host
            .clone()
            .unwrap_or_else(|| default_host(options.region).to_string());

        let scheme = AuthScheme::v1(auth_url(options, "rackspace_dns")?, SERVER_URL_HEADER)
            .endpoint_rewrite(Arc::new(move |discovered: &Url| {
                dns_endpoint(discovered, &host)
            }));

        let connection = AsyncConnection::new(auth_connection(credentials, scheme, options))
            .with_policy(options.poll_policy);

        Ok(Self {
            connection,
            region: options.region,
        })
    }

    /// Account region
    pub fn region(&self) -> Region {
        self.region
    }
}

fn default_host(region: Region) -> &'static str {
    match region {
        Region::Us => DNS_HOST_US,
        Region::Uk => DNS_HOST_UK,
    }
}

/// Point the server management URL at the DNS API of the same account.
///
/// `https://servers.api.rackspacecloud.com/v1.0/123456` becomes
/// `https://dns.api.rackspacecloud.com/v1.0/123456`.
pub(crate) fn dns_endpoint(discovered: &Url, host: &str) -> cloudgate_transport::Result<Url> {
    let account = discovered
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or_else(|| {
            TransportError::MalformedResponse(format!(
                "{SERVER_URL_HEADER} has no account number: {discovered}"
            ))
        })?
        .to_string();

    let mut url = discovered.clone();
    url.set_host(Some(host))
        .map_err(|e| TransportError::Configuration(format!("Invalid DNS host {host}: {e}")))?;
    url.set_path(&format!("/{DNS_API_VERSION}/{account}"));
    url.set_query(None);
    Ok(url)
}
