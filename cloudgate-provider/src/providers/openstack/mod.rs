//! Rackspace and OpenStack compute drivers
//!
//! Both speak the OpenStack compute API behind v1.0 header auth. Only the
//! OpenStack driver exposes floating IPs.

mod error;
mod http;
mod provider;
mod types;

use cloudgate_transport::{AuthConnection, AuthScheme, Credentials};

use crate::error::{ProviderError, Result};
use crate::providers::common::{auth_connection, auth_url};
use crate::types::{DriverOptions, Region};

/// Bootstrap header announcing the compute endpoint
pub(crate) const SERVER_URL_HEADER: &str = "x-server-management-url";

/// Authenticated compute API shared by the drivers
pub(crate) struct ComputeApi {
    pub(crate) connection: AuthConnection,
    pub(crate) provider: &'static str,
}

impl ComputeApi {
    fn new(
        provider: &'static str,
        credentials: Credentials,
        options: &DriverOptions,
    ) -> Result<Self> {
        let scheme = AuthScheme::v1(auth_url(options, provider)?, SERVER_URL_HEADER);
        Ok(Self {
            connection: auth_connection(credentials, scheme, options),
            provider,
        })
    }
}

/// Rackspace Cloud Servers
pub struct RackspaceComputeDriver {
    pub(crate) api: ComputeApi,
    pub(crate) region: Region,
}

impl RackspaceComputeDriver {
    pub fn new(credentials: Credentials, options: &DriverOptions) -> Result<Self> {
        Ok(Self {
            api: ComputeApi::new("rackspace_compute", credentials, options)?,
            region: options.region,
        })
    }

    /// Account region
    pub fn region(&self) -> Region {
        self.region
    }
}

/// OpenStack compute (nova) with the floating IP extension
pub struct OpenStackComputeDriver {
    pub(crate) api: ComputeApi,
}

impl OpenStackComputeDriver {
    /// `options.auth_url` must point at the cloud's auth endpoint.
    pub fn new(credentials: Credentials, options: &DriverOptions) -> Result<Self> {
        if options.auth_url.is_none() {
            return Err(ProviderError::InvalidParameter {
                provider: "openstack".to_string(),
                param: "auth_url".to_string(),
                detail: "OpenStack has no default auth endpoint".to_string(),
            });
        }
        Ok(Self {
            api: ComputeApi::new("openstack", credentials, options)?,
        })
    }
}
