//! Rackspace Cloud Files storage driver

mod error;
mod http;
mod provider;
mod types;

use cloudgate_transport::{AuthConnection, AuthScheme, Credentials, Url};

use crate::error::Result;
use crate::providers::common::{auth_connection, auth_url};
use crate::traits::ProviderErrorMapper;
use crate::types::{DriverOptions, Region};

pub(crate) use types::{CloudFilesContainer, CloudFilesObject};

/// Bootstrap header announcing the storage endpoint
pub(crate) const STORAGE_URL_HEADER: &str = "x-storage-url";
/// Bootstrap header announcing the CDN management endpoint
pub(crate) const CDN_URL_HEADER: &str = "x-cdn-management-url";
/// Longest container name the API accepts
pub(crate) const MAX_CONTAINER_NAME_LEN: usize = 256;
/// Prefix of user metadata headers on objects
pub(crate) const OBJECT_META_PREFIX: &str = "x-object-meta-";

/// Rackspace Cloud Files driver
pub struct CloudFilesDriver {
    pub(crate) connection: AuthConnection,
    pub(crate) region: Region,
}

impl CloudFilesDriver {
    /// Driver for the account behind `credentials` (user name and API key).
    ///
    /// Nothing is sent until the first call; that call authenticates.
    pub fn new(credentials: Credentials, options: &DriverOptions) -> Result<Self> {
        let scheme = AuthScheme::v1(auth_url(options, "cloudfiles")?, STORAGE_URL_HEADER)
            .management_url_header(CDN_URL_HEADER)
            .default_param("format", "json");
        Ok(Self {
            connection: auth_connection(credentials, scheme, options),
            region: options.region,
        })
    }

    /// Account region
    pub fn region(&self) -> Region {
        self.region
    }

    /// CDN management endpoint announced at authentication.
    pub async fn cdn_management_url(&self) -> Result<Option<Url>> {
        let session = self
            .connection
            .session()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(session.management_url.clone())
    }
}
