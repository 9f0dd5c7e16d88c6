use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cloudgate_transport::{ChunkStream, DownloadOptions};

use crate::error::{ProviderError, Result};
use crate::types::{
    AccountMetadata, Container, CreateRecordRequest, CreateZoneRequest, FloatingIp,
    FloatingIpPool, Node, ProviderMetadata, Record, StorageObject, UpdateRecordRequest,
    UpdateZoneRequest, Zone,
};

/// Raw API error (internal)
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// HTTP status of the failed response
    pub status: Option<u16>,
    /// Provider error code, if the body carried one
    pub code: Option<String>,
    /// Raw error message
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Error context (internal)
///
/// Names the resource a call was about, so a bare 404 can be mapped to the
/// right "not found" variant.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// Container name
    pub container: Option<String>,
    /// Object name
    pub object: Option<String>,
    /// Zone ID
    pub zone_id: Option<String>,
    /// Record ID
    pub record_id: Option<String>,
    /// Floating IP address or ID
    pub floating_ip: Option<String>,
}

impl ErrorContext {
    pub fn container(name: &str) -> Self {
        Self {
            container: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn object(container: &str, object: &str) -> Self {
        Self {
            container: Some(container.to_string()),
            object: Some(object.to_string()),
            ..Self::default()
        }
    }

    pub fn zone(zone_id: &str) -> Self {
        Self {
            zone_id: Some(zone_id.to_string()),
            ..Self::default()
        }
    }

    pub fn record(zone_id: &str, record_id: &str) -> Self {
        Self {
            zone_id: Some(zone_id.to_string()),
            record_id: Some(record_id.to_string()),
            ..Self::default()
        }
    }

    pub fn floating_ip(ip: &str) -> Self {
        Self {
            floating_ip: Some(ip.to_string()),
            ..Self::default()
        }
    }
}

/// Provider error mapping trait (internal)
/// Each driver maps raw API failures onto [`ProviderError`].
pub(crate) trait ProviderErrorMapper {
    /// Driver identifier
    fn provider_name(&self) -> &'static str;

    /// Map a raw API error to the unified error type
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// Shortcut: parse error
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Shortcut: transport failure
    fn transport_error(&self, err: cloudgate_transport::Error) -> ProviderError {
        ProviderError::from_transport(self.provider_name(), err)
    }

    /// Shortcut: status outside what the operation expects
    fn unexpected_status(&self, raw: RawApiError) -> ProviderError {
        ProviderError::UnexpectedStatus {
            provider: self.provider_name().to_string(),
            status: raw.status.unwrap_or_default(),
            raw_message: (!raw.message.is_empty()).then_some(raw.message),
        }
    }

    /// Shortcut: unknown error (fallback)
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Object storage driver
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Driver identifier
    fn id(&self) -> &'static str;

    /// Driver metadata (type level, no instance needed)
    fn metadata() -> ProviderMetadata
    where
        Self: Sized;

    /// Account-wide usage
    async fn get_meta_data(&self) -> Result<AccountMetadata>;

    /// All containers; empty when the account has none
    async fn list_containers(&self) -> Result<Vec<Container>>;

    /// Objects in a container; empty for an empty container
    async fn list_container_objects(&self, container_name: &str) -> Result<Vec<StorageObject>>;

    /// One container with its usage
    async fn get_container(&self, container_name: &str) -> Result<Container>;

    /// One object's metadata
    async fn get_object(&self, container_name: &str, object_name: &str) -> Result<StorageObject>;

    /// Create a container; fails if it already exists
    async fn create_container(&self, container_name: &str) -> Result<Container>;

    /// Delete an empty container
    async fn delete_container(&self, container: &Container) -> Result<()>;

    /// Delete an object
    async fn delete_object(&self, object: &StorageObject) -> Result<()>;

    /// Save an object to disk and return the written file path.
    ///
    /// An existing directory as `destination` receives a file named after the
    /// object; any other path is used as the file path itself.
    async fn download_object(
        &self,
        object: &StorageObject,
        destination: &Path,
        options: DownloadOptions,
    ) -> Result<PathBuf>;

    /// Open an object for chunked reading
    async fn object_as_stream(
        &self,
        object: &StorageObject,
        chunk_size: Option<usize>,
    ) -> Result<ChunkStream>;
}

/// Managed DNS driver
#[async_trait]
pub trait DnsDriver: Send + Sync {
    /// Driver identifier
    fn id(&self) -> &'static str;

    /// Driver metadata (type level, no instance needed)
    fn metadata() -> ProviderMetadata
    where
        Self: Sized;

    /// All zones
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// One zone
    async fn get_zone(&self, zone_id: &str) -> Result<Zone>;

    /// Records of a zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<Record>>;

    /// One record
    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record>;

    /// Create a zone
    async fn create_zone(&self, req: &CreateZoneRequest) -> Result<Zone>;

    /// Update a zone and return the merged result
    async fn update_zone(&self, zone: &Zone, req: &UpdateZoneRequest) -> Result<Zone>;

    /// Create a record
    async fn create_record(&self, zone: &Zone, req: &CreateRecordRequest) -> Result<Record>;

    /// Update a record and return the merged result
    async fn update_record(&self, record: &Record, req: &UpdateRecordRequest) -> Result<Record>;

    /// Delete a zone
    async fn delete_zone(&self, zone: &Zone) -> Result<()>;

    /// Delete a record
    async fn delete_record(&self, record: &Record) -> Result<()>;
}

/// Compute driver
#[async_trait]
pub trait ComputeDriver: Send + Sync {
    /// Driver identifier
    fn id(&self) -> &'static str;

    /// Driver metadata (type level, no instance needed)
    fn metadata() -> ProviderMetadata
    where
        Self: Sized;

    /// All servers
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Floating IP capability, when the endpoint offers it
    fn floating_ips(&self) -> Option<&dyn FloatingIpProvider> {
        None
    }
}

/// Floating IP capability of a compute driver
#[async_trait]
pub trait FloatingIpProvider: Send + Sync {
    /// All floating IPs of the account
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>>;

    /// Floating IPs allocated from one pool
    async fn list_pool_floating_ips(&self, pool: &str) -> Result<Vec<FloatingIp>> {
        let ips = self.list_floating_ips().await?;
        Ok(ips
            .into_iter()
            .filter(|ip| ip.pool.as_deref() == Some(pool))
            .collect())
    }

    /// The floating IP with this address
    async fn get_floating_ip(&self, ip_address: &str) -> Result<FloatingIp>;

    /// Allocate a floating IP, from `pool` or the default pool
    async fn create_floating_ip(&self, pool: Option<&str>) -> Result<FloatingIp>;

    /// Release a floating IP
    async fn delete_floating_ip(&self, ip: &FloatingIp) -> Result<()>;

    /// Attach an address to a server
    async fn attach_floating_ip(&self, node_id: &str, ip_address: &str) -> Result<()>;

    /// Detach an address from a server
    async fn detach_floating_ip(&self, node_id: &str, ip_address: &str) -> Result<()>;

    /// Pools available for allocation
    async fn list_floating_ip_pools(&self) -> Result<Vec<FloatingIpPool>>;
}
