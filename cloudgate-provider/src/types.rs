use std::collections::HashMap;
use std::fmt;

use cloudgate_transport::{ConnectionConfig, PollPolicy, Url};
use serde::{Deserialize, Serialize};

// ============ Driver Options ============

/// Rackspace account region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// United States (`auth.api.rackspacecloud.com`).
    #[default]
    Us,
    /// United Kingdom (`lon.auth.api.rackspacecloud.com`).
    Uk,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Us => write!(f, "US"),
            Self::Uk => write!(f, "UK"),
        }
    }
}

/// Settings shared by every driver constructor.
///
/// ```rust
/// use std::time::Duration;
/// use cloudgate_provider::{DriverOptions, Region};
/// use cloudgate_transport::PollPolicy;
///
/// let options = DriverOptions::default()
///     .region(Region::Uk)
///     .poll_policy(PollPolicy::default().timeout(Duration::from_secs(120)));
/// assert!(options.secure);
/// ```
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Account region; picks the default auth and API hosts.
    pub region: Region,
    /// Whether the discovered endpoints must be `https`.
    pub secure: bool,
    /// Auth endpoint override (private clouds, tests). Required for OpenStack.
    pub auth_url: Option<Url>,
    /// API host override for services whose host is not announced by the
    /// auth response (Rackspace DNS).
    pub service_host: Option<String>,
    /// Transport settings.
    pub connection: ConnectionConfig,
    /// Bounds for async job polling.
    pub poll_policy: PollPolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            region: Region::default(),
            secure: true,
            auth_url: None,
            service_host: None,
            connection: ConnectionConfig::default(),
            poll_policy: PollPolicy::default(),
        }
    }
}

impl DriverOptions {
    /// Set the account region (default: US).
    #[must_use]
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Require (`true`, default) or forbid TLS on discovered endpoints.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the auth endpoint.
    #[must_use]
    pub fn auth_url(mut self, url: Url) -> Self {
        self.auth_url = Some(url);
        self
    }

    /// Override the API host.
    #[must_use]
    pub fn service_host(mut self, host: impl Into<String>) -> Self {
        self.service_host = Some(host.into());
        self
    }

    /// Replace the transport settings.
    #[must_use]
    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.connection = config;
        self
    }

    /// Replace the polling bounds.
    #[must_use]
    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }
}

// ============ Storage Types ============

/// A storage container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name.
    pub name: String,
    /// Number of objects stored.
    pub object_count: u64,
    /// Bytes used.
    pub size: u64,
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Object name.
    pub name: String,
    /// Name of the owning container.
    pub container: String,
    /// Size in bytes.
    pub size: u64,
    /// Content hash from listings (MD5 for Cloud Files).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// `ETag` header from `HEAD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Last modification time as reported by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// User metadata (`x-object-meta-*` headers, prefix removed).
    #[serde(default)]
    pub meta_data: HashMap<String, String>,
}

/// Account-wide storage usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    /// Number of containers.
    pub container_count: u64,
    /// Number of objects across all containers.
    pub object_count: u64,
    /// Bytes used across all containers.
    pub bytes_used: u64,
}

// ============ DNS Types ============

/// DNS record types common to the supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address.
    A,
    /// IPv6 address.
    Aaaa,
    /// Canonical name.
    Cname,
    /// Mail exchange.
    Mx,
    /// Name server.
    Ns,
    /// Text.
    Txt,
    /// Service locator.
    Srv,
}

/// A DNS zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Provider zone ID.
    pub id: String,
    /// Domain name.
    pub domain: String,
    /// Zone type; always `master` for Rackspace.
    pub zone_type: String,
    /// Default TTL.
    pub ttl: u32,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-form comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Provider record ID.
    pub id: String,
    /// Fully qualified record name.
    pub name: String,
    /// Record type.
    pub record_type: RecordType,
    /// Record data (address, target, text).
    pub data: String,
    /// Owning zone ID.
    pub zone_id: String,
    /// Record TTL, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Free-form comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Parameters for creating a zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    /// Domain name.
    pub domain: String,
    /// Default TTL.
    pub ttl: Option<u32>,
    /// Contact email (required by Rackspace).
    pub email: Option<String>,
    /// Free-form comment.
    pub comment: Option<String>,
}

/// Parameters for updating a zone. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateZoneRequest {
    /// New domain name. Rackspace rejects renames.
    pub domain: Option<String>,
    /// New default TTL.
    pub ttl: Option<u32>,
    /// New contact email.
    pub email: Option<String>,
    /// New comment.
    pub comment: Option<String>,
}

/// Parameters for creating a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    /// Fully qualified name, e.g. `www.example.com`.
    pub name: String,
    /// Record type.
    pub record_type: RecordType,
    /// Record data.
    pub data: String,
    /// Record TTL.
    pub ttl: Option<u32>,
    /// Free-form comment.
    pub comment: Option<String>,
}

/// Parameters for updating a record. Name and type are fixed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    /// New record data.
    pub data: Option<String>,
    /// New TTL.
    pub ttl: Option<u32>,
    /// New comment.
    pub comment: Option<String>,
}

// ============ Compute Types ============

/// A compute node (server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Server ID.
    pub id: String,
    /// Server name.
    pub name: String,
    /// Provider status string (`ACTIVE`, `BUILD`, ...).
    pub state: String,
    /// Addresses on the public network.
    pub public_ips: Vec<String>,
    /// Addresses on the private network.
    pub private_ips: Vec<String>,
}

/// A floating IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingIp {
    /// Provider ID.
    pub id: String,
    /// The address.
    pub ip_address: String,
    /// Pool the address was allocated from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    /// Node the address is attached to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// A pool floating IPs are allocated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIpPool {
    /// Pool name.
    pub name: String,
}

// ============ Provider Metadata ============

/// Service a driver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Object storage.
    Storage,
    /// Managed DNS.
    Dns,
    /// Compute servers.
    Compute,
}

/// Optional capabilities of a driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFeatures {
    /// Mutations complete through async job polling.
    pub async_jobs: bool,
    /// Objects can be streamed in chunks.
    pub streaming_download: bool,
    /// The driver exposes a floating IP capability.
    pub floating_ips: bool,
}

/// Static description of a registered driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Registry identifier, e.g. `cloudfiles_us`.
    pub id: String,
    /// Service kind.
    pub service: ServiceKind,
    /// Human-readable name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Fixed region, when the driver is region-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Feature flags.
    pub features: ProviderFeatures,
}

impl ProviderMetadata {
    /// Specialize generic driver metadata for one registry entry.
    #[must_use]
    pub fn for_entry(mut self, id: &str, name: &str, region: Option<Region>) -> Self {
        self.id = id.to_string();
        self.name = name.to_string();
        self.region = region;
        self
    }
}

// ============ Registry Keys ============

/// Registered storage drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageProvider {
    /// Cloud Files, US accounts.
    #[serde(rename = "cloudfiles_us")]
    CloudFilesUs,
    /// Cloud Files, UK accounts.
    #[serde(rename = "cloudfiles_uk")]
    CloudFilesUk,
}

/// Registered DNS drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DnsProvider {
    /// Rackspace Cloud DNS, US accounts.
    #[serde(rename = "rackspace_dns_us")]
    RackspaceUs,
    /// Rackspace Cloud DNS, UK accounts.
    #[serde(rename = "rackspace_dns_uk")]
    RackspaceUk,
}

/// Registered compute drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeProvider {
    /// Rackspace Cloud Servers, US accounts.
    #[serde(rename = "rackspace_us")]
    RackspaceUs,
    /// Rackspace Cloud Servers, UK accounts.
    #[serde(rename = "rackspace_uk")]
    RackspaceUk,
    /// OpenStack compute; needs an explicit auth URL.
    #[serde(rename = "openstack")]
    OpenStack,
}

impl StorageProvider {
    /// Registry identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CloudFilesUs => "cloudfiles_us",
            Self::CloudFilesUk => "cloudfiles_uk",
        }
    }
}

impl DnsProvider {
    /// Registry identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RackspaceUs => "rackspace_dns_us",
            Self::RackspaceUk => "rackspace_dns_uk",
        }
    }
}

impl ComputeProvider {
    /// Registry identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RackspaceUs => "rackspace_us",
            Self::RackspaceUk => "rackspace_uk",
            Self::OpenStack => "openstack",
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DnsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ComputeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
