//! # cloudgate-provider
//!
//! Cloud drivers built on the `cloudgate-transport` connection stack: object
//! storage, managed DNS and compute, each behind a trait and created through a
//! registry keyed by provider.
//!
//! ## Supported Drivers
//!
//! | Driver | Service | Feature Flag | Registry keys |
//! |--------|---------|--------------|---------------|
//! | Rackspace Cloud Files | Storage | `cloudfiles` | `cloudfiles_us`, `cloudfiles_uk` |
//! | Rackspace Cloud DNS | DNS | `rackspace-dns` | `rackspace_dns_us`, `rackspace_dns_uk` |
//! | Rackspace Cloud Servers | Compute | `openstack` | `rackspace_us`, `rackspace_uk` |
//! | OpenStack Compute (+ floating IPs) | Compute | `openstack` | `openstack` |
//!
//! `all-providers` *(default)* enables everything.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudgate_provider::{
//!     create_storage_driver, Credentials, DownloadOptions, DriverOptions, StorageDriver,
//!     StorageProvider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = create_storage_driver(
//!         StorageProvider::CloudFilesUs,
//!         Credentials::new("username", "api-key"),
//!         DriverOptions::default(),
//!     )?;
//!
//!     // The first call authenticates
//!     for container in driver.list_containers().await? {
//!         println!("{} ({} objects)", container.name, container.object_count);
//!     }
//!
//!     let object = driver.get_object("backups", "db.tar").await?;
//!     let path = driver
//!         .download_object(&object, std::path::Path::new("/tmp"), DownloadOptions::default())
//!         .await?;
//!     println!("saved to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Capability Discovery
//!
//! Floating IP management is optional for compute drivers:
//!
//! ```rust,no_run
//! # use cloudgate_provider::*;
//! # async fn example(driver: Box<dyn ComputeDriver>) -> Result<()> {
//! if let Some(ips) = driver.floating_ips() {
//!     let ip = ips.create_floating_ip(Some("public")).await?;
//!     ips.attach_floating_ip("server-id", &ip.ip_address).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All driver operations return [`Result<T, ProviderError>`](ProviderError).
//! HTTP statuses map onto resource-specific variants such as
//! [`ProviderError::ContainerNotFound`] or [`ProviderError::ZoneNotFound`];
//! transport failures keep their kind ([`ProviderError::NetworkError`],
//! [`ProviderError::TlsVerification`], [`ProviderError::AsyncJobFailed`]).

mod error;
mod factory;
mod providers;
mod traits;
mod types;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export factory functions
pub use factory::{create_compute_driver, create_dns_driver, create_storage_driver, list_providers};

// Re-export driver traits (error mapping stays internal)
pub use traits::{ComputeDriver, DnsDriver, FloatingIpProvider, StorageDriver};

// Re-export types
pub use types::{
    AccountMetadata, ComputeProvider, Container, CreateRecordRequest, CreateZoneRequest,
    DnsProvider, DriverOptions, FloatingIp, FloatingIpPool, Node, ProviderFeatures,
    ProviderMetadata, Record, RecordType, Region, ServiceKind, StorageObject, StorageProvider,
    UpdateRecordRequest, UpdateZoneRequest, Zone,
};

// Transport types that appear in driver signatures
pub use cloudgate_transport::{
    ChunkStream, ConnectionConfig, Credentials, DownloadOptions, PollPolicy, Url,
};

// Re-export concrete drivers (behind feature flags)
#[cfg(feature = "cloudfiles")]
pub use providers::CloudFilesDriver;

#[cfg(feature = "rackspace-dns")]
pub use providers::RackspaceDnsDriver;

#[cfg(feature = "openstack")]
pub use providers::{OpenStackComputeDriver, RackspaceComputeDriver};
