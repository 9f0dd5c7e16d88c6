//! Driver registry: factory functions and metadata.
//!
//! Each service has a static table mapping its provider enum to a metadata
//! function and a constructor. Entries exist only for enabled features.

use cloudgate_transport::Credentials;

use crate::error::{ProviderError, Result};
use crate::traits::{ComputeDriver, DnsDriver, StorageDriver};
use crate::types::{
    ComputeProvider, DnsProvider, DriverOptions, ProviderMetadata, Region, StorageProvider,
};

#[cfg(feature = "cloudfiles")]
use crate::providers::CloudFilesDriver;
#[cfg(feature = "openstack")]
use crate::providers::{OpenStackComputeDriver, RackspaceComputeDriver};
#[cfg(feature = "rackspace-dns")]
use crate::providers::RackspaceDnsDriver;

/// One registry row
struct Entry<P, D: ?Sized> {
    provider: P,
    name: &'static str,
    region: Option<Region>,
    metadata: fn() -> ProviderMetadata,
    create: fn(Credentials, DriverOptions) -> Result<Box<D>>,
}

impl<P: Copy + PartialEq + std::fmt::Display, D: ?Sized> Entry<P, D> {
    fn metadata(&self) -> ProviderMetadata {
        (self.metadata)().for_entry(&self.provider.to_string(), self.name, self.region)
    }
}

fn lookup<P, D>(table: &'static [Entry<P, D>], provider: P) -> Result<&'static Entry<P, D>>
where
    P: Copy + PartialEq + std::fmt::Display,
    D: ?Sized,
{
    table
        .iter()
        .find(|entry| entry.provider == provider)
        .ok_or_else(|| ProviderError::Unsupported {
            provider: provider.to_string(),
            feature: "this driver (disabled at compile time)".to_string(),
        })
}

// ==================== Tables ====================

static STORAGE_DRIVERS: &[Entry<StorageProvider, dyn StorageDriver>] = &[
    #[cfg(feature = "cloudfiles")]
    Entry {
        provider: StorageProvider::CloudFilesUs,
        name: "CloudFiles (US)",
        region: Some(Region::Us),
        metadata: <CloudFilesDriver as StorageDriver>::metadata,
        create: cloudfiles_us,
    },
    #[cfg(feature = "cloudfiles")]
    Entry {
        provider: StorageProvider::CloudFilesUk,
        name: "CloudFiles (UK)",
        region: Some(Region::Uk),
        metadata: <CloudFilesDriver as StorageDriver>::metadata,
        create: cloudfiles_uk,
    },
];

static DNS_DRIVERS: &[Entry<DnsProvider, dyn DnsDriver>] = &[
    #[cfg(feature = "rackspace-dns")]
    Entry {
        provider: DnsProvider::RackspaceUs,
        name: "Rackspace DNS (US)",
        region: Some(Region::Us),
        metadata: <RackspaceDnsDriver as DnsDriver>::metadata,
        create: rackspace_dns_us,
    },
    #[cfg(feature = "rackspace-dns")]
    Entry {
        provider: DnsProvider::RackspaceUk,
        name: "Rackspace DNS (UK)",
        region: Some(Region::Uk),
        metadata: <RackspaceDnsDriver as DnsDriver>::metadata,
        create: rackspace_dns_uk,
    },
];

static COMPUTE_DRIVERS: &[Entry<ComputeProvider, dyn ComputeDriver>] = &[
    #[cfg(feature = "openstack")]
    Entry {
        provider: ComputeProvider::RackspaceUs,
        name: "Rackspace Cloud Servers (US)",
        region: Some(Region::Us),
        metadata: <RackspaceComputeDriver as ComputeDriver>::metadata,
        create: rackspace_compute_us,
    },
    #[cfg(feature = "openstack")]
    Entry {
        provider: ComputeProvider::RackspaceUk,
        name: "Rackspace Cloud Servers (UK)",
        region: Some(Region::Uk),
        metadata: <RackspaceComputeDriver as ComputeDriver>::metadata,
        create: rackspace_compute_uk,
    },
    #[cfg(feature = "openstack")]
    Entry {
        provider: ComputeProvider::OpenStack,
        name: "OpenStack",
        region: None,
        metadata: <OpenStackComputeDriver as ComputeDriver>::metadata,
        create: openstack_compute,
    },
];

// ==================== Constructors ====================

#[cfg(feature = "cloudfiles")]
fn cloudfiles_us(credentials: Credentials, options: DriverOptions) -> Result<Box<dyn StorageDriver>> {
    Ok(Box::new(CloudFilesDriver::new(credentials, &options.region(Region::Us))?))
}

#[cfg(feature = "cloudfiles")]
fn cloudfiles_uk(credentials: Credentials, options: DriverOptions) -> Result<Box<dyn StorageDriver>> {
    Ok(Box::new(CloudFilesDriver::new(credentials, &options.region(Region::Uk))?))
}

#[cfg(feature = "rackspace-dns")]
fn rackspace_dns_us(credentials: Credentials, options: DriverOptions) -> Result<Box<dyn DnsDriver>> {
    Ok(Box::new(RackspaceDnsDriver::new(credentials, &options.region(Region::Us))?))
}

#[cfg(feature = "rackspace-dns")]
fn rackspace_dns_uk(credentials: Credentials, options: DriverOptions) -> Result<Box<dyn DnsDriver>> {
    Ok(Box::new(RackspaceDnsDriver::new(credentials, &options.region(Region::Uk))?))
}

#[cfg(feature = "openstack")]
fn rackspace_compute_us(
    credentials: Credentials,
    options: DriverOptions,
) -> Result<Box<dyn ComputeDriver>> {
    Ok(Box::new(RackspaceComputeDriver::new(
        credentials,
        &options.region(Region::Us),
    )?))
}

#[cfg(feature = "openstack")]
fn rackspace_compute_uk(
    credentials: Credentials,
    options: DriverOptions,
) -> Result<Box<dyn ComputeDriver>> {
    Ok(Box::new(RackspaceComputeDriver::new(
        credentials,
        &options.region(Region::Uk),
    )?))
}

#[cfg(feature = "openstack")]
fn openstack_compute(
    credentials: Credentials,
    options: DriverOptions,
) -> Result<Box<dyn ComputeDriver>> {
    Ok(Box::new(OpenStackComputeDriver::new(credentials, &options)?))
}

// ==================== Public API ====================

/// Creates a storage driver.
///
/// Nothing is sent over the network until the first driver call.
///
/// # Examples
///
/// ```rust,no_run
/// use cloudgate_provider::{
///     create_storage_driver, Credentials, DriverOptions, StorageDriver, StorageProvider,
/// };
///
/// let driver = create_storage_driver(
///     StorageProvider::CloudFilesUk,
///     Credentials::new("username", "api-key"),
///     DriverOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(driver.id(), "cloudfiles");
/// ```
pub fn create_storage_driver(
    provider: StorageProvider,
    credentials: Credentials,
    options: DriverOptions,
) -> Result<Box<dyn StorageDriver>> {
    let entry = lookup(STORAGE_DRIVERS, provider)?;
    log::debug!("Creating storage driver {provider}");
    (entry.create)(credentials, options)
}

/// Creates a DNS driver.
pub fn create_dns_driver(
    provider: DnsProvider,
    credentials: Credentials,
    options: DriverOptions,
) -> Result<Box<dyn DnsDriver>> {
    let entry = lookup(DNS_DRIVERS, provider)?;
    log::debug!("Creating DNS driver {provider}");
    (entry.create)(credentials, options)
}

/// Creates a compute driver.
///
/// Whether the driver manages floating IPs is discovered at runtime through
/// [`ComputeDriver::floating_ips`].
pub fn create_compute_driver(
    provider: ComputeProvider,
    credentials: Credentials,
    options: DriverOptions,
) -> Result<Box<dyn ComputeDriver>> {
    let entry = lookup(COMPUTE_DRIVERS, provider)?;
    log::debug!("Creating compute driver {provider}");
    (entry.create)(credentials, options)
}

/// Returns metadata for every driver enabled via feature flags.
pub fn list_providers() -> Vec<ProviderMetadata> {
    STORAGE_DRIVERS
        .iter()
        .map(Entry::metadata)
        .chain(DNS_DRIVERS.iter().map(Entry::metadata))
        .chain(COMPUTE_DRIVERS.iter().map(Entry::metadata))
        .collect()
}
