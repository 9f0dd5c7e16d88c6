//! Driver implementations

/// Shared utilities used by the drivers.
pub(crate) mod common;

#[cfg(feature = "cloudfiles")]
mod cloudfiles;
#[cfg(feature = "openstack")]
mod openstack;
#[cfg(feature = "rackspace-dns")]
mod rackspace_dns;

#[cfg(feature = "cloudfiles")]
pub use cloudfiles::CloudFilesDriver;
#[cfg(feature = "openstack")]
pub use openstack::{OpenStackComputeDriver, RackspaceComputeDriver};
#[cfg(feature = "rackspace-dns")]
pub use rackspace_dns::RackspaceDnsDriver;
