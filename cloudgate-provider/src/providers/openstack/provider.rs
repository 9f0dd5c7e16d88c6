//! `ComputeDriver` and `FloatingIpProvider` implementations

use async_trait::async_trait;
use cloudgate_transport::Request;

use crate::error::{ProviderError, Result};
use crate::providers::common::path_segment;
use crate::traits::{ComputeDriver, ErrorContext, FloatingIpProvider, ProviderErrorMapper};
use crate::types::{
    FloatingIp, FloatingIpPool, Node, ProviderFeatures, ProviderMetadata, ServiceKind,
};

use super::types::{
    CreateFloatingIp, FloatingIpEnvelope, FloatingIpList, FloatingIpPoolList, OpenStackFloatingIp,
    OpenStackServer, ServerAction, ServerList,
};
use super::{ComputeApi, OpenStackComputeDriver, RackspaceComputeDriver};

impl ComputeApi {
    pub(crate) async fn list_nodes(&self) -> Result<Vec<Node>> {
        let list: ServerList = self.get("/servers/detail").await?;
        Ok(list.servers.into_iter().map(to_node).collect())
    }

    async fn server_action(
        &self,
        node_id: &str,
        action: &ServerAction<'_>,
        ip_address: &str,
    ) -> Result<()> {
        let path = format!(
            "/servers/{}/action",
            path_segment(node_id, "node_id", self.provider_name())?
        );
        self.post(
            &path,
            action,
            ErrorContext::floating_ip(ip_address),
        )
        .await?;
        Ok(())
    }
}

fn to_node(mut server: OpenStackServer) -> Node {
    let mut network = |name: &str| -> Vec<String> {
        server
            .addresses
            .remove(name)
            .unwrap_or_default()
            .into_iter()
            .map(super::types::ServerAddress::into_addr)
            .collect()
    };
    let public_ips = network("public");
    let private_ips = network("private");

    Node {
        id: server.id,
        name: server.name,
        state: server.status,
        public_ips,
        private_ips,
    }
}

fn to_floating_ip(ip: OpenStackFloatingIp) -> FloatingIp {
    FloatingIp {
        id: ip.id,
        ip_address: ip.ip,
        pool: ip.pool,
        node_id: ip.instance_id,
    }
}

fn compute_metadata(id: &str, name: &str, floating_ips: bool) -> ProviderMetadata {
    ProviderMetadata {
        id: id.to_string(),
        service: ServiceKind::Compute,
        name: name.to_string(),
        description: if floating_ips {
            "Compute servers with floating IP management".to_string()
        } else {
            "Compute servers".to_string()
        },
        region: None,
        features: ProviderFeatures {
            async_jobs: false,
            streaming_download: false,
            floating_ips,
        },
    }
}

// ==================== Rackspace ====================

#[async_trait]
impl ComputeDriver for RackspaceComputeDriver {
    fn id(&self) -> &'static str {
        "rackspace_compute"
    }

    fn metadata() -> ProviderMetadata {
        compute_metadata("rackspace_compute", "Rackspace Cloud Servers", false)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.api.list_nodes().await
    }
}

// ==================== OpenStack ====================

#[async_trait]
impl ComputeDriver for OpenStackComputeDriver {
    fn id(&self) -> &'static str {
        "openstack"
    }

    fn metadata() -> ProviderMetadata {
        compute_metadata("openstack", "OpenStack Compute", true)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.api.list_nodes().await
    }

    fn floating_ips(&self) -> Option<&dyn FloatingIpProvider> {
        Some(self)
    }
}

#[async_trait]
impl FloatingIpProvider for OpenStackComputeDriver {
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>> {
        let list: FloatingIpList = self.api.get("/os-floating-ips").await?;
        Ok(list.floating_ips.into_iter().map(to_floating_ip).collect())
    }

    async fn get_floating_ip(&self, ip_address: &str) -> Result<FloatingIp> {
        let mut matching: Vec<FloatingIp> = self
            .list_floating_ips()
            .await?
            .into_iter()
            .filter(|ip| ip.ip_address == ip_address)
            .collect();

        match matching.len() {
            1 => Ok(matching.remove(0)),
            0 => Err(ProviderError::FloatingIpNotFound {
                provider: self.api.provider_name().to_string(),
                ip: ip_address.to_string(),
            }),
            n => Err(self.api.parse_error(format!(
                "{n} floating IPs share the address {ip_address}"
            ))),
        }
    }

    async fn create_floating_ip(&self, pool: Option<&str>) -> Result<FloatingIp> {
        let response = self
            .api
            .post(
                "/os-floating-ips",
                &CreateFloatingIp { pool },
                ErrorContext::default(),
            )
            .await?;
        let envelope: FloatingIpEnvelope =
            response.json().map_err(|e| self.api.transport_error(e))?;

        let mut ip = to_floating_ip(envelope.floating_ip);
        // Older deployments omit the pool in the reply
        if ip.pool.is_none() {
            ip.pool = pool.map(String::from);
        }
        log::info!("[openstack] Allocated floating IP {}", ip.ip_address);
        Ok(ip)
    }

    async fn delete_floating_ip(&self, ip: &FloatingIp) -> Result<()> {
        self.api
            .execute(
                Request::delete(format!(
                    "/os-floating-ips/{}",
                    path_segment(&ip.id, "floating_ip_id", self.api.provider_name())?
                )),
                ErrorContext::floating_ip(&ip.ip_address),
            )
            .await?;
        log::info!("[openstack] Released floating IP {}", ip.ip_address);
        Ok(())
    }

    async fn attach_floating_ip(&self, node_id: &str, ip_address: &str) -> Result<()> {
        self.api
            .server_action(
                node_id,
                &ServerAction::AddFloatingIp {
                    address: ip_address,
                },
                ip_address,
            )
            .await
    }

    async fn detach_floating_ip(&self, node_id: &str, ip_address: &str) -> Result<()> {
        self.api
            .server_action(
                node_id,
                &ServerAction::RemoveFloatingIp {
                    address: ip_address,
                },
                ip_address,
            )
            .await
    }

    async fn list_floating_ip_pools(&self) -> Result<Vec<FloatingIpPool>> {
        let list: FloatingIpPoolList = self.api.get("/os-floating-ip-pools").await?;
        Ok(list.floating_ip_pools)
    }
}
