use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::providers::common::deserialize_id;
use crate::types::FloatingIpPool;

// ============ Servers ============

#[derive(Debug, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub servers: Vec<OpenStackServer>,
}

#[derive(Debug, Deserialize)]
pub struct OpenStackServer {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    /// Network name to addresses
    #[serde(default)]
    pub addresses: HashMap<String, Vec<ServerAddress>>,
}

/// v1.0 lists bare strings, v1.1 objects with `addr`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ServerAddress {
    Plain(String),
    Detailed { addr: String },
}

impl ServerAddress {
    pub fn into_addr(self) -> String {
        match self {
            Self::Plain(addr) | Self::Detailed { addr } => addr,
        }
    }
}

// ============ Floating IPs ============

#[derive(Debug, Deserialize)]
pub struct FloatingIpList {
    #[serde(default)]
    pub floating_ips: Vec<OpenStackFloatingIp>,
}

#[derive(Debug, Deserialize)]
pub struct FloatingIpEnvelope {
    pub floating_ip: OpenStackFloatingIp,
}

#[derive(Debug, Deserialize)]
pub struct OpenStackFloatingIp {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub ip: String,
    pub instance_id: Option<String>,
    pub pool: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FloatingIpPoolList {
    #[serde(default)]
    pub floating_ip_pools: Vec<FloatingIpPool>,
}

#[derive(Debug, Serialize)]
pub struct CreateFloatingIp<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<&'a str>,
}

/// `POST /servers/{id}/action` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerAction<'a> {
    AddFloatingIp { address: &'a str },
    RemoveFloatingIp { address: &'a str },
}
