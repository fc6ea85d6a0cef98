//! Provisioning configuration.

use serde::{Deserialize, Serialize};

use crate::core::cloud::{Cloud, HostCapacity, PrivateDatacenter, PublicDatacenter};
use crate::core::error::Result;
use crate::core::instance::InstanceType;

pub const DEFAULT_PROVISIONING_POLICY: &str = "BruteForce";
pub const DEFAULT_LOAD_BALANCER: &str = "Compress[cpu_threshold=0.8,ram_threshold=0.8]";

/// Holds raw provisioning config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawProvisioningConfig {
    pub provisioning_policy: Option<String>,
    pub load_balancer: Option<String>,
    pub public_datacenters: Option<Vec<PublicDatacenterConfig>>,
    pub private_datacenters: Option<Vec<PrivateDatacenterConfig>>,
}

/// Holds configuration of an elastic datacenter.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PublicDatacenterConfig {
    /// Datacenter name.
    pub name: String,
    /// Offered instance types.
    pub instance_types: Vec<InstanceType>,
}

/// Holds configuration of a single physical host or a set of identical hosts.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host CPU capacity.
    pub cpus: u32,
    /// Host memory capacity in MB.
    pub memory: u64,
    /// Number of such hosts.
    pub count: Option<u32>,
}

/// Holds configuration of a datacenter bounded by its hosts capacity.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PrivateDatacenterConfig {
    /// Datacenter name.
    pub name: String,
    /// Offered instance types, the first one is used for provisioning.
    pub instance_types: Vec<InstanceType>,
    /// Configurations of physical hosts.
    pub hosts: Vec<HostConfig>,
}

/// Represents provisioning configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ProvisioningConfig {
    /// Provisioning policy config string, e.g. `BruteForce[margin=0.5]`.
    pub provisioning_policy: String,
    /// Load balancer config string, e.g. `Compress[cpu_threshold=0.8,ram_threshold=0.8]`.
    pub load_balancer: String,
    /// Configurations of elastic datacenters.
    pub public_datacenters: Vec<PublicDatacenterConfig>,
    /// Configurations of bounded datacenters.
    pub private_datacenters: Vec<PrivateDatacenterConfig>,
}

impl ProvisioningConfig {
    /// Creates provisioning config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(file_name)?)
    }

    /// Creates provisioning config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawProvisioningConfig = serde_yaml::from_str(yaml)?;
        Ok(Self {
            provisioning_policy: raw
                .provisioning_policy
                .unwrap_or_else(|| DEFAULT_PROVISIONING_POLICY.to_string()),
            load_balancer: raw.load_balancer.unwrap_or_else(|| DEFAULT_LOAD_BALANCER.to_string()),
            public_datacenters: raw.public_datacenters.unwrap_or_default(),
            private_datacenters: raw.private_datacenters.unwrap_or_default(),
        })
    }

    /// Builds cloud capacity model described by this config.
    pub fn build_cloud(&self) -> Cloud {
        let mut cloud = Cloud::new();
        for datacenter in &self.public_datacenters {
            cloud.add_public_datacenter(PublicDatacenter::new(
                &datacenter.name,
                datacenter.instance_types.clone(),
            ));
        }
        for datacenter in &self.private_datacenters {
            let hosts = datacenter
                .hosts
                .iter()
                .flat_map(|host| (0..host.count.unwrap_or(1)).map(|_| HostCapacity::new(host.cpus, host.memory)))
                .collect();
            cloud.add_private_datacenter(PrivateDatacenter::new(
                &datacenter.name,
                datacenter.instance_types.clone(),
                hosts,
            ));
        }
        cloud
    }
}
