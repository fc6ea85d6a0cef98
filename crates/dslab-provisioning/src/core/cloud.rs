//! Capacity model of public and private clouds.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::common::IdCounter;
use crate::core::instance::{Instance, InstanceType};

/// Resource capacity of a physical host in a private datacenter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostCapacity {
    pub cpus: u32,
    pub memory: u64,
}

impl HostCapacity {
    pub fn new(cpus: u32, memory: u64) -> Self {
        Self { cpus, memory }
    }

    /// Returns how many instances of the specified type fit on this host.
    ///
    /// A zero requirement doesn't limit the corresponding dimension.
    pub fn fits(&self, instance_type: &InstanceType) -> u32 {
        let by_cpu = self.cpus.checked_div(instance_type.cores).unwrap_or(u32::MAX);
        let by_memory = self
            .memory
            .checked_div(instance_type.memory)
            .map_or(u32::MAX, |count| count.min(u32::MAX as u64) as u32);
        by_cpu.min(by_memory)
    }
}

/// Elastic (on-demand) resource pool with effectively unbounded capacity.
#[derive(Clone, Debug)]
pub struct PublicDatacenter {
    pub name: String,
    pub instance_types: Vec<InstanceType>,
}

impl PublicDatacenter {
    pub fn new(name: &str, instance_types: Vec<InstanceType>) -> Self {
        Self {
            name: name.to_string(),
            instance_types,
        }
    }
}

/// Resource pool bounded by the capacity of its physical hosts.
#[derive(Clone, Debug)]
pub struct PrivateDatacenter {
    pub name: String,
    pub instance_types: Vec<InstanceType>,
    pub hosts: Vec<HostCapacity>,
}

impl PrivateDatacenter {
    pub fn new(name: &str, instance_types: Vec<InstanceType>, hosts: Vec<HostCapacity>) -> Self {
        Self {
            name: name.to_string(),
            instance_types,
            hosts,
        }
    }

    /// Returns the primary instance type used for provisioning in this datacenter.
    pub fn primary_instance_type(&self) -> Option<&InstanceType> {
        self.instance_types.first()
    }

    /// Returns the maximum number of instances of the specified type which can run in this datacenter at once.
    pub fn max_available_instances(&self, instance_type: &InstanceType) -> u32 {
        self.hosts
            .iter()
            .fold(0u32, |total, host| total.saturating_add(host.fits(instance_type)))
    }
}

/// A set of datacenters where job instances can be provisioned.
#[derive(Clone, Debug, Default)]
pub struct Cloud {
    pub public_datacenters: Vec<PublicDatacenter>,
    pub private_datacenters: Vec<PrivateDatacenter>,
}

impl Cloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_public_datacenter(&mut self, datacenter: PublicDatacenter) {
        self.public_datacenters.push(datacenter);
    }

    pub fn add_private_datacenter(&mut self, datacenter: PrivateDatacenter) {
        self.private_datacenters.push(datacenter);
    }

    /// Builds the ordered list of candidate instances for a job with `task_count` tasks.
    ///
    /// Each public datacenter contributes `task_count` instances of every its type, so that every task could run on
    /// its own instance. Each private datacenter contributes `min(task_count, max available)` instances of its
    /// primary type. Candidates are not provisioned, the caller provisions only those used by the selected plan.
    pub fn candidate_instances(&self, task_count: usize, ids: &mut IdCounter) -> Vec<Instance> {
        let mut candidates = Vec::new();
        for datacenter in &self.public_datacenters {
            for instance_type in &datacenter.instance_types {
                for _ in 0..task_count {
                    candidates.push(Instance::new(ids.next_id(), instance_type.clone()));
                }
            }
        }
        for datacenter in &self.private_datacenters {
            let Some(instance_type) = datacenter.primary_instance_type() else {
                debug!("private datacenter {} has no instance types, skipping", datacenter.name);
                continue;
            };
            let available = datacenter.max_available_instances(instance_type) as usize;
            for _ in 0..task_count.min(available) {
                candidates.push(Instance::new(ids.next_id(), instance_type.clone()));
            }
        }
        candidates
    }
}
