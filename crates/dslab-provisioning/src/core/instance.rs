//! Representations of compute instance, its type and status.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::common::InstanceId;

/// Status of instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InstanceStatus {
    Booting,
    Running,
    Terminated,
}

impl Display for InstanceStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            InstanceStatus::Booting => write!(f, "booting"),
            InstanceStatus::Running => write!(f, "running"),
            InstanceStatus::Terminated => write!(f, "terminated"),
        }
    }
}

/// Describes a class of instances offered by a datacenter: capacity and price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceType {
    /// Type name, unique within a datacenter.
    pub name: String,
    /// Number of virtual cores.
    pub cores: u32,
    /// Speed of a single core in MIPS.
    pub mips: f64,
    /// Memory amount in MB.
    pub memory: u64,
    /// Price of running one instance for an hour.
    pub cost_per_hour: f64,
}

impl InstanceType {
    pub fn new(name: &str, cores: u32, mips: f64, memory: u64, cost_per_hour: f64) -> Self {
        Self {
            name: name.to_string(),
            cores,
            mips,
            memory,
            cost_per_hour,
        }
    }
}

/// Represents compute instance (VM).
///
// An instance is either a provisioning candidate created by a provisioning policy, or an already running server
// owned by the simulation. Loads are fractions in [0, 1] reported by the monitoring of the surrounding simulation;
// policies only read them.
#[derive(Clone, Debug, Serialize)]
pub struct Instance {
    pub id: InstanceId,
    pub instance_type: InstanceType,
    pub status: InstanceStatus,
    pub cpu_load: f64,
    pub memory_load: f64,
    pub out_of_memory: bool,
}

impl Instance {
    /// Creates a booting instance of the specified type with zero load.
    pub fn new(id: InstanceId, instance_type: InstanceType) -> Self {
        Self {
            id,
            instance_type,
            status: InstanceStatus::Booting,
            cpu_load: 0.,
            memory_load: 0.,
            out_of_memory: false,
        }
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_load(mut self, cpu_load: f64, memory_load: f64) -> Self {
        self.cpu_load = cpu_load;
        self.memory_load = memory_load;
        self
    }

    pub fn with_out_of_memory(mut self, out_of_memory: bool) -> Self {
        self.out_of_memory = out_of_memory;
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == InstanceStatus::Running
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "instance#{}({})", self.id, self.instance_type.name)
    }
}
