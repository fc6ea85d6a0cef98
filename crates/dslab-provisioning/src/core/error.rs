//! Errors reported by policies and configuration loading.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::core::common::SessionId;

/// Explains why a session could not be routed to an application server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnschedulableReason {
    /// The load balancer has no application servers at all.
    NoAppServers,
    /// Application servers exist, but all of them are either booting or terminated.
    NoRunningAppServers,
}

impl Display for UnschedulableReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            UnschedulableReason::NoAppServers => write!(f, "there are no AS servers"),
            UnschedulableReason::NoRunningAppServers => {
                write!(f, "all AS servers are either booting or terminated")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no candidate instances are available")]
    NoCapacityAvailable,

    #[error("job has no tasks")]
    EmptyJob,

    #[error("search space of {candidates}^{tasks} assignments exceeds the limit of {limit}")]
    SearchSpaceTooLarge { candidates: usize, tasks: usize, limit: u64 },

    #[error("no assignment has comparable execution time")]
    NoFeasibleAssignment,

    #[error("session {session} cannot be scheduled, as {reason}")]
    SessionUnschedulable { session: SessionId, reason: UnschedulableReason },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("can't parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("can't write CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
