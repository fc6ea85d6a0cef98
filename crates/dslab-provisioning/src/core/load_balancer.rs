//! Web session load balancers.

use std::collections::BTreeSet;

use crate::core::common::{DbBalancerId, InstanceId, SessionId};
use crate::core::config::options::{parse_config_value, parse_option, parse_options};
use crate::core::error::{Error, Result};
use crate::core::instance::Instance;
use crate::core::load_balancers::compress::CompressLoadBalancer;
use crate::core::session::Session;

/// Outcome of routing a batch of sessions.
#[derive(Debug, Default)]
pub struct AssignmentReport {
    /// Sessions assigned in this batch and their application servers.
    pub assigned: Vec<(SessionId, InstanceId)>,
    /// Sessions left unassigned, as [`Error::SessionUnschedulable`].
    pub failures: Vec<Error>,
}

impl AssignmentReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Trait for implementation of load balancers.
///
/// The load balancer routes sessions without an application server to one of `app_servers`. `used_servers` holds
/// IDs of servers which already host sessions. Both are snapshots provided by the caller and are not updated while
/// a batch is processed. A session which can't be routed is left unassigned and reported, the rest of the batch is
/// still processed.
pub trait LoadBalancer {
    fn assign_to_servers(
        &self,
        app_servers: &[Instance],
        used_servers: &BTreeSet<InstanceId>,
        sessions: &mut [Session],
    ) -> AssignmentReport;

    /// Returns the database balancer assigned to sessions which don't have one.
    fn db_balancer(&self) -> DbBalancerId;
}

/// Creates load balancer from config string, e.g. `Compress[cpu_threshold=0.8,ram_threshold=0.8]`.
pub fn load_balancer_resolver(config_str: &str, name: &str, db_balancer: DbBalancerId) -> Result<Box<dyn LoadBalancer>> {
    let (balancer_name, options) = parse_config_value(config_str);
    let options = parse_options(options.as_deref().unwrap_or_default());
    match balancer_name.as_str() {
        "Compress" => {
            let cpu_threshold = parse_option(&options, "cpu_threshold")?
                .ok_or_else(|| Error::InvalidConfiguration("cpu_threshold is required".to_string()))?;
            let ram_threshold = parse_option(&options, "ram_threshold")?
                .ok_or_else(|| Error::InvalidConfiguration("ram_threshold is required".to_string()))?;
            Ok(Box::new(CompressLoadBalancer::new(
                name,
                db_balancer,
                cpu_threshold,
                ram_threshold,
            )?))
        }
        _ => Err(Error::UnknownPolicy(config_str.to_string())),
    }
}
