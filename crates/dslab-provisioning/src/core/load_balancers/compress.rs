//! Load balancer compressing the load into the smallest number of servers.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::Level::Debug;
use log::{debug, error, info, log_enabled};

use crate::core::common::{DbBalancerId, InstanceId};
use crate::core::error::{Error, Result, UnschedulableReason};
use crate::core::instance::Instance;
use crate::core::load_balancer::{AssignmentReport, LoadBalancer};
use crate::core::session::Session;

/// Routes sessions to the most loaded running server whose utilization is below the thresholds.
///
/// Servers already hosting sessions are preferred over free ones, so the load is packed onto as few servers as
/// possible. If no server is below the thresholds, the least preferred server is used rather than dropping the
/// session.
///
/// All sessions of a batch are ranked against the same snapshot of server loads and used servers, so several
/// sessions of one batch may land on the same server even if its updated load would exceed the thresholds.
pub struct CompressLoadBalancer {
    name: String,
    db_balancer: DbBalancerId,
    cpu_threshold: f64,
    ram_threshold: f64,
}

impl CompressLoadBalancer {
    /// Creates load balancer. Both thresholds must be in [0, 1].
    pub fn new(name: &str, db_balancer: DbBalancerId, cpu_threshold: f64, ram_threshold: f64) -> Result<Self> {
        for (threshold_name, value) in [("cpu_threshold", cpu_threshold), ("ram_threshold", ram_threshold)] {
            if !(0. ..=1.).contains(&value) {
                return Err(Error::InvalidConfiguration(format!(
                    "{} must be in [0, 1], got {}",
                    threshold_name, value
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            db_balancer,
            cpu_threshold,
            ram_threshold,
        })
    }

    pub fn cpu_threshold(&self) -> f64 {
        self.cpu_threshold
    }

    pub fn ram_threshold(&self) -> f64 {
        self.ram_threshold
    }

    /// Orders servers by preference: used servers by descending CPU load, then free servers in their original order.
    pub fn rank_servers<'a>(servers: &[&'a Instance], used_servers: &BTreeSet<InstanceId>) -> Vec<&'a Instance> {
        let mut ranked = servers.to_vec();
        ranked.sort_by(|a, b| compare_servers(a, b, used_servers));
        ranked
    }

    /// Returns the first ranked server below the thresholds, or the last ranked one if there is no such server.
    fn select_server<'a>(&self, ranked: &[&'a Instance]) -> Option<&'a Instance> {
        ranked
            .iter()
            .find(|server| {
                server.cpu_load < self.cpu_threshold && server.memory_load < self.ram_threshold && !server.out_of_memory
            })
            .or_else(|| ranked.last())
            .copied()
    }

    fn describe_candidates(ranked: &[&Instance], used_servers: &BTreeSet<InstanceId>) -> String {
        ranked
            .iter()
            .map(|server| {
                format!(
                    "{}[{}{}] cpu({:.2}), ram({:.2})",
                    server,
                    if used_servers.contains(&server.id) { "" } else { "FREE, " },
                    server.status,
                    server.cpu_load,
                    server.memory_load
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn compare_servers(a: &Instance, b: &Instance, used_servers: &BTreeSet<InstanceId>) -> Ordering {
    match (used_servers.contains(&a.id), used_servers.contains(&b.id)) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => b.cpu_load.total_cmp(&a.cpu_load),
    }
}

impl LoadBalancer for CompressLoadBalancer {
    fn assign_to_servers(
        &self,
        app_servers: &[Instance],
        used_servers: &BTreeSet<InstanceId>,
        sessions: &mut [Session],
    ) -> AssignmentReport {
        let mut report = AssignmentReport::default();
        let running: Vec<&Instance> = app_servers.iter().filter(|server| server.is_running()).collect();

        if running.is_empty() {
            let reason = if app_servers.is_empty() {
                UnschedulableReason::NoAppServers
            } else {
                UnschedulableReason::NoRunningAppServers
            };
            for session in sessions.iter().filter(|session| !session.is_assigned()) {
                error!(
                    "[Load Balancer]({}): session {} cannot be scheduled, as {}",
                    self.name, session.id, reason
                );
                report.failures.push(Error::SessionUnschedulable {
                    session: session.id,
                    reason,
                });
            }
            return report;
        }

        let ranked = Self::rank_servers(&running, used_servers);
        if log_enabled!(Debug) {
            debug!(
                "[Load Balancer]({}), candidate servers: {}",
                self.name,
                Self::describe_candidates(&ranked, used_servers)
            );
        }

        for session in sessions.iter_mut().filter(|session| !session.is_assigned()) {
            let Some(server) = self.select_server(&ranked) else {
                continue;
            };
            session.app_server = Some(server.id);
            report.assigned.push((session.id, server.id));
            info!(
                "[Load Balancer]({}): assigning session {} to {}[{}] cpu({:.2}), ram({:.2})",
                self.name, session.id, server, server.status, server.cpu_load, server.memory_load
            );
        }

        for session in sessions.iter_mut() {
            if session.db_balancer.is_none() {
                session.db_balancer = Some(self.db_balancer);
            }
        }
        report
    }

    fn db_balancer(&self) -> DbBalancerId {
        self.db_balancer
    }
}
