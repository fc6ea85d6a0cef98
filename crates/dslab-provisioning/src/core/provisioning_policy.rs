//! Provisioning policies.

use std::sync::Arc;

use crate::core::cloud::Cloud;
use crate::core::common::IdCounter;
use crate::core::config::options::{parse_config_value, parse_options};
use crate::core::cost_model::CostModel;
use crate::core::error::{Error, Result};
use crate::core::job::Job;
use crate::core::plan::ProvisioningPlan;
use crate::core::provisioning_policies::brute_force::BruteForce;

/// Trait for implementation of provisioning policies.
///
/// The policy is defined as a function of the cloud capacity and the job, which returns the plan: the instances to
/// provision and the assignment of job tasks to these instances. New candidate instances get their IDs from `ids`.
///
/// The policy doesn't provision anything itself, the caller applies the returned plan.
pub trait ProvisioningPolicy {
    fn run_algorithm(&self, cloud: &Cloud, job: &Job, ids: &mut IdCounter) -> Result<ProvisioningPlan>;
}

/// Creates provisioning policy from config string, e.g. `BruteForce[margin=0.5,max_search_space=10000]`.
pub fn provisioning_policy_resolver(
    config_str: &str,
    cost_model: Arc<dyn CostModel + Send + Sync>,
) -> Result<Box<dyn ProvisioningPolicy>> {
    let (policy_name, options) = parse_config_value(config_str);
    let options = parse_options(options.as_deref().unwrap_or_default());
    match policy_name.as_str() {
        "BruteForce" => Ok(Box::new(BruteForce::from_options(&options, cost_model)?)),
        _ => Err(Error::UnknownPolicy(config_str.to_string())),
    }
}
