use std::collections::BTreeSet;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{error, info};
use rand::prelude::*;
use rand_pcg::Pcg64;

use dslab_provisioning::core::common::IdCounter;
use dslab_provisioning::core::config::provisioning_config::ProvisioningConfig;
use dslab_provisioning::core::cost_model::LinearCostModel;
use dslab_provisioning::core::error::Result;
use dslab_provisioning::core::instance::{Instance, InstanceStatus, InstanceType};
use dslab_provisioning::core::job::Job;
use dslab_provisioning::core::load_balancer::load_balancer_resolver;
use dslab_provisioning::core::provisioning_policy::provisioning_policy_resolver;
use dslab_provisioning::core::session::Session;

/// Provisions a random MapReduce job and routes a batch of web sessions
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to provisioning config
    #[clap(long, default_value = "config.yaml")]
    config: String,

    /// Number of map tasks
    #[clap(long, default_value_t = 2)]
    map_tasks: usize,

    /// Number of reduce tasks
    #[clap(long, default_value_t = 1)]
    reduce_tasks: usize,

    /// Number of application servers
    #[clap(long, default_value_t = 4)]
    servers: u32,

    /// Number of sessions in the batch
    #[clap(long, default_value_t = 10)]
    sessions: u32,

    /// Random seed
    #[clap(long, default_value_t = 123)]
    seed: u64,

    /// Save the provisioning plan to this CSV file
    #[clap(long)]
    plan_csv: Option<String>,
}

fn provision_job(config: &ProvisioningConfig, args: &Args, rng: &mut Pcg64, ids: &mut IdCounter) -> Result<()> {
    let cloud = config.build_cloud();
    let policy = provisioning_policy_resolver(&config.provisioning_policy, Arc::new(LinearCostModel::new()))?;

    let mut job = Job::new(ids.next_id());
    for _ in 0..args.map_tasks {
        job.add_map_task(ids.next_id(), rng.gen_range(1000. ..50000.));
    }
    for _ in 0..args.reduce_tasks {
        job.add_reduce_task(ids.next_id(), rng.gen_range(1000. ..20000.));
    }

    let plan = policy.run_algorithm(&cloud, &job, ids)?;
    for task in job.tasks() {
        info!(
            "{} task {} (length {:.0}) -> instance {}",
            task.kind,
            task.id,
            task.length,
            plan.instance_for(task.id).unwrap_or_default()
        );
    }
    for instance in plan.map_and_reduce_instances.iter() {
        info!("provision {} for map and reduce tasks", instance);
    }
    for instance in plan.reduce_only_instances.iter() {
        info!("provision {} for reduce tasks only", instance);
    }
    info!(
        "execution time {:.3} s, cost {:.5}, {} assignments evaluated",
        plan.score.execution_time, plan.score.cost, plan.evaluated_candidates
    );
    if let Some(path) = &args.plan_csv {
        plan.save_csv(path)?;
    }
    Ok(())
}

fn route_sessions(config: &ProvisioningConfig, args: &Args, rng: &mut Pcg64, ids: &mut IdCounter) -> Result<()> {
    let db_balancer = ids.next_id();
    let load_balancer = load_balancer_resolver(&config.load_balancer, "web", db_balancer)?;

    let server_type = InstanceType::new("app-server", 2, 1000., 4096, 0.1);
    let mut used_servers = BTreeSet::new();
    let servers: Vec<Instance> = (0..args.servers)
        .map(|_| {
            let server = Instance::new(ids.next_id(), server_type.clone())
                .with_status(if rng.gen_bool(0.8) {
                    InstanceStatus::Running
                } else {
                    InstanceStatus::Booting
                })
                .with_load(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            if rng.gen_bool(0.5) {
                used_servers.insert(server.id);
            }
            server
        })
        .collect();

    let mut sessions: Vec<Session> = (0..args.sessions).map(|_| Session::new(ids.next_id())).collect();
    let report = load_balancer.assign_to_servers(&servers, &used_servers, &mut sessions);
    info!(
        "{} sessions assigned, {} unschedulable",
        report.assigned.len(),
        report.failures.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let args = Args::parse();
    let config = match ProvisioningConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("can't load config {}: {}", args.config, e);
            return ExitCode::FAILURE;
        }
    };

    let mut rng = Pcg64::seed_from_u64(args.seed);
    let mut ids = IdCounter::new();
    if let Err(e) = provision_job(&config, &args, &mut rng, &mut ids) {
        error!("provisioning failed: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = route_sessions(&config, &args, &mut rng, &mut ids) {
        error!("routing failed: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
