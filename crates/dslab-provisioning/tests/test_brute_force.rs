use std::sync::Arc;

use rand::prelude::*;
use rand_pcg::Pcg64;

use dslab_provisioning::core::cloud::{Cloud, HostCapacity, PrivateDatacenter, PublicDatacenter};
use dslab_provisioning::core::common::IdCounter;
use dslab_provisioning::core::cost_model::{CostModel, LinearCostModel, Score, TableCostModel};
use dslab_provisioning::core::error::Error;
use dslab_provisioning::core::instance::{Instance, InstanceType};
use dslab_provisioning::core::job::{Job, Task, TaskKind};
use dslab_provisioning::core::plan::InstanceRole;
use dslab_provisioning::core::provisioning_policies::brute_force::BruteForce;
use dslab_provisioning::core::provisioning_policy::{provisioning_policy_resolver, ProvisioningPolicy};

fn instance_type(name: &str) -> InstanceType {
    InstanceType::new(name, 1, 1000., 1024, 1.)
}

fn map_task(id: u32) -> Task {
    Task::new(id, TaskKind::Map, 1000.)
}

fn reduce_task(id: u32) -> Task {
    Task::new(id, TaskKind::Reduce, 1000.)
}

// Two instances ("fast" and "cheap") and two tasks, all four assignments:
// [a, a] -> time 5, cost 18
// [a, b] -> time 5, cost 12
// [b, a] -> time 7, cost 11
// [b, b] -> time 7, cost 5
fn two_by_two() -> (Vec<Instance>, Vec<Task>, TableCostModel) {
    let candidates = vec![
        Instance::new(10, instance_type("fast")),
        Instance::new(11, instance_type("cheap")),
    ];
    let tasks = vec![map_task(1), reduce_task(2)];
    let model = TableCostModel::new()
        .with(1, "fast", 2., 10.)
        .with(1, "cheap", 4., 3.)
        .with(2, "fast", 3., 8.)
        .with(2, "cheap", 3., 2.);
    (candidates, tasks, model)
}

#[test]
// The fastest assignments are [a, a] and [a, b], the cheaper of them wins.
fn test_selects_cheapest_of_fastest() {
    let (candidates, tasks, model) = two_by_two();
    let policy = BruteForce::new(Arc::new(model));
    let plan = policy.optimize(&candidates, &tasks).unwrap();

    assert_eq!(plan.instance_for(1), Some(10));
    assert_eq!(plan.instance_for(2), Some(11));
    assert_eq!(plan.score, Score::new(5., 12.));
    assert_eq!(plan.evaluated_candidates, 4);
    assert_eq!(
        plan.map_and_reduce_instances.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![10]
    );
    assert_eq!(plan.reduce_only_instances.iter().map(|i| i.id).collect::<Vec<_>>(), vec![11]);
}

#[test]
// With a margin covering all assignments the cheapest one overall is selected.
fn test_margin_widens_cost_comparison() {
    let (candidates, tasks, model) = two_by_two();
    let policy = BruteForce::new(Arc::new(model)).with_margin(2.);
    let plan = policy.optimize(&candidates, &tasks).unwrap();

    assert_eq!(plan.instance_for(1), Some(11));
    assert_eq!(plan.instance_for(2), Some(11));
    assert_eq!(plan.score, Score::new(7., 5.));
    assert_eq!(plan.instance_ids(), vec![11]);
    assert!(plan.reduce_only_instances.is_empty());

    // a margin below the time gap keeps the exact minimum
    let (candidates, tasks, model) = two_by_two();
    let plan = BruteForce::new(Arc::new(model))
        .with_margin(1.9)
        .optimize(&candidates, &tasks)
        .unwrap();
    assert_eq!(plan.score, Score::new(5., 12.));
}

#[test]
// Identical candidates give equal scores, the first enumerated assignment wins.
fn test_first_enumerated_wins_ties() {
    let candidates = vec![
        Instance::new(1, instance_type("fast")),
        Instance::new(2, instance_type("fast")),
    ];
    let tasks = vec![map_task(5), map_task(6), reduce_task(7)];
    let model = TableCostModel::new()
        .with(5, "fast", 1., 1.)
        .with(6, "fast", 1., 1.)
        .with(7, "fast", 1., 1.);
    let plan = BruteForce::new(Arc::new(model)).optimize(&candidates, &tasks).unwrap();

    assert!(plan.scheduling_plan.values().all(|&instance| instance == 1));
    assert_eq!(plan.instance_ids(), vec![1]);
    assert_eq!(plan.evaluated_candidates, 8);
}

#[test]
// An instance hosting a map task is never reported as reduce-only, whatever the task order.
fn test_map_task_presence_takes_priority() {
    let candidates = vec![
        Instance::new(1, instance_type("shared")),
        Instance::new(2, instance_type("other")),
    ];
    let tasks = vec![reduce_task(1), map_task(2), reduce_task(3)];
    let model = TableCostModel::new()
        .with(1, "shared", 1., 1.)
        .with(2, "shared", 1., 1.)
        .with(3, "other", 1., 1.)
        .with(1, "other", 2., 1.)
        .with(2, "other", 2., 1.)
        .with(3, "shared", 2., 1.);
    let plan = BruteForce::new(Arc::new(model)).optimize(&candidates, &tasks).unwrap();

    assert_eq!(plan.instance_for(1), Some(1));
    assert_eq!(plan.instance_for(2), Some(1));
    assert_eq!(plan.instance_for(3), Some(2));
    assert_eq!(plan.role_of(1), Some(InstanceRole::MapAndReduce));
    assert_eq!(plan.role_of(2), Some(InstanceRole::ReduceOnly));
    assert_eq!(plan.map_and_reduce_instances.len(), 1);
    assert_eq!(plan.reduce_only_instances.len(), 1);
}

#[test]
fn test_errors() {
    let (candidates, tasks, model) = two_by_two();
    let model = Arc::new(model);

    let policy = BruteForce::new(model.clone());
    assert!(matches!(policy.optimize(&[], &tasks), Err(Error::NoCapacityAvailable)));
    assert!(matches!(policy.optimize(&candidates, &[]), Err(Error::EmptyJob)));

    let policy = BruteForce::new(model.clone()).with_max_search_space(3);
    assert!(matches!(
        policy.optimize(&candidates, &tasks),
        Err(Error::SearchSpaceTooLarge {
            candidates: 2,
            tasks: 2,
            limit: 3
        })
    ));
    let policy = BruteForce::new(model.clone()).with_max_search_space(4);
    assert!(policy.optimize(&candidates, &tasks).is_ok());

    let policy = BruteForce::new(model.clone()).with_margin(-1.);
    assert!(matches!(
        policy.optimize(&candidates, &tasks),
        Err(Error::InvalidConfiguration(_))
    ));
    let policy = BruteForce::new(model.clone()).with_workers(0);
    assert!(matches!(
        policy.optimize(&candidates, &tasks),
        Err(Error::InvalidConfiguration(_))
    ));
}

#[test]
fn test_huge_search_space_is_rejected() {
    let candidates: Vec<Instance> = (0..100).map(|i| Instance::new(i, instance_type("t"))).collect();
    let tasks: Vec<Task> = (0..20).map(map_task).collect();
    let policy = BruteForce::new(Arc::new(LinearCostModel::new())).with_max_search_space(u64::MAX);
    assert!(matches!(
        policy.optimize(&candidates, &tasks),
        Err(Error::SearchSpaceTooLarge { .. })
    ));
}

fn random_fixture(rng: &mut Pcg64, n: usize, r: usize) -> (Vec<Instance>, Vec<Task>, TableCostModel) {
    let types = ["a", "b", "c", "d"];
    let candidates: Vec<Instance> = (0..n)
        .map(|i| Instance::new(100 + i as u32, instance_type(types[rng.gen_range(0..types.len())])))
        .collect();
    let tasks: Vec<Task> = (0..r)
        .map(|i| {
            if rng.gen_bool(0.5) {
                map_task(i as u32)
            } else {
                reduce_task(i as u32)
            }
        })
        .collect();
    let mut model = TableCostModel::new();
    for task in &tasks {
        for t in types {
            // small integers produce plenty of ties
            model.set(task.id, t, rng.gen_range(1..5u32) as f64, rng.gen_range(1..5u32) as f64);
        }
    }
    (candidates, tasks, model)
}

// Straightforward recursive search over all assignments in lexicographic order.
fn best_by_recursion(
    model: &dyn CostModel,
    candidates: &[Instance],
    tasks: &[Task],
    prefix: &mut Vec<usize>,
    best: &mut Option<(Vec<usize>, Score)>,
) {
    if prefix.len() == tasks.len() {
        let assignment: Vec<&Instance> = prefix.iter().map(|&i| &candidates[i]).collect();
        let score = model.score(tasks, &assignment);
        let better = match best {
            None => true,
            Some((_, current)) => {
                score.execution_time < current.execution_time
                    || (score.execution_time == current.execution_time && score.cost < current.cost)
            }
        };
        if better {
            *best = Some((prefix.clone(), score));
        }
        return;
    }
    for i in 0..candidates.len() {
        prefix.push(i);
        best_by_recursion(model, candidates, tasks, prefix, best);
        prefix.pop();
    }
}

#[test]
// Cross-checks the selected plan against an independent exhaustive search.
fn test_matches_recursive_search() {
    let mut rng = Pcg64::seed_from_u64(123);
    for _ in 0..50 {
        let n: usize = rng.gen_range(1..5);
        let r: usize = rng.gen_range(1..5);
        let (candidates, tasks, model) = random_fixture(&mut rng, n, r);

        let mut best = None;
        best_by_recursion(&model, &candidates, &tasks, &mut Vec::new(), &mut best);
        let (expected, expected_score) = best.unwrap();

        let plan = BruteForce::new(Arc::new(model)).optimize(&candidates, &tasks).unwrap();
        assert_eq!(plan.score, expected_score);
        assert_eq!(plan.evaluated_candidates, (n as u64).pow(r as u32));
        for (task, &i) in tasks.iter().zip(expected.iter()) {
            assert_eq!(plan.instance_for(task.id), Some(candidates[i].id));
        }

        // every task is assigned exactly once, only to candidates, and the pools partition the used instances
        assert_eq!(plan.scheduling_plan.len(), tasks.len());
        let mut used: Vec<u32> = plan.scheduling_plan.values().copied().collect();
        used.sort();
        used.dedup();
        let mut pooled = plan.instance_ids();
        pooled.sort();
        assert_eq!(used, pooled);
        assert!(used.iter().all(|id| candidates.iter().any(|c| c.id == *id)));
    }
}

#[test]
fn test_parallel_scoring_matches_sequential() {
    let mut rng = Pcg64::seed_from_u64(7);
    for workers in [2, 3, 8] {
        let (candidates, tasks, model) = random_fixture(&mut rng, 3, 5);
        let model = Arc::new(model);
        let sequential = BruteForce::new(model.clone()).optimize(&candidates, &tasks).unwrap();
        let parallel = BruteForce::new(model.clone())
            .with_workers(workers)
            .optimize(&candidates, &tasks)
            .unwrap();
        assert_eq!(parallel.scheduling_plan, sequential.scheduling_plan);
        assert_eq!(parallel.score, sequential.score);
        assert_eq!(parallel.evaluated_candidates, 243);
    }
}

fn test_cloud() -> Cloud {
    let mut cloud = Cloud::new();
    cloud.add_public_datacenter(PublicDatacenter::new(
        "public",
        vec![
            InstanceType::new("small", 1, 1000., 1024, 0.1),
            InstanceType::new("large", 4, 1000., 4096, 0.5),
        ],
    ));
    cloud.add_private_datacenter(PrivateDatacenter::new(
        "private",
        vec![InstanceType::new("local", 2, 1000., 2048, 0.)],
        vec![HostCapacity::new(3, 8192)],
    ));
    cloud
}

fn test_job(ids: &mut IdCounter) -> Job {
    let mut job = Job::new(ids.next_id());
    job.add_map_task(ids.next_id(), 8000.);
    job.add_reduce_task(ids.next_id(), 4000.);
    job
}

#[test]
// Candidates: 2 small, 2 large (public) and 1 local (private host fits only one), 5^2 assignments.
// Both tasks run fastest on a large instance: 8000 / 4000 + 4000 / 4000 = 3 seconds.
fn test_run_algorithm_on_cloud() {
    let cloud = test_cloud();
    let mut ids = IdCounter::new();
    let job = test_job(&mut ids);
    let first_candidate = ids.clone().next_id();

    let policy = BruteForce::new(Arc::new(LinearCostModel::new()));
    let plan = policy.run_algorithm(&cloud, &job, &mut ids).unwrap();

    assert_eq!(plan.evaluated_candidates, 25);
    assert_eq!(plan.score.execution_time, 3.);
    assert!((plan.score.cost - 3. / 3600. * 0.5).abs() < 1e-12);
    // the first large candidate hosts both tasks
    let large = first_candidate + 2;
    assert_eq!(plan.instance_for(job.map_tasks[0].id), Some(large));
    assert_eq!(plan.instance_for(job.reduce_tasks[0].id), Some(large));
    assert_eq!(plan.map_and_reduce_instances.len(), 1);
    assert_eq!(plan.map_and_reduce_instances[0].instance_type.name, "large");
    assert!(plan.reduce_only_instances.is_empty());
}

#[test]
// The free private instance is twice slower (6 seconds), a margin of 3 makes it eligible and it wins by cost.
fn test_run_algorithm_with_margin_prefers_free_private_instance() {
    let cloud = test_cloud();
    let mut ids = IdCounter::new();
    let job = test_job(&mut ids);

    let policy = provisioning_policy_resolver("BruteForce[margin=3]", Arc::new(LinearCostModel::new())).unwrap();
    let plan = policy.run_algorithm(&cloud, &job, &mut ids).unwrap();

    assert_eq!(plan.score, Score::new(6., 0.));
    assert_eq!(plan.instance_ids().len(), 1);
    assert_eq!(plan.map_and_reduce_instances[0].instance_type.name, "local");
}

#[test]
fn test_run_algorithm_without_capacity() {
    let mut ids = IdCounter::new();
    let job = test_job(&mut ids);
    let policy = BruteForce::new(Arc::new(LinearCostModel::new()));

    assert!(matches!(
        policy.run_algorithm(&Cloud::new(), &job, &mut ids),
        Err(Error::NoCapacityAvailable)
    ));
    assert!(matches!(
        policy.run_algorithm(&test_cloud(), &Job::new(0), &mut ids),
        Err(Error::EmptyJob)
    ));
}

#[test]
fn test_policy_resolver() {
    let model = Arc::new(LinearCostModel::new());
    assert!(provisioning_policy_resolver("BruteForce", model.clone()).is_ok());
    assert!(provisioning_policy_resolver("BruteForce[margin=0.5,max_search_space=100,workers=2]", model.clone()).is_ok());
    assert!(matches!(
        provisioning_policy_resolver("BruteForce[margin=-1]", model.clone()),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        provisioning_policy_resolver("BruteForce[margin=abc]", model.clone()),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        provisioning_policy_resolver("Greedy", model),
        Err(Error::UnknownPolicy(_))
    ));
}

#[test]
fn test_save_csv() {
    let (candidates, tasks, model) = two_by_two();
    let plan = BruteForce::new(Arc::new(model)).optimize(&candidates, &tasks).unwrap();
    let path = std::env::temp_dir().join("dslab_provisioning_plan.csv");
    plan.save_csv(path.to_str().unwrap()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "task,kind,instance,instance_type,role");
    assert_eq!(lines[1], "1,Map,10,fast,map_and_reduce");
    assert_eq!(lines[2], "2,Reduce,11,cheap,reduce_only");
    std::fs::remove_file(path).unwrap();
}
