//! Models estimating execution time and cost of tasks on instances.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::common::TaskId;
use crate::core::instance::Instance;
use crate::core::job::Task;

/// Aggregate execution time and cost of a task assignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Score {
    pub execution_time: f64,
    pub cost: f64,
}

impl Score {
    pub fn new(execution_time: f64, cost: f64) -> Self {
        Self { execution_time, cost }
    }
}

/// Estimates how long a task runs on an instance and how much it costs.
///
/// The provisioning policies use this trait to score candidate assignments. Scoring is a pure function of the
/// candidate: implementations must not depend on any assignment installed elsewhere, so that candidates can be
/// scored in any order or in parallel.
pub trait CostModel {
    fn task_time(&self, task: &Task, instance: &Instance) -> f64;

    fn task_cost(&self, task: &Task, instance: &Instance) -> f64;

    /// Scores a full assignment, where `assignment[i]` is the instance running `tasks[i]`.
    fn score(&self, tasks: &[Task], assignment: &[&Instance]) -> Score {
        let mut score = Score::default();
        for (task, instance) in tasks.iter().zip(assignment.iter()) {
            score.execution_time += self.task_time(task, instance);
            score.cost += self.task_cost(task, instance);
        }
        score
    }
}

/// Time is proportional to task length and inversely proportional to instance speed,
/// cost is the running time billed at the hourly instance price.
#[derive(Clone, Debug, Default)]
pub struct LinearCostModel {}

impl LinearCostModel {
    pub fn new() -> Self {
        Self {}
    }
}

impl CostModel for LinearCostModel {
    fn task_time(&self, task: &Task, instance: &Instance) -> f64 {
        let instance_type = &instance.instance_type;
        task.length / (instance_type.mips * instance_type.cores as f64)
    }

    fn task_cost(&self, task: &Task, instance: &Instance) -> f64 {
        self.task_time(task, instance) / 3600. * instance.instance_type.cost_per_hour
    }
}

/// Cost model backed by precomputed (time, cost) values for pairs of task and instance type.
///
/// Pairs without a value are scored with infinite time and cost.
#[derive(Clone, Debug, Default)]
pub struct TableCostModel {
    values: HashMap<(TaskId, String), (f64, f64)>,
}

impl TableCostModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, task: TaskId, instance_type: &str, time: f64, cost: f64) {
        self.values.insert((task, instance_type.to_string()), (time, cost));
    }

    pub fn with(mut self, task: TaskId, instance_type: &str, time: f64, cost: f64) -> Self {
        self.set(task, instance_type, time, cost);
        self
    }

    fn get(&self, task: &Task, instance: &Instance) -> (f64, f64) {
        self.values
            .get(&(task.id, instance.instance_type.name.clone()))
            .copied()
            .unwrap_or((f64::INFINITY, f64::INFINITY))
    }
}

impl CostModel for TableCostModel {
    fn task_time(&self, task: &Task, instance: &Instance) -> f64 {
        self.get(task, instance).0
    }

    fn task_cost(&self, task: &Task, instance: &Instance) -> f64 {
        self.get(task, instance).1
    }
}
