//! Provisioning plan produced by provisioning policies.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::common::{InstanceId, TaskId};
use crate::core::cost_model::Score;
use crate::core::error::Result;
use crate::core::instance::Instance;
use crate::core::job::{Task, TaskKind};

/// Role of a provisioned instance in the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InstanceRole {
    /// Instance hosts at least one map task (and possibly reduce tasks).
    MapAndReduce,
    /// Instance hosts reduce tasks only.
    ReduceOnly,
}

impl Display for InstanceRole {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            InstanceRole::MapAndReduce => write!(f, "map_and_reduce"),
            InstanceRole::ReduceOnly => write!(f, "reduce_only"),
        }
    }
}

/// Classifies instances used by an assignment in a single pass, where `assignment[i]` runs `tasks[i]`.
///
/// The result preserves the order in which instances are first used. An instance hosting any map task is
/// classified as [`InstanceRole::MapAndReduce`] regardless of the order of tasks.
pub fn classify_instances(tasks: &[Task], assignment: &[&Instance]) -> IndexMap<InstanceId, InstanceRole> {
    let mut roles = IndexMap::new();
    for (task, instance) in tasks.iter().zip(assignment.iter()) {
        let role = roles.entry(instance.id).or_insert(InstanceRole::ReduceOnly);
        if task.kind == TaskKind::Map {
            *role = InstanceRole::MapAndReduce;
        }
    }
    roles
}

#[derive(Serialize)]
struct PlanRow<'a> {
    task: TaskId,
    kind: TaskKind,
    instance: InstanceId,
    instance_type: &'a str,
    role: String,
}

/// The selected task assignment together with the minimal set of instances to provision.
#[derive(Clone, Debug)]
pub struct ProvisioningPlan {
    /// Instance assigned to each task.
    pub scheduling_plan: BTreeMap<TaskId, InstanceId>,
    /// Instances hosting at least one map task.
    pub map_and_reduce_instances: Vec<Instance>,
    /// Instances hosting only reduce tasks.
    pub reduce_only_instances: Vec<Instance>,
    /// Aggregate execution time and cost of the plan.
    pub score: Score,
    /// Number of assignments evaluated to select the plan.
    pub evaluated_candidates: u64,
    task_kinds: BTreeMap<TaskId, TaskKind>,
}

impl ProvisioningPlan {
    /// Builds plan from an assignment, where `assignment[i]` runs `tasks[i]`.
    pub fn from_assignment(tasks: &[Task], assignment: &[&Instance], score: Score, evaluated_candidates: u64) -> Self {
        let scheduling_plan = tasks
            .iter()
            .zip(assignment.iter())
            .map(|(task, instance)| (task.id, instance.id))
            .collect();
        let task_kinds = tasks.iter().map(|task| (task.id, task.kind)).collect();

        let roles = classify_instances(tasks, assignment);
        let mut map_and_reduce_instances = Vec::new();
        let mut reduce_only_instances = Vec::new();
        for (id, role) in roles.iter() {
            let instance = assignment
                .iter()
                .find(|instance| instance.id == *id)
                .map(|instance| (*instance).clone());
            match (role, instance) {
                (InstanceRole::MapAndReduce, Some(instance)) => map_and_reduce_instances.push(instance),
                (InstanceRole::ReduceOnly, Some(instance)) => reduce_only_instances.push(instance),
                (_, None) => {}
            }
        }

        Self {
            scheduling_plan,
            map_and_reduce_instances,
            reduce_only_instances,
            score,
            evaluated_candidates,
            task_kinds,
        }
    }

    /// Returns the instance assigned to the specified task.
    pub fn instance_for(&self, task: TaskId) -> Option<InstanceId> {
        self.scheduling_plan.get(&task).copied()
    }

    /// Returns IDs of all instances to provision.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.map_and_reduce_instances
            .iter()
            .chain(self.reduce_only_instances.iter())
            .map(|instance| instance.id)
            .collect()
    }

    /// Returns the role of the specified instance in the plan.
    pub fn role_of(&self, instance: InstanceId) -> Option<InstanceRole> {
        if self.map_and_reduce_instances.iter().any(|i| i.id == instance) {
            Some(InstanceRole::MapAndReduce)
        } else if self.reduce_only_instances.iter().any(|i| i.id == instance) {
            Some(InstanceRole::ReduceOnly)
        } else {
            None
        }
    }

    /// Saves the plan to CSV file with one row per task.
    pub fn save_csv(&self, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let mut wtr = csv::Writer::from_writer(file);
        for (&task, &instance_id) in self.scheduling_plan.iter() {
            let instance = self
                .map_and_reduce_instances
                .iter()
                .chain(self.reduce_only_instances.iter())
                .find(|i| i.id == instance_id);
            let (Some(instance), Some(&kind)) = (instance, self.task_kinds.get(&task)) else {
                continue;
            };
            wtr.serialize(PlanRow {
                task,
                kind,
                instance: instance_id,
                instance_type: &instance.instance_type.name,
                role: self.role_of(instance_id).map(|r| r.to_string()).unwrap_or_default(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
