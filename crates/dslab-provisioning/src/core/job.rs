//! MapReduce job and its tasks.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::core::common::TaskId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    Map,
    Reduce,
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            TaskKind::Map => write!(f, "map"),
            TaskKind::Reduce => write!(f, "reduce"),
        }
    }
}

/// A unit of work belonging to a job.
///
/// Map and reduce tasks are assigned to instances the same way, the kind matters only for the accounting done by
/// the cost model and for splitting the provisioned instances into pools.
#[derive(Clone, Debug, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Amount of work in millions of instructions.
    pub length: f64,
}

impl Task {
    pub fn new(id: TaskId, kind: TaskKind, length: f64) -> Self {
        Self { id, kind, length }
    }

    pub fn is_map(&self) -> bool {
        self.kind == TaskKind::Map
    }
}

/// A MapReduce job: ordered lists of map and reduce tasks.
#[derive(Clone, Debug, Default)]
pub struct Job {
    pub id: u32,
    pub map_tasks: Vec<Task>,
    pub reduce_tasks: Vec<Task>,
}

impl Job {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            map_tasks: Vec::new(),
            reduce_tasks: Vec::new(),
        }
    }

    pub fn add_map_task(&mut self, id: TaskId, length: f64) {
        self.map_tasks.push(Task::new(id, TaskKind::Map, length));
    }

    pub fn add_reduce_task(&mut self, id: TaskId, length: f64) {
        self.reduce_tasks.push(Task::new(id, TaskKind::Reduce, length));
    }

    pub fn task_count(&self) -> usize {
        self.map_tasks.len() + self.reduce_tasks.len()
    }

    /// Returns all tasks of the job: map tasks followed by reduce tasks.
    pub fn tasks(&self) -> Vec<Task> {
        self.map_tasks.iter().chain(self.reduce_tasks.iter()).cloned().collect()
    }

    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.map_tasks.iter().chain(self.reduce_tasks.iter()).find(|task| task.id == id)
    }
}
