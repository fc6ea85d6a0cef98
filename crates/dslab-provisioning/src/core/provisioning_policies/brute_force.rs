//! Brute force provisioning policy.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;

use log::{debug, info};
use threadpool::ThreadPool;

use crate::core::cloud::Cloud;
use crate::core::common::IdCounter;
use crate::core::config::options::parse_option;
use crate::core::cost_model::{CostModel, Score};
use crate::core::error::{Error, Result};
use crate::core::instance::Instance;
use crate::core::job::{Job, Task};
use crate::core::odometer::{search_space_size, Odometer};
use crate::core::plan::ProvisioningPlan;
use crate::core::provisioning_policy::ProvisioningPolicy;

/// Default limit on the number of assignments evaluated by a single run.
pub const DEFAULT_MAX_SEARCH_SPACE: u64 = 1_000_000;

/// Evaluates every assignment of tasks to candidate instances (several tasks may share an instance) and returns
/// the fastest one, breaking ties by cost.
///
/// Assignments whose execution time exceeds the minimum by at most `margin` are considered equally fast, the
/// cheapest of them is selected and the first enumerated one wins among equally cheap. The search space grows as
/// `N^R` for `N` candidates and `R` tasks, so runs exceeding `max_search_space` assignments are rejected with
/// [`Error::SearchSpaceTooLarge`] and the caller is expected to fall back to a heuristic policy.
///
/// Scoring can be split among several worker threads with [`BruteForce::with_workers`], the result is the same as
/// in the sequential run.
pub struct BruteForce {
    cost_model: Arc<dyn CostModel + Send + Sync>,
    margin: f64,
    max_search_space: u64,
    workers: usize,
}

impl BruteForce {
    pub fn new(cost_model: Arc<dyn CostModel + Send + Sync>) -> Self {
        Self {
            cost_model,
            margin: 0.,
            max_search_space: DEFAULT_MAX_SEARCH_SPACE,
            workers: 1,
        }
    }

    /// Creates policy from parsed config options `margin`, `max_search_space` and `workers`.
    pub fn from_options(options: &HashMap<String, String>, cost_model: Arc<dyn CostModel + Send + Sync>) -> Result<Self> {
        let mut policy = Self::new(cost_model);
        if let Some(margin) = parse_option(options, "margin")? {
            policy.margin = margin;
        }
        if let Some(max_search_space) = parse_option(options, "max_search_space")? {
            policy.max_search_space = max_search_space;
        }
        if let Some(workers) = parse_option(options, "workers")? {
            policy.workers = workers;
        }
        policy.validate()?;
        Ok(policy)
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_max_search_space(mut self, max_search_space: u64) -> Self {
        self.max_search_space = max_search_space;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn max_search_space(&self) -> u64 {
        self.max_search_space
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin < 0. {
            return Err(Error::InvalidConfiguration(format!(
                "margin must be a non-negative number, got {}",
                self.margin
            )));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfiguration("workers must be positive".to_string()));
        }
        Ok(())
    }

    /// Selects the best assignment of `tasks` to `candidates`.
    ///
    /// Task `i` of the returned plan runs on one of the candidates, only the candidates used by the selected
    /// assignment are returned for provisioning.
    pub fn optimize(&self, candidates: &[Instance], tasks: &[Task]) -> Result<ProvisioningPlan> {
        self.validate()?;
        if tasks.is_empty() {
            return Err(Error::EmptyJob);
        }
        if candidates.is_empty() {
            return Err(Error::NoCapacityAvailable);
        }
        let size = match search_space_size(candidates.len(), tasks.len()) {
            Some(size) if size <= self.max_search_space => size,
            _ => {
                return Err(Error::SearchSpaceTooLarge {
                    candidates: candidates.len(),
                    tasks: tasks.len(),
                    limit: self.max_search_space,
                })
            }
        };
        debug!(
            "evaluating {} assignments of {} tasks to {} candidate instances",
            size,
            tasks.len(),
            candidates.len()
        );

        let scores = if self.workers > 1 && size > 1 {
            self.score_parallel(candidates, tasks, size)
        } else {
            score_range(self.cost_model.as_ref(), candidates, tasks, 0, size)
        };
        assert_eq!(scores.len() as u64, size, "some assignments were not scored");

        let winner = select_fastest_cheapest(&scores, self.margin).ok_or(Error::NoFeasibleAssignment)?;
        let odometer = Odometer::starting_at(candidates.len(), tasks.len(), winner as u64);
        let assignment: Vec<&Instance> = odometer.digits().iter().map(|&d| &candidates[d - 1]).collect();
        let plan = ProvisioningPlan::from_assignment(tasks, &assignment, scores[winner], size);
        info!(
            "selected assignment #{} with time {:.3} and cost {:.3}: {} map-and-reduce and {} reduce-only instances",
            winner,
            plan.score.execution_time,
            plan.score.cost,
            plan.map_and_reduce_instances.len(),
            plan.reduce_only_instances.len()
        );
        Ok(plan)
    }

    fn score_parallel(&self, candidates: &[Instance], tasks: &[Task], size: u64) -> Vec<Score> {
        let pool = ThreadPool::new(self.workers);
        let candidates = Arc::new(candidates.to_vec());
        let tasks = Arc::new(tasks.to_vec());
        let chunk = (size + self.workers as u64 - 1) / self.workers as u64;
        let (tx, rx) = mpsc::channel();

        let mut start = 0;
        while start < size {
            let count = chunk.min(size - start);
            let tx = tx.clone();
            let cost_model = self.cost_model.clone();
            let candidates = candidates.clone();
            let tasks = tasks.clone();
            pool.execute(move || {
                let scores = score_range(cost_model.as_ref(), &candidates, &tasks, start, count);
                let _ = tx.send((start, scores));
            });
            start += count;
        }
        drop(tx);

        let mut parts: Vec<(u64, Vec<Score>)> = rx.iter().collect();
        parts.sort_by_key(|(start, _)| *start);
        parts.into_iter().flat_map(|(_, scores)| scores).collect()
    }
}

impl ProvisioningPolicy for BruteForce {
    fn run_algorithm(&self, cloud: &Cloud, job: &Job, ids: &mut IdCounter) -> Result<ProvisioningPlan> {
        let tasks = job.tasks();
        if tasks.is_empty() {
            return Err(Error::EmptyJob);
        }
        let candidates = cloud.candidate_instances(tasks.len(), ids);
        debug!(
            "job {}: {} candidate instances for {} map and {} reduce tasks",
            job.id,
            candidates.len(),
            job.map_tasks.len(),
            job.reduce_tasks.len()
        );
        self.optimize(&candidates, &tasks)
    }
}

/// Scores `count` assignments in enumeration order starting from the assignment with index `start`.
fn score_range(cost_model: &dyn CostModel, candidates: &[Instance], tasks: &[Task], start: u64, count: u64) -> Vec<Score> {
    let mut scores = Vec::with_capacity(count as usize);
    let mut odometer = Odometer::starting_at(candidates.len(), tasks.len(), start);
    let mut assignment: Vec<&Instance> = Vec::with_capacity(tasks.len());
    while (scores.len() as u64) < count && !odometer.is_exhausted() {
        assignment.clear();
        assignment.extend(odometer.digits().iter().map(|&d| &candidates[d - 1]));
        scores.push(cost_model.score(tasks, &assignment));
        odometer.advance();
    }
    scores
}

/// Returns the index of the cheapest assignment among those at most `margin` slower than the fastest one.
///
/// The first one wins among equally cheap assignments. Returns `None` if no score is comparable.
pub fn select_fastest_cheapest(scores: &[Score], margin: f64) -> Option<usize> {
    let fastest = scores
        .iter()
        .map(|score| score.execution_time)
        .fold(f64::INFINITY, f64::min);
    let mut best: Option<usize> = None;
    for (i, score) in scores.iter().enumerate() {
        if score.execution_time - margin > fastest || score.execution_time.is_nan() {
            continue;
        }
        let cheaper = match best {
            Some(b) => score.cost < scores[b].cost,
            None => true,
        };
        if cheaper {
            best = Some(i);
        }
    }
    best
}
