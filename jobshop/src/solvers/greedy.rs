use std::{fmt, str::FromStr, time::Instant};

use log::{debug, info};
use thiserror::Error;

use super::{ExitCause, Solution, Solver};
use crate::{
    encoding::{ResourceOrder, Task},
    schedule::EvaluationError,
    Instance,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown priority rule `{0}`, expected one of spt, lrpt, est_spt, est_lrpt")]
pub struct UnknownPriorityRule(pub String);

/// Dispatching rule used to pick the next task among the realisable ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriorityRule {
    /// Shortest processing time.
    Spt,
    /// Longest remaining processing time of the job.
    Lrpt,
    /// Earliest start time, ties broken by SPT.
    EstSpt,
    /// Earliest start time, ties broken by LRPT.
    #[default]
    EstLrpt,
}

impl PriorityRule {
    pub const ALL: [PriorityRule; 4] = [
        PriorityRule::Spt,
        PriorityRule::Lrpt,
        PriorityRule::EstSpt,
        PriorityRule::EstLrpt,
    ];

    fn earliest_start_first(self) -> bool {
        matches!(self, PriorityRule::EstSpt | PriorityRule::EstLrpt)
    }

    /// Lower is better.
    fn priority(self, instance: &Instance, task: Task) -> i64 {
        match self {
            PriorityRule::Spt | PriorityRule::EstSpt => task.duration(instance) as i64,
            PriorityRule::Lrpt | PriorityRule::EstLrpt => {
                let remaining: i64 = (task.task..instance.num_tasks())
                    .map(|step| instance.duration(task.job, step) as i64)
                    .sum();
                -remaining
            }
        }
    }
}

impl fmt::Display for PriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityRule::Spt => "spt",
            PriorityRule::Lrpt => "lrpt",
            PriorityRule::EstSpt => "est_spt",
            PriorityRule::EstLrpt => "est_lrpt",
        };
        f.write_str(name)
    }
}

impl FromStr for PriorityRule {
    type Err = UnknownPriorityRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spt" => Ok(PriorityRule::Spt),
            "lrpt" => Ok(PriorityRule::Lrpt),
            "est_spt" => Ok(PriorityRule::EstSpt),
            "est_lrpt" => Ok(PriorityRule::EstLrpt),
            _ => Err(UnknownPriorityRule(s.to_owned())),
        }
    }
}

/// List scheduler dispatching one realisable task at a time, without
/// backtracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver {
    rule: PriorityRule,
}

impl GreedySolver {
    pub fn new(rule: PriorityRule) -> Self {
        Self { rule }
    }

    /// Builds machine orders by repeatedly dispatching the best realisable
    /// task according to `rule`.
    ///
    /// Earliest start times are estimated from the accumulated durations
    /// already dispatched on the job and on the machine, not from the
    /// disjunctive graph. Ties go to the lowest job index.
    pub fn build(instance: &Instance, rule: PriorityRule) -> ResourceOrder {
        let mut order = ResourceOrder::new(instance.num_machines());

        let mut realisable: Vec<Option<Task>> = (0..instance.num_jobs())
            .map(|job| Some(Task::new(job, 0)))
            .collect();
        let mut job_times = vec![0_u32; instance.num_jobs()];
        let mut machine_times = vec![0_u32; instance.num_machines()];

        for _ in 0..(instance.num_jobs() * instance.num_tasks()) {
            let earliest_start =
                |task: Task| job_times[task.job].max(machine_times[task.machine(instance)]);
            let candidates = realisable.iter().flatten().copied();

            let selected = if rule.earliest_start_first() {
                candidates
                    .clone()
                    .map(earliest_start)
                    .min()
                    .and_then(|min_start| {
                        candidates
                            .filter(|&task| earliest_start(task) == min_start)
                            .min_by_key(|&task| rule.priority(instance, task))
                    })
            } else {
                candidates.min_by_key(|&task| rule.priority(instance, task))
            };

            let Some(task) = selected else {
                break;
            };

            let machine = task.machine(instance);
            let duration = task.duration(instance);

            order.push(machine, task);
            realisable[task.job] =
                (task.task + 1 < instance.num_tasks()).then(|| Task::new(task.job, task.task + 1));
            job_times[task.job] += duration;
            machine_times[machine] += duration;
        }

        order
    }
}

impl Solver for GreedySolver {
    fn name(&self) -> String {
        format!("greedy({})", self.rule)
    }

    fn solve(&self, instance: &Instance, _deadline: Instant) -> Result<Solution, EvaluationError> {
        let order = Self::build(instance, self.rule);
        debug!("greedy order: {order:?}");

        let schedule = order.to_schedule(instance)?;
        info!("{}: makespan {}", self.name(), schedule.makespan());

        Ok(Solution {
            order,
            schedule,
            exit_cause: ExitCause::Blocked,
            iterations: 0,
            makespan_history: vec![],
        })
    }
}
