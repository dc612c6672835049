use std::{fmt, time::Instant};

use log::trace;
use rayon::prelude::*;

use crate::{
    encoding::ResourceOrder,
    neighborhood::{blocks_of_critical_path, Block, Swap},
    schedule::{EvaluationError, Schedule},
    Instance,
};

pub mod descent;
pub mod greedy;
pub mod tabu;

pub use descent::DescentSolver;
pub use greedy::{GreedySolver, PriorityRule, UnknownPriorityRule};
pub use tabu::{TabuOptions, TabuSolver};

/// Why a solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    /// The solver ran to completion on its own.
    Blocked,
    /// The deadline passed.
    Timeout,
    /// The iteration bound was reached.
    MaxIterations,
    /// The makespan reached the lower bound of the instance.
    ProvedOptimal,
}

impl fmt::Display for ExitCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self {
            ExitCause::Blocked => "blocked",
            ExitCause::Timeout => "timeout",
            ExitCause::MaxIterations => "max_iterations",
            ExitCause::ProvedOptimal => "proved_optimal",
        };
        f.write_str(cause)
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub order: ResourceOrder,
    pub schedule: Schedule,
    pub exit_cause: ExitCause,
    pub iterations: usize,
    /// Best makespan after each iteration.
    pub makespan_history: Vec<u32>,
}

impl Solution {
    pub fn makespan(&self) -> u32 {
        self.schedule.makespan()
    }
}

/// Anything that produces a schedule for an instance before a deadline.
pub trait Solver {
    fn name(&self) -> String;

    fn solve(&self, instance: &Instance, deadline: Instant) -> Result<Solution, EvaluationError>;
}

/// A feasible neighbor of the current order together with its evaluation.
#[derive(Debug, Clone)]
pub(crate) struct RatedMove {
    pub swap: Swap,
    pub order: ResourceOrder,
    pub schedule: Schedule,
}

/// Evaluates every swap of the critical blocks of `order`, in block order.
/// Swaps that create a cycle are dropped.
pub(crate) fn rated_moves(
    instance: &Instance,
    order: &ResourceOrder,
    schedule: &Schedule,
    parallel: bool,
) -> Vec<RatedMove> {
    let swaps: Vec<Swap> = blocks_of_critical_path(order, schedule)
        .iter()
        .flat_map(Block::neighbors)
        .collect();
    trace!("swaps: {swaps:?}");

    let map_op = |swap: Swap| {
        let mut candidate = order.clone();
        swap.apply_on(&mut candidate);

        match candidate.to_schedule(instance) {
            Ok(schedule) => Some(RatedMove {
                swap,
                order: candidate,
                schedule,
            }),
            Err(err) => {
                trace!("discarding {swap:?}: {err}");
                None
            }
        }
    };

    if parallel {
        swaps.into_par_iter().filter_map(map_op).collect()
    } else {
        swaps.into_iter().filter_map(map_op).collect()
    }
}
