use std::time::Instant;

use log::{debug, info};

use super::{greedy::GreedySolver, rated_moves, ExitCause, PriorityRule, Solution, Solver};
use crate::{schedule::EvaluationError, Instance};

/// Steepest descent over the critical block neighborhood, starting from the
/// `est_lrpt` greedy schedule. Stops in the first local optimum.
#[derive(Debug, Clone)]
pub struct DescentSolver {
    max_iterations: usize,
    seed_rule: PriorityRule,
}

impl DescentSolver {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            seed_rule: PriorityRule::EstLrpt,
        }
    }

    pub fn with_seed_rule(mut self, seed_rule: PriorityRule) -> Self {
        self.seed_rule = seed_rule;
        self
    }
}

impl Solver for DescentSolver {
    fn name(&self) -> String {
        "descent".to_owned()
    }

    fn solve(&self, instance: &Instance, deadline: Instant) -> Result<Solution, EvaluationError> {
        let mut order = GreedySolver::build(instance, self.seed_rule);
        let mut schedule = order.to_schedule(instance)?;
        let mut makespan_history = vec![];
        let mut iteration = 0;

        let exit_cause = loop {
            if iteration >= self.max_iterations {
                break ExitCause::MaxIterations;
            }
            if Instant::now() >= deadline {
                break ExitCause::Timeout;
            }

            let best = rated_moves(instance, &order, &schedule, false)
                .into_iter()
                .min_by_key(|rated| rated.schedule.makespan());

            match best {
                Some(rated) if rated.schedule.makespan() < schedule.makespan() => {
                    debug!("iteration {iteration}: makespan {}", rated.schedule.makespan());
                    order = rated.order;
                    schedule = rated.schedule;
                }
                _ => break ExitCause::Blocked,
            }

            makespan_history.push(schedule.makespan());
            iteration += 1;
        };

        info!(
            "descent: makespan {} after {iteration} iterations ({exit_cause})",
            schedule.makespan()
        );

        Ok(Solution {
            order,
            schedule,
            exit_cause,
            iterations: iteration,
            makespan_history,
        })
    }
}
