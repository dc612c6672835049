use std::time::Instant;

use log::{debug, info, trace};

use super::{greedy::GreedySolver, rated_moves, ExitCause, PriorityRule, Solution, Solver};
use crate::{
    encoding::ResourceOrder,
    neighborhood::Swap,
    schedule::{lower_bound, EvaluationError, Schedule},
    tabu_list::{IterationTabuList, TabuList},
    Instance,
};

#[derive(Debug, Clone)]
pub struct TabuOptions {
    pub max_iterations: usize,
    /// Number of iterations a reversed move stays forbidden.
    pub tabu_tenure: usize,
    /// Rule of the greedy schedule the search starts from.
    pub seed_rule: PriorityRule,
    /// Evaluate the candidate moves of one iteration with rayon.
    pub parallel: bool,
}

impl Default for TabuOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tabu_tenure: 10,
            seed_rule: PriorityRule::EstLrpt,
            parallel: false,
        }
    }
}

impl TabuOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tabu_tenure(mut self, tabu_tenure: usize) -> Self {
        self.tabu_tenure = tabu_tenure;
        self
    }

    pub fn with_seed_rule(mut self, seed_rule: PriorityRule) -> Self {
        self.seed_rule = seed_rule;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Tabu search over the Nowicki & Smutnicki neighborhood.
///
/// Every iteration moves to the best neighbor of the current order that is
/// not tabu, or that is tabu but beats the best makespan seen so far. The
/// current order may get worse, the returned one never does.
#[derive(Debug, Clone, Default)]
pub struct TabuSolver {
    options: TabuOptions,
}

impl TabuSolver {
    pub fn new(options: TabuOptions) -> Self {
        Self { options }
    }
}

/// State of one search run.
#[derive(Debug)]
struct TabuSearch {
    order: ResourceOrder,
    schedule: Schedule,
    best_order: ResourceOrder,
    best_schedule: Schedule,
    tabu_list: IterationTabuList,
    iteration: usize,
    makespan_history: Vec<u32>,
}

impl TabuSearch {
    fn new(instance: &Instance, order: ResourceOrder) -> Result<Self, EvaluationError> {
        let schedule = order.to_schedule(instance)?;

        Ok(Self {
            best_order: order.clone(),
            best_schedule: schedule.clone(),
            order,
            schedule,
            tabu_list: IterationTabuList::new(),
            iteration: 0,
            makespan_history: vec![],
        })
    }

    /// Runs one iteration and returns the applied move. `None` leaves the
    /// current order as it is.
    fn step(&mut self, instance: &Instance, options: &TabuOptions) -> Option<Swap> {
        let iteration = self.iteration;
        let best_makespan = self.best_schedule.makespan();

        let tabu_list = &self.tabu_list;
        let selected = rated_moves(instance, &self.order, &self.schedule, options.parallel)
            .into_iter()
            .filter(|rated| {
                tabu_list.is_possible_move(&rated.swap, iteration)
                    || rated.schedule.makespan() < best_makespan
            })
            .min_by_key(|rated| rated.schedule.makespan());

        let applied = match selected {
            Some(rated) => {
                trace!("iteration {iteration}: applying {:?}", rated.swap);
                self.tabu_list
                    .add_turn_to_tabu_list(&rated.swap, iteration, options.tabu_tenure);
                self.order = rated.order;
                self.schedule = rated.schedule;

                if self.schedule.makespan() < best_makespan {
                    debug!(
                        "iteration {iteration}: new best makespan {}",
                        self.schedule.makespan()
                    );
                    self.best_order = self.order.clone();
                    self.best_schedule = self.schedule.clone();
                }
                Some(rated.swap)
            }
            None => {
                trace!("iteration {iteration}: every move is tabu or infeasible");
                None
            }
        };

        self.makespan_history.push(self.best_schedule.makespan());
        self.iteration += 1;
        applied
    }
}

impl Solver for TabuSolver {
    fn name(&self) -> String {
        "tabu".to_owned()
    }

    fn solve(&self, instance: &Instance, deadline: Instant) -> Result<Solution, EvaluationError> {
        let options = &self.options;
        info!("options: {options:?}");

        let lower_bound = lower_bound(instance);
        info!("lower bound: {lower_bound}");

        let seed = GreedySolver::build(instance, options.seed_rule);
        let mut search = TabuSearch::new(instance, seed)?;
        info!("initial makespan: {}", search.schedule.makespan());

        let exit_cause = loop {
            if search.best_schedule.makespan() <= lower_bound {
                info!("Stopping search as lower bound has been reached");
                break ExitCause::ProvedOptimal;
            }
            if search.iteration >= options.max_iterations {
                break ExitCause::MaxIterations;
            }
            if Instant::now() >= deadline {
                info!("Stopping search as time limit has passed");
                break ExitCause::Timeout;
            }

            search.step(instance, options);
        };

        info!(
            "best makespan: {} after {} iterations ({exit_cause})",
            search.best_schedule.makespan(),
            search.iteration
        );

        Ok(Solution {
            order: search.best_order,
            schedule: search.best_schedule,
            exit_cause,
            iterations: search.iteration,
            makespan_history: search.makespan_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        encoding::Task, instance_gen::generate_instance, solvers::DescentSolver, test_instances,
    };

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(600)
    }

    fn crossed_order(
        machine_0: [(usize, usize); 2],
        machine_1: [(usize, usize); 2],
    ) -> ResourceOrder {
        let mut order = ResourceOrder::new(2);
        for (job, task) in machine_0 {
            order.push(0, Task::new(job, task));
        }
        for (job, task) in machine_1 {
            order.push(1, Task::new(job, task));
        }
        order
    }

    /// Makespan 10, critical blocks on both machines. Swapping machine 0
    /// gives the optimum, swapping machine 1 closes a cycle.
    fn crossed_sequential() -> ResourceOrder {
        crossed_order([(1, 1), (0, 0)], [(1, 0), (0, 1)])
    }

    /// Makespan 6, one critical block on machine 0 whose swap leads back to
    /// [`crossed_sequential`].
    fn crossed_optimal() -> ResourceOrder {
        crossed_order([(0, 0), (1, 1)], [(1, 0), (0, 1)])
    }

    #[test]
    fn reverse_move_is_refused_during_tenure() {
        let instance = test_instances::crossed();
        let options = TabuOptions::default().with_tabu_tenure(2);
        let mut search = TabuSearch::new(&instance, crossed_sequential()).unwrap();
        assert_eq!(search.schedule.makespan(), 10);

        assert_eq!(search.step(&instance, &options), Some(Swap::new(0, 0, 1)));
        assert_eq!(search.order, crossed_optimal());
        assert_eq!(search.best_schedule.makespan(), 6);

        // the only neighbor undoes the last move and does not beat the best
        assert_eq!(search.step(&instance, &options), None);
        assert_eq!(search.order, crossed_optimal());
        assert_eq!(search.iteration, 2);
        assert_eq!(search.makespan_history, vec![6, 6]);

        // tenure is over, the current order gets worse but the best stays
        assert_eq!(search.step(&instance, &options), Some(Swap::new(0, 0, 1)));
        assert_eq!(search.order, crossed_sequential());
        assert_eq!(search.schedule.makespan(), 10);
        assert_eq!(search.best_order, crossed_optimal());
        assert_eq!(search.makespan_history, vec![6, 6, 6]);
    }

    #[test]
    fn improving_tabu_move_is_taken() {
        let instance = test_instances::crossed();
        let options = TabuOptions::default();
        let mut search = TabuSearch::new(&instance, crossed_sequential()).unwrap();
        search
            .tabu_list
            .add_turn_to_tabu_list(&Swap::new(0, 1, 0), 0, 10);
        assert!(!search.tabu_list.is_possible_move(&Swap::new(0, 0, 1), 0));

        assert_eq!(search.step(&instance, &options), Some(Swap::new(0, 0, 1)));
        assert_eq!(search.best_order, crossed_optimal());
        assert_eq!(search.makespan_history, vec![6]);
    }

    #[test]
    fn search_stalls_when_every_move_is_tabu() {
        let instance = test_instances::ft06();
        let options = TabuOptions::default().with_tabu_tenure(100);

        // a local optimum is the best order seen, so no move qualifies by aspiration
        let descent = DescentSolver::new(10_000)
            .solve(&instance, deadline())
            .unwrap();
        let makespan = descent.makespan();
        let mut search = TabuSearch::new(&instance, descent.order).unwrap();
        search.iteration = 5;
        search.makespan_history = vec![makespan; 5];

        let moves = rated_moves(&instance, &search.order, &search.schedule, false);
        assert!(!moves.is_empty());
        for rated in &moves {
            assert!(rated.schedule.makespan() >= makespan);
            search.tabu_list.add_turn_to_tabu_list(&rated.swap, 0, 100);
        }
        let before = search.order.clone();

        assert_eq!(search.step(&instance, &options), None);
        assert_eq!(search.order, before);
        assert_eq!(search.iteration, 6);
        assert_eq!(search.makespan_history, vec![makespan; 6]);

        // the same state without tabu moves does leave the local optimum
        search.tabu_list = IterationTabuList::new();
        assert!(search.step(&instance, &options).is_some());
    }

    #[test]
    fn applied_moves_respect_the_tabu_list() {
        let instance = test_instances::ft06();
        let options = TabuOptions::default().with_tabu_tenure(5);
        let seed = GreedySolver::build(&instance, PriorityRule::EstLrpt);
        let mut search = TabuSearch::new(&instance, seed).unwrap();

        for _ in 0..100 {
            let iteration = search.iteration;
            let best_makespan = search.best_schedule.makespan();
            let tabu_list = search.tabu_list.clone();

            if let Some(swap) = search.step(&instance, &options) {
                assert!(
                    tabu_list.is_possible_move(&swap, iteration)
                        || search.schedule.makespan() < best_makespan
                );
            }
        }
        assert_eq!(search.iteration, 100);
    }

    #[test]
    fn best_makespan_never_increases() {
        let instance = test_instances::ft06();
        let solver = TabuSolver::new(TabuOptions::default().with_max_iterations(200));

        let solution = solver.solve(&instance, deadline()).unwrap();

        assert_eq!(solution.exit_cause, ExitCause::MaxIterations);
        assert_eq!(solution.iterations, 200);
        assert_eq!(solution.makespan_history.len(), 200);
        assert!(solution
            .makespan_history
            .windows(2)
            .all(|pair| pair[1] <= pair[0]));
        assert_eq!(solution.makespan_history.last(), Some(&solution.makespan()));
    }

    #[test]
    fn never_worse_than_greedy_seed() {
        for instance in [test_instances::ft06(), test_instances::la01()] {
            for rule in PriorityRule::ALL {
                let seed = GreedySolver::build(&instance, rule)
                    .to_schedule(&instance)
                    .unwrap();
                let solver = TabuSolver::new(
                    TabuOptions::default()
                        .with_max_iterations(100)
                        .with_seed_rule(rule),
                );

                let solution = solver.solve(&instance, deadline()).unwrap();

                assert!(solution.makespan() <= seed.makespan());
                assert!(solution.makespan() >= lower_bound(&instance));
                assert!(solution.schedule.is_valid(&instance));
                assert_eq!(
                    solution.order.to_schedule(&instance).unwrap(),
                    solution.schedule
                );
            }
        }
    }

    #[test]
    fn fixed_iteration_bound_is_reproducible() {
        let instance = generate_instance(5, 5, 42).unwrap();
        let solver = TabuSolver::new(TabuOptions::default().with_max_iterations(300));

        let first = solver.solve(&instance, deadline()).unwrap();
        let second = solver.solve(&instance, deadline()).unwrap();

        assert_eq!(first.order, second.order);
        assert_eq!(first.makespan_history, second.makespan_history);
        assert_eq!(first.exit_cause, second.exit_cause);
    }

    #[test]
    fn parallel_search_matches_sequential() {
        let instance = test_instances::ft06();
        let options = TabuOptions::default().with_max_iterations(100);

        let sequential = TabuSolver::new(options.clone())
            .solve(&instance, deadline())
            .unwrap();
        let parallel = TabuSolver::new(options.with_parallel(true))
            .solve(&instance, deadline())
            .unwrap();

        assert_eq!(sequential.order, parallel.order);
        assert_eq!(sequential.makespan_history, parallel.makespan_history);
    }

    #[test]
    fn single_task_is_optimal_immediately() {
        let instance = test_instances::single();

        let solution = TabuSolver::default().solve(&instance, deadline()).unwrap();

        assert_eq!(solution.makespan(), 7);
        assert_eq!(solution.exit_cause, ExitCause::ProvedOptimal);
        assert_eq!(solution.iterations, 0);
        assert!(solution.makespan_history.is_empty());
    }

    #[test]
    fn crossed_jobs_reach_lower_bound() {
        let instance = test_instances::crossed();

        let solution = TabuSolver::default().solve(&instance, deadline()).unwrap();

        assert_eq!(solution.makespan(), 6);
        assert_eq!(solution.exit_cause, ExitCause::ProvedOptimal);
    }

    #[test]
    fn passed_deadline_returns_seed() {
        let instance = test_instances::ft06();
        let seed = GreedySolver::build(&instance, PriorityRule::EstLrpt);

        let solution = TabuSolver::default()
            .solve(&instance, Instant::now())
            .unwrap();

        assert_eq!(solution.exit_cause, ExitCause::Timeout);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.order, seed);
    }

    #[test]
    fn zero_iterations_returns_seed() {
        let instance = test_instances::la01();
        let seed = GreedySolver::build(&instance, PriorityRule::Spt);
        let solver = TabuSolver::new(
            TabuOptions::default()
                .with_max_iterations(0)
                .with_seed_rule(PriorityRule::Spt),
        );

        let solution = solver.solve(&instance, deadline()).unwrap();

        assert_eq!(solution.order, seed);
        assert_eq!(solution.iterations, 0);
    }
}
