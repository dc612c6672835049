use std::{
    fs::File,
    io::{BufWriter, Write},
    time::{Duration, Instant},
};

use anyhow::Result;
use jobshop::{
    encoding::ResourceOrder,
    schedule::lower_bound,
    solvers::{DescentSolver, GreedySolver, Solution, Solver, TabuOptions, TabuSolver},
    Instance,
};
use log::info;
use serde::Serialize;

use super::load_instance;
use crate::{Solve, SolverKind};

/// JSON report of one solver run.
#[derive(Debug, Serialize)]
struct Report<'a> {
    instance: Option<&'a str>,
    solver: String,
    makespan: u32,
    lower_bound: u32,
    exit_cause: String,
    iterations: usize,
    elapsed_ms: u128,
    /// `[machine][position] = (job, task)`, sorted by start time
    machine_orders: Vec<Vec<(usize, usize)>>,
    /// `[job][task]`
    start_times: &'a [Vec<u32>],
    makespan_history: &'a [u32],
}

impl<'a> Report<'a> {
    fn new(
        instance: &'a Instance,
        solver: &dyn Solver,
        solution: &'a Solution,
        elapsed: Duration,
    ) -> Self {
        Self {
            instance: instance.name(),
            solver: solver.name(),
            makespan: solution.makespan(),
            lower_bound: lower_bound(instance),
            exit_cause: solution.exit_cause.to_string(),
            iterations: solution.iterations,
            elapsed_ms: elapsed.as_millis(),
            machine_orders: ResourceOrder::from_schedule(instance, &solution.schedule)
                .tasks_by_machine()
                .iter()
                .map(|tasks| tasks.iter().map(|task| (task.job, task.task)).collect())
                .collect(),
            start_times: solution.schedule.start_times(),
            makespan_history: &solution.makespan_history,
        }
    }
}

pub fn solve(args: Solve) -> Result<()> {
    let instance = load_instance(&args.instance)?;
    info!(
        "Solving {:?}: {} jobs, {} machines",
        instance.name(),
        instance.num_jobs(),
        instance.num_machines()
    );

    let solver: Box<dyn Solver> = match args.solver {
        SolverKind::Greedy => Box::new(GreedySolver::new(args.rule)),
        SolverKind::Descent => Box::new(DescentSolver::new(args.max_iter).with_seed_rule(args.rule)),
        SolverKind::Tabu => Box::new(TabuSolver::new(
            TabuOptions::default()
                .with_max_iterations(args.max_iter)
                .with_tabu_tenure(args.tenure)
                .with_seed_rule(args.rule)
                .with_parallel(args.parallel),
        )),
    };

    let start = Instant::now();
    let solution = solver.solve(&instance, start + Duration::from_secs(args.timeout_secs))?;
    let elapsed = start.elapsed();

    let report = Report::new(&instance, solver.as_ref(), &solution, elapsed);
    println!(
        "{}: makespan {} (lower bound {}, {} after {} iterations, {} ms)",
        report.solver,
        report.makespan,
        report.lower_bound,
        report.exit_cause,
        report.iterations,
        report.elapsed_ms
    );

    if let Some(output) = args.output {
        let mut writer = BufWriter::new(File::create(&output)?);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;
        info!("Wrote report to: {output:?}");
    }

    Ok(())
}
