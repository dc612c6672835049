use std::{
    fs,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use jobshop::{
    schedule::lower_bound,
    solvers::{GreedySolver, PriorityRule, Solver, TabuOptions, TabuSolver},
};
use log::info;

use super::load_instance;
use crate::Benchmark;

pub fn benchmark(benchmark: Benchmark) -> Result<()> {
    if !benchmark.instance_folder.is_dir() {
        anyhow::bail!("instance_folder is not a directory")
    }

    let mut paths: Vec<PathBuf> = benchmark
        .instance_folder
        .read_dir()?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;
    paths.retain(|path| path.is_file());
    paths.sort();

    let tabu = TabuSolver::new(
        TabuOptions::default()
            .with_max_iterations(benchmark.max_iter)
            .with_tabu_tenure(benchmark.tenure),
    );

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let instance = load_instance(&path)?;
        let mut line = format!("{path:?}: lb {}", lower_bound(&instance));

        for rule in PriorityRule::ALL {
            let makespan = GreedySolver::build(&instance, rule)
                .to_schedule(&instance)?
                .makespan();
            line.push_str(&format!(" {rule} {makespan}"));
        }

        let start = Instant::now();
        let solution = tabu.solve(
            &instance,
            start + Duration::from_secs(benchmark.timeout_secs),
        )?;
        line.push_str(&format!(
            " tabu {} ({}, {} ms)",
            solution.makespan(),
            solution.exit_cause,
            start.elapsed().as_millis()
        ));

        info!("{line}");
        results.push(line);
    }

    fs::write(benchmark.output, results.join("\n"))?;

    Ok(())
}
