#![forbid(unsafe_code)]
use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use jobshop::solvers::PriorityRule;
use log::{debug, error};

mod commands;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
/// Job-shop scheduler
struct App {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve an instance file and print the makespan
    Solve(Solve),
    /// Create a graphviz notation of the greedy schedule of an instance
    Graph {
        instance: PathBuf,
        output: PathBuf,
        #[arg(short, long, default_value_t = PriorityRule::EstLrpt)]
        rule: PriorityRule,
    },
    /// Run every greedy rule and the tabu search on all instances of a folder
    Benchmark(Benchmark),
    /// Write a random instance where every job visits every machine once
    Generate {
        output: PathBuf,
        #[arg(short, long, env = "JOBSHOP_JOBS", default_value_t = 10)]
        jobs: usize,
        #[arg(short, long, env = "JOBSHOP_MACHINES", default_value_t = 5)]
        machines: usize,
        #[arg(short, long, env = "JOBSHOP_SEED", default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SolverKind {
    Greedy,
    Descent,
    Tabu,
}

#[derive(Debug, clap::Args)]
pub struct Solve {
    instance: PathBuf,
    #[arg(long, value_enum, default_value_t = SolverKind::Tabu)]
    solver: SolverKind,
    /// Dispatching rule of the greedy schedule, also the seed of the local searches
    #[arg(short, long, default_value_t = PriorityRule::EstLrpt)]
    rule: PriorityRule,
    #[arg(long, env = "JOBSHOP_MAX_ITER", default_value_t = 1000)]
    max_iter: usize,
    #[arg(long, env = "JOBSHOP_TENURE", default_value_t = 10)]
    tenure: usize,
    #[arg(long, env = "JOBSHOP_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,
    /// Evaluate the moves of one tabu iteration in parallel
    #[arg(long, env = "JOBSHOP_PARALLEL")]
    parallel: bool,
    /// Write a JSON report of the solution
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct Benchmark {
    instance_folder: PathBuf,
    output: PathBuf,
    #[arg(long, env = "JOBSHOP_MAX_ITER", default_value_t = 1000)]
    max_iter: usize,
    #[arg(long, env = "JOBSHOP_TENURE", default_value_t = 10)]
    tenure: usize,
    #[arg(long, env = "JOBSHOP_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

fn main() -> ExitCode {
    let args: App = App::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    debug!("{args:?}");

    if let Err(err) = match args.command {
        Commands::Solve(solve) => commands::solve(solve),
        Commands::Graph {
            instance,
            output,
            rule,
        } => commands::graph(instance, output, rule),
        Commands::Benchmark(benchmark) => commands::benchmark(benchmark),
        Commands::Generate {
            output,
            jobs,
            machines,
            seed,
        } => commands::generate(output, jobs, machines, seed),
    } {
        error!("An error occurred: {err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
