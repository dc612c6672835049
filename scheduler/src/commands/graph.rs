use std::{fs, path::PathBuf};

use anyhow::Result;
use jobshop::{
    schedule::{disjunctive_graph, to_dot},
    solvers::{GreedySolver, PriorityRule},
};
use log::{debug, info};

use super::load_instance;

pub fn graph(input_path: PathBuf, output_path: PathBuf, rule: PriorityRule) -> Result<()> {
    let instance = load_instance(&input_path)?;

    debug!("Creating graph for {:?} with rule {rule}", instance.name());

    let order = GreedySolver::build(&instance, rule);
    let graph = disjunctive_graph(&instance, &order)?;

    fs::write(&output_path, to_dot(&graph))?;

    info!("Wrote graphviz dot file to: {:?}", output_path);

    Ok(())
}
