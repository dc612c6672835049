use std::{fs, path::Path};

use anyhow::{Context, Result};
use jobshop::Instance;
use jsp_parser::parse_instance;
use log::trace;

mod benchmark;
mod generate;
mod graph;
mod solve;

pub use benchmark::benchmark;
pub use generate::generate;
pub use graph::graph;
pub use solve::solve;

/// Reads and parses an instance file, naming the instance after the file.
pub fn load_instance(path: &Path) -> Result<Instance> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
    trace!("input file contents: {contents}");

    let instance =
        parse_instance(&contents).with_context(|| format!("Failed to parse {path:?}"))?;

    Ok(match path.file_stem() {
        Some(stem) => instance.with_name(stem.to_string_lossy()),
        None => instance,
    })
}
