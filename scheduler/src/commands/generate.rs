use std::{fs, path::PathBuf};

use anyhow::Result;
use jobshop::instance_gen::generate_instance;
use log::info;

pub fn generate(output: PathBuf, jobs: usize, machines: usize, seed: u64) -> Result<()> {
    let instance = generate_instance(jobs, machines, seed)?;

    fs::write(&output, instance.to_string())?;

    info!("Wrote {jobs}x{machines} instance to: {output:?}");

    Ok(())
}
