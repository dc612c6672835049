//! Reproducible random instances in the style of the Taillard generator:
//! every job visits every machine exactly once.

use jsp_parser::structs::InstanceError;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::Instance;

pub const MIN_DURATION: u32 = 1;
pub const MAX_DURATION: u32 = 99;

/// Same arguments, same instance. Fails if `num_jobs` or `num_machines` is 0.
pub fn generate_instance(
    num_jobs: usize,
    num_machines: usize,
    seed: u64,
) -> Result<Instance, InstanceError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let jobs = (0..num_jobs)
        .map(|_| {
            let mut machines: Vec<usize> = (0..num_machines).collect();
            machines.shuffle(&mut rng);

            machines
                .into_iter()
                .map(|machine| (machine, rng.gen_range(MIN_DURATION..=MAX_DURATION)))
                .collect()
        })
        .collect();

    let name = format!("random_{num_jobs}x{num_machines}_{seed}");
    Ok(Instance::new(num_machines, jobs)?.with_name(name))
}
