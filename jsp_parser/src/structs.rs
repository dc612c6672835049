use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("Instance has no jobs")]
    NoJobs,
    #[error("Job {job} has no tasks")]
    EmptyJob { job: usize },
    #[error("Job {job} has {found} tasks, expected {expected}")]
    RaggedJobs {
        job: usize,
        expected: usize,
        found: usize,
    },
    #[error("Task ({job},{task}) uses machine {machine} but only {machines} machines exist")]
    MachineOutOfRange {
        job: usize,
        task: usize,
        machine: usize,
        machines: usize,
    },
}

/// Immutable job-shop problem description.
///
/// Every job holds the same number of tasks; task `t` of job `j` runs on
/// `machine(j, t)` for `duration(j, t)` time units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    name: Option<String>,
    num_machines: usize,
    num_tasks: usize,
    // indexed by [job][task]
    durations: Vec<Vec<u32>>,
    machines: Vec<Vec<usize>>,
}

impl Instance {
    pub fn new(num_machines: usize, jobs: Vec<Vec<(usize, u32)>>) -> Result<Self, InstanceError> {
        let num_tasks = jobs.first().map(Vec::len).ok_or(InstanceError::NoJobs)?;

        let mut durations = Vec::with_capacity(jobs.len());
        let mut machines = Vec::with_capacity(jobs.len());

        for (job, tasks) in jobs.into_iter().enumerate() {
            if tasks.is_empty() {
                return Err(InstanceError::EmptyJob { job });
            }
            if tasks.len() != num_tasks {
                return Err(InstanceError::RaggedJobs {
                    job,
                    expected: num_tasks,
                    found: tasks.len(),
                });
            }

            if let Some((task, &(machine, _))) = tasks
                .iter()
                .enumerate()
                .find(|(_, (machine, _))| *machine >= num_machines)
            {
                return Err(InstanceError::MachineOutOfRange {
                    job,
                    task,
                    machine,
                    machines: num_machines,
                });
            }

            let (job_machines, job_durations) = tasks.into_iter().unzip();
            machines.push(job_machines);
            durations.push(job_durations);
        }

        Ok(Self {
            name: None,
            num_machines,
            num_tasks,
            durations,
            machines,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn num_jobs(&self) -> usize {
        self.durations.len()
    }

    /// Number of tasks of every job.
    pub fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    pub fn num_machines(&self) -> usize {
        self.num_machines
    }

    pub fn duration(&self, job: usize, task: usize) -> u32 {
        self.durations[job][task]
    }

    pub fn machine(&self, job: usize, task: usize) -> usize {
        self.machines[job][task]
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "# {name}")?;
        }
        writeln!(f, "{} {}", self.num_jobs(), self.num_machines)?;

        for (machines, durations) in self.machines.iter().zip(&self.durations) {
            let line: Vec<String> = machines
                .iter()
                .zip(durations)
                .map(|(machine, duration)| format!("{machine} {duration}"))
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }

        Ok(())
    }
}
