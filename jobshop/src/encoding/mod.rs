use std::fmt;

use crate::{
    schedule::{self, EvaluationError, Schedule},
    Instance,
};

/// One operation: step `task` of job `job`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Task {
    pub job: usize,
    pub task: usize,
}

impl Task {
    pub fn new(job: usize, task: usize) -> Self {
        Self { job, task }
    }

    pub fn duration(&self, instance: &Instance) -> u32 {
        instance.duration(self.job, self.task)
    }

    pub fn machine(&self, instance: &Instance) -> usize {
        instance.machine(self.job, self.task)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.job, self.task)
    }
}

/// Execution order of the tasks on every machine.
///
/// Each machine owns its own vector, so cloning an order never aliases
/// the sequences it was cloned from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceOrder {
    tasks_by_machine: Vec<Vec<Task>>,
}

impl ResourceOrder {
    pub fn new(num_machines: usize) -> Self {
        Self {
            tasks_by_machine: vec![vec![]; num_machines],
        }
    }

    /// Builds the order in which a feasible schedule executes the tasks on
    /// each machine. Tasks starting at the same time keep job order.
    pub fn from_schedule(instance: &Instance, schedule: &Schedule) -> Self {
        let mut order = Self::new(instance.num_machines());

        for job in 0..instance.num_jobs() {
            for task in 0..instance.num_tasks() {
                let task = Task::new(job, task);
                order.push(task.machine(instance), task);
            }
        }

        for tasks in order.tasks_by_machine.iter_mut() {
            tasks.sort_by_key(|&task| (schedule.start_time(task), task));
        }

        order
    }

    /// Appends `task` at the end of `machine`'s sequence.
    pub fn push(&mut self, machine: usize, task: Task) {
        self.tasks_by_machine[machine].push(task);
    }

    pub fn machine_tasks(&self, machine: usize) -> &[Task] {
        &self.tasks_by_machine[machine]
    }

    pub(crate) fn machine_tasks_mut(&mut self, machine: usize) -> &mut [Task] {
        &mut self.tasks_by_machine[machine]
    }

    pub fn tasks_by_machine(&self) -> &[Vec<Task>] {
        &self.tasks_by_machine
    }

    pub fn num_machines(&self) -> usize {
        self.tasks_by_machine.len()
    }

    /// Total number of tasks over all machines.
    pub fn len(&self) -> usize {
        self.tasks_by_machine.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_schedule(&self, instance: &Instance) -> Result<Schedule, EvaluationError> {
        schedule::evaluate(instance, self)
    }
}
