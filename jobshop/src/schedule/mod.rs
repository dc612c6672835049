use hashbrown::HashSet;
use log::trace;
use petgraph::{
    algo,
    dot::Dot,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
    Direction,
};
use thiserror::Error;

use crate::{
    encoding::{ResourceOrder, Task},
    Instance,
};

/// Disjunctive graph with every disjunction already oriented: job edges plus
/// one edge between consecutive tasks on each machine. Edge weights carry the
/// duration of the source task.
pub type DisjunctiveGraph = DiGraph<Task, u32>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Machine orders contain a cycle through task {task}")]
    Cycle { task: Task },
    #[error("Task {task} is missing from the machine orders")]
    MissingTask { task: Task },
    #[error("Task {task} appears more than once in the machine orders")]
    DuplicateTask { task: Task },
    #[error("Task {task} does not exist in the instance")]
    UnknownTask { task: Task },
    #[error("Task {task} is listed on machine {machine}")]
    WrongMachine { task: Task, machine: usize },
    #[error("Order covers {found} machines, instance has {expected}")]
    MachineCountMismatch { expected: usize, found: usize },
}

fn node_index(instance: &Instance, task: Task) -> NodeIndex {
    NodeIndex::new(task.job * instance.num_tasks() + task.task)
}

pub fn disjunctive_graph(
    instance: &Instance,
    order: &ResourceOrder,
) -> Result<DisjunctiveGraph, EvaluationError> {
    if order.num_machines() != instance.num_machines() {
        return Err(EvaluationError::MachineCountMismatch {
            expected: instance.num_machines(),
            found: order.num_machines(),
        });
    }

    let task_count = instance.num_jobs() * instance.num_tasks();
    let mut graph = DisjunctiveGraph::with_capacity(task_count, task_count * 2);

    for job in 0..instance.num_jobs() {
        for task in 0..instance.num_tasks() {
            graph.add_node(Task::new(job, task));
        }
    }

    for job in 0..instance.num_jobs() {
        for task in 1..instance.num_tasks() {
            let from = Task::new(job, task - 1);
            let to = Task::new(job, task);
            graph.add_edge(
                node_index(instance, from),
                node_index(instance, to),
                from.duration(instance),
            );
        }
    }

    let mut seen = vec![false; task_count];
    for (machine, tasks) in order.tasks_by_machine().iter().enumerate() {
        for &task in tasks {
            if task.job >= instance.num_jobs() || task.task >= instance.num_tasks() {
                return Err(EvaluationError::UnknownTask { task });
            }
            if task.machine(instance) != machine {
                return Err(EvaluationError::WrongMachine { task, machine });
            }

            let seen = &mut seen[node_index(instance, task).index()];
            if *seen {
                return Err(EvaluationError::DuplicateTask { task });
            }
            *seen = true;
        }

        for pair in tasks.windows(2) {
            graph.add_edge(
                node_index(instance, pair[0]),
                node_index(instance, pair[1]),
                pair[0].duration(instance),
            );
        }
    }

    if let Some(index) = seen.iter().position(|seen| !seen) {
        return Err(EvaluationError::MissingTask {
            task: graph[NodeIndex::new(index)],
        });
    }

    Ok(graph)
}

/// Renders a disjunctive graph in graphviz dot notation.
pub fn to_dot(graph: &DisjunctiveGraph) -> String {
    format!("{}", Dot::new(graph))
}

/// Computes the earliest start of every task under the given machine orders.
pub fn evaluate(instance: &Instance, order: &ResourceOrder) -> Result<Schedule, EvaluationError> {
    let graph = disjunctive_graph(instance, order)?;

    let sorted = algo::toposort(&graph, None).map_err(|cycle| EvaluationError::Cycle {
        task: graph[cycle.node_id()],
    })?;

    let mut start_times = vec![vec![0; instance.num_tasks()]; instance.num_jobs()];
    for node in sorted {
        let start = graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| {
                let predecessor = graph[edge.source()];
                start_times[predecessor.job][predecessor.task] + *edge.weight()
            })
            .max()
            .unwrap_or(0);

        let task = graph[node];
        start_times[task.job][task.task] = start;
    }

    let end_times: Vec<Vec<u32>> = start_times
        .iter()
        .enumerate()
        .map(|(job, starts)| {
            starts
                .iter()
                .enumerate()
                .map(|(task, start)| start + instance.duration(job, task))
                .collect()
        })
        .collect();

    let mut machine_predecessors = vec![vec![None; instance.num_tasks()]; instance.num_jobs()];
    for tasks in order.tasks_by_machine() {
        for pair in tasks.windows(2) {
            machine_predecessors[pair[1].job][pair[1].task] = Some(pair[0]);
        }
    }

    let makespan = end_times
        .iter()
        .flat_map(|ends| ends.iter().copied())
        .max()
        .unwrap_or(0);

    trace!("start_times: {start_times:?}");

    Ok(Schedule {
        start_times,
        end_times,
        machine_predecessors,
        makespan,
    })
}

/// Lower bound on the makespan: the longest job or the most loaded machine.
pub fn lower_bound(instance: &Instance) -> u32 {
    let mut machine_loads = vec![0; instance.num_machines()];
    let mut longest_job = 0;

    for job in 0..instance.num_jobs() {
        let mut job_length = 0;
        for task in 0..instance.num_tasks() {
            let duration = instance.duration(job, task);
            job_length += duration;
            machine_loads[instance.machine(job, task)] += duration;
        }
        longest_job = longest_job.max(job_length);
    }

    machine_loads.into_iter().max().unwrap_or(0).max(longest_job)
}

/// Start and end times of every task of an evaluated [`ResourceOrder`].
///
/// A schedule is a snapshot: after the order it came from is modified it
/// has to be evaluated again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    // indexed by [job][task]
    start_times: Vec<Vec<u32>>,
    end_times: Vec<Vec<u32>>,
    machine_predecessors: Vec<Vec<Option<Task>>>,
    makespan: u32,
}

impl Schedule {
    pub fn start_time(&self, task: Task) -> u32 {
        self.start_times[task.job][task.task]
    }

    pub fn end_time(&self, task: Task) -> u32 {
        self.end_times[task.job][task.task]
    }

    pub fn start_times(&self) -> &[Vec<u32>] {
        &self.start_times
    }

    pub fn makespan(&self) -> u32 {
        self.makespan
    }

    /// Returns a longest chain of job and machine edges, ordered from the
    /// first task to the task completing at the makespan.
    ///
    /// Walking backwards, the job predecessor is preferred over the machine
    /// predecessor when both end exactly when the current task starts.
    pub fn critical_path(&self) -> Vec<Task> {
        let Some(last_task) = self.start_times.first().map(Vec::len).filter(|&n| n > 0) else {
            return vec![];
        };

        let Some(mut current) = (0..self.start_times.len())
            .rev()
            .map(|job| Task::new(job, last_task - 1))
            .max_by_key(|&task| self.end_time(task))
        else {
            return vec![];
        };

        let mut path = vec![current];
        while self.start_time(current) != 0 {
            let start = self.start_time(current);

            let on_job = (current.task > 0)
                .then(|| Task::new(current.job, current.task - 1))
                .filter(|&task| self.end_time(task) == start);
            let previous = on_job.or_else(|| {
                self.machine_predecessors[current.job][current.task]
                    .filter(|&task| self.end_time(task) == start)
            });

            match previous {
                Some(task) => {
                    path.push(task);
                    current = task;
                }
                None => break,
            }
        }

        path.reverse();
        path
    }

    pub fn critical_tasks(&self) -> HashSet<Task> {
        self.critical_path().into_iter().collect()
    }

    /// Checks job precedence and machine exclusivity against `instance`.
    pub fn is_valid(&self, instance: &Instance) -> bool {
        for job in 0..instance.num_jobs() {
            for task in 1..instance.num_tasks() {
                if self.start_time(Task::new(job, task)) < self.end_time(Task::new(job, task - 1))
                {
                    return false;
                }
            }
        }

        let mut by_machine: Vec<Vec<Task>> = vec![vec![]; instance.num_machines()];
        for job in 0..instance.num_jobs() {
            for task in 0..instance.num_tasks() {
                let task = Task::new(job, task);
                if task.duration(instance) > 0 {
                    by_machine[task.machine(instance)].push(task);
                }
            }
        }

        by_machine.iter().all(|tasks| {
            tasks.iter().enumerate().all(|(i, &a)| {
                tasks[i + 1..].iter().all(|&b| {
                    self.end_time(a) <= self.start_time(b) || self.end_time(b) <= self.start_time(a)
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_instances;

    fn order(machines: &[&[(usize, usize)]]) -> ResourceOrder {
        let mut order = ResourceOrder::new(machines.len());
        for (machine, tasks) in machines.iter().enumerate() {
            for &(job, task) in tasks.iter() {
                order.push(machine, Task::new(job, task));
            }
        }
        order
    }

    /// Dispatches step 0 of every job, then step 1, ... which never creates a cycle.
    fn job_rounds(instance: &Instance) -> ResourceOrder {
        let mut order = ResourceOrder::new(instance.num_machines());
        for task in 0..instance.num_tasks() {
            for job in 0..instance.num_jobs() {
                let task = Task::new(job, task);
                order.push(task.machine(instance), task);
            }
        }
        order
    }

    #[test]
    fn evaluates_start_times() {
        let instance = test_instances::crossed();
        let order = order(&[&[(0, 0), (1, 1)], &[(1, 0), (0, 1)]]);

        let schedule = evaluate(&instance, &order).unwrap();

        assert_eq!(schedule.start_time(Task::new(0, 0)), 0);
        assert_eq!(schedule.start_time(Task::new(1, 0)), 0);
        assert_eq!(schedule.start_time(Task::new(0, 1)), 3);
        assert_eq!(schedule.start_time(Task::new(1, 1)), 3);
        assert_eq!(schedule.end_time(Task::new(1, 1)), 6);
        assert_eq!(schedule.makespan(), 6);
        assert!(schedule.is_valid(&instance));
    }

    #[test]
    fn critical_path_follows_machine_edge() {
        let instance = test_instances::crossed();
        let order = order(&[&[(0, 0), (1, 1)], &[(1, 0), (0, 1)]]);

        let schedule = evaluate(&instance, &order).unwrap();

        assert_eq!(
            schedule.critical_path(),
            vec![Task::new(0, 0), Task::new(1, 1)]
        );
        assert!(schedule.critical_tasks().contains(&Task::new(1, 1)));
        assert!(!schedule.critical_tasks().contains(&Task::new(1, 0)));
    }

    #[test]
    fn critical_path_sums_to_makespan() {
        let instance = test_instances::ft06();
        let order = job_rounds(&instance);

        let schedule = evaluate(&instance, &order).unwrap();
        let path = schedule.critical_path();

        assert!(schedule.is_valid(&instance));
        assert_eq!(schedule.start_time(path[0]), 0);
        assert_eq!(
            path.iter().map(|task| task.duration(&instance)).sum::<u32>(),
            schedule.makespan()
        );
        for pair in path.windows(2) {
            assert_eq!(schedule.end_time(pair[0]), schedule.start_time(pair[1]));
        }
    }

    #[test]
    fn cycle_is_reported() {
        let instance = test_instances::crossed();
        let order = order(&[&[(1, 1), (0, 0)], &[(0, 1), (1, 0)]]);

        assert!(matches!(
            evaluate(&instance, &order),
            Err(EvaluationError::Cycle { .. })
        ));
    }

    #[test]
    fn malformed_orders_are_reported() {
        let instance = test_instances::crossed();

        let missing = order(&[&[(0, 0)], &[(1, 0), (0, 1)]]);
        assert_eq!(
            evaluate(&instance, &missing),
            Err(EvaluationError::MissingTask {
                task: Task::new(1, 1)
            })
        );

        let duplicate = order(&[&[(0, 0), (1, 1), (0, 0)], &[(1, 0), (0, 1)]]);
        assert_eq!(
            evaluate(&instance, &duplicate),
            Err(EvaluationError::DuplicateTask {
                task: Task::new(0, 0)
            })
        );

        let misplaced = order(&[&[(0, 0), (1, 0)], &[(1, 1), (0, 1)]]);
        assert_eq!(
            evaluate(&instance, &misplaced),
            Err(EvaluationError::WrongMachine {
                task: Task::new(1, 0),
                machine: 0
            })
        );

        let unknown = order(&[&[(0, 0), (1, 1), (2, 0)], &[(1, 0), (0, 1)]]);
        assert_eq!(
            evaluate(&instance, &unknown),
            Err(EvaluationError::UnknownTask {
                task: Task::new(2, 0)
            })
        );
    }

    #[test]
    fn single_task_schedule() {
        let instance = test_instances::single();
        let order = order(&[&[(0, 0)]]);

        let schedule = evaluate(&instance, &order).unwrap();

        assert_eq!(schedule.makespan(), 7);
        assert_eq!(schedule.critical_path(), vec![Task::new(0, 0)]);
    }

    #[test]
    fn lower_bounds() {
        assert_eq!(lower_bound(&test_instances::crossed()), 6);
        assert_eq!(lower_bound(&test_instances::single()), 7);
        assert_eq!(lower_bound(&test_instances::ft06()), 47);
    }

    #[test]
    fn dot_output_names_tasks() {
        let instance = test_instances::crossed();
        let order = order(&[&[(0, 0), (1, 1)], &[(1, 0), (0, 1)]]);

        let dot = to_dot(&disjunctive_graph(&instance, &order).unwrap());

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("(1,1)"));
    }
}
