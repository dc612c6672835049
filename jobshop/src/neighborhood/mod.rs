//! Critical blocks and the Nowicki & Smutnicki swap neighborhood.
//!
//! A block is a maximal run of consecutive positions on one machine whose
//! tasks all lie on the critical path. Only the first two and the last two
//! tasks of a block are ever exchanged, which keeps the neighborhood linear
//! in the number of blocks.

use log::warn;

use crate::{encoding::ResourceOrder, schedule::Schedule};

/// Positions `first_task..=last_task` of `machine`'s sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub machine: usize,
    pub first_task: usize,
    pub last_task: usize,
}

impl Block {
    pub fn new(machine: usize, first_task: usize, last_task: usize) -> Self {
        Self {
            machine,
            first_task,
            last_task,
        }
    }

    pub fn len(&self) -> usize {
        (self.last_task + 1).saturating_sub(self.first_task)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Swaps of the Nowicki & Smutnicki neighborhood for this block.
    ///
    /// Two tasks yield the single swap between them, longer blocks yield the
    /// swap of their first two and of their last two tasks. Blocks with fewer
    /// than two tasks yield nothing.
    pub fn neighbors(&self) -> Vec<Swap> {
        if self.last_task <= self.first_task {
            warn!("ignoring malformed block {self:?}");
            return vec![];
        }

        if self.last_task - self.first_task == 1 {
            vec![Swap::new(self.machine, self.first_task, self.last_task)]
        } else {
            vec![
                Swap::new(self.machine, self.first_task, self.first_task + 1),
                Swap::new(self.machine, self.last_task, self.last_task - 1),
            ]
        }
    }
}

/// Exchange of the tasks at positions `t1` and `t2` of `machine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swap {
    pub machine: usize,
    pub t1: usize,
    pub t2: usize,
}

impl Swap {
    pub fn new(machine: usize, t1: usize, t2: usize) -> Self {
        Self { machine, t1, t2 }
    }

    /// Applies the swap in place. Applying it twice restores the order.
    pub fn apply_on(&self, order: &mut ResourceOrder) {
        order.machine_tasks_mut(self.machine).swap(self.t1, self.t2);
    }

    /// `(machine, lower position, higher position)`, shared by a swap and
    /// its inverse.
    pub fn key(&self) -> (usize, usize, usize) {
        (self.machine, self.t1.min(self.t2), self.t1.max(self.t2))
    }
}

/// Returns the blocks of the critical path of `schedule`, which must be the
/// evaluation of `order`. Blocks are sorted by machine, then by position.
pub fn blocks_of_critical_path(order: &ResourceOrder, schedule: &Schedule) -> Vec<Block> {
    let critical = schedule.critical_tasks();
    let mut blocks = vec![];

    for (machine, tasks) in order.tasks_by_machine().iter().enumerate() {
        let (mut a, mut b) = (0, 0);

        for (position, task) in tasks.iter().enumerate() {
            if critical.contains(task) {
                b = position;
            } else {
                if b > a {
                    blocks.push(Block::new(machine, a, b));
                }
                a = position + 1;
                b = a;
            }
        }

        if b > a {
            blocks.push(Block::new(machine, a, b));
        }
    }

    blocks
}
