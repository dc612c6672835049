use hashbrown::HashMap;

use super::TabuList;
use crate::neighborhood::Swap;

/// Tabu memory keyed by `(machine, position, position)`.
///
/// Each entry holds the first iteration at which the move is allowed again.
/// Entries are never removed, they simply stop mattering once the iteration
/// counter passes them.
#[derive(Debug, Clone, Default)]
pub struct IterationTabuList {
    allowed_from: HashMap<(usize, usize, usize), usize>,
}

impl IterationTabuList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.allowed_from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_from.is_empty()
    }
}

impl TabuList for IterationTabuList {
    fn is_possible_move(&self, swap: &Swap, iteration: usize) -> bool {
        match self.allowed_from.get(&swap.key()) {
            Some(&allowed_from) => iteration >= allowed_from,
            None => true,
        }
    }

    fn add_turn_to_tabu_list(&mut self, swap: &Swap, iteration: usize, tenure: usize) {
        self.allowed_from.insert(swap.key(), iteration + tenure);
    }
}
