use crate::neighborhood::Swap;

pub mod iteration_tabu_list;

pub use iteration_tabu_list::IterationTabuList;

pub trait TabuList {
    /// Check if move is permitted at `iteration`
    fn is_possible_move(&self, swap: &Swap, iteration: usize) -> bool;
    /// Forbid the move (and its inverse) for the next `tenure` iterations.
    fn add_turn_to_tabu_list(&mut self, swap: &Swap, iteration: usize, tenure: usize);
}
