pub mod encoding;
pub mod instance_gen;
pub mod neighborhood;
pub mod schedule;
pub mod solvers;
pub mod tabu_list;

pub use jsp_parser::structs::Instance;
