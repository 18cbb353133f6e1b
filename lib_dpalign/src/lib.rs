pub mod context;
pub mod dp;
pub mod error;
pub mod flat_model;
mod io;
pub mod log_space;
pub mod markov_model;
pub mod pairwise_alignment;
pub mod sequence;
pub mod substitution_matrix;
pub mod symbol;
pub mod weight_matrix;
