pub mod elevation;
pub mod engine;
pub mod error;
pub mod face;
pub mod graph;
pub mod math;
pub mod sampler;
pub mod solver;
pub mod topology;

pub use error::{Result, RunoffError};
