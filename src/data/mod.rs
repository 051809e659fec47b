mod frame;
mod observations;

pub use observations::{Observation, Observations};
