mod decomposition;
mod distribution;
mod divergence;
mod groups;
mod index;
mod segregation;

pub use decomposition::{decompose, Components, Decomposition};
pub use distribution::CumulativeDistributions;
pub use divergence::Divergence;
pub use groups::compute_per_group;
pub use index::{BOUND_TOLERANCE, compute, compute_from_distributions, compute_sorted, IndexEntry, SegregationIndexSet};
pub use segregation::{compute_frame, compute_per_group_frame, decompose_frame, Segregation};
