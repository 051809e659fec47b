#![doc = "Reardon's ordinal segregation indices and their between/within group decomposition"]
mod config;
mod data;
mod error;
mod segregation;
mod types;

#[doc(inline)]
pub use config::SegregationConfig;

#[doc(inline)]
pub use data::{Observation, Observations};

#[doc(inline)]
pub use error::{Result, SegregationError};

#[doc(inline)]
pub use segregation::{
    BOUND_TOLERANCE, compute, compute_from_distributions, compute_frame, compute_per_group, compute_per_group_frame,
    compute_sorted, decompose, decompose_frame, Components, CumulativeDistributions, Decomposition,
    Divergence, IndexEntry, Segregation, SegregationIndexSet,
};

#[doc(inline)]
pub use types::Level;
