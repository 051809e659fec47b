use polars::prelude::PolarsError;

/// Errors raised while building distributions or computing segregation indices.
#[derive(Debug, thiserror::Error)]
pub enum SegregationError {
    /// The input does not have the shape the index needs (too few categories, no rows, ...).
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    /// A computed quantity left [0, 1] or was not finite. Never clamped.
    #[error("numerical invariant violated: {quantity} = {value} is not a finite value in [0, 1]")]
    NumericalInvariant { quantity: String, value: f64 },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl SegregationError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    pub(crate) fn numerical(quantity: impl Into<String>, value: f64) -> Self {
        Self::NumericalInvariant { quantity: quantity.into(), value }
    }

    /// Attach the group a per-group computation failed in.
    pub(crate) fn in_group(self, group: impl std::fmt::Display) -> Self {
        match self {
            Self::Validation { reason } => Self::Validation { reason: format!("group {group}: {reason}") },
            Self::NumericalInvariant { quantity, value } =>
                Self::NumericalInvariant { quantity: format!("{quantity} in group {group}"), value },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SegregationError>;
