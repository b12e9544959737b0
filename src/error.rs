//! Error type shared by the sampler, the diagnostics and the exporters.

use thiserror::Error;

/// Everything that can go wrong while building or running a chain.
///
/// A rejected proposal is not an error: it is the expected outcome of the
/// acceptance test and shows up as a repeated state in the output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetropolisError {
    /// A caller-supplied argument is out of range (e.g. zero samples).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The initial state has a density for which the acceptance ratio is undefined.
    #[error("target density at initial state {state} is {density}; it must be finite and strictly positive")]
    Domain { state: f64, density: f64 },

    /// The proposal produced a NaN or infinite candidate.
    #[error("proposal returned non-finite candidate {candidate} from state {current}")]
    NonFiniteProposal { current: f64, candidate: f64 },

    /// The target density returned a negative or non-finite value at a candidate.
    #[error("target density at {state} is {density}; densities must be finite and non-negative")]
    InvalidDensity { state: f64, density: f64 },

    /// A diagnostic could not be computed from the given samples.
    #[error("statistics error: {0}")]
    Stats(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl MetropolisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn stats(msg: impl Into<String>) -> Self {
        Self::Stats(msg.into())
    }
}

/// Lossy conversion used when reporting scalar values in errors and logs.
pub(crate) fn as_f64<T: num_traits::ToPrimitive>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}
