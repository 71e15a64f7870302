//! Error types for the replay layer.
//!
//! Sampling never aborts mid-stream: parameter problems are rejected up
//! front with a structured error, before any engine output is consumed, and
//! NaN shape parameters that the reference stream propagates as NaN results
//! are deliberately *not* errors (see the facade documentation).

use thiserror::Error;

/// Categorised failures surfaced by construction and sampling calls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RandstateError {
    /// The engine's declared output shape cannot be normalised into 64-bit
    /// words (for example a container whose block holds fewer than 64 bits).
    #[error("unsupported engine output shape: {reason}")]
    UnsupportedShape {
        /// Why the shape was rejected.
        reason: String,
    },

    /// `high - low` is not finite, so no uniform draw can be attempted.
    #[error("non-finite sampling range [{low}, {high}]")]
    NonFiniteRange {
        /// Requested lower bound.
        low: f64,
        /// Requested upper bound.
        high: f64,
    },

    /// An inclusive integer range where the lower bound exceeds the upper.
    #[error("empty integer range: low exceeds high")]
    EmptyRange,

    /// A distribution parameter outside its documented domain.
    #[error("invalid distribution parameter {name} = {value}")]
    InvalidParameter {
        /// Parameter name as documented on the sampling method.
        name: &'static str,
        /// Offending value, widened to double precision.
        value: f64,
    },

    /// A probability vector with negative entries or mass above one.
    #[error("probabilities must be non-negative and sum to at most 1")]
    InvalidProbabilities,
}

impl RandstateError {
    /// Shorthand used by the facade's domain checks.
    pub(crate) fn param(name: &'static str, value: f64) -> Self {
        RandstateError::InvalidParameter { name, value }
    }
}
