//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal to a run and surface before any document is processed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A fusion weight is negative or not a finite number.
    #[error("invalid weight {name} = {value}: must be a finite, non-negative number")]
    InvalidWeight { name: &'static str, value: f64 },

    /// The fusion weights do not sum to one.
    #[error("fusion weights sum to {sum}, expected 1.0")]
    WeightsDoNotSumToOne { sum: f64 },

    /// A threshold or fraction lies outside `[0, 1]`.
    #[error("{name} = {value} is outside [0, 1]")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    /// The section match floor is negative or not finite.
    #[error("invalid section match floor {value}: must be a finite, non-negative number")]
    InvalidSectionFloor { value: f64 },

    #[error("refinement pass cap must be at least 1")]
    ZeroRefinementPasses,

    #[error("AI timeout must be greater than zero")]
    ZeroTimeout,

    #[error("embedding cache capacity must be at least 1")]
    ZeroCacheCapacity,

    /// An environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {reason}")]
    ParseError {
        name: &'static str,
        value: String,
        reason: String,
    },
}
