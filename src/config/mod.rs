//! Environment-backed engine configuration.
//!
//! Every setting has a default (see [`crate::constants`]). Override with `FOLIO_*` environment
//! variables, then call [`Config::validate`]. The engine and pipeline validate again at
//! construction, so an invalid configuration never reaches a document.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AI_TIMEOUT_SECS, DEFAULT_EMBEDDING_CACHE_CAPACITY,
    DEFAULT_ESCALATION_COVERAGE_FLOOR, DEFAULT_ESCALATION_UNLABELED_FRACTION,
    DEFAULT_NEAR_DUPLICATE_THRESHOLD, DEFAULT_NUMBER_ACCEPTANCE_FLOOR,
    DEFAULT_NUMBER_COVERAGE_THRESHOLD, DEFAULT_REFINEMENT_MAX_PASSES,
    DEFAULT_SECTION_MATCH_FLOOR, DEFAULT_W_CONTINUITY, DEFAULT_W_NUMBER, DEFAULT_W_SECTION,
    WEIGHT_SUM_EPSILON,
};

/// Fusion weights. Must sum to `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Weight of the page-number signal. Default: `0.6`.
    pub number: f64,
    /// Weight of the section signal. Default: `0.2`.
    pub section: f64,
    /// Weight of the continuity signal. Default: `0.2`.
    pub continuity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            number: DEFAULT_W_NUMBER,
            section: DEFAULT_W_SECTION,
            continuity: DEFAULT_W_CONTINUITY,
        }
    }
}

impl Weights {
    pub fn new(number: f64, section: f64, continuity: f64) -> Self {
        Self {
            number,
            section,
            continuity,
        }
    }

    pub fn sum(&self) -> f64 {
        self.number + self.section + self.continuity
    }
}

/// Engine configuration.
///
/// Use [`Config::from_env`] to read `FOLIO_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Signal fusion weights.
    pub weights: Weights,

    /// Coverage at or above which pages are ordered by number. Default: `0.7`.
    pub number_coverage_threshold: f64,

    /// Cosine similarity for near-duplicate grouping. Default: `0.95`.
    pub near_duplicate_threshold: f64,

    /// Confidence a detected number needs to be accepted. Default: `0.5`.
    pub number_acceptance_floor: f64,

    /// Minimum keyword score for a section label. Default: `1.0`.
    pub section_match_floor: f64,

    /// Coverage below which the document is escalated. Default: `0.3`.
    pub escalation_coverage_floor: f64,

    /// Escalate when more than this fraction of pages has neither number nor section.
    /// Default: `0.5`.
    pub escalation_unlabeled_fraction: f64,

    /// Cap on refinement passes. Default: `64`.
    pub refinement_max_passes: u32,

    /// Bound on a single reasoning call. Default: 30s.
    pub ai_timeout: Duration,

    /// Model name for the `genai` reasoner; `None` disables it.
    pub ai_model: Option<String>,

    /// Max entries in the per-pipeline embedding cache. Default: `4096`.
    pub embedding_cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            number_coverage_threshold: DEFAULT_NUMBER_COVERAGE_THRESHOLD,
            near_duplicate_threshold: DEFAULT_NEAR_DUPLICATE_THRESHOLD,
            number_acceptance_floor: DEFAULT_NUMBER_ACCEPTANCE_FLOOR,
            section_match_floor: DEFAULT_SECTION_MATCH_FLOOR,
            escalation_coverage_floor: DEFAULT_ESCALATION_COVERAGE_FLOOR,
            escalation_unlabeled_fraction: DEFAULT_ESCALATION_UNLABELED_FRACTION,
            refinement_max_passes: DEFAULT_REFINEMENT_MAX_PASSES,
            ai_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            ai_model: None,
            embedding_cache_capacity: DEFAULT_EMBEDDING_CACHE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_W_NUMBER: &'static str = "FOLIO_W_NUMBER";
    const ENV_W_SECTION: &'static str = "FOLIO_W_SECTION";
    const ENV_W_CONTINUITY: &'static str = "FOLIO_W_CONTINUITY";
    const ENV_NUMBER_COVERAGE_THRESHOLD: &'static str = "FOLIO_NUMBER_COVERAGE_THRESHOLD";
    const ENV_NEAR_DUPLICATE_THRESHOLD: &'static str = "FOLIO_NEAR_DUPLICATE_THRESHOLD";
    const ENV_NUMBER_ACCEPTANCE_FLOOR: &'static str = "FOLIO_NUMBER_ACCEPTANCE_FLOOR";
    const ENV_SECTION_MATCH_FLOOR: &'static str = "FOLIO_SECTION_MATCH_FLOOR";
    const ENV_ESCALATION_COVERAGE_FLOOR: &'static str = "FOLIO_ESCALATION_COVERAGE_FLOOR";
    const ENV_ESCALATION_UNLABELED_FRACTION: &'static str = "FOLIO_ESCALATION_UNLABELED_FRACTION";
    const ENV_REFINEMENT_MAX_PASSES: &'static str = "FOLIO_REFINEMENT_MAX_PASSES";
    const ENV_AI_TIMEOUT_SECS: &'static str = "FOLIO_AI_TIMEOUT_SECS";
    const ENV_AI_MODEL: &'static str = "FOLIO_AI_MODEL";
    const ENV_EMBEDDING_CACHE_CAPACITY: &'static str = "FOLIO_EMBEDDING_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Values are parsed but not validated; call [`Config::validate`] afterwards.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let weights = Weights {
            number: Self::parse_from_env(Self::ENV_W_NUMBER, defaults.weights.number)?,
            section: Self::parse_from_env(Self::ENV_W_SECTION, defaults.weights.section)?,
            continuity: Self::parse_from_env(
                Self::ENV_W_CONTINUITY,
                defaults.weights.continuity,
            )?,
        };

        let ai_timeout_secs: u64 =
            Self::parse_from_env(Self::ENV_AI_TIMEOUT_SECS, defaults.ai_timeout.as_secs())?;

        Ok(Self {
            weights,
            number_coverage_threshold: Self::parse_from_env(
                Self::ENV_NUMBER_COVERAGE_THRESHOLD,
                defaults.number_coverage_threshold,
            )?,
            near_duplicate_threshold: Self::parse_from_env(
                Self::ENV_NEAR_DUPLICATE_THRESHOLD,
                defaults.near_duplicate_threshold,
            )?,
            number_acceptance_floor: Self::parse_from_env(
                Self::ENV_NUMBER_ACCEPTANCE_FLOOR,
                defaults.number_acceptance_floor,
            )?,
            section_match_floor: Self::parse_from_env(
                Self::ENV_SECTION_MATCH_FLOOR,
                defaults.section_match_floor,
            )?,
            escalation_coverage_floor: Self::parse_from_env(
                Self::ENV_ESCALATION_COVERAGE_FLOOR,
                defaults.escalation_coverage_floor,
            )?,
            escalation_unlabeled_fraction: Self::parse_from_env(
                Self::ENV_ESCALATION_UNLABELED_FRACTION,
                defaults.escalation_unlabeled_fraction,
            )?,
            refinement_max_passes: Self::parse_from_env(
                Self::ENV_REFINEMENT_MAX_PASSES,
                defaults.refinement_max_passes,
            )?,
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            ai_model: Self::parse_optional_string_from_env(Self::ENV_AI_MODEL),
            embedding_cache_capacity: Self::parse_from_env(
                Self::ENV_EMBEDDING_CACHE_CAPACITY,
                defaults.embedding_cache_capacity,
            )?,
        })
    }

    /// Checks the weight-sum invariant and every threshold range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (name, value) in [
            ("w_number", w.number),
            ("w_section", w.section),
            ("w_continuity", w.continuity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        let sum = w.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }

        for (name, value) in [
            ("number_coverage_threshold", self.number_coverage_threshold),
            ("near_duplicate_threshold", self.near_duplicate_threshold),
            ("number_acceptance_floor", self.number_acceptance_floor),
            ("escalation_coverage_floor", self.escalation_coverage_floor),
            (
                "escalation_unlabeled_fraction",
                self.escalation_unlabeled_fraction,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if !self.section_match_floor.is_finite() || self.section_match_floor < 0.0 {
            return Err(ConfigError::InvalidSectionFloor {
                value: self.section_match_floor,
            });
        }

        if self.refinement_max_passes == 0 {
            return Err(ConfigError::ZeroRefinementPasses);
        }

        if self.ai_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        if self.embedding_cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }

        Ok(())
    }

    /// Returns a copy with the given weights (not validated).
    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::ParseError {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
