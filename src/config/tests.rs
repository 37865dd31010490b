use super::*;
use serial_test::serial;
use std::env;
use std::time::Duration;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_folio_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("FOLIO_W_NUMBER");
        env::remove_var("FOLIO_W_SECTION");
        env::remove_var("FOLIO_W_CONTINUITY");
        env::remove_var("FOLIO_NUMBER_COVERAGE_THRESHOLD");
        env::remove_var("FOLIO_NEAR_DUPLICATE_THRESHOLD");
        env::remove_var("FOLIO_NUMBER_ACCEPTANCE_FLOOR");
        env::remove_var("FOLIO_SECTION_MATCH_FLOOR");
        env::remove_var("FOLIO_ESCALATION_COVERAGE_FLOOR");
        env::remove_var("FOLIO_ESCALATION_UNLABELED_FRACTION");
        env::remove_var("FOLIO_REFINEMENT_MAX_PASSES");
        env::remove_var("FOLIO_AI_TIMEOUT_SECS");
        env::remove_var("FOLIO_AI_MODEL");
        env::remove_var("FOLIO_EMBEDDING_CACHE_CAPACITY");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.weights.number, 0.6);
    assert_eq!(config.weights.section, 0.2);
    assert_eq!(config.weights.continuity, 0.2);
    assert_eq!(config.number_coverage_threshold, 0.7);
    assert_eq!(config.near_duplicate_threshold, 0.95);
    assert_eq!(config.ai_timeout, Duration::from_secs(30));
    assert!(config.ai_model.is_none());
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_weights_summing_to_point_nine_rejected() {
    let config = Config::default().with_weights(Weights::new(0.5, 0.2, 0.2));

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::WeightsDoNotSumToOne { .. }));
    assert!(err.to_string().contains("expected 1.0"));
}

#[test]
fn test_weights_within_epsilon_accepted() {
    let config = Config::default().with_weights(Weights::new(0.1 + 0.2, 0.3, 0.4));
    assert!(config.validate().is_ok());
}

#[test]
fn test_negative_weight_rejected() {
    let config = Config::default().with_weights(Weights::new(1.2, -0.2, 0.0));

    let err = config.validate().unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidWeight {
            name: "w_section",
            value: -0.2
        }
    );
}

#[test]
fn test_nan_weight_rejected() {
    let config = Config::default().with_weights(Weights::new(f64::NAN, 0.5, 0.5));
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidWeight { name: "w_number", .. })
    ));
}

#[test]
fn test_threshold_out_of_range_rejected() {
    let config = Config {
        near_duplicate_threshold: 1.5,
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ThresholdOutOfRange {
            name: "near_duplicate_threshold",
            ..
        }
    ));
}

#[test]
fn test_negative_coverage_threshold_rejected() {
    let config = Config {
        number_coverage_threshold: -0.1,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_refinement_passes_rejected() {
    let config = Config {
        refinement_max_passes: 0,
        ..Default::default()
    };
    assert_eq!(
        config.validate().unwrap_err(),
        ConfigError::ZeroRefinementPasses
    );
}

#[test]
fn test_zero_timeout_rejected() {
    let config = Config {
        ai_timeout: Duration::ZERO,
        ..Default::default()
    };
    assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroTimeout);
}

#[test]
fn test_negative_section_floor_rejected() {
    let config = Config {
        section_match_floor: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidSectionFloor { .. })
    ));
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_folio_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn test_from_env_custom_weights() {
    clear_folio_env();

    with_env_vars(
        &[
            ("FOLIO_W_NUMBER", "0.5"),
            ("FOLIO_W_SECTION", "0.25"),
            ("FOLIO_W_CONTINUITY", "0.25"),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.weights, Weights::new(0.5, 0.25, 0.25));
            assert!(config.validate().is_ok());
        },
    );
}

#[test]
#[serial]
fn test_from_env_unbalanced_weights_fail_validation() {
    clear_folio_env();

    with_env_vars(&[("FOLIO_W_NUMBER", "0.9")], || {
        let config = Config::from_env().expect("parsing does not validate");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    });
}

#[test]
#[serial]
fn test_from_env_unparseable_value() {
    clear_folio_env();

    with_env_vars(&[("FOLIO_NUMBER_COVERAGE_THRESHOLD", "seventy")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ParseError {
                name: "FOLIO_NUMBER_COVERAGE_THRESHOLD",
                ..
            }
        ));
        assert!(err.to_string().contains("seventy"));
    });
}

#[test]
#[serial]
fn test_from_env_timeout_and_model() {
    clear_folio_env();

    with_env_vars(
        &[
            ("FOLIO_AI_TIMEOUT_SECS", "5"),
            ("FOLIO_AI_MODEL", "  gemini-2.5-flash-lite  "),
        ],
        || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.ai_timeout, Duration::from_secs(5));
            assert_eq!(config.ai_model.as_deref(), Some("gemini-2.5-flash-lite"));
        },
    );
}

#[test]
#[serial]
fn test_from_env_empty_model_is_none() {
    clear_folio_env();

    with_env_vars(&[("FOLIO_AI_MODEL", "   ")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.ai_model.is_none());
    });
}

#[test]
#[serial]
fn test_from_env_refinement_passes() {
    clear_folio_env();

    with_env_vars(&[("FOLIO_REFINEMENT_MAX_PASSES", "8")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.refinement_max_passes, 8);
    });
}
