//! Unit tests for configuration field validation.

use slider_motion::config::{ConfigField, SliderConfig};
use slider_motion::error::ConfigError;
use slider_motion::DirectionSign;

/// Test every field accepts its range boundaries.
#[test]
fn test_range_boundaries_accepted() {
    for field in ConfigField::ALL {
        let (min, max) = field.range();
        let mut config = SliderConfig::default();

        assert!(config.update(field, min).is_ok(), "{} min", field.name());
        assert_eq!(config.get(field), min);
        assert!(config.update(field, max).is_ok(), "{} max", field.name());
        assert_eq!(config.get(field), max);
    }
}

/// Test values just outside the range are rejected and change nothing.
#[test]
fn test_out_of_range_rejected() {
    for field in ConfigField::ALL.iter().copied().filter(|f| !f.is_direction()) {
        let (min, max) = field.range();
        let mut config = SliderConfig::default();
        let before = config.clone();

        assert_eq!(
            config.update(field, min - 1.0),
            Err(ConfigError::OutOfRange {
                field,
                value: min - 1.0
            })
        );
        assert!(config.update(field, max + 1.0).is_err());
        assert_eq!(config, before);
    }
}

/// Test direction fields only take exact signs.
#[test]
fn test_direction_fields() {
    let mut config = SliderConfig::default();

    assert!(config.update(ConfigField::HomingDirection, 0.0).is_err());
    assert!(config.update(ConfigField::HomingDirection, 2.0).is_err());
    assert_eq!(config.homing_direction, DirectionSign::REVERSE);

    config.update(ConfigField::HomingDirection, 1.0).unwrap();
    assert_eq!(config.homing_direction, DirectionSign::FORWARD);
}

/// Test fractional values for integral fields are rejected.
#[test]
fn test_fractional_values_rejected() {
    let mut config = SliderConfig::default();
    assert!(config.update(ConfigField::SliderStepsPerMm, 187.5).is_err());
    assert!(config.update(ConfigField::MinSliderStep, f32::INFINITY).is_err());
    assert_eq!(config.slide_steps_per_mm, 187);
}
