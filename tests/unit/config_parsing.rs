//! Unit tests for TOML settings parsing and the file store.

use slider_motion::config::{
    load_settings, parse_settings, SettingsStore, SliderConfig, StoredSettings, TomlFileStore,
    SETTINGS_VERSION,
};
use slider_motion::error::{ConfigError, Error};
use slider_motion::DirectionSign;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("slider-motion-{}-{}.toml", name, std::process::id()))
}

/// Test parsing a complete settings record.
#[test]
fn test_parse_full_record() {
    let toml_str = r#"
version = 1

[slider]
rail_length = 800
min_slider_step = 2
homing_direction = 1
slider_direction = -1
rotate_direction = 1
slide_steps_per_mm = 160
pan_steps_per_degree = 40
homing_speed_slide = 20
homing_speed_pan = 40
default_slider_speed = 25.0
default_slider_accel = 50.0
default_rotate_speed = 15.0
default_rotate_accel = 30.0

[slider.stepping]
settle_ms = 1000
exposure_ms = 2000
shutter_pulse_ms = 150
step_speed = 3.0
step_accel = 10.0
"#;

    let record = parse_settings(toml_str).expect("Failed to parse TOML");
    let slider = &record.slider;

    assert_eq!(record.version, SETTINGS_VERSION);
    assert_eq!(slider.rail_length, 800);
    assert_eq!(slider.homing_direction, DirectionSign::FORWARD);
    assert_eq!(slider.slider_direction, DirectionSign::REVERSE);
    assert_eq!(slider.slide_steps_per_mm, 160);
    assert_eq!(slider.default_rotate_accel, 30.0);
    assert_eq!(slider.stepping.exposure_ms, 2000);
    assert_eq!(slider.stepping.shutter_pulse_ms, 150);
}

/// Test that missing fields take their compiled-in defaults.
#[test]
fn test_missing_fields_use_defaults() {
    let record = parse_settings("version = 1\n[slider]\n").expect("Failed to parse TOML");

    assert_eq!(record.slider, SliderConfig::default());
    assert_eq!(record.slider.stepping.settle_ms, 600);
}

/// Test that a direction other than +1/-1 is a parse error.
#[test]
fn test_invalid_direction_is_rejected() {
    let toml_str = r#"
version = 1

[slider]
homing_direction = 0
"#;

    let result = parse_settings(toml_str);
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test that garbage is a parse error rather than a panic.
#[test]
fn test_corrupt_record_is_parse_error() {
    assert!(parse_settings("version = [").is_err());
}

/// Test writing and reloading through a file.
#[test]
fn test_file_store_round_trip() {
    let path = temp_path("round-trip");
    let _ = std::fs::remove_file(&path);

    let mut store = TomlFileStore::new(&path);
    assert!(store.load().expect("Missing file should not be an error").is_none());

    let config = SliderConfig {
        rail_length: 1200,
        rotate_direction: DirectionSign::REVERSE,
        ..SliderConfig::default()
    };
    store
        .save(&StoredSettings::current(config.clone()))
        .expect("Failed to write settings");

    let mut reopened = TomlFileStore::new(&path);
    assert_eq!(load_settings(&mut reopened), config);

    let _ = std::fs::remove_file(&path);
}

/// Test that a corrupt file falls back to defaults.
#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let path = temp_path("corrupt");
    std::fs::write(&path, "this is not = = toml").expect("Failed to write file");

    let mut store = TomlFileStore::new(&path);
    assert!(store.load().is_err());
    assert_eq!(load_settings(&mut store), SliderConfig::default());

    let _ = std::fs::remove_file(&path);
}

/// Test that a record with unusable calibration falls back to defaults.
#[test]
fn test_invalid_values_file_falls_back() {
    let path = temp_path("invalid-values");
    std::fs::write(
        &path,
        "version = 1\n[slider]\nslide_steps_per_mm = 0\nrail_length = 0\n",
    )
    .expect("Failed to write file");

    let mut store = TomlFileStore::new(&path);
    let record = store.load().expect("Record should parse").expect("Record should exist");
    assert_eq!(record.slider.slide_steps_per_mm, 0);
    assert_eq!(load_settings(&mut store), SliderConfig::default());

    let _ = std::fs::remove_file(&path);
}

/// Test that an older record version falls back to defaults.
#[test]
fn test_version_mismatch_file_falls_back() {
    let path = temp_path("old-version");
    std::fs::write(&path, "version = 0\n[slider]\nrail_length = 900\n").expect("Failed to write file");

    let mut store = TomlFileStore::new(&path);
    assert_eq!(load_settings(&mut store), SliderConfig::default());

    let _ = std::fs::remove_file(&path);
}
