//! Configuration module for slider-motion.
//!
//! Provides the calibration record, its runtime-updatable fields and the
//! versioned settings store it is persisted through.

mod field;
mod slider;
mod store;
pub mod units;

pub use field::ConfigField;
pub use slider::{
    SliderConfig, SteppingConfig, DEFAULT_MIN_SLIDER_STEP_MM, DEFAULT_PAN_STEPS_PER_DEGREE,
    DEFAULT_RAIL_LENGTH_MM, DEFAULT_ROTATE_ACCEL, DEFAULT_ROTATE_SPEED, DEFAULT_SLIDE_ACCEL,
    DEFAULT_SLIDE_SPEED, DEFAULT_SLIDE_STEPS_PER_MM,
};
pub use store::{
    check_version, load_settings, MemoryStore, SettingsStore, StoredSettings, SETTINGS_VERSION,
};

#[cfg(feature = "std")]
pub use store::{parse_settings, TomlFileStore};

// Re-export unit types at config level
pub use units::{Degrees, DirectionSign, Millimeters, Steps};
