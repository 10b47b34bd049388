//! Externally updatable configuration fields and their accepted ranges.

use serde::{Deserialize, Serialize};

/// A single named configuration field that may be changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    /// Direction the carriage travels to find the home switch.
    HomingDirection,
    /// Logical direction of the slide axis.
    SlidingDirection,
    /// Logical direction of the pan axis.
    PanDirection,
    /// Slide motor steps per millimeter.
    SliderStepsPerMm,
    /// Pan motor steps per degree.
    RotationStepsPerDegree,
    /// Slide speed while seeking home, mm/s.
    HomingSpeedSlide,
    /// Pan speed while homing, steps/s.
    HomingSpeedPan,
    /// Smallest stop-motion step, mm.
    MinSliderStep,
    /// Usable rail length, mm.
    RailLength,
}

impl ConfigField {
    /// All updatable fields.
    pub const ALL: [ConfigField; 9] = [
        ConfigField::HomingDirection,
        ConfigField::SlidingDirection,
        ConfigField::PanDirection,
        ConfigField::SliderStepsPerMm,
        ConfigField::RotationStepsPerDegree,
        ConfigField::HomingSpeedSlide,
        ConfigField::HomingSpeedPan,
        ConfigField::MinSliderStep,
        ConfigField::RailLength,
    ];

    /// Field name as used in stored settings and the configuration snapshot.
    pub const fn name(self) -> &'static str {
        match self {
            ConfigField::HomingDirection => "homing_direction",
            ConfigField::SlidingDirection => "slider_direction",
            ConfigField::PanDirection => "rotate_direction",
            ConfigField::SliderStepsPerMm => "slide_steps_per_mm",
            ConfigField::RotationStepsPerDegree => "pan_steps_per_degree",
            ConfigField::HomingSpeedSlide => "homing_speed_slide",
            ConfigField::HomingSpeedPan => "homing_speed_pan",
            ConfigField::MinSliderStep => "min_slider_step",
            ConfigField::RailLength => "rail_length",
        }
    }

    /// Look a field up by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Inclusive range of accepted values.
    pub const fn range(self) -> (f32, f32) {
        match self {
            ConfigField::HomingDirection
            | ConfigField::SlidingDirection
            | ConfigField::PanDirection => (-1.0, 1.0),
            ConfigField::SliderStepsPerMm => (1.0, 10_000.0),
            ConfigField::RotationStepsPerDegree => (1.0, 10_000.0),
            ConfigField::HomingSpeedSlide => (1.0, 500.0),
            ConfigField::HomingSpeedPan => (1.0, 10_000.0),
            ConfigField::MinSliderStep => (1.0, 100.0),
            ConfigField::RailLength => (10.0, 5_000.0),
        }
    }

    /// Whether the field holds a direction sign.
    pub const fn is_direction(self) -> bool {
        matches!(
            self,
            ConfigField::HomingDirection | ConfigField::SlidingDirection | ConfigField::PanDirection
        )
    }

    /// Check a value against the field's range.
    ///
    /// Direction fields only accept exactly 1 or -1, every other field only
    /// accepts whole numbers.
    pub fn accepts(self, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.is_direction() {
            return value == 1.0 || value == -1.0;
        }
        let (min, max) = self.range();
        value >= min && value <= max && libm::truncf(value) == value
    }
}
