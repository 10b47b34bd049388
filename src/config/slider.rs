//! Slider calibration and default-behavior record.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::field::ConfigField;
use super::units::{Degrees, DirectionSign, Millimeters, Steps};

/// Rail length the carriage can travel along, mm.
pub const DEFAULT_RAIL_LENGTH_MM: u16 = 330;
/// Slide motor steps per millimeter.
pub const DEFAULT_SLIDE_STEPS_PER_MM: u16 = 187;
/// Pan motor steps per degree.
pub const DEFAULT_PAN_STEPS_PER_DEGREE: u16 = 78;
/// Smallest stop-motion step, mm.
pub const DEFAULT_MIN_SLIDER_STEP_MM: u16 = 5;
/// Default slide speed for positioning moves, mm/s.
pub const DEFAULT_SLIDE_SPEED: f32 = 30.0;
/// Default slide acceleration for positioning moves, mm/s².
pub const DEFAULT_SLIDE_ACCEL: f32 = 60.0;
/// Default pan speed for positioning moves, °/s.
pub const DEFAULT_ROTATE_SPEED: f32 = 30.0;
/// Default pan acceleration for positioning moves, °/s².
pub const DEFAULT_ROTATE_ACCEL: f32 = 60.0;

/// Calibration constants and default speeds for the slider.
///
/// Loaded once at boot and changed only through [`SliderConfig::update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    /// Usable rail length in millimeters; also the homing travel ceiling.
    pub rail_length: u16,

    /// Smallest stop-motion step in millimeters.
    pub min_slider_step: u16,

    /// Direction the carriage moves to reach the home switch.
    pub homing_direction: DirectionSign,

    /// Logical direction of the slide axis.
    pub slider_direction: DirectionSign,

    /// Logical direction of the pan axis.
    pub rotate_direction: DirectionSign,

    /// Slide motor steps per millimeter.
    pub slide_steps_per_mm: u16,

    /// Pan motor steps per degree.
    pub pan_steps_per_degree: u16,

    /// Slide speed while seeking home, mm/s.
    pub homing_speed_slide: u16,

    /// Pan homing speed, steps/s.
    pub homing_speed_pan: u16,

    /// Slide speed for positioning moves, mm/s.
    pub default_slider_speed: f32,

    /// Slide acceleration for positioning and timed moves, mm/s².
    pub default_slider_accel: f32,

    /// Pan speed for positioning moves, °/s.
    pub default_rotate_speed: f32,

    /// Pan acceleration for positioning and timed moves, °/s².
    pub default_rotate_accel: f32,

    /// Stop-motion timing.
    pub stepping: SteppingConfig,
}

/// Timing and speed used by the stop-motion sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteppingConfig {
    /// Pause after a step completes before the shutter fires, ms.
    pub settle_ms: u32,

    /// Pause after the shutter fires before the next step starts, ms.
    pub exposure_ms: u32,

    /// Length of the shutter release pulse, ms.
    pub shutter_pulse_ms: u32,

    /// Slide speed for each step, mm/s.
    pub step_speed: f32,

    /// Slide acceleration for each step, mm/s².
    pub step_accel: f32,
}

impl Default for SteppingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 600,
            exposure_ms: 500,
            shutter_pulse_ms: 300,
            step_speed: 4.0,
            step_accel: 20.0,
        }
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            rail_length: DEFAULT_RAIL_LENGTH_MM,
            min_slider_step: DEFAULT_MIN_SLIDER_STEP_MM,
            homing_direction: DirectionSign::REVERSE,
            slider_direction: DirectionSign::FORWARD,
            rotate_direction: DirectionSign::FORWARD,
            slide_steps_per_mm: DEFAULT_SLIDE_STEPS_PER_MM,
            pan_steps_per_degree: DEFAULT_PAN_STEPS_PER_DEGREE,
            homing_speed_slide: DEFAULT_SLIDE_SPEED as u16,
            homing_speed_pan: DEFAULT_PAN_STEPS_PER_DEGREE,
            default_slider_speed: DEFAULT_SLIDE_SPEED,
            default_slider_accel: DEFAULT_SLIDE_ACCEL,
            default_rotate_speed: DEFAULT_ROTATE_SPEED,
            default_rotate_accel: DEFAULT_ROTATE_ACCEL,
            stepping: SteppingConfig::default(),
        }
    }
}

impl SliderConfig {
    /// Convert a logical slide position to raw motor steps.
    #[inline]
    pub fn slide_to_steps(&self, position: Millimeters) -> Steps {
        let steps = position.0 * self.slide_steps_per_mm as f32 * self.slider_direction.factor();
        Steps(libm::roundf(steps) as i64)
    }

    /// Convert raw slide motor steps to a logical position.
    #[inline]
    pub fn slide_from_steps(&self, steps: Steps) -> Millimeters {
        Millimeters(self.slider_direction.factor() * steps.0 as f32 / self.slide_steps_per_mm as f32)
    }

    /// Convert a logical pan angle to raw motor steps.
    #[inline]
    pub fn pan_to_steps(&self, angle: Degrees) -> Steps {
        let steps = angle.0 * self.pan_steps_per_degree as f32 * self.rotate_direction.factor();
        Steps(libm::roundf(steps) as i64)
    }

    /// Convert raw pan motor steps to a logical angle.
    #[inline]
    pub fn pan_from_steps(&self, steps: Steps) -> Degrees {
        Degrees(self.rotate_direction.factor() * steps.0 as f32 / self.pan_steps_per_degree as f32)
    }

    /// Convert a slide rate (mm/s or mm/s²) to a step rate.
    #[inline]
    pub fn slide_rate_to_steps(&self, per_second: f32) -> f32 {
        libm::fabsf(per_second) * self.slide_steps_per_mm as f32
    }

    /// Convert a pan rate (°/s or °/s²) to a step rate.
    #[inline]
    pub fn pan_rate_to_steps(&self, per_second: f32) -> f32 {
        libm::fabsf(per_second) * self.pan_steps_per_degree as f32
    }

    /// Read a runtime-updatable field as a number.
    pub fn get(&self, field: ConfigField) -> f32 {
        match field {
            ConfigField::HomingDirection => self.homing_direction.factor(),
            ConfigField::SlidingDirection => self.slider_direction.factor(),
            ConfigField::PanDirection => self.rotate_direction.factor(),
            ConfigField::SliderStepsPerMm => self.slide_steps_per_mm as f32,
            ConfigField::RotationStepsPerDegree => self.pan_steps_per_degree as f32,
            ConfigField::HomingSpeedSlide => self.homing_speed_slide as f32,
            ConfigField::HomingSpeedPan => self.homing_speed_pan as f32,
            ConfigField::MinSliderStep => self.min_slider_step as f32,
            ConfigField::RailLength => self.rail_length as f32,
        }
    }

    /// Check every field of a record read back from storage.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutOfRange` for the first runtime-updatable
    /// field its own update would reject, or `ConfigError::InvalidValue`
    /// for a speed, acceleration or pulse length the motion code cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for field in ConfigField::ALL {
            let value = self.get(field);
            if !field.accepts(value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        let speeds = [
            ("default_slider_speed", self.default_slider_speed),
            ("default_rotate_speed", self.default_rotate_speed),
            ("stepping.step_speed", self.stepping.step_speed),
        ];
        for (name, speed) in speeds {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(ConfigError::InvalidValue(name));
            }
        }

        // Zero acceleration means no ramp
        let accels = [
            ("default_slider_accel", self.default_slider_accel),
            ("default_rotate_accel", self.default_rotate_accel),
            ("stepping.step_accel", self.stepping.step_accel),
        ];
        for (name, accel) in accels {
            if !accel.is_finite() || accel < 0.0 {
                return Err(ConfigError::InvalidValue(name));
            }
        }

        if self.stepping.shutter_pulse_ms == 0 {
            return Err(ConfigError::InvalidValue("stepping.shutter_pulse_ms"));
        }
        Ok(())
    }

    /// Validate and apply a single field update.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutOfRange` and leaves the record untouched if
    /// the value is outside the field's range.
    pub fn update(&mut self, field: ConfigField, value: f32) -> Result<(), ConfigError> {
        if !field.accepts(value) {
            return Err(ConfigError::OutOfRange { field, value });
        }

        match field {
            ConfigField::HomingDirection => self.homing_direction = DirectionSign::new(value as i32)?,
            ConfigField::SlidingDirection => self.slider_direction = DirectionSign::new(value as i32)?,
            ConfigField::PanDirection => self.rotate_direction = DirectionSign::new(value as i32)?,
            ConfigField::SliderStepsPerMm => self.slide_steps_per_mm = value as u16,
            ConfigField::RotationStepsPerDegree => self.pan_steps_per_degree = value as u16,
            ConfigField::HomingSpeedSlide => self.homing_speed_slide = value as u16,
            ConfigField::HomingSpeedPan => self.homing_speed_pan = value as u16,
            ConfigField::MinSliderStep => self.min_slider_step = value as u16,
            ConfigField::RailLength => self.rail_length = value as u16,
        }

        Ok(())
    }
}
