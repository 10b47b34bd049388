//! Status and command surface for the network layer.
//!
//! Snapshots serialize with the field names the web front end expects.
//! [`Command`] is the deserializable form of every slider command; the
//! transport parses a request into one and hands it to [`Slider::execute`].

use embedded_hal::digital::{InputPin, OutputPin};
use serde::{Deserialize, Serialize};

use crate::axis::MotionAxis;
use crate::config::units::{Degrees, Millimeters};
use crate::config::{ConfigField, SettingsStore, SliderConfig};
use crate::error::Result;
use crate::slider::{AxisMove, AxisRates, BookmarkKind, Slider};
use crate::time::SystemClock;

/// Point-in-time view of the slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderStatus {
    /// Homing has completed since power-on.
    pub homed: bool,
    /// Motor drivers are enabled.
    pub motors_enabled: bool,
    /// State ordinal.
    pub state: u8,
    /// Slide position, mm.
    pub slide_pos: f32,
    /// Pan angle, degrees.
    pub pan_pos_degrees: f32,
    /// Start bookmark slide position, mm.
    pub start_slide: f32,
    /// Start bookmark pan angle, degrees.
    pub start_pan_degrees: f32,
    /// End bookmark slide position, mm.
    pub end_slide: f32,
    /// End bookmark pan angle, degrees.
    pub end_pan_degrees: f32,
    /// A fault is latched and a reset is needed.
    pub faulted: bool,
}

/// Calibration values shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    /// Rail length, mm.
    pub rail_length: u16,
    /// Homing direction sign.
    pub homing_direction: i8,
    /// Slide direction sign.
    pub slide_direction: i8,
    /// Pan direction sign.
    pub rotate_direction: i8,
    /// Slide steps per mm.
    pub slide_steps_per_unit: u16,
    /// Pan steps per degree.
    pub pan_steps_per_degree: u16,
    /// Slide homing speed, mm/s.
    pub homing_speed_slide: u16,
    /// Pan homing speed.
    pub homing_speed_pan: u16,
}

impl From<&SliderConfig> for ConfigSnapshot {
    fn from(config: &SliderConfig) -> Self {
        Self {
            rail_length: config.rail_length,
            homing_direction: config.homing_direction.value(),
            slide_direction: config.slider_direction.value(),
            rotate_direction: config.rotate_direction.value(),
            slide_steps_per_unit: config.slide_steps_per_mm,
            pan_steps_per_degree: config.pan_steps_per_degree,
            homing_speed_slide: config.homing_speed_slide,
            homing_speed_pan: config.homing_speed_pan,
        }
    }
}

/// A command accepted from the network layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Enable the motor drivers.
    EnableMotors,
    /// Disable the motor drivers.
    DisableMotors,
    /// Force a state by ordinal. Ordinals at or beyond the sentinels are
    /// rejected.
    SetState {
        /// State ordinal.
        state: u8,
    },
    /// Store an explicit start bookmark.
    SetStart {
        /// Slide position, mm.
        slide: f32,
        /// Pan angle, degrees.
        pan: f32,
    },
    /// Store an explicit end bookmark.
    SetEnd {
        /// Slide position, mm.
        slide: f32,
        /// Pan angle, degrees.
        pan: f32,
    },
    /// Store the current position as the start bookmark.
    CaptureStart,
    /// Store the current position as the end bookmark.
    CaptureEnd,
    /// Set the traverse duration.
    SetDuration {
        /// Seconds; zero counts as one.
        seconds: u32,
    },
    /// Move to start, then traverse to end.
    StartMotion,
    /// Seek the home switch.
    Home,
    /// Direct move to absolute positions.
    MoveAbsolute {
        /// Slide axis.
        slide: AxisMove,
        /// Pan axis.
        pan: AxisMove,
    },
    /// Direct move by offsets.
    MoveRelative {
        /// Slide axis.
        slide: AxisMove,
        /// Pan axis.
        pan: AxisMove,
    },
    /// Direct move to a stored bookmark.
    MoveToBookmark {
        /// Which bookmark.
        bookmark: BookmarkKind,
        /// Slide rates.
        slide: AxisRates,
        /// Pan rates.
        pan: AxisRates,
    },
    /// Start a stop-motion session.
    StartStepping {
        /// Total slide travel, mm.
        total_distance: f32,
        /// Travel per step, mm.
        step_size: f32,
    },
    /// Make the current pan angle zero.
    SetPanHome,
    /// Update and persist one configuration field.
    ///
    /// If the write fails the previous value stays in effect.
    UpdateConfig {
        /// Field to change.
        field: ConfigField,
        /// New value.
        value: f32,
    },
    /// Update and persist the rail length.
    SetRailLength {
        /// Rail length, mm.
        rail_length: u32,
    },
}

impl<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK> Slider<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>
where
    SLIDE: MotionAxis,
    PAN: MotionAxis,
    EN: OutputPin,
    SH: OutputPin,
    LED: OutputPin,
    LIM: InputPin,
    CLK: SystemClock,
{
    /// Snapshot of the current state, positions and bookmarks in logical units.
    pub fn status(&self) -> SliderStatus {
        let config = self.config();
        let start = self.start_bookmark();
        let end = self.end_bookmark();

        SliderStatus {
            homed: self.is_homed(),
            motors_enabled: self.motors_enabled(),
            state: self.state().ordinal(),
            slide_pos: self.slide_position().value(),
            pan_pos_degrees: self.pan_position().value(),
            start_slide: config.slide_from_steps(start.slide).value(),
            start_pan_degrees: config.pan_from_steps(start.pan).value(),
            end_slide: config.slide_from_steps(end.slide).value(),
            end_pan_degrees: config.pan_from_steps(end.pan).value(),
            faulted: self.fault().is_some(),
        }
    }

    /// Snapshot of the calibration values.
    pub fn config_snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::from(self.config())
    }

    /// Apply a command.
    ///
    /// Configuration updates are written to `store` before this returns.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason; a rejected command changes nothing.
    pub fn execute<S: SettingsStore>(&mut self, command: Command, store: &mut S) -> Result<()> {
        debug!("Executing command");

        match command {
            Command::EnableMotors => self.enable_motors(),
            Command::DisableMotors => self.disable_motors(),
            Command::SetState { state } => self.request_state(state).map(|_| ()),
            Command::SetStart { slide, pan } => self.set_start(Millimeters(slide), Degrees(pan)),
            Command::SetEnd { slide, pan } => self.set_end(Millimeters(slide), Degrees(pan)),
            Command::CaptureStart => self.capture_start(),
            Command::CaptureEnd => self.capture_end(),
            Command::SetDuration { seconds } => self.set_duration(seconds),
            Command::StartMotion => self.start_motion(),
            Command::Home => self.home(),
            Command::MoveAbsolute { slide, pan } => self.move_absolute(slide, pan),
            Command::MoveRelative { slide, pan } => self.move_relative(slide, pan),
            Command::MoveToBookmark {
                bookmark,
                slide,
                pan,
            } => self.move_to_bookmark(bookmark, slide, pan),
            Command::StartStepping {
                total_distance,
                step_size,
            } => self.start_stepping(Millimeters(total_distance), Millimeters(step_size)),
            Command::SetPanHome => self.set_pan_home(),
            Command::UpdateConfig { field, value } => self.update_config(field, value, store),
            Command::SetRailLength { rail_length } => self.update_rail_length(rail_length, store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_snapshot_from_defaults() {
        let snapshot = ConfigSnapshot::from(&SliderConfig::default());

        assert_eq!(snapshot.rail_length, 330);
        assert_eq!(snapshot.homing_direction, -1);
        assert_eq!(snapshot.slide_direction, 1);
        assert_eq!(snapshot.slide_steps_per_unit, 187);
        assert_eq!(snapshot.pan_steps_per_degree, 78);
    }
}
