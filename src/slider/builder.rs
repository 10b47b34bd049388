//! Builder pattern for Slider.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::axis::MotionAxis;
use crate::config::SliderConfig;
use crate::error::{ConfigError, Error, Result};
use crate::indicator::FaultIndicator;
use crate::shutter::ShutterTrigger;
use crate::time::SystemClock;

use super::machine::{Bookmark, Slider};
use super::state::{ControlCell, SliderState};

/// Builder for creating Slider instances.
pub struct SliderBuilder<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>
where
    SLIDE: MotionAxis,
    PAN: MotionAxis,
    EN: OutputPin,
    SH: OutputPin,
    LED: OutputPin,
    LIM: InputPin,
    CLK: SystemClock,
{
    cell: Option<&'c ControlCell>,
    config: SliderConfig,
    slide: Option<SLIDE>,
    pan: Option<PAN>,
    enable_pin: Option<EN>,
    shutter_pin: Option<SH>,
    status_led: Option<LED>,
    home_switch: Option<LIM>,
    clock: Option<CLK>,
}

impl<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK> Default
    for SliderBuilder<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>
where
    SLIDE: MotionAxis,
    PAN: MotionAxis,
    EN: OutputPin,
    SH: OutputPin,
    LED: OutputPin,
    LIM: InputPin,
    CLK: SystemClock,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK> SliderBuilder<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>
where
    SLIDE: MotionAxis,
    PAN: MotionAxis,
    EN: OutputPin,
    SH: OutputPin,
    LED: OutputPin,
    LIM: InputPin,
    CLK: SystemClock,
{
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            cell: None,
            config: SliderConfig::default(),
            slide: None,
            pan: None,
            enable_pin: None,
            shutter_pin: None,
            status_led: None,
            home_switch: None,
            clock: None,
        }
    }

    /// Set the control cell shared with the endstop guard.
    pub fn cell(mut self, cell: &'c ControlCell) -> Self {
        self.cell = Some(cell);
        self
    }

    /// Set the configuration, usually from [`load_settings`](crate::config::load_settings).
    pub fn config(mut self, config: SliderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the slide axis.
    pub fn slide_axis(mut self, axis: SLIDE) -> Self {
        self.slide = Some(axis);
        self
    }

    /// Set the pan axis.
    pub fn pan_axis(mut self, axis: PAN) -> Self {
        self.pan = Some(axis);
        self
    }

    /// Set the driver enable pin (active low).
    pub fn enable_pin(mut self, pin: EN) -> Self {
        self.enable_pin = Some(pin);
        self
    }

    /// Set the shutter release pin.
    pub fn shutter_pin(mut self, pin: SH) -> Self {
        self.shutter_pin = Some(pin);
        self
    }

    /// Set the status LED pin.
    pub fn status_led(mut self, pin: LED) -> Self {
        self.status_led = Some(pin);
        self
    }

    /// Set the home limit switch input.
    pub fn home_switch(mut self, pin: LIM) -> Self {
        self.home_switch = Some(pin);
        self
    }

    /// Set the time source.
    pub fn clock(mut self, clock: CLK) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the Slider.
    ///
    /// Enables the drivers, leaving the slider `Idle`, and arms the endstop
    /// guard.
    ///
    /// # Errors
    ///
    /// Returns an error if a required part is missing or the enable pin
    /// cannot be driven.
    pub fn build(self) -> Result<Slider<'c, SLIDE, PAN, EN, SH, LED, LIM, CLK>> {
        let cell = self.cell.ok_or_else(|| missing("cell"))?;
        let slide = self.slide.ok_or_else(|| missing("slide_axis"))?;
        let pan = self.pan.ok_or_else(|| missing("pan_axis"))?;
        let enable_pin = self.enable_pin.ok_or_else(|| missing("enable_pin"))?;
        let shutter_pin = self.shutter_pin.ok_or_else(|| missing("shutter_pin"))?;
        let status_led = self.status_led.ok_or_else(|| missing("status_led"))?;
        let home_switch = self.home_switch.ok_or_else(|| missing("home_switch"))?;
        let clock = self.clock.ok_or_else(|| missing("clock"))?;

        let shutter = ShutterTrigger::new(shutter_pin, self.config.stepping.shutter_pulse_ms);

        let mut slider = Slider {
            cell,
            config: self.config,
            slide,
            pan,
            enable_pin,
            shutter,
            indicator: FaultIndicator::new(status_led),
            home_switch,
            clock,
            start: Bookmark::default(),
            end: Bookmark::default(),
            duration_secs: 1,
            homed: false,
            fault: None,
            session: None,
            pause: None,
            backing_off: false,
            last_state: SliderState::Idle,
            driver_enabled: None,
        };

        slider.enable_motors()?;
        cell.arm_guard();
        info!("Slider ready");

        Ok(slider)
    }
}

fn missing(name: &'static str) -> Error {
    Error::Config(ConfigError::MissingComponent(name))
}
