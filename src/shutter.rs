//! Camera shutter release.
//!
//! The release line is driven high for a fixed pulse and dropped again from
//! the tick loop once the pulse has elapsed, so firing never blocks.

use core::time::Duration;

use embedded_hal::digital::OutputPin;

use crate::error::{HardwareError, Result};
use crate::time::Deadline;

/// Default length of the release pulse, ms.
pub const DEFAULT_SHUTTER_PULSE_MS: u32 = 300;

/// Whether a release pulse is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutterState {
    /// Release line low.
    Idle,
    /// Release line high until the pulse ends.
    Releasing,
}

/// Drives the camera's shutter release line.
#[derive(Debug)]
pub struct ShutterTrigger<PIN: OutputPin> {
    pin: PIN,
    pulse: Duration,
    release_ends: Option<Deadline>,
    releases: u32,
}

impl<PIN: OutputPin> ShutterTrigger<PIN> {
    /// Wrap the release pin with a pulse length in milliseconds.
    pub fn new(pin: PIN, pulse_ms: u32) -> Self {
        Self {
            pin,
            pulse: Duration::from_millis(u64::from(pulse_ms)),
            release_ends: None,
            releases: 0,
        }
    }

    /// Change the pulse length used by the next release.
    pub fn set_pulse_ms(&mut self, pulse_ms: u32) {
        self.pulse = Duration::from_millis(u64::from(pulse_ms));
    }

    /// Current state.
    pub fn state(&self) -> ShutterState {
        if self.release_ends.is_some() {
            ShutterState::Releasing
        } else {
            ShutterState::Idle
        }
    }

    /// Releases fired since construction.
    pub fn releases(&self) -> u32 {
        self.releases
    }

    /// Start a release pulse at `now`.
    ///
    /// Firing while a pulse is in flight restarts the pulse.
    pub fn fire(&mut self, now: Duration) -> Result<()> {
        self.pin.set_high().map_err(|_| HardwareError::ShutterPin)?;
        self.release_ends = Some(Deadline::after(now, self.pulse));
        self.releases = self.releases.wrapping_add(1);
        info!("Shutter released");
        Ok(())
    }

    /// End the pulse once it has elapsed.
    pub fn poll(&mut self, now: Duration) -> Result<ShutterState> {
        if let Some(deadline) = self.release_ends {
            if deadline.is_due(now) {
                self.pin.set_low().map_err(|_| HardwareError::ShutterPin)?;
                self.release_ends = None;
            }
        }
        Ok(self.state())
    }

    /// Release the pin.
    pub fn release(self) -> PIN {
        self.pin
    }
}
