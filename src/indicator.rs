//! Status LED fault blink.

use core::time::Duration;

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::{HardwareError, Result};
use crate::time::Deadline;

/// Half-period of the fault blink, ms.
pub const FAULT_BLINK_MS: u64 = 200;

/// Latched fault conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// The home switch was never seen within the rail length.
    HomingFailed,
}

/// Blinks the status LED while a fault is latched.
#[derive(Debug)]
pub struct FaultIndicator<LED: OutputPin> {
    led: LED,
    level: PinState,
    next_toggle: Option<Deadline>,
}

impl<LED: OutputPin> FaultIndicator<LED> {
    /// Wrap the status LED pin.
    pub fn new(led: LED) -> Self {
        Self {
            led,
            level: PinState::Low,
            next_toggle: None,
        }
    }

    /// Whether the blink has been started.
    pub fn is_blinking(&self) -> bool {
        self.next_toggle.is_some()
    }

    /// Toggle the LED when due, starting the blink on the first call.
    pub fn poll(&mut self, now: Duration) -> Result<()> {
        let due = match self.next_toggle {
            Some(deadline) => deadline.is_due(now),
            None => true,
        };
        if !due {
            return Ok(());
        }

        self.level = !self.level;
        self.led
            .set_state(self.level)
            .map_err(|_| HardwareError::StatusLedPin)?;
        self.next_toggle = Some(Deadline::after(now, Duration::from_millis(FAULT_BLINK_MS)));
        Ok(())
    }

    /// Release the pin.
    pub fn release(self) -> LED {
        self.led
    }
}
