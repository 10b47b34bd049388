//! Motion axis abstraction.
//!
//! A [`MotionAxis`] is one stepper-driven degree of freedom. It works purely in
//! raw motor steps; the slider converts millimeters and degrees, applies
//! direction signs, and decides when to advance it.

mod sim;
mod stepper;

use embedded_hal::digital::{InputPin, PinState};

use crate::config::units::{DirectionSign, Steps};
use crate::error::Result;

pub use sim::{SimulatedAxis, SimulatedSwitch};
pub use stepper::{StepperAxis, PULSE_WIDTH_US};

/// Where a move should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisTarget {
    /// Absolute step position.
    Absolute(Steps),
    /// Offset from the current position.
    Relative(Steps),
}

impl AxisTarget {
    /// Resolve to an absolute position given the current one.
    #[inline]
    pub fn resolve(self, current: Steps) -> Steps {
        match self {
            AxisTarget::Absolute(steps) => steps,
            AxisTarget::Relative(delta) => current + delta,
        }
    }
}

/// Capabilities the slider needs from one stepper axis.
///
/// Speed and acceleration changes take effect for the move programmed by the
/// next [`set_target`](MotionAxis::set_target) or the move in flight.
pub trait MotionAxis {
    /// Set the cruise speed in steps per second.
    fn set_speed(&mut self, steps_per_sec: f32);

    /// Set the ramp rate in steps per second squared.
    fn set_acceleration(&mut self, steps_per_sec2: f32);

    /// Program the next move.
    fn set_target(&mut self, target: AxisTarget);

    /// Redefine the current position without moving; clears any pending move.
    fn set_current_position(&mut self, position: Steps);

    /// Take at most one step if one is due.
    ///
    /// Returns `true` while the axis is still moving. Never blocks.
    fn advance(&mut self) -> Result<bool>;

    /// Whether the last programmed move has finished.
    fn motion_complete(&self) -> bool;

    /// Current position in steps.
    fn current_position(&self) -> Steps;

    /// Drive toward `direction` at `steps_per_sec` until `limit` reads
    /// `active`, giving up after `max_travel` steps.
    ///
    /// Blocks until the switch is found or the travel ceiling is hit. Returns
    /// `true` with the axis stopped at the switch on success, `false` if the
    /// switch was never seen.
    fn seek_home<L: InputPin>(
        &mut self,
        limit: &mut L,
        active: PinState,
        direction: DirectionSign,
        steps_per_sec: f32,
        max_travel: Steps,
    ) -> Result<bool>;
}

/// Read a limit switch, mapping pin errors.
pub(crate) fn limit_active<L: InputPin>(limit: &mut L, active: PinState) -> Result<bool> {
    let high = limit
        .is_high()
        .map_err(|_| crate::error::HardwareError::LimitSwitchPin)?;
    Ok(match active {
        PinState::High => high,
        PinState::Low => !high,
    })
}
