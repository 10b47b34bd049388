//! In-memory axis for host-side runs.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, PinState};

use crate::config::units::{DirectionSign, Steps};
use crate::error::Result;

use super::{AxisTarget, MotionAxis};

/// An axis that moves a fixed number of steps per [`advance`](MotionAxis::advance).
///
/// Homing is modelled by [`with_home_at`](Self::with_home_at): the switch
/// closes when the axis reaches that position. The limit pin handed to
/// `seek_home` is not read.
#[derive(Debug, Clone)]
pub struct SimulatedAxis {
    position: Steps,
    target: Steps,
    speed: f32,
    acceleration: f32,
    steps_per_advance: u32,
    home_at: Option<Steps>,
    advances: u32,
}

impl SimulatedAxis {
    /// Create an axis at zero that covers `steps_per_advance` steps each tick.
    pub fn new(steps_per_advance: u32) -> Self {
        Self {
            position: Steps::default(),
            target: Steps::default(),
            speed: 0.0,
            acceleration: 0.0,
            steps_per_advance: steps_per_advance.max(1),
            home_at: None,
            advances: 0,
        }
    }

    /// Place the home switch at `position`.
    pub fn with_home_at(mut self, position: Steps) -> Self {
        self.home_at = Some(position);
        self
    }

    /// Start the axis somewhere other than zero.
    pub fn with_position(mut self, position: Steps) -> Self {
        self.position = position;
        self.target = position;
        self
    }

    /// Last speed programmed, steps/s.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Last acceleration programmed, steps/s².
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Position the programmed move ends at.
    pub fn target(&self) -> Steps {
        self.target
    }

    /// Number of `advance` calls that moved the axis.
    pub fn advances(&self) -> u32 {
        self.advances
    }
}

impl MotionAxis for SimulatedAxis {
    fn set_speed(&mut self, steps_per_sec: f32) {
        self.speed = libm::fabsf(steps_per_sec);
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) {
        self.acceleration = libm::fabsf(steps_per_sec2);
    }

    fn set_target(&mut self, target: AxisTarget) {
        self.target = target.resolve(self.position);
    }

    fn set_current_position(&mut self, position: Steps) {
        self.position = position;
        self.target = position;
    }

    fn advance(&mut self) -> Result<bool> {
        let delta = self.target.0 - self.position.0;
        if delta == 0 {
            return Ok(false);
        }

        let stride = delta
            .unsigned_abs()
            .min(u64::from(self.steps_per_advance)) as i64;
        self.position = Steps(self.position.0 + stride * delta.signum());
        self.advances += 1;
        Ok(self.position != self.target)
    }

    fn motion_complete(&self) -> bool {
        self.position == self.target
    }

    fn current_position(&self) -> Steps {
        self.position
    }

    fn seek_home<L: InputPin>(
        &mut self,
        _limit: &mut L,
        _active: PinState,
        direction: DirectionSign,
        _steps_per_sec: f32,
        max_travel: Steps,
    ) -> Result<bool> {
        let step = i64::from(direction.value());
        let mut travelled = 0;

        let found = loop {
            if self.home_at == Some(self.position) {
                break true;
            }
            if travelled >= max_travel.abs() {
                break false;
            }
            self.position = Steps(self.position.0 + step);
            travelled += 1;
        };

        self.target = self.position;
        Ok(found)
    }
}

/// A switch input fixed at one level.
///
/// Stands in for the home switch when the axis models homing itself.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSwitch {
    level: PinState,
}

impl SimulatedSwitch {
    /// A switch that always reads `level`.
    pub const fn new(level: PinState) -> Self {
        Self { level }
    }
}

impl ErrorType for SimulatedSwitch {
    type Error = Infallible;
}

impl InputPin for SimulatedSwitch {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.level == PinState::High)
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.level == PinState::Low)
    }
}
