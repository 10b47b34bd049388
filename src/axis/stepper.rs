//! STEP/DIR stepper axis.
//!
//! Generic over embedded-hal 1.0 pin and delay types. Steps are scheduled
//! against a [`SystemClock`] so [`MotionAxis::advance`] never blocks; only
//! [`MotionAxis::seek_home`] busy-waits between pulses.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::config::units::{DirectionSign, Steps};
use crate::error::{HardwareError, Result};
use crate::motion::{Direction, MotionPhase, MoveProfile, StepSchedule};
use crate::time::SystemClock;

use super::{limit_active, AxisTarget, MotionAxis};

/// Width of the STEP pulse in microseconds.
pub const PULSE_WIDTH_US: u32 = 2;

/// Stepper axis driven through STEP and DIR lines.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
/// - `CLOCK`: Time source for step scheduling
pub struct StepperAxis<STEP, DIR, DELAY, CLOCK>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    CLOCK: SystemClock,
{
    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin.
    dir_pin: DIR,

    /// Delay provider for pulse timing.
    delay: DELAY,

    /// Time source for non-blocking scheduling.
    clock: CLOCK,

    /// Current absolute position.
    position: Steps,

    /// Position the last programmed move ends at.
    target: Steps,

    /// Cruise speed, steps/s.
    speed: f32,

    /// Ramp rate, steps/s².
    acceleration: f32,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<Direction>,

    /// Whether DIR logic is inverted.
    invert_direction: bool,

    /// Target or rates changed since the schedule was planned.
    replan: bool,

    /// Schedule for the move in flight.
    schedule: Option<StepSchedule>,

    /// Clock reading at which the next step is due.
    next_step_at: Duration,
}

impl<STEP, DIR, DELAY, CLOCK> StepperAxis<STEP, DIR, DELAY, CLOCK>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    CLOCK: SystemClock,
{
    /// Create an axis at position zero, at rest.
    pub fn new(step_pin: STEP, dir_pin: DIR, delay: DELAY, clock: CLOCK) -> Self {
        Self {
            step_pin,
            dir_pin,
            delay,
            clock,
            position: Steps::default(),
            target: Steps::default(),
            speed: 0.0,
            acceleration: 0.0,
            current_direction: None,
            invert_direction: false,
            replan: false,
            schedule: None,
            next_step_at: Duration::ZERO,
        }
    }

    /// Invert DIR pin logic.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Position the programmed move ends at.
    #[inline]
    pub fn target(&self) -> Steps {
        self.target
    }

    /// Phase of the move in flight.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.schedule
            .as_ref()
            .map(|s| s.phase())
            .unwrap_or(MotionPhase::Complete)
    }

    /// Release the pins.
    pub fn release(self) -> (STEP, DIR, DELAY, CLOCK) {
        (self.step_pin, self.dir_pin, self.delay, self.clock)
    }

    fn plan(&mut self) -> Result<()> {
        self.replan = false;
        let delta = self.target.0 - self.position.0;
        let profile = MoveProfile::trapezoidal(delta, self.speed, self.acceleration);

        if profile.is_zero() {
            self.schedule = None;
            return Ok(());
        }

        self.set_direction(profile.direction)?;
        self.schedule = Some(StepSchedule::new(profile));
        self.next_step_at = self.clock.elapsed();
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Forward => !self.invert_direction,
            Direction::Backward => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| HardwareError::StepPin)?;
        } else {
            self.dir_pin.set_low().map_err(|_| HardwareError::StepPin)?;
        }

        self.current_direction = Some(direction);
        Ok(())
    }

    fn pulse(&mut self, direction: Direction) -> Result<()> {
        self.step_pin.set_high().map_err(|_| HardwareError::StepPin)?;
        self.delay.delay_us(PULSE_WIDTH_US);
        self.step_pin.set_low().map_err(|_| HardwareError::StepPin)?;
        self.position = Steps(self.position.0 + direction.sign());
        Ok(())
    }
}

impl<STEP, DIR, DELAY, CLOCK> MotionAxis for StepperAxis<STEP, DIR, DELAY, CLOCK>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    CLOCK: SystemClock,
{
    fn set_speed(&mut self, steps_per_sec: f32) {
        self.speed = libm::fabsf(steps_per_sec);
        self.replan = true;
    }

    fn set_acceleration(&mut self, steps_per_sec2: f32) {
        self.acceleration = libm::fabsf(steps_per_sec2);
        self.replan = true;
    }

    fn set_target(&mut self, target: AxisTarget) {
        self.target = target.resolve(self.position);
        self.replan = true;
    }

    fn set_current_position(&mut self, position: Steps) {
        self.position = position;
        self.target = position;
        self.schedule = None;
        self.replan = false;
    }

    fn advance(&mut self) -> Result<bool> {
        if self.replan {
            self.plan()?;
        }

        let (direction, interval_ns) = match self.schedule.as_ref() {
            Some(schedule) if !schedule.is_complete() => {
                (schedule.direction(), schedule.current_interval_ns())
            }
            _ => {
                self.schedule = None;
                return Ok(false);
            }
        };

        let now = self.clock.elapsed();
        if now < self.next_step_at {
            return Ok(true);
        }

        self.pulse(direction)?;
        self.next_step_at = now + Duration::from_nanos(interval_ns);

        let more = self.schedule.as_mut().map(|s| s.advance()).unwrap_or(false);
        if !more {
            self.schedule = None;
        }
        Ok(more)
    }

    fn motion_complete(&self) -> bool {
        let idle = match self.schedule.as_ref() {
            Some(schedule) => schedule.is_complete(),
            None => true,
        };
        idle && (!self.replan || self.target == self.position)
    }

    fn current_position(&self) -> Steps {
        self.position
    }

    fn seek_home<L: InputPin>(
        &mut self,
        limit: &mut L,
        active: PinState,
        direction: DirectionSign,
        steps_per_sec: f32,
        max_travel: Steps,
    ) -> Result<bool> {
        self.schedule = None;
        self.replan = false;

        let direction = Direction::from_steps(direction.value() as i64);
        self.set_direction(direction)?;

        let speed = libm::fabsf(steps_per_sec).max(1.0);
        let interval_ns = (1_000_000_000.0 / speed) as u32;
        let gap_ns = interval_ns.saturating_sub(PULSE_WIDTH_US * 1_000);

        let mut travelled: u64 = 0;
        let found = loop {
            if limit_active(limit, active)? {
                break true;
            }
            if travelled >= max_travel.abs() {
                break false;
            }
            self.pulse(direction)?;
            travelled += 1;
            self.delay.delay_ns(gap_ns);
        };

        self.target = self.position;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinMockState, Transaction as PinTransaction,
    };

    #[test]
    fn test_advance_steps_only_when_due() {
        let clock = ManualClock::new();
        let step = PinMock::new(&[
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
        ]);
        let dir = PinMock::new(&[PinTransaction::set(PinMockState::High)]);
        let mut step_check = step.clone();
        let mut dir_check = dir.clone();

        let mut axis = StepperAxis::new(step, dir, NoopDelay::new(), &clock);
        axis.set_speed(1000.0);
        axis.set_acceleration(0.0);
        axis.set_target(AxisTarget::Absolute(Steps(2)));
        assert!(!axis.motion_complete());

        // First step is due immediately
        assert!(axis.advance().unwrap());
        assert_eq!(axis.current_position(), Steps(1));

        // Not due yet: 1 ms interval at 1000 steps/s
        assert!(axis.advance().unwrap());
        assert_eq!(axis.current_position(), Steps(1));

        clock.advance_ms(1);
        assert!(!axis.advance().unwrap());
        assert_eq!(axis.current_position(), Steps(2));
        assert!(axis.motion_complete());

        step_check.done();
        dir_check.done();
    }

    #[test]
    fn test_slow_speed_keeps_long_interval() {
        let clock = ManualClock::new();
        let step = PinMock::new(&[
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
        ]);
        let dir = PinMock::new(&[PinTransaction::set(PinMockState::High)]);
        let (mut step_check, mut dir_check) = (step.clone(), dir.clone());

        let mut axis = StepperAxis::new(step, dir, NoopDelay::new(), &clock);
        axis.set_speed(0.1);
        axis.set_acceleration(0.0);
        axis.set_target(AxisTarget::Absolute(Steps(3)));

        assert!(axis.advance().unwrap());
        assert_eq!(axis.current_position(), Steps(1));

        // 10 s between steps at 0.1 steps/s
        clock.advance_ms(5_000);
        assert!(axis.advance().unwrap());
        assert_eq!(axis.current_position(), Steps(1));

        clock.advance_ms(5_000);
        assert!(axis.advance().unwrap());
        assert_eq!(axis.current_position(), Steps(2));

        step_check.done();
        dir_check.done();
    }

    #[test]
    fn test_seek_home_finds_switch() {
        let clock = ManualClock::new();
        let step = PinMock::new(&[
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
        ]);
        // Reverse direction drives DIR low
        let dir = PinMock::new(&[PinTransaction::set(PinMockState::Low)]);
        let mut limit = PinMock::new(&[
            PinTransaction::get(PinMockState::High),
            PinTransaction::get(PinMockState::Low),
        ]);
        let (mut step_check, mut dir_check) = (step.clone(), dir.clone());

        let mut axis = StepperAxis::new(step, dir, NoopDelay::new(), &clock);
        let found = axis
            .seek_home(
                &mut limit,
                PinState::Low,
                DirectionSign::REVERSE,
                100.0,
                Steps(10),
            )
            .unwrap();

        assert!(found);
        assert_eq!(axis.current_position(), Steps(-1));
        assert!(axis.motion_complete());

        step_check.done();
        dir_check.done();
        limit.done();
    }

    #[test]
    fn test_seek_home_gives_up_after_max_travel() {
        let clock = ManualClock::new();
        let step = PinMock::new(&[
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
            PinTransaction::set(PinMockState::High),
            PinTransaction::set(PinMockState::Low),
        ]);
        let dir = PinMock::new(&[PinTransaction::set(PinMockState::High)]);
        let mut limit = PinMock::new(&[
            PinTransaction::get(PinMockState::High),
            PinTransaction::get(PinMockState::High),
            PinTransaction::get(PinMockState::High),
        ]);
        let (mut step_check, mut dir_check) = (step.clone(), dir.clone());

        let mut axis = StepperAxis::new(step, dir, NoopDelay::new(), &clock);
        let found = axis
            .seek_home(
                &mut limit,
                PinState::Low,
                DirectionSign::FORWARD,
                100.0,
                Steps(2),
            )
            .unwrap();

        assert!(!found);
        assert_eq!(axis.current_position(), Steps(2));

        step_check.done();
        dir_check.done();
        limit.done();
    }
}
