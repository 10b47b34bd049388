//! Driving one stepper axis directly.
//!
//! Plans a trapezoidal move, prints its shape, then runs it on a
//! `StepperAxis` with mock pins and the operating-system clock.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use slider_motion::time::OperatingSystemClock;
use slider_motion::{AxisTarget, MotionAxis, MoveProfile, StepperAxis, Steps};

/// Mock delay provider for demonstration.
struct MockDelay;

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        // In real code, this would use hardware timer
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}

/// Mock output pin that counts rising edges.
struct MockPin {
    state: bool,
    rising: u32,
}

impl MockPin {
    fn new() -> Self {
        Self {
            state: false,
            rising: 0,
        }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.state {
            self.rising += 1;
        }
        self.state = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state = false;
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

fn main() {
    println!("=== Stepper Axis Example ===\n");

    let profile = MoveProfile::trapezoidal(800, 2000.0, 8000.0);

    println!("Total steps: {}", profile.total_steps);
    println!("Direction: {:?}", profile.direction);
    println!("Acceleration phase: {} steps", profile.accel_steps);
    println!("Deceleration starts at step {}", profile.decel_start);
    println!("Estimated duration: {:.3} seconds", profile.estimated_duration_secs());

    let clock = OperatingSystemClock::new();
    let mut axis = StepperAxis::new(MockPin::new(), MockPin::new(), MockDelay, &clock);

    axis.set_speed(2000.0);
    axis.set_acceleration(8000.0);
    axis.set_target(AxisTarget::Absolute(Steps(800)));

    while !axis.motion_complete() {
        axis.advance().expect("step failed");
    }

    println!("\nReached {} steps", axis.current_position().value());
    let (step_pin, _, _, _) = axis.release();
    println!("STEP pulses sent: {}", step_pin.rising);
    println!("\n=== Example Complete ===");
}
