//! Motion profile calculation.
//!
//! Plans symmetric trapezoidal moves in step space: accelerate from rest,
//! cruise at the requested speed, decelerate to rest at the target.

use libm::sqrtf;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing step count.
    Forward,
    /// Decreasing step count.
    Backward,
}

impl Direction {
    /// Get direction from signed step count.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Accelerating from rest toward cruise velocity.
    Accelerating,
    /// Moving at constant cruise velocity.
    Cruising,
    /// Decelerating from cruise velocity to rest.
    Decelerating,
    /// Motion complete.
    Complete,
}

/// Computed motion profile for a single move.
#[derive(Debug, Clone)]
pub struct MoveProfile {
    /// Total steps to move (absolute value).
    pub total_steps: u32,

    /// Direction of motion.
    pub direction: Direction,

    /// Steps spent accelerating.
    pub accel_steps: u32,

    /// First step of the deceleration ramp.
    pub decel_start: u32,

    /// Cruise velocity in steps/sec.
    pub cruise_velocity: f32,

    /// Acceleration and deceleration rate in steps/sec². Zero means the move
    /// runs at cruise velocity from the first step.
    pub acceleration: f32,
}

impl MoveProfile {
    /// Plan a trapezoidal move.
    ///
    /// # Arguments
    ///
    /// * `delta_steps` - Signed step count (positive = forward)
    /// * `velocity` - Cruise velocity in steps/sec
    /// * `acceleration` - Ramp rate in steps/sec²
    pub fn trapezoidal(delta_steps: i64, velocity: f32, acceleration: f32) -> Self {
        let direction = Direction::from_steps(delta_steps);
        let steps = u32::try_from(delta_steps.unsigned_abs()).unwrap_or(u32::MAX);

        if steps == 0 || velocity.is_nan() || velocity <= 0.0 {
            return Self::zero();
        }

        if acceleration.is_nan() || acceleration <= 0.0 {
            return Self {
                total_steps: steps,
                direction,
                accel_steps: 0,
                decel_start: steps,
                cruise_velocity: velocity,
                acceleration: 0.0,
            };
        }

        // Steps needed to reach cruise velocity: v² / 2a
        let ramp = libm::ceilf(velocity * velocity / (2.0 * acceleration)) as u32;

        let (accel_steps, decel_start) = if ramp.saturating_mul(2) >= steps {
            // Triangle profile: cruise velocity is never reached
            let half = steps / 2;
            (half, steps - half)
        } else {
            (ramp, steps - ramp)
        };

        Self {
            total_steps: steps,
            direction,
            accel_steps,
            decel_start,
            cruise_velocity: velocity,
            acceleration,
        }
    }

    /// Create a zero-length profile (no motion).
    pub fn zero() -> Self {
        Self {
            total_steps: 0,
            direction: Direction::Forward,
            accel_steps: 0,
            decel_start: 0,
            cruise_velocity: 0.0,
            acceleration: 0.0,
        }
    }

    /// Check if this is a zero-length profile.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.total_steps == 0
    }

    /// Get the phase at a given step number.
    pub fn phase_at(&self, step: u32) -> MotionPhase {
        if step >= self.total_steps {
            MotionPhase::Complete
        } else if step < self.accel_steps {
            MotionPhase::Accelerating
        } else if step < self.decel_start {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Velocity in steps/sec while taking step `step`.
    pub fn velocity_at(&self, step: u32) -> f32 {
        match self.phase_at(step) {
            MotionPhase::Complete => 0.0,
            MotionPhase::Cruising => self.cruise_velocity,
            MotionPhase::Accelerating => {
                let v = sqrtf(2.0 * self.acceleration * (step + 1) as f32);
                v.min(self.cruise_velocity)
            }
            MotionPhase::Decelerating => {
                if self.acceleration > 0.0 {
                    let remaining = (self.total_steps - step) as f32;
                    sqrtf(2.0 * self.acceleration * remaining).min(self.cruise_velocity)
                } else {
                    self.cruise_velocity
                }
            }
        }
    }

    /// Time between step `step` and the next one, in nanoseconds.
    ///
    /// Slow timelapse legs run well under one step per second, so the
    /// interval can exceed what fits in 32 bits.
    pub fn interval_at(&self, step: u32) -> u64 {
        let velocity = self.velocity_at(step);
        if velocity > 0.0 {
            (1_000_000_000.0f64 / f64::from(velocity)) as u64
        } else {
            u64::MAX
        }
    }

    /// Estimate total duration of the move in seconds.
    pub fn estimated_duration_secs(&self) -> f32 {
        if self.total_steps == 0 {
            return 0.0;
        }

        let ramp_time = if self.acceleration > 0.0 {
            // Peak velocity actually reached on a triangle profile
            let peak = sqrtf(2.0 * self.acceleration * self.accel_steps as f32)
                .min(self.cruise_velocity);
            2.0 * peak / self.acceleration
        } else {
            0.0
        };

        let cruise_steps = self.decel_start.saturating_sub(self.accel_steps);
        ramp_time + cruise_steps as f32 / self.cruise_velocity
    }
}
