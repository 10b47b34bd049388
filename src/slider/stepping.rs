//! Stop-motion sequencing.

use core::time::Duration;

use crate::config::units::Millimeters;
use crate::config::SteppingConfig;
use crate::error::CommandError;
use crate::time::Deadline;

/// What the next iteration of a session asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Move the slide to `target` for step `index` (1-based).
    Step {
        /// Step number, starting at 1.
        index: u32,
        /// Absolute slide position for this step.
        target: Millimeters,
    },
    /// The last step has been taken.
    Finished,
}

/// A travel distance cut into equal steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SteppingSession {
    total: Millimeters,
    step: Millimeters,
    index: u32,
    ceiling: u32,
    baseline: Millimeters,
}

impl SteppingSession {
    /// Plan `total` millimeters of travel in `step` millimeter increments,
    /// measured from `baseline`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidParameter` unless both distances are
    /// finite and positive.
    pub fn start(
        total: Millimeters,
        step: Millimeters,
        baseline: Millimeters,
    ) -> Result<Self, CommandError> {
        if !total.0.is_finite() || total.0 <= 0.0 {
            return Err(CommandError::InvalidParameter("total_distance"));
        }
        if !step.0.is_finite() || step.0 <= 0.0 {
            return Err(CommandError::InvalidParameter("step_size"));
        }

        let ceiling = libm::floorf(total.0 / step.0) as u32;

        Ok(Self {
            total,
            step,
            index: 0,
            ceiling,
            baseline,
        })
    }

    /// Run one iteration: count the step and say where to go next.
    pub fn next(&mut self) -> StepOutcome {
        self.index = self.index.saturating_add(1);
        if self.index > self.ceiling {
            return StepOutcome::Finished;
        }

        StepOutcome::Step {
            index: self.index,
            target: Millimeters(self.baseline.0 + self.index as f32 * self.step.0),
        }
    }

    /// Steps this session takes.
    #[inline]
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Iterations run so far.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Distance per step.
    #[inline]
    pub fn step_size(&self) -> Millimeters {
        self.step
    }

    /// Total distance requested.
    #[inline]
    pub fn total_distance(&self) -> Millimeters {
        self.total
    }

    /// Slide position the session started from.
    #[inline]
    pub fn baseline(&self) -> Millimeters {
        self.baseline
    }
}

/// Pause between two steps, split around the shutter release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StepPause {
    /// Step finished; waiting before the shutter fires.
    Settling {
        until: Deadline,
        target: Millimeters,
    },
    /// Shutter fired; waiting before the slide moves to `target`.
    Exposing {
        until: Deadline,
        target: Millimeters,
    },
}

impl StepPause {
    pub(crate) fn settle(now: Duration, timing: &SteppingConfig, target: Millimeters) -> Self {
        StepPause::Settling {
            until: Deadline::after(now, Duration::from_millis(u64::from(timing.settle_ms))),
            target,
        }
    }

    pub(crate) fn expose(now: Duration, timing: &SteppingConfig, target: Millimeters) -> Self {
        StepPause::Exposing {
            until: Deadline::after(now, Duration::from_millis(u64::from(timing.exposure_ms))),
            target,
        }
    }
}
