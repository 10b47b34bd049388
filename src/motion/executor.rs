//! Motion execution - step scheduling.

use super::profile::{Direction, MotionPhase, MoveProfile};

/// Runtime state while a [`MoveProfile`] is being stepped out.
#[derive(Debug, Clone)]
pub struct StepSchedule {
    /// The planned profile.
    profile: MoveProfile,

    /// Steps already taken.
    current_step: u32,
}

impl StepSchedule {
    /// Start executing a profile from its first step.
    pub fn new(profile: MoveProfile) -> Self {
        Self {
            profile,
            current_step: 0,
        }
    }

    /// Check if motion is complete.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current_step >= self.profile.total_steps
    }

    /// Get the number of steps taken so far.
    #[inline]
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Get steps remaining.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.profile.total_steps.saturating_sub(self.current_step)
    }

    /// Get the current phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.profile.phase_at(self.current_step)
    }

    /// Direction of every step in this move.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.profile.direction
    }

    /// Wait before the next step, in nanoseconds.
    #[inline]
    pub fn current_interval_ns(&self) -> u64 {
        self.profile.interval_at(self.current_step)
    }

    /// Get the motion profile.
    #[inline]
    pub fn profile(&self) -> &MoveProfile {
        &self.profile
    }

    /// Record that one step was taken.
    ///
    /// Returns `true` while more steps remain.
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }

        self.current_step += 1;
        !self.is_complete()
    }

    /// Get progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.profile.total_steps == 0 {
            1.0
        } else {
            self.current_step as f32 / self.profile.total_steps as f32
        }
    }
}
