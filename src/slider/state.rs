//! Slider operating state and the cell it is shared through.
//!
//! The tick loop, command handlers and endstop interrupts all touch the
//! state and the motor-enable flag. They do so only through [`ControlCell`],
//! which holds both in atomics so interrupt handlers never need a lock.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::error::CommandError;

/// Ordinal just below the first valid state.
pub const STATE_FIRST: u8 = 0;

/// Ordinal just above the last valid state.
pub const STATE_LAST: u8 = 10;

/// Operating state of the slider.
///
/// Ordinals are reported in status snapshots and lie strictly between
/// [`STATE_FIRST`] and [`STATE_LAST`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SliderState {
    /// Drivers disabled; nothing moves.
    MotorsOff = 1,
    /// Drivers enabled, waiting for a command.
    Idle = 2,
    /// Seeking the home switch.
    Homing = 3,
    /// Positioning both axes on the start bookmarks.
    MovingToStart = 4,
    /// Timed traverse toward the end bookmarks.
    MovingToEnd = 5,
    /// Homed or traverse finished; ready for the next run.
    Ready = 6,
    /// Direct move in progress.
    Working = 7,
    /// Stop-motion step in progress.
    Stepping = 8,
    /// Stop-motion step done; waiting on settle and exposure.
    StepFinished = 9,
}

impl SliderState {
    /// Every state, in ordinal order.
    pub const ALL: [SliderState; 9] = [
        SliderState::MotorsOff,
        SliderState::Idle,
        SliderState::Homing,
        SliderState::MovingToStart,
        SliderState::MovingToEnd,
        SliderState::Ready,
        SliderState::Working,
        SliderState::Stepping,
        SliderState::StepFinished,
    ];

    /// Look up a state by ordinal; `None` for the sentinels and beyond.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        if ordinal <= STATE_FIRST || ordinal >= STATE_LAST {
            return None;
        }
        Self::ALL.get(usize::from(ordinal - 1)).copied()
    }

    /// Ordinal reported in status snapshots.
    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            SliderState::MotorsOff => "MOTORS_OFF",
            SliderState::Idle => "IDLE",
            SliderState::Homing => "HOMING",
            SliderState::MovingToStart => "MOVING_TO_START",
            SliderState::MovingToEnd => "MOVING_TO_END",
            SliderState::Ready => "READY",
            SliderState::Working => "WORKING",
            SliderState::Stepping => "STEPPING",
            SliderState::StepFinished => "STEP_FINISHED",
        }
    }

    /// Whether a move, homing run or stepping session owns the axes.
    pub const fn is_busy(self) -> bool {
        matches!(
            self,
            SliderState::Homing
                | SliderState::MovingToStart
                | SliderState::MovingToEnd
                | SliderState::Working
                | SliderState::Stepping
                | SliderState::StepFinished
        )
    }

    /// Whether this state belongs to a stepping session.
    pub const fn is_stepping(self) -> bool {
        matches!(self, SliderState::Stepping | SliderState::StepFinished)
    }
}

impl fmt::Display for SliderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for SliderState {
    type Error = CommandError;

    fn try_from(ordinal: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(ordinal).ok_or(CommandError::InvalidState(ordinal))
    }
}

/// Shared slider state and motor-enable flag.
///
/// The tick loop and command handlers run on one context; the endstop guard
/// may preempt them at any point. Anything that moves the machine forward
/// goes through [`ControlCell::transition`], so a state the guard wrote in
/// between is never overwritten. The guard disarms itself before writing.
#[derive(Debug)]
pub struct ControlCell {
    state: AtomicU8,
    motors_enabled: AtomicBool,
    guard_armed: AtomicBool,
    endstop_events: AtomicU32,
    guard_rearms: AtomicU32,
}

impl ControlCell {
    /// Motors off, guard disarmed.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(SliderState::MotorsOff as u8),
            motors_enabled: AtomicBool::new(false),
            guard_armed: AtomicBool::new(false),
            endstop_events: AtomicU32::new(0),
            guard_rearms: AtomicU32::new(0),
        }
    }

    /// Current state.
    pub fn state(&self) -> SliderState {
        SliderState::from_ordinal(self.state.load(Ordering::Acquire))
            .unwrap_or(SliderState::MotorsOff)
    }

    /// Move to `state`.
    pub fn set_state(&self, state: SliderState) {
        self.state.store(state.ordinal(), Ordering::Release);
    }

    /// Move from `from` to `to`, only if the state is still `from`.
    ///
    /// Returns `false` and leaves the state alone if something else (the
    /// endstop guard, typically) changed it first.
    pub fn transition(&self, from: SliderState, to: SliderState) -> bool {
        self.state
            .compare_exchange(from.ordinal(), to.ordinal(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Move to the state with the given ordinal.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidState` and leaves the state unchanged if
    /// the ordinal is at or outside the sentinels.
    pub fn try_set_state(&self, ordinal: u8) -> Result<SliderState, CommandError> {
        match SliderState::from_ordinal(ordinal) {
            Some(state) => {
                self.set_state(state);
                Ok(state)
            }
            None => {
                warn!("Invalid state requested: {}", ordinal);
                Err(CommandError::InvalidState(ordinal))
            }
        }
    }

    /// Whether the motor drivers are enabled.
    pub fn motors_enabled(&self) -> bool {
        self.motors_enabled.load(Ordering::Acquire)
    }

    /// Enable or disable the drivers, forcing `Idle` or `MotorsOff`.
    pub fn set_motors_enabled(&self, enabled: bool) {
        self.motors_enabled.store(enabled, Ordering::Release);
        self.set_state(if enabled {
            SliderState::Idle
        } else {
            SliderState::MotorsOff
        });
    }

    /// Clear the motor-enable flag without leaving the current state.
    ///
    /// Used where a sequence ends in a resting state with the drivers off.
    pub fn release_drivers(&self) {
        self.motors_enabled.store(false, Ordering::Release);
    }

    /// Whether endstop edges are currently acted on.
    pub fn guard_armed(&self) -> bool {
        self.guard_armed.load(Ordering::Acquire)
    }

    /// Start acting on endstop edges.
    pub fn arm_guard(&self) {
        self.guard_armed.store(true, Ordering::Release);
    }

    /// Stop acting on endstop edges.
    pub fn disarm_guard(&self) {
        self.guard_armed.store(false, Ordering::Release);
    }

    /// Endstop trips handled so far.
    pub fn endstop_events(&self) -> u32 {
        self.endstop_events.load(Ordering::Acquire)
    }

    /// Times the guard re-armed itself after a trip.
    pub fn guard_rearms(&self) -> u32 {
        self.guard_rearms.load(Ordering::Acquire)
    }

    pub(crate) fn record_endstop_event(&self) {
        let count = self.endstop_events.load(Ordering::Relaxed);
        self.endstop_events
            .store(count.wrapping_add(1), Ordering::Release);
    }

    pub(crate) fn record_guard_rearm(&self) {
        let count = self.guard_rearms.load(Ordering::Relaxed);
        self.guard_rearms
            .store(count.wrapping_add(1), Ordering::Release);
    }
}

impl Default for ControlCell {
    fn default() -> Self {
        Self::new()
    }
}
