//! Endstop safety cutoff.
//!
//! Call [`EndstopGuard::on_edge`] from the limit switch interrupt handlers.
//! A trip disables the drivers regardless of what the slider is doing.

use crate::slider::ControlCell;

/// Which limit switch fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Endstop {
    /// Switch at the home end of the rail.
    Left,
    /// Switch at the far end of the rail.
    Right,
}

impl Endstop {
    /// Name used in log output.
    pub const fn name(self) -> &'static str {
        match self {
            Endstop::Left => "Left",
            Endstop::Right => "Right",
        }
    }
}

/// Result of handing an edge to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GuardResponse {
    /// Motors were cut and the guard re-armed.
    Tripped,
    /// Guard was disarmed; the edge was dropped.
    Ignored,
}

/// Handles endstop edges against the shared [`ControlCell`].
#[derive(Debug, Clone, Copy)]
pub struct EndstopGuard<'c> {
    cell: &'c ControlCell,
}

impl<'c> EndstopGuard<'c> {
    /// Guard the slider sharing `cell`.
    pub const fn new(cell: &'c ControlCell) -> Self {
        Self { cell }
    }

    /// Handle a rising edge on either limit switch.
    ///
    /// Both switches are disarmed while the motors are cut and re-armed only
    /// afterwards, so a bouncing contact is handled once.
    pub fn on_edge(&self, endstop: Endstop) -> GuardResponse {
        if !self.cell.guard_armed() {
            return GuardResponse::Ignored;
        }

        self.cell.disarm_guard();
        self.cell.set_motors_enabled(false);
        self.cell.record_endstop_event();
        warn!("{} endstop triggered! Stopped motors.", endstop.name());

        self.cell.arm_guard();
        self.cell.record_guard_rearm();
        GuardResponse::Tripped
    }

    /// Whether edges are currently acted on.
    pub fn is_armed(&self) -> bool {
        self.cell.guard_armed()
    }
}
