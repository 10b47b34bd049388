//! Motion module for slider-motion.
//!
//! Provides motion profile calculation and step scheduling for the
//! embedded-hal axis driver.

mod executor;
mod profile;

pub use executor::StepSchedule;
pub use profile::{Direction, MotionPhase, MoveProfile};
