//! Slider module for slider-motion.
//!
//! Provides the slider state machine, its builder, the shared control cell
//! and stop-motion sequencing.

mod builder;
mod machine;
mod state;
mod stepping;

pub use builder::SliderBuilder;
pub use machine::{
    traverse_speed, AxisMove, AxisRates, Bookmark, BookmarkKind, Slider, HOME_SWITCH_ACTIVE,
    HOMING_BACKOFF_MM,
};
pub use state::{ControlCell, SliderState, STATE_FIRST, STATE_LAST};
pub use stepping::{StepOutcome, SteppingSession};
