//! # slider-motion
//!
//! Motion-control core for a two-axis motorized camera slider with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **State machine**: Homing, timed start-to-end moves, direct moves and stop-motion stepping
//! - **embedded-hal 1.0**: Uses `OutputPin` for STEP/DIR, `InputPin` for the home switch, `DelayNs` for pulses
//! - **no_std compatible**: Core library works without standard library
//! - **Non-blocking**: Every timed wait is a deadline checked by `tick()`; only homing blocks
//! - **Interrupt-safe**: Endstops cut the motors through a lock-free shared cell
//! - **Persistent settings**: Versioned calibration record with a fallback to defaults
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use slider_motion::{ControlCell, EndstopGuard, SliderBuilder, StepperAxis};
//!
//! static CELL: ControlCell = ControlCell::new();
//!
//! let config = slider_motion::load_settings(&mut store);
//!
//! let mut slider = SliderBuilder::new()
//!     .cell(&CELL)
//!     .config(config)
//!     .slide_axis(StepperAxis::new(slide_step, slide_dir, delay, &clock))
//!     .pan_axis(StepperAxis::new(pan_step, pan_dir, delay, &clock))
//!     .enable_pin(enable)
//!     .shutter_pin(shutter)
//!     .status_led(led)
//!     .home_switch(home_switch)
//!     .clock(&clock)
//!     .build()?;
//!
//! // From the endstop interrupt handlers
//! EndstopGuard::new(&CELL).on_edge(Endstop::Left);
//!
//! slider.home()?;
//! loop {
//!     slider.tick()?;
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables the TOML settings file and the operating-system clock
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

// This must go first so the logging macros are visible everywhere
mod fmt;

// Core modules
pub mod axis;
pub mod config;
pub mod error;
pub mod facade;
pub mod guard;
pub mod indicator;
pub mod motion;
pub mod shutter;
pub mod slider;
pub mod time;

// Re-exports for ergonomic API
pub use axis::{AxisTarget, MotionAxis, SimulatedAxis, SimulatedSwitch, StepperAxis};
pub use config::{load_settings, ConfigField, SettingsStore, SliderConfig, SteppingConfig};
pub use error::{Error, Result};
pub use facade::{Command, ConfigSnapshot, SliderStatus};
pub use guard::{Endstop, EndstopGuard, GuardResponse};
pub use indicator::Fault;
pub use motion::{Direction, MotionPhase, MoveProfile};
pub use shutter::{ShutterState, ShutterTrigger};
pub use slider::{ControlCell, Slider, SliderBuilder, SliderState};
pub use time::SystemClock;

// Settings file (std only)
#[cfg(feature = "std")]
pub use config::TomlFileStore;

// Unit types
pub use config::units::{Degrees, DirectionSign, Millimeters, Steps};
