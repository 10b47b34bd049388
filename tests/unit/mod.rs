//! Unit test harness for slider-motion.
//!
//! This module organizes unit tests for each component of the library.

#[cfg(feature = "std")]
mod config_parsing;
mod config_validation;
