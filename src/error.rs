//! Error types for slider-motion.
//!
//! Provides unified error handling across configuration, command handling and
//! the GPIO boundary.

use core::fmt;

use crate::config::ConfigField;
use crate::slider::SliderState;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all slider-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing, validation or persistence error
    Config(ConfigError),
    /// Command rejected by the slider
    Command(CommandError),
    /// GPIO operation failed
    Hardware(HardwareError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse a stored settings record
    ParseError(heapless::String<128>),
    /// Stored record has a different layout version
    UnsupportedVersion {
        /// Version found in the record
        found: u32,
        /// Version this build understands
        expected: u32,
    },
    /// Direction sign was not exactly +1 or -1
    InvalidDirection(i32),
    /// Field value outside its accepted range
    OutOfRange {
        /// Field being updated
        field: ConfigField,
        /// Rejected value
        value: f32,
    },
    /// Stored speed, acceleration or timing that cannot be used
    InvalidValue(&'static str),
    /// A required part was not supplied to a builder
    MissingComponent(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Errors returned by slider commands.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Requested state ordinal lies outside the defined states
    InvalidState(u8),
    /// A move, homing run or stepping session is in progress
    Busy(SliderState),
    /// Motor drivers are disabled
    MotorsDisabled,
    /// The slider is latched in a fault and needs a reset
    Faulted,
    /// A numeric argument was rejected
    InvalidParameter(&'static str),
    /// The home switch was not found within the rail length
    HomingFailed,
}

/// GPIO-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// Motor driver enable line could not be driven
    DriverEnablePin,
    /// Shutter release line could not be driven
    ShutterPin,
    /// Status LED could not be driven
    StatusLedPin,
    /// STEP or DIR line could not be driven
    StepPin,
    /// Home limit switch could not be read
    LimitSwitchPin,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Command(e) => write!(f, "Command rejected: {}", e),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::UnsupportedVersion { found, expected } => {
                write!(f, "Settings version {} does not match {}", found, expected)
            }
            ConfigError::InvalidDirection(v) => {
                write!(f, "Invalid direction sign: {}. Must be 1 or -1", v)
            }
            ConfigError::OutOfRange { field, value } => {
                let (min, max) = field.range();
                write!(
                    f,
                    "Value {} for '{}' outside [{}, {}]",
                    value,
                    field.name(),
                    min,
                    max
                )
            }
            ConfigError::InvalidValue(name) => write!(f, "Invalid value for {}", name),
            ConfigError::MissingComponent(name) => write!(f, "{} is required", name),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidState(v) => write!(f, "Invalid state requested: {}", v),
            CommandError::Busy(state) => write!(f, "Slider busy ({})", state.name()),
            CommandError::MotorsDisabled => write!(f, "Motors are disabled"),
            CommandError::Faulted => write!(f, "Slider is faulted, reset required"),
            CommandError::InvalidParameter(name) => write!(f, "Invalid parameter: {}", name),
            CommandError::HomingFailed => write!(f, "Home switch not found within rail length"),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::DriverEnablePin => write!(f, "driver enable pin operation failed"),
            HardwareError::ShutterPin => write!(f, "shutter pin operation failed"),
            HardwareError::StatusLedPin => write!(f, "status LED pin operation failed"),
            HardwareError::StepPin => write!(f, "STEP/DIR pin operation failed"),
            HardwareError::LimitSwitchPin => write!(f, "limit switch read failed"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message_names_field() {
        let err = Error::from(ConfigError::OutOfRange {
            field: ConfigField::RailLength,
            value: 0.0,
        });
        let msg = std::format!("{}", err);
        assert!(msg.contains("rail_length"), "{}", msg);
    }
}
