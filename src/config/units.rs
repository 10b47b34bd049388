//! Unit types for physical quantities.
//!
//! Provides type-safe representations of slide distance, pan angle, raw motor
//! steps and direction signs to prevent unit confusion at compile time.

use core::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Linear slide position or distance in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f32);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Add for Millimeters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Pan angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f32);

impl Degrees {
    /// Create a new Degrees value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Add for Degrees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Degrees {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Motor position in steps (absolute from origin).
///
/// Uses i64 for unlimited range in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Steps(pub i64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Get absolute value as u64.
    #[inline]
    pub fn abs(self) -> u64 {
        self.0.unsigned_abs()
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Logical direction of an axis: `+1` keeps the wiring, `-1` inverts it.
///
/// Validated at construction so the sign is always exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirectionSign(i8);

impl DirectionSign {
    /// Steps increase with logical position.
    pub const FORWARD: Self = Self(1);
    /// Steps decrease with logical position.
    pub const REVERSE: Self = Self(-1);

    /// Create a direction sign with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDirection` unless `value` is 1 or -1.
    pub fn new(value: i32) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(Self::FORWARD),
            -1 => Ok(Self::REVERSE),
            other => Err(ConfigError::InvalidDirection(other)),
        }
    }

    /// Get the sign as an integer.
    #[inline]
    pub const fn value(self) -> i8 {
        self.0
    }

    /// Get the sign as a float multiplier.
    #[inline]
    pub fn factor(self) -> f32 {
        self.0 as f32
    }

    /// Get the opposite sign.
    #[inline]
    pub const fn flipped(self) -> Self {
        Self(-self.0)
    }
}

impl Default for DirectionSign {
    fn default() -> Self {
        Self::FORWARD
    }
}

impl Neg for DirectionSign {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.flipped()
    }
}

impl TryFrom<i32> for DirectionSign {
    type Error = ConfigError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for DirectionSign {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i8(self.0)
    }
}

impl<'de> Deserialize<'de> for DirectionSign {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = i32::deserialize(deserializer)?;
        DirectionSign::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Millimeters.
    fn mm(self) -> Millimeters;
    /// Convert to Degrees.
    fn degrees(self) -> Degrees;
}

impl UnitExt for f32 {
    #[inline]
    fn mm(self) -> Millimeters {
        Millimeters(self)
    }

    #[inline]
    fn degrees(self) -> Degrees {
        Degrees(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign_valid_values() {
        assert_eq!(DirectionSign::new(1).unwrap(), DirectionSign::FORWARD);
        assert_eq!(DirectionSign::new(-1).unwrap(), DirectionSign::REVERSE);
    }

    #[test]
    fn test_direction_sign_invalid_values() {
        assert!(DirectionSign::new(0).is_err());
        assert!(DirectionSign::new(2).is_err());
        assert!(DirectionSign::new(-2).is_err());
    }

    #[test]
    fn test_direction_sign_flip() {
        assert_eq!(-DirectionSign::FORWARD, DirectionSign::REVERSE);
        assert_eq!(DirectionSign::REVERSE.flipped().factor(), 1.0);
    }

    #[test]
    fn test_unit_ext() {
        assert_eq!(12.5f32.mm(), Millimeters(12.5));
        assert_eq!((-90.0f32).degrees().value(), -90.0);
    }
}
