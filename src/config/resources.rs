//! Resource Quantities
//!
//! Memory and wall-time limits written as a quantity plus a unit,
//! e.g. `10G`, `512 MB`, `1h`, `90s`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

/// Splits `"10 GB"` into `(10, "GB")`.
fn split_quantity(value: &str) -> Result<(u64, &str), SubmitError> {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    if digits_end == 0 {
        return Err(SubmitError::invalid_unit(value, "missing quantity"));
    }

    let amount = trimmed[..digits_end]
        .parse::<u64>()
        .map_err(|e| SubmitError::invalid_unit(value, e.to_string()))?;

    if amount == 0 {
        return Err(SubmitError::invalid_unit(value, "quantity must be positive"));
    }

    Ok((amount, trimmed[digits_end..].trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUnit {
    B,
    KB,
    MB,
    GB,
    TB,
}

impl MemoryUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_uppercase().as_str() {
            "B" => Some(Self::B),
            "K" | "KB" => Some(Self::KB),
            "M" | "MB" => Some(Self::MB),
            "G" | "GB" => Some(Self::GB),
            "T" | "TB" => Some(Self::TB),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
        }
    }
}

/// A memory limit such as `10G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemorySize {
    amount: u64,
    unit: MemoryUnit,
}

impl MemorySize {
    pub fn new(amount: u64, unit: MemoryUnit) -> Self {
        Self { amount, unit }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn unit(&self) -> MemoryUnit {
        self.unit
    }

    /// Engine literal, usable inside a closure: `10.GB`.
    pub fn to_literal(&self) -> String {
        format!("{}.{}", self.amount, self.unit.as_str())
    }
}

impl Default for MemorySize {
    fn default() -> Self {
        Self::new(10, MemoryUnit::GB)
    }
}

impl FromStr for MemorySize {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, unit) = split_quantity(s)?;
        let unit = MemoryUnit::parse(unit).ok_or_else(|| {
            SubmitError::invalid_unit(s, format!("unknown memory unit '{}' (use B, KB, MB, GB, TB)", unit))
        })?;
        Ok(Self { amount, unit })
    }
}

/// Engine string form: `10 GB`.
impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit.as_str())
    }
}

impl TryFrom<String> for MemorySize {
    type Error = SubmitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MemorySize> for String {
    fn from(value: MemorySize) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit {
            "ms" => Some(Self::Millis),
            "s" => Some(Self::Seconds),
            "m" | "min" => Some(Self::Minutes),
            "h" => Some(Self::Hours),
            "d" => Some(Self::Days),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }

    fn literal_suffix(&self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Seconds => "s",
            Self::Minutes => "min",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

/// A wall-time limit such as `1h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeLimit {
    amount: u64,
    unit: TimeUnit,
}

impl TimeLimit {
    pub fn new(amount: u64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Engine literal, usable inside a closure: `1.h`.
    pub fn to_literal(&self) -> String {
        format!("{}.{}", self.amount, self.unit.literal_suffix())
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        Self::new(1, TimeUnit::Hours)
    }
}

impl FromStr for TimeLimit {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, unit) = split_quantity(s)?;
        let unit = TimeUnit::parse(unit).ok_or_else(|| {
            SubmitError::invalid_unit(s, format!("unknown time unit '{}' (use ms, s, m, h, d)", unit))
        })?;
        Ok(Self { amount, unit })
    }
}

impl fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.as_str())
    }
}

impl TryFrom<String> for TimeLimit {
    type Error = SubmitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeLimit> for String {
    fn from(value: TimeLimit) -> Self {
        value.to_string()
    }
}
