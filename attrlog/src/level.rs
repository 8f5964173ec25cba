//! Severity levels and event identifiers.
//!
//! [`Level`] is an ordered scale ending in the [`Level::Disabled`] sentinel, which is never enabled regardless of the
//! configured minimum.
//!
//! ```rust
//! use attrlog::Level;
//!
//! assert!(Level::Warning > Level::Information);
//! assert!(Level::Error.is_enabled_for(Level::Warning));
//! assert!(!Level::Disabled.is_enabled_for(Level::Trace));
//! assert_eq!("warn".parse::<Level>().unwrap(), Level::Warning);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Severity of a log entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(u8)]
pub enum Level {
    /// Designates very low priority, often extremely verbose, information.
    #[default]
    Trace = 0,
    /// Designates lower priority information.
    Debug = 1,
    /// Designates useful information.
    Information = 2,
    /// Designates hazardous situations.
    Warning = 3,
    /// Designates very serious errors.
    Error = 4,
    /// Designates failures that might crash the program.
    Critical = 5,
    /// Sentinel that is never enabled.
    Disabled = 6,
}

impl Level {
    /// All levels in ascending order, including the sentinel.
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Information,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Disabled,
    ];

    /// Converts a raw value in `0..=6` into a level.
    pub fn from_raw(raw: i64) -> Result<Self, Error> {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(Error::LevelOutOfRange { value: raw })
    }

    /// Returns the raw value of this level.
    pub fn to_raw(self) -> u8 {
        self as u8
    }

    /// Whether an entry at this level passes the given minimum.
    ///
    /// The [`Level::Disabled`] sentinel is never enabled.
    pub fn is_enabled_for(self, minimum: Level) -> bool {
        self >= minimum && self < Level::Disabled
    }

    /// The canonical name of this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "Trace",
            Level::Debug => "Debug",
            Level::Information => "Information",
            Level::Warning => "Warning",
            Level::Error => "Error",
            Level::Critical => "Critical",
            Level::Disabled => "None",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "information" | "info" => Level::Information,
            "warning" | "warn" => Level::Warning,
            "error" => Level::Error,
            "critical" | "fatal" => Level::Critical,
            "none" | "off" | "disabled" => Level::Disabled,
            _ => return Err(Error::UnknownLevel(s.to_owned())),
        };
        Ok(level)
    }
}

impl TryFrom<i64> for Level {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Error> {
        Self::from_raw(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.to_raw()
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawLevel {
            Raw(i64),
            Name(String),
        }

        match RawLevel::deserialize(deserializer)? {
            RawLevel::Raw(raw) => Level::from_raw(raw),
            RawLevel::Name(name) => name.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

/// Identifies a logging event.
///
/// Two ids are equal when their numeric ids are equal, the name is informational only.
#[derive(Clone, Debug, Default)]
pub struct EventId {
    id: i32,
    name: Option<Cow<'static, str>>,
}

impl EventId {
    /// Creates an event id with an optional name.
    pub fn new(id: i32, name: Option<impl Into<Cow<'static, str>>>) -> Self {
        Self {
            id,
            name: name.map(Into::into),
        }
    }

    /// Creates a named event id.
    pub fn named(id: i32, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// The numeric id.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// The optional name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl PartialEq for EventId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventId {}

impl std::hash::Hash for EventId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self { id, name: None }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({name})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}
