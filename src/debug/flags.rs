//! The debug bitmask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable consulted by [`DebugFlags::from_env`].
pub const DEBUG_ENV_VAR: &str = "CHSM_DEBUG";

bitflags! {
    /// Selects which trace lines a machine emits.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chsm::debug::DebugFlags;
    ///
    /// let flags: DebugFlags = "events,algorithm".parse().unwrap();
    /// assert!(flags.contains(DebugFlags::EVENTS));
    /// assert!(!flags.contains(DebugFlags::ENTER_EXIT));
    /// assert_eq!(flags | DebugFlags::ENTER_EXIT, DebugFlags::ALL);
    /// ```
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DebugFlags: u8 {
        /// Entrances to and exits from states.
        const ENTER_EXIT = 0x01;
        /// Event broadcasting, queueing and dequeueing.
        const EVENTS = 0x02;
        /// Progress through the phases of the algorithm.
        const ALGORITHM = 0x04;
        const ALL = Self::ENTER_EXIT.bits() | Self::EVENTS.bits() | Self::ALGORITHM.bits();
    }
}

impl DebugFlags {
    pub const NONE: Self = Self::empty();

    /// Flags named by `CHSM_DEBUG`, or none when unset or unparsable.
    pub fn from_env() -> Self {
        match std::env::var(DEBUG_ENV_VAR) {
            Ok(v) => v.parse().unwrap_or_else(|err| {
                tracing::warn!(name = DEBUG_ENV_VAR, value = %v, %err, "invalid env var value, using default");
                Self::NONE
            }),
            Err(_) => Self::NONE,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown debug flag '{0}' (expected none, enter_exit, events, algorithm or all)")]
pub struct ParseDebugFlagsError(pub String);

impl FromStr for DebugFlags {
    type Err = ParseDebugFlagsError;

    /// Comma- or `|`-separated flag names, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::NONE;
        for word in s.split([',', '|']).map(str::trim).filter(|w| !w.is_empty()) {
            flags |= match word.to_ascii_lowercase().as_str() {
                "none" => Self::NONE,
                "enter_exit" | "enter-exit" => Self::ENTER_EXIT,
                "events" => Self::EVENTS,
                "algorithm" => Self::ALGORITHM,
                "all" => Self::ALL,
                _ => return Err(ParseDebugFlagsError(word.to_string())),
            };
        }
        Ok(flags)
    }
}

impl fmt::Display for DebugFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (Self::ENTER_EXIT, "enter_exit"),
            (Self::EVENTS, "events"),
            (Self::ALGORITHM, "algorithm"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_combined_names() {
        assert_eq!("all".parse::<DebugFlags>().unwrap(), DebugFlags::ALL);
        assert_eq!("none".parse::<DebugFlags>().unwrap(), DebugFlags::NONE);
        assert_eq!(
            "Events | enter-exit".parse::<DebugFlags>().unwrap(),
            DebugFlags::EVENTS | DebugFlags::ENTER_EXIT
        );
        assert_eq!("".parse::<DebugFlags>().unwrap(), DebugFlags::NONE);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "events,verbose".parse::<DebugFlags>().unwrap_err();
        assert_eq!(err, ParseDebugFlagsError("verbose".to_string()));
    }

    #[test]
    fn contains_requires_every_bit() {
        let flags = DebugFlags::EVENTS;
        assert!(flags.contains(DebugFlags::EVENTS));
        assert!(!flags.contains(DebugFlags::ALL));
        assert!(DebugFlags::ALL.contains(DebugFlags::EVENTS | DebugFlags::ALGORITHM));
    }

    #[test]
    fn truncation_drops_unknown_bits() {
        assert_eq!(DebugFlags::from_bits_truncate(0xff), DebugFlags::ALL);
        assert_eq!(DebugFlags::ALL.bits(), 0x07);
    }

    #[test]
    fn serializes_through_serde() {
        let flags = DebugFlags::EVENTS | DebugFlags::ALGORITHM;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(serde_json::from_str::<DebugFlags>(&json).unwrap(), flags);
    }

    #[test]
    fn display_round_trips() {
        let flags = DebugFlags::ENTER_EXIT | DebugFlags::ALGORITHM;
        assert_eq!(flags.to_string(), "enter_exit,algorithm");
        assert_eq!(flags.to_string().parse::<DebugFlags>().unwrap(), flags);
        assert_eq!(DebugFlags::NONE.to_string(), "none");
    }
}
