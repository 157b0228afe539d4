//! Run-time errors.

use crate::core::CallbackError;
use std::fmt;
use thiserror::Error;

/// Which user callback failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Precondition,
    Condition,
    Target,
    Action,
    EnterAction,
    ExitAction,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Precondition => "precondition",
            Self::Condition => "condition",
            Self::Target => "target",
            Self::Action => "transition action",
            Self::EnterAction => "enter action",
            Self::ExitAction => "exit action",
        })
    }
}

/// Errors surfaced by `Machine::broadcast` and friends.
///
/// Non-events (a false precondition, no eligible transition, a suppressed
/// reentrant broadcast) are not errors; see `BroadcastOutcome`.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("No event named '{0}' in this machine")]
    UnknownEvent(String),

    #[error("No state '{0}' in this machine")]
    UnknownState(String),

    #[error("Target computed an illegal transition from '{from}' to '{to}' across a set boundary")]
    IllegalTarget { from: String, to: String },

    #[error("{kind} of '{subject}' failed: {source}")]
    Callback {
        kind: CallbackKind,
        /// Event or state the callback belongs to.
        subject: String,
        #[source]
        source: CallbackError,
    },
}

impl MachineError {
    pub(crate) fn callback(kind: CallbackKind, subject: &str, source: CallbackError) -> Self {
        Self::Callback {
            kind,
            subject: subject.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_error_names_kind_and_subject() {
        let err = MachineError::callback(CallbackKind::EnterAction, "cook", "door open".into());
        assert_eq!(err.to_string(), "enter action of 'cook' failed: door open");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn illegal_target_names_both_states() {
        let err = MachineError::IllegalTarget {
            from: "left.x".to_string(),
            to: "right.y".to_string(),
        };
        assert!(err.to_string().contains("'left.x' to 'right.y'"));
    }
}
