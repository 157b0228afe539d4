//! Build errors for machine definitions and the fluent builders.

use crate::core::{EventId, StateId, TransitionId};
use thiserror::Error;

/// One inconsistency found in a set of machine tables.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableFault {
    #[error("Root {root} is out of range")]
    RootOutOfRange { root: StateId },

    #[error("Root {root} is not a cluster")]
    RootNotCluster { root: StateId },

    #[error("Root {root} has a parent")]
    RootHasParent { root: StateId },

    #[error("{owner} refers to {state}, which does not exist")]
    StateOutOfRange { owner: String, state: StateId },

    #[error("{owner} refers to {event}, which does not exist")]
    EventOutOfRange { owner: String, event: EventId },

    #[error("{owner} refers to {transition}, which does not exist")]
    TransitionOutOfRange {
        owner: String,
        transition: TransitionId,
    },

    #[error("{child} is listed by {listed_by} but names {declared:?} as its parent")]
    ParentMismatch {
        child: StateId,
        listed_by: StateId,
        declared: Option<StateId>,
    },

    #[error("{state} is not listed by its parent {parent}")]
    Detached { state: StateId, parent: StateId },

    #[error("{state} has no parent and is not the root")]
    Orphan { state: StateId },

    #[error("{child} is listed more than once")]
    DuplicateChild { child: StateId },

    #[error("{state} does not reach the root through its parents")]
    ParentCycle { state: StateId },

    #[error("Base chain of {event} loops")]
    BaseEventCycle { event: EventId },

    #[error("{transition} is not owned by any event")]
    UnownedTransition { transition: TransitionId },

    #[error("{transition} from {from} to {to} crosses a set boundary")]
    IllegalTransition {
        transition: TransitionId,
        from: StateId,
        to: StateId,
    },

    #[error("State name '{name}' is used more than once")]
    DuplicateStateName { name: String },

    #[error("Event name '{name}' is used more than once")]
    DuplicateEventName { name: String },
}

/// Errors that can occur when building machine definitions and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid machine tables: {}", render_faults(.faults))]
    Invalid { faults: Vec<TableFault> },

    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition has both a fixed and a computed destination. Call only one of .to() or .target()")]
    ConflictingDestination,

    #[error("'{0}' is a leaf and cannot have children")]
    NotAParent(String),

    #[error("No state '{0}' in this builder")]
    UnknownState(String),

    #[error("No event '{0}' in this builder")]
    UnknownEvent(String),
}

fn render_faults(faults: &[TableFault]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
