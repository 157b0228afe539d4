//! State definitions.
//!
//! A state is one record in a flat table. Its variant decides how it treats
//! its children: a leaf has none, a cluster keeps exactly one of them active,
//! a set keeps all of them active.

use super::callback::StateAction;
use super::history::History;
use super::id::{EventId, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation status of a state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Inactive,
    Active,
    /// Active, but already committed to a transition during the scan of
    /// the current broadcast. Only ever observed while that broadcast is
    /// in flight.
    ActiveDisabled,
}

impl Activation {
    /// Both `Active` and `ActiveDisabled` count as active.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

/// The closed set of state variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateKind {
    Leaf,
    Cluster {
        children: Vec<StateId>,
        history: History,
    },
    Set {
        children: Vec<StateId>,
    },
}

impl StateKind {
    /// Children in declaration order; empty for a leaf.
    pub fn children(&self) -> &[StateId] {
        match self {
            Self::Leaf => &[],
            Self::Cluster { children, .. } | Self::Set { children } => children,
        }
    }

    /// Clusters and sets.
    pub fn is_parent(&self) -> bool {
        !matches!(self, Self::Leaf)
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster { .. })
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set { .. })
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Leaf => "state",
            Self::Cluster { .. } => "cluster",
            Self::Set { .. } => "set",
        })
    }
}

/// Construction parameters of one state.
#[derive(Clone, Debug)]
pub struct StateDef {
    pub name: String,
    pub parent: Option<StateId>,
    pub kind: StateKind,
    pub enter_action: Option<StateAction>,
    pub exit_action: Option<StateAction>,
    pub enter_event: Option<EventId>,
    pub exit_event: Option<EventId>,
}

impl StateDef {
    fn with_kind(name: impl Into<String>, kind: StateKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            kind,
            enter_action: None,
            exit_action: None,
            enter_event: None,
            exit_event: None,
        }
    }

    /// A state without children.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self::with_kind(name, StateKind::Leaf)
    }

    pub fn cluster(
        name: impl Into<String>,
        children: impl IntoIterator<Item = StateId>,
        history: History,
    ) -> Self {
        Self::with_kind(
            name,
            StateKind::Cluster {
                children: children.into_iter().collect(),
                history,
            },
        )
    }

    pub fn set(name: impl Into<String>, children: impl IntoIterator<Item = StateId>) -> Self {
        Self::with_kind(
            name,
            StateKind::Set {
                children: children.into_iter().collect(),
            },
        )
    }

    /// Record the parent. The parent must list this state among its children.
    pub fn child_of(mut self, parent: StateId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn on_enter(mut self, action: StateAction) -> Self {
        self.enter_action = Some(action);
        self
    }

    pub fn on_exit(mut self, action: StateAction) -> Self {
        self.exit_action = Some(action);
        self
    }

    /// Event broadcast every time this state is entered.
    pub fn enter_event(mut self, event: EventId) -> Self {
        self.enter_event = Some(event);
        self
    }

    /// Event broadcast every time this state is exited.
    pub fn exit_event(mut self, event: EventId) -> Self {
        self.exit_event = Some(event);
        self
    }
}
