//! Transition definitions and the concurrency-boundary legality rule.

use super::callback::{Action, Condition, Target};
use super::id::StateId;
use super::state::StateDef;

/// Construction parameters of one transition.
///
/// A transition with neither a fixed destination nor a computed one is
/// internal: firing it runs only its action, no state is exited or entered.
#[derive(Clone, Debug)]
pub struct TransitionDef {
    pub from: StateId,
    pub to: Option<StateId>,
    pub condition: Option<Condition>,
    pub target: Option<Target>,
    pub action: Option<Action>,
}

impl TransitionDef {
    /// A transition with a fixed destination.
    pub fn new(from: StateId, to: StateId) -> Self {
        Self {
            from,
            to: Some(to),
            condition: None,
            target: None,
            action: None,
        }
    }

    /// A transition that runs its action without leaving `from`.
    pub fn internal(from: StateId) -> Self {
        Self {
            from,
            to: None,
            condition: None,
            target: None,
            action: None,
        }
    }

    /// Destination computed when the transition is considered.
    pub fn computed(from: StateId, target: Target) -> Self {
        Self {
            from,
            to: None,
            condition: None,
            target: Some(target),
            action: None,
        }
    }

    /// Only enabled while `condition` holds.
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn is_internal(&self) -> bool {
        self.to.is_none() && self.target.is_none()
    }
}

/// Ancestors of `state`, root first, ending with `state` itself.
pub fn lineage(states: &[StateDef], state: StateId) -> Vec<StateId> {
    let mut chain = Vec::new();
    let mut cursor = Some(state);
    while let Some(id) = cursor {
        // A cycle can only come from an unvalidated table; stop rather than spin.
        if chain.len() > states.len() {
            break;
        }
        chain.push(id);
        cursor = states.get(id.index()).and_then(|s| s.parent);
    }
    chain.reverse();
    chain
}

/// Deepest state that is an ancestor of (or equal to) both `s1` and `s2`.
pub fn nearest_common_ancestor(states: &[StateDef], s1: StateId, s2: StateId) -> Option<StateId> {
    lineage(states, s1)
        .into_iter()
        .zip(lineage(states, s2))
        .take_while(|(a, b)| a == b)
        .last()
        .map(|(a, _)| a)
}

/// A transition between `s1` and `s2` is illegal when it would cross a
/// set's boundary between two of its concurrent regions: their nearest
/// common ancestor is a set that is neither endpoint.
pub fn is_legal(states: &[StateDef], s1: StateId, s2: StateId) -> bool {
    match nearest_common_ancestor(states, s1, s2) {
        Some(nca) if nca != s1 && nca != s2 => {
            !states.get(nca.index()).is_some_and(|s| s.kind.is_set())
        }
        _ => true,
    }
}
