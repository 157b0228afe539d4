//! Cluster history.
//!
//! A cluster remembers which of its children was active most recently.
//! With history enabled, re-entering the cluster resumes that child
//! instead of the default (first declared) one.

use super::id::StateId;
use serde::{Deserialize, Serialize};

/// History attribute declared on a cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum History {
    /// Always enter the default child.
    #[default]
    None,
    /// Resume the most recently active child.
    Shallow,
    /// Like `Shallow`, and every cluster nested below behaves as if it had
    /// been declared with history too.
    Deep,
}

impl History {
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Per-instance child bookkeeping of one cluster.
///
/// `last_child` survives the cluster's own exit. `None` means the cluster
/// has never been visited (or its history was cleared back to nothing);
/// it is distinct from having last visited the default child.
///
/// # Example
///
/// ```rust
/// use chsm::core::{ClusterHistory, StateId};
///
/// let default_child = StateId(1);
/// let mut history = ClusterHistory::default();
/// assert_eq!(history.resume(default_child, true), default_child);
///
/// history.record(StateId(2));
/// assert_eq!(history.resume(default_child, true), StateId(2));
/// assert_eq!(history.resume(default_child, false), default_child);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHistory {
    pub active_child: Option<StateId>,
    pub last_child: Option<StateId>,
}

impl ClusterHistory {
    /// Make `child` both the active and the most recent child.
    pub fn record(&mut self, child: StateId) {
        self.active_child = Some(child);
        self.last_child = Some(child);
    }

    /// Child to enter when the cluster is entered without a more specific
    /// target. Also records it.
    pub fn resume(&mut self, default_child: StateId, has_history: bool) -> StateId {
        let child = match self.last_child {
            Some(last) if has_history => last,
            _ => default_child,
        };
        self.record(child);
        child
    }

    /// Forget the remembered child; the next entry uses the default.
    pub fn clear(&mut self, default_child: Option<StateId>) {
        self.last_child = default_child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unvisited_cluster_resumes_default() {
        let mut history = ClusterHistory::default();
        assert_eq!(history.resume(StateId(4), true), StateId(4));
        assert_eq!(history.active_child, Some(StateId(4)));
        assert_eq!(history.last_child, Some(StateId(4)));
    }

    #[test]
    fn history_resumes_last_child() {
        let mut history = ClusterHistory::default();
        history.record(StateId(6));
        assert_eq!(history.resume(StateId(4), true), StateId(6));
    }

    #[test]
    fn without_history_default_wins_and_overwrites_last() {
        let mut history = ClusterHistory::default();
        history.record(StateId(6));
        assert_eq!(history.resume(StateId(4), false), StateId(4));
        assert_eq!(history.last_child, Some(StateId(4)));
    }

    #[test]
    fn clear_resets_to_default() {
        let mut history = ClusterHistory::default();
        history.record(StateId(6));
        history.clear(Some(StateId(4)));
        assert_eq!(history.resume(StateId(4), true), StateId(4));
    }

    #[test]
    fn active_child_is_not_touched_by_clear() {
        let mut history = ClusterHistory::default();
        history.record(StateId(6));
        history.clear(Some(StateId(4)));
        assert_eq!(history.active_child, Some(StateId(6)));
    }

    #[test]
    fn history_attribute_enabled() {
        assert!(!History::None.is_enabled());
        assert!(History::Shallow.is_enabled());
        assert!(History::Deep.is_enabled());
    }
}
