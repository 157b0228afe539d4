//! Installed machine tables.

use super::machine::Machine;
use crate::builder::validate::validate_tables;
use crate::builder::BuildError;
use crate::core::{
    EventDef, EventId, History, StateDef, StateId, StateKind, TransitionDef, TransitionId,
};
use crate::debug::DebugFlags;
use std::collections::HashMap;
use std::sync::Arc;
use stillwater::validation::Validation;

/// The immutable tables of one machine: every state, event and transition,
/// indexed by id.
///
/// A definition is installed once and then shared by any number of
/// [`Machine`] instances. Only activation, history and queue state live in
/// the instances.
#[derive(Debug)]
pub struct MachineDefinition {
    root: StateId,
    states: Vec<StateDef>,
    events: Vec<EventDef>,
    transitions: Vec<TransitionDef>,
    has_history: Vec<bool>,
    state_index: HashMap<String, StateId>,
    event_index: HashMap<String, EventId>,
}

impl MachineDefinition {
    /// Install the tables produced by a front end.
    ///
    /// Ids are array positions. All construction faults are collected and
    /// reported together.
    pub fn new(
        root: StateId,
        states: Vec<StateDef>,
        events: Vec<EventDef>,
        transitions: Vec<TransitionDef>,
    ) -> Result<Self, BuildError> {
        if let Validation::Failure(faults) = validate_tables(root, &states, &events, &transitions) {
            return Err(BuildError::Invalid {
                faults: faults.iter().cloned().collect(),
            });
        }

        let has_history = resolve_history(&states);
        let state_index = states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), StateId(i)))
            .collect();
        let event_index = events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), EventId(i)))
            .collect();

        Ok(Self {
            root,
            states,
            events,
            transitions,
            has_history,
            state_index,
            event_index,
        })
    }

    /// A fresh, inactive machine running these tables. Its debug flags
    /// start from `CHSM_DEBUG`.
    pub fn instantiate(self: &Arc<Self>) -> Machine {
        Machine::new(Arc::clone(self), DebugFlags::from_env())
    }

    /// Wrap the tables in an `Arc` and create the first instance.
    pub fn into_machine(self) -> Machine {
        Arc::new(self).instantiate()
    }

    /// The root cluster.
    pub fn root(&self) -> StateId {
        self.root
    }

    /// State table, indexed by `StateId`.
    pub fn states(&self) -> &[StateDef] {
        &self.states
    }

    /// Event table, indexed by `EventId`.
    pub fn events(&self) -> &[EventDef] {
        &self.events
    }

    /// Transition table, indexed by `TransitionId`.
    pub fn transitions(&self) -> &[TransitionDef] {
        &self.transitions
    }

    /// Definition of one state. Panics on an id outside the table.
    pub fn state(&self, id: StateId) -> &StateDef {
        &self.states[id.index()]
    }

    /// Definition of one event. Panics on an id outside the table.
    pub fn event(&self, id: EventId) -> &EventDef {
        &self.events[id.index()]
    }

    /// Definition of one transition. Panics on an id outside the table.
    pub fn transition(&self, id: TransitionId) -> &TransitionDef {
        &self.transitions[id.index()]
    }

    /// Whether a cluster resumes its last child, either declared or
    /// inherited from an enclosing deep-history cluster.
    pub fn has_history(&self, id: StateId) -> bool {
        self.has_history[id.index()]
    }

    /// Look up a state by qualified name.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.state_index.get(name).copied()
    }

    /// Look up an event by name.
    pub fn event_id(&self, name: &str) -> Option<EventId> {
        self.event_index.get(name).copied()
    }

    /// The event followed by its base events, most derived first.
    pub fn base_chain(&self, event: EventId) -> impl Iterator<Item = EventId> + '_ {
        std::iter::successors(Some(event), move |e| self.events[e.index()].base)
    }

    /// Every transition an event may fire: its own first, then those
    /// inherited from each base in turn.
    pub fn event_transitions(&self, event: EventId) -> impl Iterator<Item = TransitionId> + '_ {
        self.base_chain(event)
            .flat_map(move |e| self.events[e.index()].transitions.iter().copied())
    }

    /// True if `ancestor` is a strict ancestor of `state`.
    pub fn is_proper_ancestor(&self, ancestor: StateId, state: StateId) -> bool {
        std::iter::successors(self.state(state).parent, |s| self.state(*s).parent)
            .any(|s| s == ancestor)
    }
}

/// Per-state history flag with deep history pushed down to every cluster
/// nested below a deep cluster, through sets as well.
fn resolve_history(states: &[StateDef]) -> Vec<bool> {
    let mut has_history: Vec<bool> = states
        .iter()
        .map(|s| matches!(&s.kind, StateKind::Cluster { history, .. } if history.is_enabled()))
        .collect();

    for state in states {
        let StateKind::Cluster {
            history: History::Deep,
            children,
        } = &state.kind
        else {
            continue;
        };
        let mut pending: Vec<StateId> = children.clone();
        while let Some(id) = pending.pop() {
            let nested = &states[id.index()];
            if nested.kind.is_cluster() {
                has_history[id.index()] = true;
            }
            pending.extend_from_slice(nested.kind.children());
        }
    }
    has_history
}
