//! Entering and exiting states.
//!
//! Entry walks up: entering a state whose parent is inactive enters the
//! parent first, telling it which child is already on its way in. Exit walks
//! down then up: a parent exits its active children before itself, and a
//! state exited on the way to a destination keeps exiting ancestors until it
//! reaches one that also contains the destination.

use super::error::{CallbackKind, MachineError};
use super::machine::Machine;
use super::trigger::Trigger;
use crate::core::{Activation, StateId, StateKind};
use crate::debug::DebugFlags;

impl Machine {
    /// Enter `state` and its default (or remembered) descendants.
    ///
    /// `from_child` is set when a child is entering its parent on its own
    /// behalf; that child is not entered again. Returns `false` if nothing
    /// was entered.
    pub(crate) fn enter_state(
        &self,
        state: StateId,
        trigger: &Trigger<'_>,
        from_child: Option<StateId>,
    ) -> Result<bool, MachineError> {
        let definition = self.definition().clone();
        match &definition.state(state).kind {
            StateKind::Leaf => self.enter_plain(state, trigger),
            StateKind::Cluster { children, .. } => {
                if !self.enter_plain(state, trigger)? {
                    return Ok(false);
                }
                let Some(&default_child) = children.first() else {
                    return Ok(true);
                };
                match from_child {
                    Some(child) => {
                        self.with_runtime(|rt| rt.clusters[state.index()].record(child));
                    }
                    None => {
                        let has_history = definition.has_history(state);
                        let child = self.with_runtime(|rt| {
                            rt.clusters[state.index()].resume(default_child, has_history)
                        });
                        self.enter_state(child, trigger, None)?;
                    }
                }
                Ok(true)
            }
            StateKind::Set { children } => {
                if !self.enter_plain(state, trigger)? {
                    return Ok(false);
                }
                for &child in children {
                    if Some(child) != from_child {
                        self.enter_state(child, trigger, None)?;
                    }
                }
                Ok(true)
            }
        }
    }

    fn enter_plain(&self, state: StateId, trigger: &Trigger<'_>) -> Result<bool, MachineError> {
        if self.active(state) {
            return Ok(false);
        }
        if let Some(parent) = self.parent(state) {
            if !self.active(parent) {
                self.enter_state(parent, trigger, Some(state))?;
                // A set parent enters all of its children, this one included.
                if self.active(state) {
                    return Ok(false);
                }
            } else if !self.switch_child(parent, state) {
                return Ok(false);
            }
        }

        self.set_activation(state, Activation::Active);
        self.echo(DebugFlags::ENTER_EXIT, || {
            format!("entering: {}", self.state_name(state))
        });

        let def = self.definition().state(state);
        if let Some(action) = &def.enter_action {
            action.exec(trigger, state).map_err(|source| {
                MachineError::callback(CallbackKind::EnterAction, &def.name, source)
            })?;
        }
        if let Some(event) = def.enter_event {
            self.broadcast(event)?;
        }
        Ok(true)
    }

    /// Exit `state` and its active descendants. With a destination, keep
    /// exiting ancestors that do not contain it.
    pub(crate) fn exit_state(
        &self,
        state: StateId,
        trigger: &Trigger<'_>,
        to: Option<StateId>,
    ) -> Result<bool, MachineError> {
        if !self.active(state) {
            return Ok(false);
        }
        let definition = self.definition().clone();
        match &definition.state(state).kind {
            StateKind::Leaf => {}
            StateKind::Cluster { .. } => {
                if let Some(child) = self.active_child(state) {
                    self.exit_state(child, trigger, None)?;
                }
            }
            StateKind::Set { children } => {
                for &child in children {
                    self.exit_state(child, trigger, None)?;
                }
            }
        }
        self.exit_plain(state, trigger, to)
    }

    fn exit_plain(
        &self,
        state: StateId,
        trigger: &Trigger<'_>,
        to: Option<StateId>,
    ) -> Result<bool, MachineError> {
        if !self.active(state) {
            return Ok(false);
        }
        self.echo(DebugFlags::ENTER_EXIT, || {
            format!("exiting : {}", self.state_name(state))
        });

        let def = self.definition().state(state);
        if let Some(action) = &def.exit_action {
            action.exec(trigger, state).map_err(|source| {
                MachineError::callback(CallbackKind::ExitAction, &def.name, source)
            })?;
        }
        if let Some(event) = def.exit_event {
            self.broadcast(event)?;
        }
        self.set_activation(state, Activation::Inactive);
        if def.kind.is_cluster() {
            self.with_runtime(|rt| rt.clusters[state.index()].active_child = None);
        }

        if let (Some(to), Some(parent)) = (to, def.parent) {
            if !self.definition().is_proper_ancestor(parent, to) {
                self.exit_state(parent, trigger, Some(to))?;
            }
        }
        Ok(true)
    }

    /// Ask `parent` to make `child` its active child.
    ///
    /// A cluster refuses while another of its children is active; a set
    /// always agrees.
    fn switch_child(&self, parent: StateId, child: StateId) -> bool {
        if !self.definition().state(parent).kind.is_cluster() {
            return true;
        }
        let current = self.active_child(parent);
        if current.is_some_and(|c| c != child && self.active(c)) {
            return false;
        }
        self.with_runtime(|rt| rt.clusters[parent.index()].record(child));
        true
    }
}
