//! Builder for constructing machine definitions.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{
    EventDef, EventId, History, Precondition, StateAction, StateDef, StateId, StateKind,
    TransitionDef, TransitionId,
};
use crate::runtime::MachineDefinition;

/// Builds the dense tables of a machine one declaration at a time.
///
/// Ids are handed out in declaration order. Children are appended to their
/// parent as they are declared, so the first child declared under a
/// cluster is its default child. State names are qualified by their
/// ancestors (`"door.open"`), except that the root's name is not included.
///
/// # Example
///
/// ```rust
/// use chsm::builder::{MachineBuilder, TransitionBuilder};
///
/// let mut builder = MachineBuilder::new("lamp");
/// let off = builder.state("off", builder.root()).unwrap();
/// let on = builder.state("on", builder.root()).unwrap();
/// let toggle = builder.event("toggle");
/// builder
///     .transition(toggle, TransitionBuilder::new().from(off).to(on))
///     .unwrap();
/// builder
///     .transition(toggle, TransitionBuilder::new().from(on).to(off))
///     .unwrap();
///
/// let machine = builder.build().unwrap().into_machine();
/// machine.enter().unwrap();
/// assert!(machine.active(off));
///
/// machine.broadcast(toggle).unwrap();
/// assert!(machine.active(on));
/// ```
pub struct MachineBuilder {
    states: Vec<StateDef>,
    events: Vec<EventDef>,
    transitions: Vec<TransitionDef>,
}

impl MachineBuilder {
    /// Create a builder whose root cluster is named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            states: vec![StateDef::cluster(root_name, Vec::<StateId>::new(), History::None)],
            events: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// The root cluster, created by [`MachineBuilder::new`].
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    /// Set the history attribute of the root cluster.
    pub fn root_history(&mut self, history: History) -> &mut Self {
        if let StateKind::Cluster { history: h, .. } = &mut self.states[0].kind {
            *h = history;
        }
        self
    }

    /// Add a leaf under `parent`.
    pub fn state(&mut self, name: &str, parent: StateId) -> Result<StateId, BuildError> {
        self.add_state(name, parent, StateKind::Leaf)
    }

    /// Add a cluster under `parent`. Its first child becomes the default.
    pub fn cluster(
        &mut self,
        name: &str,
        parent: StateId,
        history: History,
    ) -> Result<StateId, BuildError> {
        let kind = StateKind::Cluster {
            children: Vec::new(),
            history,
        };
        self.add_state(name, parent, kind)
    }

    /// Add a set under `parent`.
    pub fn set(&mut self, name: &str, parent: StateId) -> Result<StateId, BuildError> {
        let kind = StateKind::Set {
            children: Vec::new(),
        };
        self.add_state(name, parent, kind)
    }

    fn add_state(
        &mut self,
        name: &str,
        parent: StateId,
        kind: StateKind,
    ) -> Result<StateId, BuildError> {
        let id = StateId(self.states.len());
        let qualified = if parent == self.root() {
            name.to_string()
        } else {
            format!("{}.{}", self.state_def(parent)?.name, name)
        };

        let parent_def = self.state_def_mut(parent)?;
        match &mut parent_def.kind {
            StateKind::Cluster { children, .. } | StateKind::Set { children } => children.push(id),
            StateKind::Leaf => return Err(BuildError::NotAParent(parent_def.name.clone())),
        }

        let mut def = StateDef::leaf(qualified).child_of(parent);
        def.kind = kind;
        self.states.push(def);
        Ok(id)
    }

    /// Declare an event with no base.
    pub fn event(&mut self, name: impl Into<String>) -> EventId {
        let id = EventId(self.events.len());
        self.events.push(EventDef::new(name));
        id
    }

    /// Declare an event that inherits the transitions and precondition of
    /// `base`.
    pub fn derived_event(
        &mut self,
        name: impl Into<String>,
        base: EventId,
    ) -> Result<EventId, BuildError> {
        self.event_def(base)?;
        let id = EventId(self.events.len());
        self.events.push(EventDef::new(name).based_on(base));
        Ok(id)
    }

    /// Attach a precondition to `event`.
    pub fn precondition(
        &mut self,
        event: EventId,
        precondition: Precondition,
    ) -> Result<&mut Self, BuildError> {
        self.event_def_mut(event)?.precondition = Some(precondition);
        Ok(self)
    }

    /// Add a transition fired by `event`.
    pub fn transition(
        &mut self,
        event: EventId,
        builder: TransitionBuilder,
    ) -> Result<TransitionId, BuildError> {
        self.event_def(event)?;
        let transition = builder.build()?;
        let id = TransitionId(self.transitions.len());
        self.transitions.push(transition);
        self.event_def_mut(event)?.transitions.push(id);
        Ok(id)
    }

    /// Run `action` whenever `state` is entered.
    pub fn on_enter(&mut self, state: StateId, action: StateAction) -> Result<&mut Self, BuildError> {
        self.state_def_mut(state)?.enter_action = Some(action);
        Ok(self)
    }

    /// Run `action` whenever `state` is exited.
    pub fn on_exit(&mut self, state: StateId, action: StateAction) -> Result<&mut Self, BuildError> {
        self.state_def_mut(state)?.exit_action = Some(action);
        Ok(self)
    }

    /// Declare the event broadcast whenever `state` is entered, named
    /// `enter(<state>)`.
    pub fn enter_event(&mut self, state: StateId) -> Result<EventId, BuildError> {
        let name = format!("enter({})", self.state_def(state)?.name);
        let event = self.event(name);
        self.state_def_mut(state)?.enter_event = Some(event);
        Ok(event)
    }

    /// Declare the event broadcast whenever `state` is exited, named
    /// `exit(<state>)`.
    pub fn exit_event(&mut self, state: StateId) -> Result<EventId, BuildError> {
        let name = format!("exit({})", self.state_def(state)?.name);
        let event = self.event(name);
        self.state_def_mut(state)?.exit_event = Some(event);
        Ok(event)
    }

    /// Validate and install the tables.
    pub fn build(self) -> Result<MachineDefinition, BuildError> {
        MachineDefinition::new(StateId(0), self.states, self.events, self.transitions)
    }

    fn state_def(&self, id: StateId) -> Result<&StateDef, BuildError> {
        self.states
            .get(id.index())
            .ok_or_else(|| BuildError::UnknownState(id.to_string()))
    }

    fn state_def_mut(&mut self, id: StateId) -> Result<&mut StateDef, BuildError> {
        self.states
            .get_mut(id.index())
            .ok_or_else(|| BuildError::UnknownState(id.to_string()))
    }

    fn event_def(&self, id: EventId) -> Result<&EventDef, BuildError> {
        self.events
            .get(id.index())
            .ok_or_else(|| BuildError::UnknownEvent(id.to_string()))
    }

    fn event_def_mut(&mut self, id: EventId) -> Result<&mut EventDef, BuildError> {
        self.events
            .get_mut(id.index())
            .ok_or_else(|| BuildError::UnknownEvent(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_are_wired_in_declaration_order() {
        let mut builder = MachineBuilder::new("root");
        let door = builder.cluster("door", builder.root(), History::Shallow).unwrap();
        let closed = builder.state("closed", door).unwrap();
        let open = builder.state("open", door).unwrap();

        let def = builder.build().unwrap();

        assert_eq!(def.state(door).kind.children(), &[closed, open]);
        assert_eq!(def.state(open).parent, Some(door));
        assert_eq!(def.state_id("door.open"), Some(open));
        assert_eq!(def.state_id("door"), Some(door));
    }

    #[test]
    fn leaf_cannot_take_children() {
        let mut builder = MachineBuilder::new("root");
        let leaf = builder.state("leaf", builder.root()).unwrap();

        let result = builder.state("child", leaf);
        assert!(matches!(result, Err(BuildError::NotAParent(name)) if name == "leaf"));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut builder = MachineBuilder::new("root");

        assert!(matches!(
            builder.state("x", StateId(7)),
            Err(BuildError::UnknownState(_))
        ));
        assert!(matches!(
            builder.derived_event("d", EventId(3)),
            Err(BuildError::UnknownEvent(_))
        ));
    }

    #[test]
    fn enter_and_exit_events_are_named_after_the_state() {
        let mut builder = MachineBuilder::new("root");
        let oven = builder.cluster("oven", builder.root(), History::None).unwrap();
        let cooking = builder.state("cooking", oven).unwrap();
        let entered = builder.enter_event(cooking).unwrap();
        let exited = builder.exit_event(cooking).unwrap();

        let def = builder.build().unwrap();

        assert_eq!(def.event(entered).name, "enter(oven.cooking)");
        assert_eq!(def.event(exited).name, "exit(oven.cooking)");
        assert_eq!(def.state(cooking).enter_event, Some(entered));
    }

    #[test]
    fn illegal_fixed_transition_fails_build() {
        let mut builder = MachineBuilder::new("root");
        let both = builder.set("both", builder.root()).unwrap();
        let left = builder.state("left", both).unwrap();
        let right = builder.state("right", both).unwrap();
        let go = builder.event("go");
        builder
            .transition(go, TransitionBuilder::new().from(left).to(right))
            .unwrap();

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("crosses a set boundary"));
    }
}
