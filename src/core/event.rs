//! Event definitions and parameter blocks.

use super::callback::Precondition;
use super::id::{EventId, TransitionId};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Parameters carried by one broadcast.
///
/// A parameter block is transient: the machine holds it only while the
/// broadcast is in progress and drops it once the event is dequeued.
/// Actions of base events see the parameter block of the derived event
/// that was actually broadcast.
#[derive(Clone)]
pub struct ParamBlock(Arc<dyn Any + Send + Sync>);

impl ParamBlock {
    pub fn new<T: Any + Send + Sync>(params: T) -> Self {
        Self(Arc::new(params))
    }

    /// Borrow the parameters as `T`, if that is what they are.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for ParamBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamBlock(..)")
    }
}

/// Construction parameters of one event.
///
/// An event owns an ordered list of transitions and optionally names a
/// base event. Broadcasting a derived event considers its own transitions
/// first, then those of each base in turn.
#[derive(Clone, Debug)]
pub struct EventDef {
    pub name: String,
    pub base: Option<EventId>,
    pub transitions: Vec<TransitionId>,
    pub precondition: Option<Precondition>,
}

impl EventDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            transitions: Vec::new(),
            precondition: None,
        }
    }

    /// Make this a derived event of `base`.
    pub fn based_on(mut self, base: EventId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_transitions(mut self, transitions: impl IntoIterator<Item = TransitionId>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Gate broadcasts of this event on `precondition`.
    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = Some(precondition);
        self
    }
}
