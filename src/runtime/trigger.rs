//! What a callback sees of the event that triggered it.

use super::machine::Machine;
use crate::core::{EventId, ParamBlock};
use std::any::Any;

/// Name reported for the internal event used to enter and exit a machine.
pub const PRIME_EVENT_NAME: &str = "<prime>";

/// The event being processed when a callback runs, plus a handle to the
/// machine so callbacks can query activation and broadcast further events.
///
/// Events broadcast from inside a callback while the machine is already
/// processing are queued and handled in the next microstep.
#[derive(Clone, Debug)]
pub struct Trigger<'m> {
    machine: &'m Machine,
    event: Option<EventId>,
    params: Option<ParamBlock>,
}

impl<'m> Trigger<'m> {
    pub(crate) fn new(machine: &'m Machine, event: EventId, params: Option<ParamBlock>) -> Self {
        Self {
            machine,
            event: Some(event),
            params,
        }
    }

    pub(crate) fn prime(machine: &'m Machine) -> Self {
        Self {
            machine,
            event: None,
            params: None,
        }
    }

    /// The machine running the callback.
    pub fn machine(&self) -> &'m Machine {
        self.machine
    }

    /// `None` when the machine itself is being entered or exited.
    pub fn event(&self) -> Option<EventId> {
        self.event
    }

    /// True when the callback runs from `enter` or `exit` rather than an event.
    pub fn is_prime(&self) -> bool {
        self.event.is_none()
    }

    /// Name of the triggering event.
    pub fn name(&self) -> &'m str {
        match self.event {
            Some(event) => self.machine.event_name(event),
            None => PRIME_EVENT_NAME,
        }
    }

    /// Parameters of the broadcast, if it carried any.
    pub fn params(&self) -> Option<&ParamBlock> {
        self.params.as_ref()
    }

    /// Parameters of the broadcast, if present and of type `T`.
    pub fn param<T: Any>(&self) -> Option<&T> {
        self.params.as_ref().and_then(ParamBlock::get::<T>)
    }
}
