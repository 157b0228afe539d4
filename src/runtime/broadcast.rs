//! Event broadcast: preconditions, the transition scan, and queueing.

use super::error::{CallbackKind, MachineError};
use super::machine::Machine;
use super::trigger::Trigger;
use crate::core::{is_legal, Activation, EventId, ParamBlock, StateId, TransitionId};
use crate::debug::DebugFlags;

/// What a broadcast did, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// At least one transition was taken and the queue has been drained.
    Completed,
    /// At least one transition was taken; the machine was already running,
    /// so the event waits for the next microstep.
    Queued,
    /// The event, or one of its base events, was already being broadcast.
    Suppressed,
    /// A precondition in the base chain rejected the parameters.
    PreconditionFailed,
    /// No active state had an enabled transition on the event.
    NoTransition,
}

impl BroadcastOutcome {
    /// True if the event caused (or will cause) transitions.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Completed | Self::Queued)
    }
}

/// A transition claimed during one scan, kept so a failed scan can be
/// undone.
struct Claim {
    transition: TransitionId,
    took: bool,
    disabled: Option<StateId>,
}

impl Machine {
    /// Broadcast `event` without parameters. Preconditions are skipped.
    pub fn broadcast(&self, event: EventId) -> Result<BroadcastOutcome, MachineError> {
        self.dispatch(event, None)
    }

    /// Broadcast with a parameter block, visible to preconditions and to
    /// every callback triggered by this event.
    pub fn broadcast_with(
        &self,
        event: EventId,
        params: ParamBlock,
    ) -> Result<BroadcastOutcome, MachineError> {
        self.dispatch(event, Some(params))
    }

    /// Broadcast the event called `name`, failing with
    /// [`MachineError::UnknownEvent`] if there is none.
    pub fn broadcast_by_name(
        &self,
        name: &str,
        params: Option<ParamBlock>,
    ) -> Result<BroadcastOutcome, MachineError> {
        let event = self
            .event_id(name)
            .ok_or_else(|| MachineError::UnknownEvent(name.to_string()))?;
        self.dispatch(event, params)
    }

    fn dispatch(
        &self,
        event: EventId,
        params: Option<ParamBlock>,
    ) -> Result<BroadcastOutcome, MachineError> {
        if event.index() >= self.definition().events().len() {
            return Err(MachineError::UnknownEvent(event.to_string()));
        }
        let _guard = self.lock();
        self.broadcast_locked(event, params)
    }

    fn broadcast_locked(
        &self,
        event: EventId,
        params: Option<ParamBlock>,
    ) -> Result<BroadcastOutcome, MachineError> {
        let definition = self.definition().clone();
        // An event is busy while it, or anything derived from it, is being
        // broadcast; so is every event derived from a busy one.
        if definition
            .base_chain(event)
            .any(|e| self.is_event_in_progress(e))
        {
            return Ok(BroadcastOutcome::Suppressed);
        }
        let name = definition.event(event).name.as_str();
        self.echo(DebugFlags::EVENTS, || format!("broadcast: {name}"));

        self.with_runtime(|rt| {
            for e in definition.base_chain(event) {
                rt.events[e.index()].in_progress += 1;
            }
            rt.events[event.index()].params = params.clone();
        });

        if let Some(params) = &params {
            match self.check_preconditions(event, params) {
                Ok(true) => {}
                Ok(false) => {
                    self.cancel(event);
                    return Ok(BroadcastOutcome::PreconditionFailed);
                }
                Err(err) => {
                    self.cancel(event);
                    return Err(err);
                }
            }
        }

        let trigger = Trigger::new(self, event, params);
        let claims = match self.scan(event, &trigger) {
            Ok(claims) => claims,
            Err(err) => {
                self.cancel(event);
                return Err(err);
            }
        };
        if claims.is_empty() {
            self.cancel(event);
            return Ok(BroadcastOutcome::NoTransition);
        }

        let running = self.with_runtime(|rt| {
            rt.queue.push_back(event);
            rt.in_progress
        });
        self.echo(DebugFlags::EVENTS, || format!("queued   : {name}"));
        if running {
            return Ok(BroadcastOutcome::Queued);
        }
        self.algorithm()?;
        Ok(BroadcastOutcome::Completed)
    }

    /// Evaluate preconditions from the root of the base chain down to the
    /// event itself, stopping at the first rejection.
    fn check_preconditions(
        &self,
        event: EventId,
        params: &ParamBlock,
    ) -> Result<bool, MachineError> {
        let definition = self.definition().clone();
        let chain: Vec<EventId> = definition.base_chain(event).collect();
        for &e in chain.iter().rev() {
            let def = definition.event(e);
            let Some(precondition) = &def.precondition else {
                continue;
            };
            let passed = precondition.eval(params).map_err(|source| {
                MachineError::callback(CallbackKind::Precondition, &def.name, source)
            })?;
            self.echo(DebugFlags::EVENTS, || format!("+ precondition: {passed}"));
            if !passed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Claim every enabled transition of `event` and its bases. On failure
    /// every claim made so far is released.
    fn scan(&self, event: EventId, trigger: &Trigger<'_>) -> Result<Vec<Claim>, MachineError> {
        self.echo(DebugFlags::EVENTS, || "+ checking transitions".to_string());
        self.nest(DebugFlags::EVENTS);
        let mut claims = Vec::new();
        let result = self.scan_into(event, trigger, &mut claims);
        self.unnest(DebugFlags::EVENTS);
        match result {
            Ok(()) => Ok(claims),
            Err(err) => {
                self.release(&claims);
                Err(err)
            }
        }
    }

    fn scan_into(
        &self,
        event: EventId,
        trigger: &Trigger<'_>,
        claims: &mut Vec<Claim>,
    ) -> Result<(), MachineError> {
        let definition = self.definition().clone();
        let name = definition.event(event).name.as_str();

        for t in definition.event_transitions(event) {
            let transition = definition.transition(t);
            let from = transition.from;
            // ActiveDisabled sources are already committed elsewhere.
            if self.activation(from) != Activation::Active {
                continue;
            }
            if let Some(condition) = &transition.condition {
                let enabled = condition.eval(trigger).map_err(|source| {
                    MachineError::callback(CallbackKind::Condition, name, source)
                })?;
                if !enabled {
                    continue;
                }
            }

            let to = match (transition.to, &transition.target) {
                (Some(to), _) => Some(to),
                (None, Some(target)) => {
                    let computed = target.eval(trigger).map_err(|source| {
                        MachineError::callback(CallbackKind::Target, name, source)
                    })?;
                    let Some(to) = computed else {
                        continue;
                    };
                    if to.index() >= definition.states().len() {
                        return Err(MachineError::UnknownState(to.to_string()));
                    }
                    if !is_legal(definition.states(), from, to) {
                        return Err(MachineError::IllegalTarget {
                            from: self.state_name(from).to_string(),
                            to: self.state_name(to).to_string(),
                        });
                    }
                    Some(to)
                }
                (None, None) => None,
            };

            let claim = self.with_runtime(|rt| {
                let took = rt.taken[t.index()].is_none();
                if took {
                    rt.taken[t.index()] = Some(event);
                }
                let disabled = to.map(|to| {
                    rt.target[t.index()] = Some(to);
                    rt.states[from.index()] = Activation::ActiveDisabled;
                    from
                });
                Claim {
                    transition: t,
                    took,
                    disabled,
                }
            });
            claims.push(claim);

            self.echo(DebugFlags::EVENTS, || match to {
                Some(to) => format!(
                    "+ found  : {} -> {}",
                    self.state_name(from),
                    self.state_name(to)
                ),
                None => format!("+ found  : {} (internal)", self.state_name(from)),
            });
        }
        Ok(())
    }

    fn release(&self, claims: &[Claim]) {
        self.with_runtime(|rt| {
            for claim in claims {
                let t = claim.transition.index();
                if claim.took {
                    rt.taken[t] = None;
                    rt.target[t] = None;
                }
                if let Some(from) = claim.disabled {
                    rt.states[from.index()] = Activation::Active;
                }
            }
        });
    }

    fn cancel(&self, event: EventId) {
        self.broadcasted(event);
        self.echo(DebugFlags::EVENTS, || {
            format!("broadcast: {} -- cancelled", self.event_name(event))
        });
    }

    /// Release the in-progress marks of `event` and its bases and drop its
    /// parameters.
    pub(crate) fn broadcasted(&self, event: EventId) {
        let definition = self.definition().clone();
        self.with_runtime(|rt| {
            for e in definition.base_chain(event) {
                let slot = &mut rt.events[e.index()];
                slot.in_progress = slot.in_progress.saturating_sub(1);
            }
            rt.events[event.index()].params = None;
        });
    }
}
