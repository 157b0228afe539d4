//! The microstep loop.
//!
//! Each microstep takes a snapshot of the queue and processes it in three
//! phases: exit the sources of every claimed transition and run the
//! transition actions, enter every destination, then dequeue the events.
//! Events broadcast while a microstep runs are queued behind the snapshot
//! and handled by the next one.

use super::error::{CallbackKind, MachineError};
use super::machine::Machine;
use super::trigger::Trigger;
use crate::core::{Activation, EventId};
use crate::debug::DebugFlags;

impl Machine {
    /// Drain the event queue. A no-op when the loop is already running
    /// further up the stack or nothing is queued.
    ///
    /// On error the queue is abandoned so the machine stays usable.
    pub(crate) fn algorithm(&self) -> Result<(), MachineError> {
        let _guard = self.lock();
        let start = self.with_runtime(|rt| {
            if rt.in_progress || rt.queue.is_empty() {
                return false;
            }
            rt.in_progress = true;
            true
        });
        if !start {
            return Ok(());
        }

        self.echo(DebugFlags::ALGORITHM, || "ALGORITHM BEGINNING".to_string());
        self.nest(DebugFlags::ALGORITHM);
        if let Err(err) = self.drain_queue() {
            self.abandon_queue();
            return Err(err);
        }
        self.unnest(DebugFlags::ALGORITHM);
        self.with_runtime(|rt| rt.in_progress = false);
        self.echo(DebugFlags::ALGORITHM, || "ALGORITHM COMPLETE".to_string());
        Ok(())
    }

    fn drain_queue(&self) -> Result<(), MachineError> {
        loop {
            let events: Vec<EventId> = self.with_runtime_ref(|rt| rt.queue.iter().copied().collect());
            if events.is_empty() {
                return Ok(());
            }
            self.echo(DebugFlags::ALGORITHM, || {
                format!("events in micro-step: {}", events.len())
            });

            self.phase(r#"ALGORITHM PHASE I: Exit "from" states"#, || {
                events.iter().try_for_each(|&e| self.exit_sources(e))
            })?;
            self.phase(r#"ALGORITHM PHASE II: Enter "to" states"#, || {
                events.iter().try_for_each(|&e| self.enter_targets(e))
            })?;
            self.phase("ALGORITHM PHASE III: Dequeue events", || {
                for _ in 0..events.len() {
                    let Some(event) = self.with_runtime(|rt| rt.queue.pop_front()) else {
                        break;
                    };
                    self.broadcasted(event);
                    self.echo(DebugFlags::ALGORITHM, || {
                        format!("dequeued: {}", self.event_name(event))
                    });
                }
                Ok(())
            })?;
        }
    }

    fn phase(
        &self,
        title: &str,
        body: impl FnOnce() -> Result<(), MachineError>,
    ) -> Result<(), MachineError> {
        self.echo(DebugFlags::ALGORITHM, || title.to_string());
        self.nest(DebugFlags::ALGORITHM);
        body()?;
        self.unnest(DebugFlags::ALGORITHM);
        Ok(())
    }

    fn trigger_for(&self, event: EventId) -> Trigger<'_> {
        let params = self.with_runtime_ref(|rt| rt.events[event.index()].params.clone());
        Trigger::new(self, event, params)
    }

    /// Phase I for one event.
    fn exit_sources(&self, event: EventId) -> Result<(), MachineError> {
        let definition = self.definition().clone();
        let trigger = self.trigger_for(event);
        self.echo(DebugFlags::ALGORITHM, || {
            format!("iterating transitions of: {}", self.event_name(event))
        });
        self.nest(DebugFlags::ALGORITHM);

        for t in definition.event_transitions(event) {
            if self.claimed_by(t) != Some(event) {
                continue;
            }
            let transition = definition.transition(t);
            let from = transition.from;
            // Exited by an earlier transition of this microstep.
            if !self.active(from) {
                self.with_runtime(|rt| {
                    rt.taken[t.index()] = None;
                    rt.target[t.index()] = None;
                });
                continue;
            }

            let to = self.with_runtime_ref(|rt| rt.target[t.index()]);
            self.echo(DebugFlags::ALGORITHM, || match to {
                Some(to) => format!(
                    "performing: {} -> {}",
                    self.state_name(from),
                    self.state_name(to)
                ),
                None => format!("performing: {} (internal)", self.state_name(from)),
            });
            let proceed = match to {
                Some(to) => self.exit_state(from, &trigger, Some(to))?,
                None => true,
            };
            if !proceed {
                continue;
            }
            if let Some(action) = &transition.action {
                self.echo(DebugFlags::ALGORITHM, || "performing action".to_string());
                action.exec(&trigger).map_err(|source| {
                    MachineError::callback(CallbackKind::Action, self.event_name(event), source)
                })?;
            }
        }

        self.unnest(DebugFlags::ALGORITHM);
        Ok(())
    }

    /// Phase II for one event.
    fn enter_targets(&self, event: EventId) -> Result<(), MachineError> {
        let definition = self.definition().clone();
        let trigger = self.trigger_for(event);

        for t in definition.event_transitions(event) {
            if self.claimed_by(t) != Some(event) {
                continue;
            }
            let to = self.with_runtime(|rt| {
                rt.taken[t.index()] = None;
                rt.target[t.index()].take()
            });
            if let Some(to) = to {
                self.enter_state(to, &trigger, None)?;
            }
        }
        Ok(())
    }

    /// Drop every queued event and every claim, and restore disabled states,
    /// after a callback failed mid-run.
    pub(crate) fn abandon_queue(&self) {
        let drained: Vec<EventId> = self.with_runtime(|rt| rt.queue.drain(..).collect());
        for event in drained {
            self.broadcasted(event);
        }
        self.with_runtime(|rt| {
            rt.taken.fill(None);
            rt.target.fill(None);
            for state in &mut rt.states {
                if *state == Activation::ActiveDisabled {
                    *state = Activation::Active;
                }
            }
            rt.depth = 0;
            rt.in_progress = false;
        });
    }
}
