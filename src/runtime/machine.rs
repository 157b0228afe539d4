//! A running machine instance.

use super::definition::MachineDefinition;
use super::error::MachineError;
use super::trigger::Trigger;
use crate::core::{Activation, ClusterHistory, EventId, ParamBlock, StateId, TransitionId};
use crate::debug::{DebugFlags, DebugSink, TraceLine, TracingSink};
use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Per-instance broadcast bookkeeping of one event.
#[derive(Debug, Default)]
pub(crate) struct EventSlot {
    /// Nonzero while this event, or an event derived from it, is being
    /// broadcast.
    pub(crate) in_progress: u32,
    pub(crate) params: Option<ParamBlock>,
}

/// Everything that mutates while a machine runs.
pub(crate) struct Runtime {
    pub(crate) states: Vec<Activation>,
    /// Indexed by state id; only cluster entries are used.
    pub(crate) clusters: Vec<ClusterHistory>,
    pub(crate) events: Vec<EventSlot>,
    /// Which event claimed each transition during its scan.
    pub(crate) taken: Vec<Option<EventId>>,
    /// Resolved destination of each claimed transition.
    pub(crate) target: Vec<Option<StateId>>,
    pub(crate) queue: VecDeque<EventId>,
    pub(crate) in_progress: bool,
    pub(crate) depth: usize,
    pub(crate) sink: Arc<dyn DebugSink>,
}

impl Runtime {
    fn new(definition: &MachineDefinition, sink: Arc<dyn DebugSink>) -> Self {
        let states = definition.states().len();
        let transitions = definition.transitions().len();
        Self {
            states: vec![Activation::Inactive; states],
            clusters: vec![ClusterHistory::default(); states],
            events: definition.events().iter().map(|_| EventSlot::default()).collect(),
            taken: vec![None; transitions],
            target: vec![None; transitions],
            queue: VecDeque::new(),
            in_progress: false,
            depth: 0,
            sink,
        }
    }
}

struct Shared {
    id: Uuid,
    definition: Arc<MachineDefinition>,
    debug: AtomicU8,
    runtime: ReentrantMutex<RefCell<Runtime>>,
}

/// One independent, self-contained state machine instance.
///
/// Cloning a `Machine` clones the handle: both clones drive the same
/// instance. Use [`Machine::duplicate`] for a separate instance of the same
/// definition.
///
/// All mutation happens under a per-instance reentrant lock, so broadcasts
/// from different threads are serialized while callbacks running on the
/// locking thread may broadcast again.
#[derive(Clone)]
pub struct Machine {
    shared: Arc<Shared>,
}

impl Machine {
    pub(crate) fn new(definition: Arc<MachineDefinition>, debug: DebugFlags) -> Self {
        Self::with_sink(definition, debug, Arc::new(TracingSink))
    }

    fn with_sink(
        definition: Arc<MachineDefinition>,
        debug: DebugFlags,
        sink: Arc<dyn DebugSink>,
    ) -> Self {
        let runtime = Runtime::new(&definition, sink);
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                definition,
                debug: AtomicU8::new(debug.bits()),
                runtime: ReentrantMutex::new(RefCell::new(runtime)),
            }),
        }
    }

    /// A new, inactive instance of the same definition, with the same debug
    /// flags and sink.
    pub fn duplicate(&self) -> Machine {
        let sink = self.with_runtime_ref(|rt| Arc::clone(&rt.sink));
        Self::with_sink(Arc::clone(&self.shared.definition), self.debug(), sink)
    }

    /// Identity of this instance, stamped on every trace line.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// The shared tables this machine runs.
    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.shared.definition
    }

    /// Enter the root cluster, and with it the default (or remembered)
    /// configuration. Returns `false` if the machine was already active.
    pub fn enter(&self) -> Result<bool, MachineError> {
        let _guard = self.shared.runtime.lock();
        self.run_held(|| {
            let trigger = Trigger::prime(self);
            self.enter_state(self.definition().root(), &trigger, None)
        })
    }

    /// Exit every active state. Returns `false` if the machine was not
    /// active.
    pub fn exit(&self) -> Result<bool, MachineError> {
        let _guard = self.shared.runtime.lock();
        self.run_held(|| {
            let trigger = Trigger::prime(self);
            self.exit_state(self.definition().root(), &trigger, None)
        })
    }

    /// Run `f` as if the algorithm were in progress, so that events it
    /// raises are queued, then drain them.
    fn run_held(
        &self,
        f: impl FnOnce() -> Result<bool, MachineError>,
    ) -> Result<bool, MachineError> {
        let nested = self.with_runtime(|rt| std::mem::replace(&mut rt.in_progress, true));
        if nested {
            return f();
        }
        let result = f();
        self.with_runtime(|rt| rt.in_progress = false);
        match result {
            Ok(changed) => {
                self.algorithm()?;
                Ok(changed)
            }
            Err(err) => {
                self.abandon_queue();
                Err(err)
            }
        }
    }

    /// A machine is active iff its root cluster is.
    pub fn is_active(&self) -> bool {
        self.active(self.definition().root())
    }

    /// Whether `state` is active, disabled or not.
    ///
    /// # Panics
    ///
    /// Panics if `state` is not a state of this machine's definition. The
    /// same holds for every query taking a `StateId` or `EventId`.
    pub fn active(&self, state: StateId) -> bool {
        self.activation(state).is_active()
    }

    /// Full activation of `state`, including the disabled mark set during
    /// a microstep.
    pub fn activation(&self, state: StateId) -> Activation {
        self.with_runtime_ref(|rt| rt.states[state.index()])
    }

    /// The child a cluster currently holds active.
    pub fn active_child(&self, cluster: StateId) -> Option<StateId> {
        self.with_runtime_ref(|rt| rt.clusters[cluster.index()].active_child)
    }

    /// Most recently active child, kept across the cluster's own exit.
    pub fn last_child(&self, cluster: StateId) -> Option<StateId> {
        self.with_runtime_ref(|rt| rt.clusters[cluster.index()].last_child)
    }

    /// Whether the cluster resumes its last child on entry.
    pub fn has_history(&self, cluster: StateId) -> bool {
        self.definition().has_history(cluster)
    }

    /// Reset a cluster's history to its default child. No effect on other
    /// states.
    pub fn clear(&self, cluster: StateId) {
        let default_child = self.first_child(cluster);
        if self.definition().state(cluster).kind.is_cluster() {
            self.with_runtime(|rt| rt.clusters[cluster.index()].clear(default_child));
        }
    }

    /// Reset the history of `state` and of every cluster nested below it.
    pub fn deep_clear(&self, state: StateId) {
        let _guard = self.shared.runtime.lock();
        self.clear(state);
        for &child in self.children(state) {
            self.deep_clear(child);
        }
    }

    /// Children in declaration order; empty for leaves.
    pub fn children(&self, state: StateId) -> &[StateId] {
        self.definition().state(state).kind.children()
    }

    /// The default child of a parent.
    pub fn first_child(&self, state: StateId) -> Option<StateId> {
        self.children(state).first().copied()
    }

    /// True for leaves and childless parents.
    pub fn is_empty(&self, state: StateId) -> bool {
        self.children(state).is_empty()
    }

    /// `None` for the root.
    pub fn parent(&self, state: StateId) -> Option<StateId> {
        self.definition().state(state).parent
    }

    /// Qualified name of a state.
    pub fn state_name(&self, state: StateId) -> &str {
        &self.definition().state(state).name
    }

    /// Name of an event.
    pub fn event_name(&self, event: EventId) -> &str {
        &self.definition().event(event).name
    }

    /// Look up a state by qualified name.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.definition().state_id(name)
    }

    /// Look up an event by name.
    pub fn event_id(&self, name: &str) -> Option<EventId> {
        self.definition().event_id(name)
    }

    /// All states in id order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        (0..self.definition().states().len()).map(StateId)
    }

    /// Whether `event` (or an event derived from it) is being broadcast.
    pub fn is_event_in_progress(&self, event: EventId) -> bool {
        self.with_runtime_ref(|rt| rt.events[event.index()].in_progress > 0)
    }

    /// Trace categories currently enabled.
    pub fn debug(&self) -> DebugFlags {
        DebugFlags::from_bits_truncate(self.shared.debug.load(Ordering::Relaxed))
    }

    /// Replace the debug flags, returning the previous ones.
    pub fn set_debug(&self, flags: DebugFlags) -> DebugFlags {
        let previous = self.shared.debug.swap(flags.bits(), Ordering::Relaxed);
        DebugFlags::from_bits_truncate(previous)
    }

    /// Send trace lines to `sink` instead of the current one.
    pub fn set_debug_sink(&self, sink: Arc<dyn DebugSink>) {
        self.with_runtime(|rt| rt.sink = sink);
    }

    /// Activation of every state, in id order.
    pub fn dump_state(&self) -> MachineSnapshot {
        let states = self.with_runtime_ref(|rt| {
            rt.states
                .iter()
                .enumerate()
                .map(|(i, activation)| StateSnapshot {
                    id: StateId(i),
                    name: self.state_name(StateId(i)).to_string(),
                    activation: *activation,
                })
                .collect()
        });
        MachineSnapshot {
            machine: self.id(),
            taken_at: Utc::now(),
            states,
        }
    }

    pub(crate) fn with_runtime<R>(&self, f: impl FnOnce(&mut Runtime) -> R) -> R {
        let guard = self.shared.runtime.lock();
        let mut runtime = guard.borrow_mut();
        f(&mut runtime)
    }

    pub(crate) fn with_runtime_ref<R>(&self, f: impl FnOnce(&Runtime) -> R) -> R {
        let guard = self.shared.runtime.lock();
        let runtime = guard.borrow();
        f(&runtime)
    }

    pub(crate) fn lock(&self) -> parking_lot::ReentrantMutexGuard<'_, RefCell<Runtime>> {
        self.shared.runtime.lock()
    }

    pub(crate) fn set_activation(&self, state: StateId, activation: Activation) {
        self.with_runtime(|rt| rt.states[state.index()] = activation);
    }

    pub(crate) fn claimed_by(&self, transition: TransitionId) -> Option<EventId> {
        self.with_runtime_ref(|rt| rt.taken[transition.index()])
    }

    /// Emit a trace line if `category` is enabled.
    pub(crate) fn echo(&self, category: DebugFlags, message: impl FnOnce() -> String) {
        if !self.debug().contains(category) {
            return;
        }
        let (sink, depth) = self.with_runtime_ref(|rt| (Arc::clone(&rt.sink), rt.depth));
        sink.line(&TraceLine {
            machine: self.id(),
            depth,
            category,
            message: message(),
            at: Utc::now(),
        });
    }

    pub(crate) fn nest(&self, category: DebugFlags) {
        if self.debug().contains(category) {
            self.with_runtime(|rt| rt.depth += 1);
        }
    }

    pub(crate) fn unnest(&self, category: DebugFlags) {
        if self.debug().contains(category) {
            self.with_runtime(|rt| rt.depth = rt.depth.saturating_sub(1));
        }
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Activation of one state at the time of a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub id: StateId,
    pub name: String,
    pub activation: Activation,
}

/// Point-in-time view of every state of a machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub machine: Uuid,
    pub taken_at: DateTime<Utc>,
    pub states: Vec<StateSnapshot>,
}

impl MachineSnapshot {
    /// Names of the states that were active, in id order.
    pub fn active_states(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|s| s.activation.is_active())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Pretty-printed JSON form of the snapshot.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for MachineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "current state:")?;
        for state in &self.states {
            let mark = if state.activation.is_active() { '*' } else { ' ' };
            writeln!(f, " {mark}{}", state.name)?;
        }
        Ok(())
    }
}
