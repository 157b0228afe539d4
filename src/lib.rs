//! chsm: a runtime for Concurrent Hierarchical State Machines
//!
//! A machine is a tree of states. Clusters keep exactly one child active
//! (optionally remembering which one across exits), sets keep all of their
//! children active, and leaves carry no children. Events are broadcast to
//! the whole machine; every transition whose source is active and whose
//! condition holds fires in the same microstep.
//!
//! # Core Concepts
//!
//! - **Definition**: Immutable tables of states, events and transitions,
//!   installed once and shared by any number of machines
//! - **Machine**: One independent instance with its own activation,
//!   history and event queue
//! - **Broadcast**: Scan for enabled transitions, then run the three-phase
//!   microstep algorithm (exit sources, enter destinations, dequeue)
//!
//! # Example
//!
//! ```rust
//! use chsm::builder::{MachineBuilder, TransitionBuilder};
//! use chsm::core::History;
//! use chsm::runtime::BroadcastOutcome;
//!
//! let mut builder = MachineBuilder::new("player");
//! let stopped = builder.state("stopped", builder.root()).unwrap();
//! let running = builder.cluster("running", builder.root(), History::Shallow).unwrap();
//! let playing = builder.state("playing", running).unwrap();
//! let paused = builder.state("paused", running).unwrap();
//!
//! let play = builder.event("play");
//! let pause = builder.event("pause");
//! let stop = builder.event("stop");
//! builder.transition(play, TransitionBuilder::new().from(stopped).to(running)).unwrap();
//! builder.transition(pause, TransitionBuilder::new().from(playing).to(paused)).unwrap();
//! builder.transition(stop, TransitionBuilder::new().from(running).to(stopped)).unwrap();
//!
//! let machine = builder.build().unwrap().into_machine();
//! machine.enter().unwrap();
//!
//! machine.broadcast(play).unwrap();
//! machine.broadcast(pause).unwrap();
//! machine.broadcast(stop).unwrap();
//! assert_eq!(machine.broadcast(play).unwrap(), BroadcastOutcome::Completed);
//!
//! // `running` has history: it resumes where it left off.
//! assert!(machine.active(paused));
//! ```

pub mod builder;
pub mod core;
pub mod debug;
pub mod runtime;

// Re-export commonly used types
pub use builder::{BuildError, MachineBuilder, TransitionBuilder};
pub use crate::core::{Activation, EventId, History, ParamBlock, StateId, TransitionId};
pub use debug::DebugFlags;
pub use runtime::{BroadcastOutcome, Machine, MachineDefinition, MachineError, Trigger};
