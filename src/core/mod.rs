//! Core machine tables and callback objects.
//!
//! This module holds the plain data a front end hands to the engine:
//! - dense ids for states, events and transitions
//! - state, event and transition definitions
//! - cluster history
//! - callback objects (actions, conditions, targets, preconditions)
//!
//! Nothing here mutates at run time except `ClusterHistory`, which the
//! runtime keeps one of per cluster per machine instance.

mod callback;
mod event;
mod history;
mod id;
mod state;
mod transition;

pub use callback::{
    Action, CallbackError, CallbackResult, Condition, Precondition, StateAction, Target,
};
pub use event::{EventDef, ParamBlock};
pub use history::{ClusterHistory, History};
pub use id::{EventId, StateId, TransitionId};
pub use state::{Activation, StateDef, StateKind};
pub use transition::{is_legal, lineage, nearest_common_ancestor, TransitionDef};
