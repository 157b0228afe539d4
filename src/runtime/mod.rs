//! The engine: installed definitions and the machines that run them.

mod activation;
mod algorithm;
mod broadcast;
mod definition;
mod error;
mod machine;
mod trigger;

pub use broadcast::BroadcastOutcome;
pub use definition::MachineDefinition;
pub use error::{CallbackKind, MachineError};
pub use machine::{Machine, MachineSnapshot, StateSnapshot};
pub use trigger::{Trigger, PRIME_EVENT_NAME};
