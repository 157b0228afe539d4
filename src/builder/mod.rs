//! Builder API for constructing machine definitions.
//!
//! `MachineBuilder` assigns dense ids and wires parents to children;
//! `TransitionBuilder` assembles one transition at a time. Both end in
//! [`validate_tables`], which checks the finished tables as a whole.

pub mod error;
pub mod machine;
pub mod transition;
pub mod validate;

pub use error::{BuildError, TableFault};
pub use machine::MachineBuilder;
pub use transition::TransitionBuilder;
pub use validate::{validate_tables, TableCheck};
