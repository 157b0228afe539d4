//! Callback objects supplied by the front end.
//!
//! The engine never inspects user code: actions, conditions, computed
//! targets and preconditions are opaque shared closures with fixed
//! signatures. Every callback may fail; a failure propagates to the caller
//! of the broadcast that triggered it.

use super::event::ParamBlock;
use super::id::StateId;
use crate::runtime::Trigger;
use std::fmt;
use std::sync::Arc;

/// Error produced by a user callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a user callback.
pub type CallbackResult<T> = Result<T, CallbackError>;

type ActionFn = dyn Fn(&Trigger<'_>) -> CallbackResult<()> + Send + Sync;
type StateActionFn = dyn Fn(&Trigger<'_>, StateId) -> CallbackResult<()> + Send + Sync;
type ConditionFn = dyn Fn(&Trigger<'_>) -> CallbackResult<bool> + Send + Sync;
type TargetFn = dyn Fn(&Trigger<'_>) -> CallbackResult<Option<StateId>> + Send + Sync;
type PreconditionFn = dyn Fn(&ParamBlock) -> CallbackResult<bool> + Send + Sync;

/// Action run by a transition, between exiting its source and entering
/// its destination.
///
/// # Example
///
/// ```rust
/// use chsm::core::Action;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let count = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&count);
/// let action = Action::new(move |_trigger| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// # let _ = action;
/// ```
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    /// Wrap an infallible action.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&Trigger<'_>) + Send + Sync + 'static,
    {
        Self(Arc::new(move |trigger| {
            action(trigger);
            Ok(())
        }))
    }

    /// Wrap an action that may fail, e.g. one that broadcasts further events.
    pub fn try_new<F>(action: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> CallbackResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(action))
    }

    pub fn exec(&self, trigger: &Trigger<'_>) -> CallbackResult<()> {
        (self.0)(trigger)
    }
}

/// Enter or exit action of a state. Receives the state being entered or
/// exited alongside the trigger.
#[derive(Clone)]
pub struct StateAction(Arc<StateActionFn>);

impl StateAction {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&Trigger<'_>, StateId) + Send + Sync + 'static,
    {
        Self(Arc::new(move |trigger, state| {
            action(trigger, state);
            Ok(())
        }))
    }

    pub fn try_new<F>(action: F) -> Self
    where
        F: Fn(&Trigger<'_>, StateId) -> CallbackResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(action))
    }

    pub fn exec(&self, trigger: &Trigger<'_>, state: StateId) -> CallbackResult<()> {
        (self.0)(trigger, state)
    }
}

/// Guard on a transition. The transition is a candidate only while its
/// condition holds.
#[derive(Clone)]
pub struct Condition(Arc<ConditionFn>);

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |trigger| Ok(predicate(trigger))))
    }

    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> CallbackResult<bool> + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn eval(&self, trigger: &Trigger<'_>) -> CallbackResult<bool> {
        (self.0)(trigger)
    }
}

/// Computed destination of a transition, evaluated in place of a fixed
/// destination. Returning `None` abandons that one transition.
#[derive(Clone)]
pub struct Target(Arc<TargetFn>);

impl Target {
    pub fn new<F>(target: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> Option<StateId> + Send + Sync + 'static,
    {
        Self(Arc::new(move |trigger| Ok(target(trigger))))
    }

    pub fn try_new<F>(target: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> CallbackResult<Option<StateId>> + Send + Sync + 'static,
    {
        Self(Arc::new(target))
    }

    pub fn eval(&self, trigger: &Trigger<'_>) -> CallbackResult<Option<StateId>> {
        (self.0)(trigger)
    }
}

/// Precondition of an event, evaluated against the parameter block of a
/// broadcast before any transition is scanned.
///
/// # Example
///
/// ```rust
/// use chsm::core::{ParamBlock, Precondition};
///
/// let positive = Precondition::new(|params: &ParamBlock| {
///     params.get::<i32>().is_some_and(|n| *n > 0)
/// });
///
/// assert!(positive.eval(&ParamBlock::new(5)).unwrap());
/// assert!(!positive.eval(&ParamBlock::new(-1)).unwrap());
/// assert!(!positive.eval(&ParamBlock::new("five")).unwrap());
/// ```
#[derive(Clone)]
pub struct Precondition(Arc<PreconditionFn>);

impl Precondition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ParamBlock) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |params| Ok(predicate(params))))
    }

    pub fn try_new<F>(predicate: F) -> Self
    where
        F: Fn(&ParamBlock) -> CallbackResult<bool> + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn eval(&self, params: &ParamBlock) -> CallbackResult<bool> {
        (self.0)(params)
    }
}

macro_rules! opaque_debug {
    ($($name:ident),*) => {
        $(
            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(concat!(stringify!($name), "(..)"))
                }
            }
        )*
    };
}

opaque_debug!(Action, StateAction, Condition, Target, Precondition);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Overheated;

    impl fmt::Display for Overheated {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("overheated")
        }
    }

    impl std::error::Error for Overheated {}

    #[test]
    fn precondition_reads_typed_params() {
        let even = Precondition::new(|p: &ParamBlock| p.get::<u32>().is_some_and(|n| n % 2 == 0));

        assert!(even.eval(&ParamBlock::new(4u32)).unwrap());
        assert!(!even.eval(&ParamBlock::new(3u32)).unwrap());
    }

    #[test]
    fn fallible_precondition_reports_error() {
        let failing = Precondition::try_new(|_| Err(Overheated.into()));

        let err = failing.eval(&ParamBlock::new(())).unwrap_err();
        assert_eq!(err.to_string(), "overheated");
    }

    #[test]
    fn callbacks_are_cheap_to_clone() {
        let precondition = Precondition::new(|_| true);
        let copy = precondition.clone();

        assert!(Arc::ptr_eq(&precondition.0, &copy.0));
    }

    #[test]
    fn debug_output_is_opaque() {
        let action = Action::new(|_| {});
        assert_eq!(format!("{action:?}"), "Action(..)");
    }
}
