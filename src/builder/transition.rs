//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::core::{Action, CallbackResult, Condition, StateId, Target, TransitionDef};
use crate::runtime::Trigger;

/// Builder for constructing transitions with a fluent API.
///
/// A transition built without `.to()` or `.target()` is internal.
#[derive(Default)]
pub struct TransitionBuilder {
    from: Option<StateId>,
    to: Option<StateId>,
    target: Option<Target>,
    condition: Option<Condition>,
    action: Option<Action>,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source state (required).
    pub fn from(mut self, state: StateId) -> Self {
        self.from = Some(state);
        self
    }

    /// Set a fixed destination.
    pub fn to(mut self, state: StateId) -> Self {
        self.to = Some(state);
        self
    }

    /// Compute the destination when the transition is considered.
    pub fn target<F>(mut self, target: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> Option<StateId> + Send + Sync + 'static,
    {
        self.target = Some(Target::new(target));
        self
    }

    /// Add a prebuilt condition.
    pub fn guard(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Add a condition using a closure.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Condition::new(predicate));
        self
    }

    /// Run `action` between the exit and enter phases.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Trigger<'_>) + Send + Sync + 'static,
    {
        self.action = Some(Action::new(action));
        self
    }

    /// Set an action that may fail, typically because it broadcasts.
    pub fn try_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Trigger<'_>) -> CallbackResult<()> + Send + Sync + 'static,
    {
        self.action = Some(Action::try_new(action));
        self
    }

    /// Build the transition.
    pub fn build(self) -> Result<TransitionDef, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        if self.to.is_some() && self.target.is_some() {
            return Err(BuildError::ConflictingDestination);
        }

        Ok(TransitionDef {
            from,
            to: self.to,
            condition: self.condition,
            target: self.target,
            action: self.action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::new().to(StateId(2)).build();

        assert!(matches!(result, Err(BuildError::MissingFromState)));
    }

    #[test]
    fn fixed_and_computed_destinations_conflict() {
        let result = TransitionBuilder::new()
            .from(StateId(1))
            .to(StateId(2))
            .target(|_| Some(StateId(3)))
            .build();

        assert!(matches!(result, Err(BuildError::ConflictingDestination)));
    }

    #[test]
    fn transition_without_destination_is_internal() {
        let transition = TransitionBuilder::new()
            .from(StateId(1))
            .action(|_| {})
            .build()
            .unwrap();

        assert!(transition.is_internal());
        assert!(transition.action.is_some());
    }

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionBuilder::new()
            .from(StateId(1))
            .to(StateId(2))
            .when(|trigger| !trigger.is_prime())
            .build()
            .unwrap();

        assert_eq!(transition.from, StateId(1));
        assert_eq!(transition.to, Some(StateId(2)));
        assert!(transition.condition.is_some());
        assert!(!transition.is_internal());
    }
}
