//! Whole-table validation.
//!
//! Every check runs, and every fault is reported, so a front end sees all
//! of its mistakes at once.

use super::error::TableFault;
use crate::core::{is_legal, EventDef, EventId, StateDef, StateId, TransitionDef, TransitionId};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result of a single table check.
pub type TableCheck = Validation<(), NonEmptyVec<TableFault>>;

fn check(ok: bool, fault: impl FnOnce() -> TableFault) -> TableCheck {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(fault())
    }
}

/// Validate installation tables, accumulating ALL faults.
pub fn validate_tables(
    root: StateId,
    states: &[StateDef],
    events: &[EventDef],
    transitions: &[TransitionDef],
) -> TableCheck {
    let mut checks: Vec<TableCheck> = Vec::new();

    check_root(root, states, &mut checks);
    check_references(states, events, transitions, &mut checks);
    check_hierarchy(root, states, &mut checks);
    check_base_chains(events, &mut checks);
    check_transitions(states, events, transitions, &mut checks);
    check_names(states, events, &mut checks);

    Validation::all_vec(checks).map(|_| ())
}

fn check_root(root: StateId, states: &[StateDef], checks: &mut Vec<TableCheck>) {
    let Some(def) = states.get(root.index()) else {
        checks.push(Validation::fail(TableFault::RootOutOfRange { root }));
        return;
    };
    checks.push(check(def.kind.is_cluster(), || TableFault::RootNotCluster {
        root,
    }));
    checks.push(check(def.parent.is_none(), || TableFault::RootHasParent {
        root,
    }));
}

fn check_references(
    states: &[StateDef],
    events: &[EventDef],
    transitions: &[TransitionDef],
    checks: &mut Vec<TableCheck>,
) {
    let state_ok = |owner: &str, state: StateId| {
        check(state.index() < states.len(), || TableFault::StateOutOfRange {
            owner: owner.to_string(),
            state,
        })
    };
    let event_ok = |owner: &str, event: EventId| {
        check(event.index() < events.len(), || TableFault::EventOutOfRange {
            owner: owner.to_string(),
            event,
        })
    };

    for def in states {
        let owner = format!("state '{}'", def.name);
        checks.extend(def.parent.map(|p| state_ok(&owner, p)));
        checks.extend(def.kind.children().iter().map(|&c| state_ok(&owner, c)));
        checks.extend(def.enter_event.map(|e| event_ok(&owner, e)));
        checks.extend(def.exit_event.map(|e| event_ok(&owner, e)));
    }

    for def in events {
        let owner = format!("event '{}'", def.name);
        checks.extend(def.base.map(|b| event_ok(&owner, b)));
        for &t in &def.transitions {
            checks.push(check(t.index() < transitions.len(), || {
                TableFault::TransitionOutOfRange {
                    owner: owner.clone(),
                    transition: t,
                }
            }));
        }
    }

    for (i, def) in transitions.iter().enumerate() {
        let owner = TransitionId(i).to_string();
        checks.push(state_ok(&owner, def.from));
        checks.extend(def.to.map(|to| state_ok(&owner, to)));
    }
}

fn check_hierarchy(root: StateId, states: &[StateDef], checks: &mut Vec<TableCheck>) {
    let mut listed = HashSet::new();
    for (i, def) in states.iter().enumerate() {
        let parent = StateId(i);
        for &child in def.kind.children() {
            let Some(child_def) = states.get(child.index()) else {
                continue;
            };
            checks.push(check(child_def.parent == Some(parent), || {
                TableFault::ParentMismatch {
                    child,
                    listed_by: parent,
                    declared: child_def.parent,
                }
            }));
            checks.push(check(listed.insert(child), || TableFault::DuplicateChild {
                child,
            }));
        }
    }

    for (i, def) in states.iter().enumerate() {
        let state = StateId(i);
        if state == root {
            continue;
        }
        match def.parent {
            None => checks.push(Validation::fail(TableFault::Orphan { state })),
            Some(parent) => {
                if let Some(parent_def) = states.get(parent.index()) {
                    checks.push(check(parent_def.kind.children().contains(&state), || {
                        TableFault::Detached { state, parent }
                    }));
                }
            }
        }
        checks.push(check(!parent_loops(states, state), || {
            TableFault::ParentCycle { state }
        }));
    }
}

/// True if following parents from `state` never ends.
fn parent_loops(states: &[StateDef], state: StateId) -> bool {
    std::iter::successors(Some(state), |s| states.get(s.index()).and_then(|d| d.parent))
        .nth(states.len())
        .is_some()
}

fn check_base_chains(events: &[EventDef], checks: &mut Vec<TableCheck>) {
    for i in 0..events.len() {
        let event = EventId(i);
        let loops = std::iter::successors(Some(event), |e| {
            events.get(e.index()).and_then(|d| d.base)
        })
        .nth(events.len())
        .is_some();
        checks.push(check(!loops, || TableFault::BaseEventCycle { event }));
    }
}

fn check_transitions(
    states: &[StateDef],
    events: &[EventDef],
    transitions: &[TransitionDef],
    checks: &mut Vec<TableCheck>,
) {
    let owned: HashSet<TransitionId> = events
        .iter()
        .flat_map(|e| e.transitions.iter().copied())
        .collect();

    for (i, def) in transitions.iter().enumerate() {
        let transition = TransitionId(i);
        checks.push(check(owned.contains(&transition), || {
            TableFault::UnownedTransition { transition }
        }));

        let Some(to) = def.to else {
            continue;
        };
        if def.from.index() < states.len() && to.index() < states.len() {
            checks.push(check(is_legal(states, def.from, to), || {
                TableFault::IllegalTransition {
                    transition,
                    from: def.from,
                    to,
                }
            }));
        }
    }
}

fn check_names(states: &[StateDef], events: &[EventDef], checks: &mut Vec<TableCheck>) {
    let mut seen = HashSet::new();
    for def in states {
        checks.push(check(seen.insert(def.name.as_str()), || {
            TableFault::DuplicateStateName {
                name: def.name.clone(),
            }
        }));
    }

    let mut seen = HashSet::new();
    for def in events {
        checks.push(check(seen.insert(def.name.as_str()), || {
            TableFault::DuplicateEventName {
                name: def.name.clone(),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::History;

    // 0 root{1 a, 2 s}, 2 s{3 left, 4 right}, 3 left{5 x}, 4 right{6 y}
    fn states() -> Vec<StateDef> {
        vec![
            StateDef::cluster("root", [StateId(1), StateId(2)], History::None),
            StateDef::leaf("a").child_of(StateId(0)),
            StateDef::set("s", [StateId(3), StateId(4)]).child_of(StateId(0)),
            StateDef::cluster("s.left", [StateId(5)], History::None).child_of(StateId(2)),
            StateDef::cluster("s.right", [StateId(6)], History::None).child_of(StateId(2)),
            StateDef::leaf("s.left.x").child_of(StateId(3)),
            StateDef::leaf("s.right.y").child_of(StateId(4)),
        ]
    }

    fn faults(result: TableCheck) -> Vec<TableFault> {
        match result {
            Validation::Failure(errors) => errors.iter().cloned().collect(),
            Validation::Success(_) => Vec::new(),
        }
    }

    #[test]
    fn well_formed_tables_pass() {
        let transitions = vec![
            TransitionDef::new(StateId(1), StateId(5)),
            TransitionDef::new(StateId(5), StateId(1)),
        ];
        let events = vec![EventDef::new("go").with_transitions([TransitionId(0), TransitionId(1)])];

        let result = validate_tables(StateId(0), &states(), &events, &transitions);
        assert!(result.is_success());
    }

    #[test]
    fn validation_accumulates_all_faults() {
        let mut table = states();
        table.push(StateDef::leaf("a"));
        let transitions = vec![
            TransitionDef::new(StateId(5), StateId(6)),
            TransitionDef::new(StateId(1), StateId(42)),
        ];
        let events = vec![EventDef::new("go").with_transitions([TransitionId(0)])];

        let found = faults(validate_tables(StateId(0), &table, &events, &transitions));

        assert!(found.contains(&TableFault::Orphan { state: StateId(7) }));
        assert!(found.contains(&TableFault::DuplicateStateName {
            name: "a".to_string()
        }));
        assert!(found.contains(&TableFault::IllegalTransition {
            transition: TransitionId(0),
            from: StateId(5),
            to: StateId(6),
        }));
        assert!(found.contains(&TableFault::UnownedTransition {
            transition: TransitionId(1)
        }));
        assert!(found
            .iter()
            .any(|f| matches!(f, TableFault::StateOutOfRange { state, .. } if *state == StateId(42))));
    }

    #[test]
    fn root_must_be_a_parentless_cluster() {
        let mut table = states();
        table[0] = StateDef::leaf("root").child_of(StateId(2));

        let found = faults(validate_tables(StateId(0), &table, &[], &[]));

        assert!(found.contains(&TableFault::RootNotCluster { root: StateId(0) }));
        assert!(found.contains(&TableFault::RootHasParent { root: StateId(0) }));
        assert!(found
            .iter()
            .any(|f| matches!(f, TableFault::ParentCycle { .. })));

        let found = faults(validate_tables(StateId(9), &states(), &[], &[]));
        assert!(found.contains(&TableFault::RootOutOfRange { root: StateId(9) }));
    }

    #[test]
    fn base_chain_cycles_are_rejected() {
        let events = vec![
            EventDef::new("a").based_on(EventId(1)),
            EventDef::new("b").based_on(EventId(0)),
        ];

        let found = faults(validate_tables(StateId(0), &states(), &events, &[]));
        assert!(found.contains(&TableFault::BaseEventCycle { event: EventId(0) }));
        assert!(found.contains(&TableFault::BaseEventCycle { event: EventId(1) }));
    }

    #[test]
    fn child_listed_by_wrong_parent() {
        let mut table = states();
        table[5].parent = Some(StateId(4));

        let found = faults(validate_tables(StateId(0), &table, &[], &[]));

        assert!(found.contains(&TableFault::ParentMismatch {
            child: StateId(5),
            listed_by: StateId(3),
            declared: Some(StateId(4)),
        }));
        assert!(found.contains(&TableFault::Detached {
            state: StateId(5),
            parent: StateId(4),
        }));
    }
}
