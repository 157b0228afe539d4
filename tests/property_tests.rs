//! Property-based tests for running machines.
//!
//! These tests use proptest to drive a fixed machine with random broadcast
//! sequences and check the structural invariants after every broadcast.

use chsm::builder::{MachineBuilder, TransitionBuilder};
use chsm::core::History;
use chsm::runtime::{BroadcastOutcome, Machine};
use chsm::{EventId, StateId};
use proptest::prelude::*;

// root
// ├── idle
// ├── work (shallow)
// │   ├── prep
// │   └── run (set)
// │       ├── left  { l1, l2 }
// │       └── right (deep) { r1, inner { i1, i2 } }
// └── halt
struct Fixture {
    machine: Machine,
    events: Vec<EventId>,
}

fn fixture() -> Fixture {
    let mut b = MachineBuilder::new("root");
    let root = b.root();
    let idle = b.state("idle", root).unwrap();
    let work = b.cluster("work", root, History::Shallow).unwrap();
    let prep = b.state("prep", work).unwrap();
    let run = b.set("run", work).unwrap();
    let left = b.cluster("left", run, History::None).unwrap();
    let l1 = b.state("l1", left).unwrap();
    let l2 = b.state("l2", left).unwrap();
    let right = b.cluster("right", run, History::Deep).unwrap();
    let r1 = b.state("r1", right).unwrap();
    let inner = b.cluster("inner", right, History::None).unwrap();
    let i1 = b.state("i1", inner).unwrap();
    let i2 = b.state("i2", inner).unwrap();
    let halt = b.state("halt", root).unwrap();

    let table: &[(&str, &[(StateId, StateId)])] = &[
        ("start", &[(idle, work), (halt, idle)]),
        ("go", &[(prep, run), (l1, l2), (r1, inner)]),
        ("step", &[(l2, l1), (i1, i2), (i2, r1)]),
        ("dive", &[(idle, i2), (prep, l2)]),
        ("pause", &[(run, prep)]),
        ("leave", &[(work, idle), (l2, halt)]),
        ("stop", &[(idle, halt), (work, halt)]),
    ];

    let mut events = Vec::new();
    for (name, transitions) in table {
        let event = b.event(*name);
        for &(from, to) in *transitions {
            b.transition(event, TransitionBuilder::new().from(from).to(to))
                .unwrap();
        }
        events.push(event);
    }
    let noop = b.derived_event("nudge", events[2]).unwrap();
    b.transition(noop, TransitionBuilder::new().from(l1)).unwrap();
    events.push(noop);

    let machine = b.build().unwrap().into_machine();
    machine.enter().unwrap();
    Fixture { machine, events }
}

fn check_invariants(machine: &Machine) -> Result<(), TestCaseError> {
    for state in machine.states() {
        let kind = &machine.definition().state(state).kind;
        if !kind.is_parent() || machine.is_empty(state) {
            continue;
        }
        let active = machine.active(state);
        let children = machine.children(state);
        let active_children = children.iter().filter(|&&c| machine.active(c)).count();

        if kind.is_cluster() {
            prop_assert_eq!(active_children, usize::from(active), "cluster {}", state);
            if active {
                let child = machine.active_child(state);
                prop_assert!(child.is_some_and(|c| machine.active(c)));
            }
        } else {
            let expected = if active { children.len() } else { 0 };
            prop_assert_eq!(active_children, expected, "set {}", state);
        }
    }

    for state in machine.states() {
        if machine.active(state) {
            if let Some(parent) = machine.parent(state) {
                prop_assert!(machine.active(parent), "{} active under inactive parent", state);
            }
        }
    }
    Ok(())
}

prop_compose! {
    fn broadcasts()(picks in prop::collection::vec(0..8usize, 1..40)) -> Vec<usize> {
        picks
    }
}

proptest! {
    #[test]
    fn hierarchy_invariants_hold_after_every_broadcast(picks in broadcasts()) {
        let f = fixture();
        check_invariants(&f.machine)?;

        for pick in picks {
            let outcome = f.machine.broadcast(f.events[pick]).unwrap();
            prop_assert!(outcome != BroadcastOutcome::Queued);
            prop_assert!(outcome != BroadcastOutcome::Suppressed);
            check_invariants(&f.machine)?;
        }
    }

    #[test]
    fn no_event_stays_in_progress(picks in broadcasts()) {
        let f = fixture();

        for pick in picks {
            f.machine.broadcast(f.events[pick]).unwrap();
            for &event in &f.events {
                prop_assert!(!f.machine.is_event_in_progress(event));
            }
        }
    }

    #[test]
    fn duplicates_follow_the_same_path(picks in broadcasts()) {
        let f = fixture();
        let twin = f.machine.duplicate();
        twin.enter().unwrap();

        for pick in picks {
            let a = f.machine.broadcast(f.events[pick]).unwrap();
            let b = twin.broadcast(f.events[pick]).unwrap();
            prop_assert_eq!(a, b);
        }
        let ours = f.machine.dump_state();
        let theirs = twin.dump_state();
        prop_assert_eq!(ours.active_states(), theirs.active_states());
    }

    #[test]
    fn exit_then_enter_restores_a_consistent_machine(picks in broadcasts()) {
        let f = fixture();
        for pick in picks {
            f.machine.broadcast(f.events[pick]).unwrap();
        }

        f.machine.exit().unwrap();
        prop_assert!(f.machine.states().all(|s| !f.machine.active(s)));

        f.machine.enter().unwrap();
        check_invariants(&f.machine)?;
    }
}
