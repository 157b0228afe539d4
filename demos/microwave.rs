//! Microwave Oven
//!
//! A set of concurrent regions: the oven mode and the interior light.
//! Opening the door disables the oven and turns the light on in the same
//! microstep; entering `cook` turns the light on through an enter event.
//!
//! Key concepts:
//! - Sets keep all of their regions active
//! - One broadcast may fire a transition in every region
//! - Enter events chain into the next microstep
//! - Preconditions reject bad parameters before any transition is scanned
//!
//! Run with: cargo run --example microwave
//! Trace with: CHSM_DEBUG=all cargo run --example microwave

use chsm::builder::{MachineBuilder, TransitionBuilder};
use chsm::core::{History, Precondition, StateAction};
use chsm::debug::StderrSink;
use chsm::{DebugFlags, ParamBlock};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Microwave Example ===\n");

    let timer = Arc::new(AtomicU32::new(0));

    let mut builder = MachineBuilder::new("microwave");
    let components = builder.set("components", builder.root())?;

    let mode = builder.cluster("mode", components, History::None)?;
    let operational = builder.cluster("operational", mode, History::None)?;
    let idle = builder.state("idle", operational)?;
    let cook = builder.state("cook", operational)?;
    let disabled = builder.state("disabled", mode)?;

    let light = builder.cluster("light", components, History::None)?;
    let off = builder.state("off", light)?;
    let on = builder.state("on", light)?;

    let digit = builder.event("digit");
    let start = builder.event("start");
    let stop = builder.event("stop");
    let open = builder.event("open");
    let close = builder.event("close");
    let cooking = builder.enter_event(cook)?;

    let t = Arc::clone(&timer);
    builder.transition(
        digit,
        TransitionBuilder::new().from(idle).action(move |trigger| {
            if let Some(d) = trigger.param::<u32>() {
                let minutes = (t.load(Ordering::SeqCst) * 10 + d) % 100;
                t.store(minutes, Ordering::SeqCst);
                println!("  timer: {minutes:02} min");
            }
        }),
    )?;
    let t = Arc::clone(&timer);
    builder.transition(
        start,
        TransitionBuilder::new()
            .from(idle)
            .to(cook)
            .when(move |_| t.load(Ordering::SeqCst) > 0),
    )?;
    builder.transition(stop, TransitionBuilder::new().from(cook).to(idle))?;
    builder.transition(stop, TransitionBuilder::new().from(on).to(off))?;
    builder.transition(open, TransitionBuilder::new().from(operational).to(disabled))?;
    builder.transition(open, TransitionBuilder::new().from(off).to(on))?;
    builder.transition(close, TransitionBuilder::new().from(disabled).to(operational))?;
    builder.transition(close, TransitionBuilder::new().from(on).to(off))?;
    builder.transition(cooking, TransitionBuilder::new().from(off).to(on))?;

    let t = Arc::clone(&timer);
    builder.on_exit(
        cook,
        StateAction::new(move |_, _| {
            t.store(0, Ordering::SeqCst);
        }),
    )?;
    builder.precondition(
        digit,
        Precondition::new(|params| params.get::<u32>().is_some_and(|d| *d <= 9)),
    )?;

    let machine = builder.build()?.into_machine();
    if machine.debug().is_empty() {
        machine.set_debug(DebugFlags::ENTER_EXIT);
    }
    machine.set_debug_sink(Arc::new(StderrSink));
    machine.enter()?;

    let show = |label: &str| {
        println!("{label}: {:?}", machine.dump_state().active_states());
    };
    show("entered");

    println!("\nSetting the timer:");
    for d in [1u32, 2, 42] {
        let outcome = machine.broadcast_with(digit, ParamBlock::new(d))?;
        println!("  digit {d} -> {outcome:?}");
    }

    machine.broadcast(start)?;
    show("started");

    machine.broadcast(open)?;
    show("door open");

    machine.broadcast(close)?;
    show("door closed");

    let outcome = machine.broadcast(stop)?;
    println!("stop while idle -> {outcome:?}");
    println!("timer after the door opened: {}", timer.load(Ordering::SeqCst));

    println!("\n=== Example Complete ===");
    Ok(())
}
