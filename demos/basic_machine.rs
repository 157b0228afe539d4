//! Basic Machine
//!
//! This example builds a connection machine with a nested cluster and
//! drives it with a few broadcasts.
//!
//! Key concepts:
//! - Clusters keep exactly one child active
//! - Transitions out of a cluster exit its active child first
//! - Events with no enabled transition change nothing
//! - Trace lines are forwarded to `tracing` by default
//!
//! Run with: cargo run --example basic_machine

use chsm::builder::{MachineBuilder, TransitionBuilder};
use chsm::core::History;
use chsm::DebugFlags;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("chsm=debug")
        .with_target(false)
        .init();

    println!("=== Basic Machine Example ===\n");

    let mut builder = MachineBuilder::new("connection");
    let root = builder.root();
    let disconnected = builder.state("disconnected", root)?;
    let online = builder.cluster("online", root, History::None)?;
    let connecting = builder.state("connecting", online)?;
    let connected = builder.state("connected", online)?;

    let dial = builder.event("dial");
    let ack = builder.event("ack");
    let hangup = builder.event("hangup");
    builder.transition(dial, TransitionBuilder::new().from(disconnected).to(online))?;
    builder.transition(ack, TransitionBuilder::new().from(connecting).to(connected))?;
    builder.transition(hangup, TransitionBuilder::new().from(online).to(disconnected))?;

    let machine = builder.build()?.into_machine();
    machine.set_debug(DebugFlags::ENTER_EXIT | DebugFlags::EVENTS);

    machine.enter()?;
    println!("{}", machine.dump_state());

    for event in [dial, ack, ack, hangup] {
        let outcome = machine.broadcast(event)?;
        println!("{:<8} -> {:?}", machine.event_name(event), outcome);
    }
    println!("\n{}", machine.dump_state());

    println!("=== Example Complete ===");
    Ok(())
}
