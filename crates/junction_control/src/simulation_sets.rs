//! Deterministic per-tick ordering via `SystemSet` phases.
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick counter, clearing last tick's decisions, applying
//!   user commands, pruning signs on removed segments.
//! * **Simulation** – Node dispatch (light programs), then pedestrian
//!   queries, then vehicle releases and vehicle arbitration, in that order.
//! * **PostSim** – Host-side consumers of the decision resources.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain by `JunctionControlPlugin`. Plugins use
/// `.in_set(SimulationSet::X)` and add `.after()` constraints within a phase.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    PreSim,
    Simulation,
    PostSim,
}
