//! Per-tick routing of node updates.
//!
//! Nodes under manual or timed control are stepped by
//! [`TrafficLightControl`]; every other node is left to the host's stock
//! light cycle. Nodes are visited in ascending id order so that group repair
//! and program advancement are deterministic.

use bevy::prelude::*;

use crate::network::{NodeId, RoadNetworkView};
use crate::traffic_lights::{StepOutcome, TrafficLightControl};
use crate::{SimulationSet, TickCounter};

/// What happened to one node this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDispatch {
    /// Custom control stepped the node.
    Custom(StepOutcome),
    /// The host should run its stock light logic.
    Stock,
}

/// Route one node's update. Call once per node per tick.
pub fn simulate_node(
    node: NodeId,
    tick: u64,
    control: &mut TrafficLightControl,
    network: &RoadNetworkView,
) -> NodeDispatch {
    if !control.has_custom_simulation(node) {
        return NodeDispatch::Stock;
    }
    NodeDispatch::Custom(control.step(node, network, tick))
}

/// Sent once per timed group that had to be reset to stock lights.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ProgramLostEvent {
    /// Node whose step detected the problem.
    pub node: NodeId,
    pub cleared: Vec<NodeId>,
}

/// Counters from the most recent dispatch pass plus running totals.
#[derive(Resource, Debug, Default, Clone)]
pub struct DispatchStats {
    pub custom_nodes: u32,
    pub stock_nodes: u32,
    /// Timed programs that advanced this tick.
    pub programs_advanced: u32,
    /// Timed groups repaired since startup.
    pub programs_lost_total: u64,
    pub last_tick: u64,
}

pub fn dispatch_node_simulation(
    tick: Res<TickCounter>,
    network: Res<RoadNetworkView>,
    mut control: ResMut<TrafficLightControl>,
    mut stats: ResMut<DispatchStats>,
    mut lost: EventWriter<ProgramLostEvent>,
) {
    let mut nodes: Vec<NodeId> = network.nodes.keys().copied().collect();
    nodes.sort_unstable();

    stats.custom_nodes = 0;
    stats.stock_nodes = 0;
    stats.programs_advanced = 0;
    stats.last_tick = tick.0;

    for node in nodes {
        match simulate_node(node, tick.0, &mut control, &network) {
            NodeDispatch::Stock => stats.stock_nodes += 1,
            NodeDispatch::Custom(outcome) => {
                stats.custom_nodes += 1;
                if outcome.advanced {
                    stats.programs_advanced += 1;
                }
                if !outcome.cleared.is_empty() {
                    stats.programs_lost_total += 1;
                    lost.send(ProgramLostEvent {
                        node,
                        cleared: outcome.cleared,
                    });
                }
            }
        }
    }
}

pub struct DispatchPlugin;

impl Plugin for DispatchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DispatchStats>()
            .add_event::<ProgramLostEvent>()
            .add_systems(
                FixedUpdate,
                dispatch_node_simulation.in_set(SimulationSet::Simulation),
            );
    }
}
