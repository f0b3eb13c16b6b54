//! Pedestrian crossing gate.
//!
//! Under stock control pedestrians follow the host light with some
//! hysteresis: a freshly turning green light is held for
//! [`PEDESTRIAN_GREEN_DWELL_TICKS`] so vehicles can clear, and a red light
//! latches a crossing request once it has been red for
//! [`PEDESTRIAN_RED_LATCH_TICKS`] of the window. Each node's window is
//! offset by its id so neighbouring nodes do not switch in unison.
//! Under manual or timed control only the explicit pedestrian colour counts.

use bevy::prelude::*;

use crate::config::{
    LIGHT_WINDOW_TICKS, PEDESTRIAN_GREEN_DWELL_TICKS, PEDESTRIAN_PHASE_DIVISOR,
    PEDESTRIAN_RED_LATCH_TICKS,
};
use crate::network::{NodeId, SegmentId};
use crate::stock_lights::{LightState, StockLights};
use crate::traffic_lights::TrafficLightControl;
use crate::{SimulationSet, TickCounter};

/// Why a crossing was permitted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossingReason {
    Clear,
    /// Stock light just turned green; vehicles are still clearing.
    GreenDwell,
    RedLight,
    /// Red light, and this query latched the pedestrian request.
    RedLatched,
    /// Manual or timed override shows red.
    ManualRed,
    /// No stock record and no override.
    NoLightData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingDecision {
    pub permitted: bool,
    pub reason: CrossingReason,
}

impl CrossingDecision {
    fn permit(reason: CrossingReason) -> Self {
        Self {
            permitted: true,
            reason,
        }
    }

    fn deny(reason: CrossingReason) -> Self {
        Self {
            permitted: false,
            reason,
        }
    }
}

/// Per-node tick offset of the pedestrian window.
#[inline]
pub fn pedestrian_offset(node: NodeId) -> u64 {
    ((node.0 as u64) << 8) / PEDESTRIAN_PHASE_DIVISOR
}

/// Position of `tick` inside the node's 256-tick pedestrian window.
#[inline]
pub fn pedestrian_phase(node: NodeId, tick: u64) -> u64 {
    tick.wrapping_sub(pedestrian_offset(node)) & (LIGHT_WINDOW_TICKS - 1)
}

/// Decide whether a pedestrian may cross `segment` at `node` this tick.
/// May latch the stock pedestrian request as a side effect.
pub fn evaluate_crossing(
    node: NodeId,
    segment: SegmentId,
    tick: u64,
    control: &TrafficLightControl,
    stock: &mut StockLights,
) -> CrossingDecision {
    if let Some(lights) = control.get_override_color(node, segment) {
        return if lights.pedestrian == LightState::Red {
            CrossingDecision::deny(CrossingReason::ManualRed)
        } else {
            CrossingDecision::permit(CrossingReason::Clear)
        };
    }

    let shifted = tick.wrapping_sub(pedestrian_offset(node));
    let phase = pedestrian_phase(node, tick);
    let Some(window) = stock.get(node, segment, shifted) else {
        return CrossingDecision::permit(CrossingReason::NoLightData);
    };

    match window.lights.pedestrian {
        LightState::RedToGreen if phase < PEDESTRIAN_GREEN_DWELL_TICKS => {
            CrossingDecision::deny(CrossingReason::GreenDwell)
        }
        LightState::Red | LightState::GreenToRed => {
            if phase >= PEDESTRIAN_RED_LATCH_TICKS
                && !window.pedestrians_latched
                && stock.latch_pedestrians(node, segment, shifted)
            {
                debug!(
                    "Pedestrian request latched at node {:?} segment {:?}",
                    node, segment
                );
                return CrossingDecision::deny(CrossingReason::RedLatched);
            }
            CrossingDecision::deny(CrossingReason::RedLight)
        }
        _ => CrossingDecision::permit(CrossingReason::Clear),
    }
}

/// A pedestrian asks to cross one arm of a node.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedestrianCrossingQuery {
    pub pedestrian: u32,
    pub node: NodeId,
    pub segment: SegmentId,
}

/// Answers to this tick's crossing queries, in query order.
#[derive(Resource, Debug, Default)]
pub struct PedestrianDecisions {
    pub decisions: Vec<(PedestrianCrossingQuery, CrossingDecision)>,
}

impl PedestrianDecisions {
    pub fn get(&self, pedestrian: u32) -> Option<&CrossingDecision> {
        self.decisions
            .iter()
            .rev()
            .find(|(q, _)| q.pedestrian == pedestrian)
            .map(|(_, d)| d)
    }
}

pub fn clear_pedestrian_decisions(mut decisions: ResMut<PedestrianDecisions>) {
    decisions.decisions.clear();
}

pub fn evaluate_pedestrian_queries(
    mut queries: EventReader<PedestrianCrossingQuery>,
    tick: Res<TickCounter>,
    control: Res<TrafficLightControl>,
    mut stock: ResMut<StockLights>,
    mut decisions: ResMut<PedestrianDecisions>,
) {
    for query in queries.read() {
        let decision = evaluate_crossing(query.node, query.segment, tick.0, &control, &mut stock);
        decisions.decisions.push((*query, decision));
    }
}

pub struct PedestrianGatePlugin;

impl Plugin for PedestrianGatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PedestrianDecisions>()
            .add_event::<PedestrianCrossingQuery>()
            .add_systems(
                FixedUpdate,
                clear_pedestrian_decisions.in_set(SimulationSet::PreSim),
            )
            .add_systems(
                FixedUpdate,
                evaluate_pedestrian_queries
                    .after(crate::dispatch::dispatch_node_simulation)
                    .in_set(SimulationSet::Simulation),
            );
    }
}
