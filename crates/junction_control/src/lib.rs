use bevy::prelude::*;

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod network;
pub mod params;
pub mod pedestrian_gate;
pub mod persistence;
pub mod priority;
pub mod results;
pub mod simulation_sets;
pub mod stock_lights;
pub mod traffic_lights;

pub use persistence::{decode_snapshot, Saveable, SaveableAppExt, SaveableRegistry};
pub use simulation_sets::SimulationSet;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Simulation tick, incremented once per `FixedUpdate` before any junction work.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct TickCounter(pub u64);

pub fn advance_tick(mut tick: ResMut<TickCounter>) {
    tick.0 = tick.0.wrapping_add(1);
}

/// Custom intersection control: manual and timed traffic lights, priority
/// signs and pedestrian gating.
///
/// The host mirrors its network into [`network::RoadNetworkView`] and its
/// stock light cycle into [`stock_lights::StockLights`], sends per-tick
/// observations as events and reads the decision resources back.
pub struct JunctionControlPlugin;

impl Plugin for JunctionControlPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>()
            .init_resource::<network::RoadNetworkView>()
            .init_resource::<stock_lights::StockLights>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::PreSim,
                    SimulationSet::Simulation,
                    SimulationSet::PostSim,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, advance_tick.in_set(SimulationSet::PreSim));

        app.add_plugins((
            params::JunctionParamsPlugin,
            traffic_lights::TrafficLightsPlugin,
            priority::PriorityPlugin,
            pedestrian_gate::PedestrianGatePlugin,
            dispatch::DispatchPlugin,
            commands::CommandsPlugin,
        ));
    }
}
