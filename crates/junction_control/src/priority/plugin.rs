use bevy::prelude::*;

use crate::{SaveableAppExt, SimulationSet};

use super::registry::PrioritySegments;
use super::systems::{
    clear_vehicle_decisions, prune_priority_segments, release_vehicles, update_priority_vehicles,
};
use super::types::{VehicleApproachEvent, VehicleDecisions, VehicleReleasedEvent};
use super::vehicle::PriorityVehicles;

pub struct PriorityPlugin;

impl Plugin for PriorityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PrioritySegments>()
            .init_resource::<PriorityVehicles>()
            .init_resource::<VehicleDecisions>()
            .add_event::<VehicleApproachEvent>()
            .add_event::<VehicleReleasedEvent>()
            .add_systems(
                FixedUpdate,
                (clear_vehicle_decisions, prune_priority_segments).in_set(SimulationSet::PreSim),
            )
            .add_systems(
                FixedUpdate,
                (release_vehicles, update_priority_vehicles)
                    .chain()
                    .after(crate::pedestrian_gate::evaluate_pedestrian_queries)
                    .in_set(SimulationSet::Simulation),
            );

        app.register_saveable::<PrioritySegments>();
    }
}
