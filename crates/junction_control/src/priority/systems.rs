use bevy::prelude::*;

use crate::network::{RoadNetworkView, VehicleId};
use crate::params::JunctionParams;
use crate::TickCounter;

use super::arbitration::has_clearance;
use super::registry::PrioritySegments;
use super::types::{
    ApproachPosition, PriorityClass, VehicleApproachEvent, VehicleDecision, VehicleDecisions,
    VehicleJunctionState, VehicleReleasedEvent,
};
use super::vehicle::{next_state, PriorityVehicleState, PriorityVehicles, TransitionInput};

/// Withdraw a vehicle from its priority segment and recycle its slot.
pub fn release_priority_vehicle(
    vehicle: VehicleId,
    segments: &mut PrioritySegments,
    vehicles: &mut PriorityVehicles,
    network: &RoadNetworkView,
) {
    segments.withdraw(vehicle, vehicles, network);
    vehicles.reset(vehicle);
}

fn free_pass(vehicle: VehicleId, state: VehicleJunctionState) -> VehicleDecision {
    VehicleDecision {
        vehicle,
        state,
        may_proceed: true,
        speed_reduction: 0.0,
    }
}

/// First-pass result for one approach event.
enum Observation {
    Decided(VehicleDecision),
    Arbitrate(PriorityClass),
}

/// Result of arbitrating one vehicle against the tick's admitted snapshot.
struct Verdict {
    class: PriorityClass,
    next: VehicleJunctionState,
    occupancy: u32,
}

/// Track and admit the vehicle, refreshing its path. No arbitration yet.
fn observe(
    approach: &VehicleApproachEvent,
    tick: u64,
    segments: &mut PrioritySegments,
    vehicles: &mut PriorityVehicles,
    network: &RoadNetworkView,
) -> Observation {
    let vehicle = approach.vehicle;
    let key = (approach.node, approach.from_segment);

    // Unclassified approach: nothing to arbitrate. Forget any stale state.
    let Some(class) = segments.get(key.0, key.1).map(|s| s.class) else {
        if vehicles.is_tracked(vehicle) {
            release_priority_vehicle(vehicle, segments, vehicles, network);
        }
        return Observation::Decided(free_pass(vehicle, VehicleJunctionState::None));
    };

    // Slot reused by the host for a vehicle at a different junction.
    if vehicles
        .get(vehicle)
        .is_some_and(|s| s.is_tracked() && !s.matches(key.0, key.1))
    {
        debug!("Vehicle {:?} changed junction; resetting its slot", vehicle);
        release_priority_vehicle(vehicle, segments, vehicles, network);
    }

    if !vehicles.is_tracked(vehicle) {
        if approach.position == ApproachPosition::Beyond {
            return Observation::Decided(free_pass(vehicle, VehicleJunctionState::None));
        }
        let Some(slot) = vehicles.slot_mut(vehicle) else {
            warn!("Vehicle {:?} is outside the tracked slot range", vehicle);
            return Observation::Decided(free_pass(vehicle, VehicleJunctionState::None));
        };
        *slot = PriorityVehicleState::begin(approach, tick);
    }
    segments.admit(key.0, key.1, vehicle, vehicles, network);
    if segments.segment_of(vehicle) != Some(key) {
        debug!(
            "Vehicle {:?} is not on a vehicle lane of segment {:?}; not controlled",
            vehicle, key.1
        );
        release_priority_vehicle(vehicle, segments, vehicles, network);
        return Observation::Decided(free_pass(vehicle, VehicleJunctionState::None));
    }

    if let Some(slot) = vehicles.get_mut(vehicle) {
        slot.last_speed = approach.speed;
        slot.to_segment = approach.to_segment.or(slot.to_segment);
        slot.to_lane = approach.to_lane.or(slot.to_lane);
    }
    Observation::Arbitrate(class)
}

/// Read-only: decide the next state against the current admitted set.
fn arbitrate(
    approach: &VehicleApproachEvent,
    class: PriorityClass,
    segments: &PrioritySegments,
    vehicles: &PriorityVehicles,
    network: &RoadNetworkView,
) -> Verdict {
    let vehicle = approach.vehicle;
    let current = vehicles.state(vehicle);
    let committed =
        current == VehicleJunctionState::Transit && approach.position != ApproachPosition::Approaching;
    let clear = committed || has_clearance(vehicle, class, segments, vehicles, network);
    let next = next_state(
        current,
        TransitionInput {
            class,
            clear,
            position: approach.position,
        },
    );
    let occupancy = segments
        .get(approach.node, approach.from_segment)
        .map(|s| s.lane_occupancy(approach.from_lane))
        .unwrap_or(0);
    Verdict {
        class,
        next,
        occupancy,
    }
}

fn apply(
    vehicle: VehicleId,
    verdict: Verdict,
    segments: &mut PrioritySegments,
    vehicles: &mut PriorityVehicles,
    network: &RoadNetworkView,
    params: &JunctionParams,
) -> VehicleDecision {
    let next = verdict.next;
    if next == VehicleJunctionState::Leave {
        release_priority_vehicle(vehicle, segments, vehicles, network);
        return free_pass(vehicle, VehicleJunctionState::Leave);
    }
    let Some(slot) = vehicles.get_mut(vehicle).filter(|s| s.is_tracked()) else {
        return free_pass(vehicle, VehicleJunctionState::None);
    };
    slot.state = next;
    if next == VehicleJunctionState::Stop {
        slot.wait_ticks += 1;
        slot.stopped = true;
        slot.speed_reduction = params.speed_reduction(verdict.class, verdict.occupancy);
    } else {
        slot.stopped = false;
        slot.speed_reduction = 0.0;
    }

    VehicleDecision {
        vehicle,
        state: next,
        may_proceed: next != VehicleJunctionState::Stop,
        speed_reduction: slot.speed_reduction,
    }
}

/// Run one tick of the junction state machine for every vehicle observed
/// this tick. All vehicles are admitted before any is arbitrated, and every
/// verdict is taken against the same state, so the outcome does not depend
/// on the order of `approaches`. Decisions come back in input order.
pub fn update_priority_tick(
    approaches: &[VehicleApproachEvent],
    tick: u64,
    segments: &mut PrioritySegments,
    vehicles: &mut PriorityVehicles,
    network: &RoadNetworkView,
    params: &JunctionParams,
) -> Vec<VehicleDecision> {
    let observed: Vec<Observation> = approaches
        .iter()
        .map(|approach| observe(approach, tick, segments, vehicles, network))
        .collect();

    let verdicts: Vec<Result<Verdict, VehicleDecision>> = approaches
        .iter()
        .zip(observed)
        .map(|(approach, observation)| match observation {
            Observation::Decided(decision) => Err(decision),
            Observation::Arbitrate(class) => {
                Ok(arbitrate(approach, class, segments, vehicles, network))
            }
        })
        .collect();

    approaches
        .iter()
        .zip(verdicts)
        .map(|(approach, verdict)| match verdict {
            Err(decision) => decision,
            Ok(verdict) => apply(
                approach.vehicle,
                verdict,
                segments,
                vehicles,
                network,
                params,
            ),
        })
        .collect()
}

/// Single-vehicle form of [`update_priority_tick`].
pub fn update_priority_vehicle(
    approach: &VehicleApproachEvent,
    tick: u64,
    segments: &mut PrioritySegments,
    vehicles: &mut PriorityVehicles,
    network: &RoadNetworkView,
    params: &JunctionParams,
) -> VehicleDecision {
    update_priority_tick(
        std::slice::from_ref(approach),
        tick,
        segments,
        vehicles,
        network,
        params,
    )
    .pop()
    .unwrap_or_else(|| free_pass(approach.vehicle, VehicleJunctionState::None))
}

pub fn clear_vehicle_decisions(mut decisions: ResMut<VehicleDecisions>) {
    decisions.clear();
}

/// Host releases are applied before this tick's observations.
pub fn release_vehicles(
    mut events: EventReader<VehicleReleasedEvent>,
    mut segments: ResMut<PrioritySegments>,
    mut vehicles: ResMut<PriorityVehicles>,
    network: Res<RoadNetworkView>,
) {
    for event in events.read() {
        release_priority_vehicle(event.vehicle, &mut segments, &mut vehicles, &network);
    }
}

pub fn update_priority_vehicles(
    mut events: EventReader<VehicleApproachEvent>,
    tick: Res<TickCounter>,
    mut segments: ResMut<PrioritySegments>,
    mut vehicles: ResMut<PriorityVehicles>,
    network: Res<RoadNetworkView>,
    params: Res<JunctionParams>,
    mut decisions: ResMut<VehicleDecisions>,
) {
    let approaches: Vec<VehicleApproachEvent> = events.read().copied().collect();
    if approaches.is_empty() {
        return;
    }
    let batch = update_priority_tick(
        &approaches,
        tick.0,
        &mut segments,
        &mut vehicles,
        &network,
        &params,
    );
    decisions.decisions.extend(batch);
}

/// Drop signs on segment ends the host removed and recycle their vehicles.
pub fn prune_priority_segments(
    network: Res<RoadNetworkView>,
    mut segments: ResMut<PrioritySegments>,
    mut vehicles: ResMut<PriorityVehicles>,
    mut last_gen: Local<Option<u32>>,
) {
    if *last_gen == Some(network.generation) {
        return;
    }
    *last_gen = Some(network.generation);

    let evicted = segments.prune_detached(&network);
    for vehicle in &evicted {
        vehicles.reset(*vehicle);
    }
    if !evicted.is_empty() {
        info!("Released {} vehicles from removed priority segments", evicted.len());
    }
    let dropped = segments.recompute_all(&vehicles, &network);
    for vehicle in &dropped {
        vehicles.reset(*vehicle);
    }
    if !dropped.is_empty() {
        info!("Released {} vehicles whose lane left their segment", dropped.len());
    }
}
