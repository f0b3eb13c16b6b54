//! Ordering of the per-tick phases: commands, node dispatch, pedestrian
//! queries, releases, vehicle arbitration.

use crate::commands::JunctionCommand;
use crate::dispatch::DispatchStats;
use crate::network::{NodeId, SegmentId, VehicleId};
use crate::pedestrian_gate::{CrossingReason, PedestrianCrossingQuery, PedestrianDecisions};
use crate::priority::ApproachPosition::AtStopLine;
use crate::priority::{PriorityClass, PriorityVehicles, VehicleJunctionState};
use crate::stock_lights::{LightPair, LightState};
use crate::test_harness::TestJunction;

#[test]
fn test_command_applies_before_pedestrian_query_same_tick() {
    let mut junction = TestJunction::new().with_crossroads(1);
    junction.command(JunctionCommand::EnableManual { node: NodeId(1) });

    junction.send_event(JunctionCommand::SetOverrideColor {
        node: NodeId(1),
        segment: SegmentId(11),
        lights: LightPair::new(LightState::Red, LightState::Green),
    });
    junction.send_event(PedestrianCrossingQuery {
        pedestrian: 1,
        node: NodeId(1),
        segment: SegmentId(11),
    });
    junction.tick(1);

    let decision = junction.resource::<PedestrianDecisions>().get(1).copied().unwrap();
    assert!(decision.permitted);
    assert_eq!(decision.reason, CrossingReason::Clear);
}

#[test]
fn test_enabled_node_is_dispatched_in_same_tick() {
    let mut junction = TestJunction::new().with_crossroads(1);
    junction.command(JunctionCommand::EnableManual { node: NodeId(1) });
    assert_eq!(junction.resource::<DispatchStats>().custom_nodes, 1);
    assert_eq!(
        junction.resource::<DispatchStats>().last_tick,
        junction.current_tick()
    );
}

#[test]
fn test_release_runs_before_observation() {
    let mut junction = TestJunction::new()
        .with_crossroads(1)
        .with_sign(1, 11, PriorityClass::Main)
        .with_sign(1, 12, PriorityClass::Yield);
    junction.observe_vehicle(1, 1, 11, Some(13), AtStopLine);

    // The host reuses slot 1 for a new vehicle on the yield arm. The release
    // is processed first, so the new vehicle starts from a fresh slot.
    junction.release_vehicle(1);
    let event = junction.approach(1, 1, 12, Some(14), AtStopLine);
    junction.send_event(event);
    junction.tick(1);

    let decision = junction.vehicle_decision(1).unwrap();
    assert_eq!(decision.state, VehicleJunctionState::Transit);
    let state = *junction
        .resource::<PriorityVehicles>()
        .get(VehicleId(1))
        .unwrap();
    assert_eq!(state.from_segment, SegmentId(12));
    assert_eq!(state.wait_ticks, 0);
}
