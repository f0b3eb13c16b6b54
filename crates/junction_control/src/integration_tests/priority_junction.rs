//! Priority-sign arbitration through approach events.

use crate::commands::JunctionCommand;
use crate::network::{NodeId, SegmentId, VehicleId};
use crate::priority::ApproachPosition::{Approaching, AtStopLine, Beyond};
use crate::priority::{PriorityClass, PrioritySegments, PriorityVehicles, VehicleJunctionState};
use crate::results::ControlResult;
use crate::test_harness::TestJunction;

/// Node 1 with a main road 11-13 crossed by a yield road 12-14.
fn main_and_yield() -> TestJunction {
    TestJunction::new()
        .with_crossroads(1)
        .with_sign(1, 11, PriorityClass::Main)
        .with_sign(1, 13, PriorityClass::Main)
        .with_sign(1, 12, PriorityClass::Yield)
        .with_sign(1, 14, PriorityClass::Yield)
}

#[test]
fn test_yield_vehicle_waits_for_main_traffic() {
    let mut junction = main_and_yield();
    junction.observe_vehicle(1, 1, 11, Some(13), AtStopLine);
    junction.assert_may_proceed(1, true);

    let main = junction.approach(1, 1, 11, Some(13), AtStopLine);
    let side = junction.approach(2, 1, 12, Some(14), AtStopLine);
    junction.send_event(main);
    junction.send_event(side);
    junction.tick(1);
    junction.assert_may_proceed(1, true);
    junction.assert_may_proceed(2, false);
    let held = junction.vehicle_decision(2).unwrap();
    assert_eq!(held.state, VehicleJunctionState::Stop);
    assert!(held.speed_reduction > 0.0 && held.speed_reduction < 1.0);

    junction.observe_vehicle(1, 1, 11, Some(13), Beyond);
    assert!(!junction
        .resource::<PriorityVehicles>()
        .is_tracked(VehicleId(1)));

    let released = junction.observe_vehicle(2, 1, 12, Some(14), AtStopLine).unwrap();
    assert_eq!(released.state, VehicleJunctionState::Transit);
    assert_eq!(released.speed_reduction, 0.0);
}

#[test]
fn test_right_turn_is_not_held_by_main_traffic() {
    let mut junction = main_and_yield();
    junction.observe_vehicle(1, 1, 11, Some(13), AtStopLine);
    // 14 -> 11 turns into the main vehicle's approach and never crosses it.
    let turn = junction.observe_vehicle(3, 1, 14, Some(11), Approaching).unwrap();
    assert_eq!(turn.state, VehicleJunctionState::Transit);
}

#[test]
fn test_host_release_frees_the_slot() {
    let mut junction = main_and_yield();
    junction.observe_vehicle(1, 1, 11, Some(13), AtStopLine);
    junction.observe_vehicle(2, 1, 12, Some(14), Approaching);
    junction.assert_may_proceed(2, false);

    junction.release_vehicle(1);
    junction.tick(1);
    assert_eq!(
        junction.resource::<PrioritySegments>().segment_of(VehicleId(1)),
        None
    );
    let side = junction.observe_vehicle(2, 1, 12, Some(14), Approaching).unwrap();
    assert!(side.may_proceed);
}

#[test]
fn test_classify_command_and_unclassified_free_pass() {
    let mut junction = TestJunction::new().with_crossroads(1);
    let free = junction.observe_vehicle(5, 1, 11, Some(13), AtStopLine).unwrap();
    assert_eq!(free.state, VehicleJunctionState::None);
    assert!(free.may_proceed);

    assert_eq!(
        junction.command(JunctionCommand::ClassifySegment {
            node: NodeId(1),
            segment: SegmentId(12),
            class: PriorityClass::Stop,
        }),
        ControlResult::Success
    );
    junction.observe_vehicle(6, 1, 12, Some(14), AtStopLine);
    junction.assert_may_proceed(6, true);
    assert_eq!(
        junction.resource::<PrioritySegments>().class_of(NodeId(1), SegmentId(12)),
        PriorityClass::Stop
    );
}

#[test]
fn test_removed_segment_drops_sign_and_members() {
    let mut junction = main_and_yield();
    junction.observe_vehicle(2, 1, 12, Some(14), Approaching);
    assert!(junction
        .resource::<PriorityVehicles>()
        .is_tracked(VehicleId(2)));

    junction.remove_segment(12);
    junction.tick(1);
    let segments = junction.resource::<PrioritySegments>();
    assert_eq!(segments.class_of(NodeId(1), SegmentId(12)), PriorityClass::None);
    assert_eq!(segments.segment_of(VehicleId(2)), None);
    assert!(!junction
        .resource::<PriorityVehicles>()
        .is_tracked(VehicleId(2)));
}

#[test]
fn test_same_tick_yield_tie_goes_to_lower_segment() {
    let mut junction = TestJunction::new()
        .with_crossroads(1)
        .with_sign(1, 12, PriorityClass::Yield)
        .with_sign(1, 13, PriorityClass::Yield);

    // 13 -> 11 crosses 12 -> 14. The higher segment's event is sent first.
    let high = junction.approach(20, 1, 13, Some(11), AtStopLine);
    let low = junction.approach(10, 1, 12, Some(14), AtStopLine);
    junction.send_event(high);
    junction.send_event(low);
    junction.tick(1);

    junction.assert_may_proceed(10, true);
    junction.assert_may_proceed(20, false);
    assert_eq!(
        junction.vehicle_decision(10).map(|d| d.state),
        Some(VehicleJunctionState::Transit)
    );
}
