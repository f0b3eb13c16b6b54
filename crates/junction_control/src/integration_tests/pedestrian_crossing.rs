//! Pedestrian gating under stock and manual lights.

use crate::commands::JunctionCommand;
use crate::network::{NodeId, SegmentId};
use crate::pedestrian_gate::CrossingReason;
use crate::stock_lights::{LightPair, LightState, StockLights};
use crate::test_harness::TestJunction;

/// Node 0 has no phase offset, so window positions equal `tick % 256`.
fn crossing_with(pedestrian: LightState) -> TestJunction {
    TestJunction::new().with_crossroads(0).with_stock_light(
        0,
        1,
        512,
        LightPair::new(LightState::Red, pedestrian),
    )
}

#[test]
fn test_fresh_green_holds_pedestrians_briefly() {
    let mut junction = crossing_with(LightState::RedToGreen);
    junction.tick_to(520);
    let early = junction.query_crossing(7, 0, 1).unwrap();
    assert!(!early.permitted);
    assert_eq!(early.reason, CrossingReason::GreenDwell);

    junction.tick_to(600);
    let later = junction.query_crossing(7, 0, 1).unwrap();
    assert!(later.permitted);
}

#[test]
fn test_red_light_latches_request_late_in_window() {
    let mut junction = crossing_with(LightState::Red);
    junction.tick_to(600);
    let d = junction.query_crossing(1, 0, 1).unwrap();
    assert_eq!(d.reason, CrossingReason::RedLight);

    junction.tick_to(720);
    let d = junction.query_crossing(2, 0, 1).unwrap();
    assert_eq!(d.reason, CrossingReason::RedLatched);
    let d = junction.query_crossing(3, 0, 1).unwrap();
    assert_eq!(d.reason, CrossingReason::RedLight);
    assert!(junction
        .resource::<StockLights>()
        .get(NodeId(0), SegmentId(1), 720)
        .unwrap()
        .pedestrians_latched);
}

#[test]
fn test_manual_pedestrian_colour_overrides_stock() {
    let mut junction = crossing_with(LightState::Green);
    junction.command(JunctionCommand::EnableManual { node: NodeId(0) });
    junction.command(JunctionCommand::SetOverrideColor {
        node: NodeId(0),
        segment: SegmentId(1),
        lights: LightPair::red(),
    });
    junction.tick_to(600);
    let d = junction.query_crossing(4, 0, 1).unwrap();
    assert!(!d.permitted);
    assert_eq!(d.reason, CrossingReason::ManualRed);
}

#[test]
fn test_decisions_cleared_each_tick() {
    let mut junction = crossing_with(LightState::Green);
    junction.tick_to(600);
    assert!(junction.query_crossing(9, 0, 1).unwrap().permitted);
    junction.tick(1);
    assert!(junction
        .resource::<crate::pedestrian_gate::PedestrianDecisions>()
        .get(9)
        .is_none());
}
