//! Manual light control driven through `JunctionCommand` events.

use crate::commands::{CommandResultLog, JunctionCommand};
use crate::dispatch::DispatchStats;
use crate::network::{NodeId, SegmentId};
use crate::results::{ControlError, ControlResult};
use crate::stock_lights::{LightPair, LightState};
use crate::test_harness::TestJunction;
use crate::traffic_lights::{LightChannel, LightSource};

fn enable_manual(node: u16) -> JunctionCommand {
    JunctionCommand::EnableManual { node: NodeId(node) }
}

#[test]
fn test_enable_manual_seeds_from_previous_window() {
    // Stock green recorded in window 0; the command lands in window 1 and
    // reads back one window.
    let mut junction = TestJunction::new()
        .with_crossroads(1)
        .with_stock_light(1, 11, 100, LightPair::green())
        .with_stock_light(
            1,
            12,
            100,
            LightPair::new(LightState::GreenToRed, LightState::RedToGreen),
        );
    junction.tick_to(300);

    assert_eq!(junction.command(enable_manual(1)), ControlResult::Success);
    junction.assert_override(1, 11, LightPair::green());
    junction.assert_override(1, 12, LightPair::red());
    junction.assert_override(1, 13, LightPair::red());
    junction.assert_light_source(1, 11, LightSource::Manual);
}

#[test]
fn test_manual_colours_persist_across_ticks() {
    let mut junction = TestJunction::new().with_crossroads(1);
    junction.command(enable_manual(1));
    let result = junction.command(JunctionCommand::SetOverrideColor {
        node: NodeId(1),
        segment: SegmentId(14),
        lights: LightPair::green(),
    });
    assert_eq!(result, ControlResult::Success);
    let changed_at = junction.current_tick();

    junction.tick(500);
    junction.assert_override(1, 14, LightPair::green());
    let entry = junction
        .lights()
        .get_override(NodeId(1), SegmentId(14))
        .copied()
        .unwrap();
    assert_eq!(entry.last_change_tick, changed_at);
    assert_eq!(entry.displayed_ticks, 500);

    let stats = junction.resource::<DispatchStats>();
    assert_eq!(stats.custom_nodes, 1);
    // Four dead-end nodes stay on stock lights.
    assert_eq!(stats.stock_nodes, 4);
}

#[test]
fn test_channel_command_changes_one_colour() {
    let mut junction = TestJunction::new().with_crossroads(1);
    junction.command(enable_manual(1));
    junction.command(JunctionCommand::SetChannelColor {
        node: NodeId(1),
        segment: SegmentId(12),
        channel: LightChannel::Pedestrian,
        state: LightState::Green,
    });
    junction.assert_override(1, 12, LightPair::new(LightState::Red, LightState::Green));
}

#[test]
fn test_disable_manual_returns_to_stock() {
    let mut junction = TestJunction::new().with_crossroads(1);
    junction.command(enable_manual(1));
    assert_eq!(
        junction.command(JunctionCommand::DisableManual { node: NodeId(1) }),
        ControlResult::Success
    );
    for segment in 11..=14 {
        junction.assert_no_override(1, segment);
        junction.assert_light_source(1, segment, LightSource::Stock);
    }
    assert!(!junction.lights().has_custom_simulation(NodeId(1)));
}

#[test]
fn test_rejected_commands_are_logged() {
    let mut junction = TestJunction::new().with_crossroads(1).with_crossroads(2);
    assert_eq!(
        junction.command(enable_manual(9)),
        ControlResult::Error(ControlError::UnknownNode(NodeId(9)))
    );
    junction.command(enable_manual(1));
    assert_eq!(
        junction.command(JunctionCommand::SetOverrideColor {
            node: NodeId(1),
            segment: SegmentId(21),
            lights: LightPair::green(),
        }),
        ControlResult::Error(ControlError::SegmentNotAtNode(NodeId(1), SegmentId(21)))
    );

    let log = junction.resource::<CommandResultLog>();
    assert_eq!(log.len(), 3);
    assert!(log.last_n(3)[1].1.is_success());
}
