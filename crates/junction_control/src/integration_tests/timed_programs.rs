//! Timed programs shared by node groups, including lost-program repair.

use crate::commands::JunctionCommand;
use crate::dispatch::{DispatchStats, ProgramLostEvent};
use crate::network::{NodeId, SegmentId};
use crate::results::{ControlError, ControlResult};
use crate::stock_lights::LightPair;
use crate::test_harness::TestJunction;
use crate::traffic_lights::LightSource;
use bevy::prelude::Events;

/// Nodes 1 and 2 share a two-step program: everything green for two program
/// ticks, then everything red for two. All commands land before tick 64.
fn two_node_program() -> TestJunction {
    let mut junction = TestJunction::new().with_crossroads(1).with_crossroads(2);
    assert_eq!(
        junction.command(JunctionCommand::EnableTimed {
            node: NodeId(1),
            members: vec![NodeId(2)],
        }),
        ControlResult::Success
    );
    for lights in [LightPair::green(), LightPair::red()] {
        for node in [1u16, 2] {
            for arm in 1..=4u16 {
                junction.command(JunctionCommand::SetOverrideColor {
                    node: NodeId(node),
                    segment: SegmentId(node * 10 + arm),
                    lights,
                });
            }
        }
        junction.command(JunctionCommand::AddTimedStep {
            node: NodeId(2),
            duration: 2,
        });
    }
    assert!(junction.current_tick() < 64);
    junction
}

#[test]
fn test_group_shares_one_program() {
    let junction = two_node_program();
    let program = junction.lights().program_of(NodeId(1)).unwrap();
    assert_eq!(program.members, vec![NodeId(1), NodeId(2)]);
    assert_eq!(program.steps.len(), 2);
    assert_eq!(
        junction.lights().program_of(NodeId(2)).map(|p| p.id),
        Some(program.id)
    );
    junction.assert_light_source(2, 21, LightSource::Timed);
}

#[test]
fn test_program_cycles_on_slow_clock() {
    let mut junction = two_node_program();

    // Step 0 lasts program ticks 1..2 (raw 64 and 128).
    junction.tick_to(127);
    assert_eq!(junction.lights().timed_step_index(NodeId(1)), Some(0));

    junction.tick_to(130);
    assert_eq!(junction.lights().timed_step_index(NodeId(1)), Some(1));
    junction.assert_override(1, 11, LightPair::red());

    junction.tick_to(260);
    for node in [1u16, 2] {
        assert_eq!(junction.lights().timed_step_index(NodeId(node)), Some(0));
        for arm in 1..=4u16 {
            junction.assert_override(node, node * 10 + arm, LightPair::green());
        }
    }
}

#[test]
fn test_paused_program_holds_its_step() {
    let mut junction = two_node_program();
    junction.tick_to(130);
    assert_eq!(
        junction.command(JunctionCommand::SetTimedActive {
            node: NodeId(1),
            active: false,
        }),
        ControlResult::Success
    );
    junction.tick(600);
    assert_eq!(junction.lights().timed_step_index(NodeId(2)), Some(1));
    junction.assert_override(2, 23, LightPair::red());
}

#[test]
fn test_manual_cannot_take_over_timed_node() {
    let mut junction = two_node_program();
    assert_eq!(
        junction.command(JunctionCommand::EnableManual { node: NodeId(2) }),
        ControlResult::Error(ControlError::TimedActive(NodeId(2)))
    );
    junction.assert_light_source(2, 21, LightSource::Timed);
}

#[test]
fn test_new_arm_resets_whole_group() {
    let mut junction = two_node_program();
    junction.add_arm(2, 25);
    junction.tick(1);

    for (node, segment) in [(1u16, 11u16), (2, 21), (2, 25)] {
        junction.assert_no_override(node, segment);
        junction.assert_light_source(node, segment, LightSource::Stock);
    }
    assert!(junction.lights().program_of(NodeId(1)).is_none());
    assert_eq!(junction.resource::<DispatchStats>().programs_lost_total, 1);

    let events = junction.resource::<Events<ProgramLostEvent>>();
    let lost: Vec<_> = events.iter_current_update_events().cloned().collect();
    assert_eq!(lost.len(), 1);
    assert_eq!(lost[0].cleared, vec![NodeId(1), NodeId(2)]);
}

#[test]
fn test_disable_timed_from_any_member() {
    let mut junction = two_node_program();
    assert_eq!(
        junction.command(JunctionCommand::DisableTimed { node: NodeId(2) }),
        ControlResult::Success
    );
    junction.assert_no_override(1, 11);
    assert!(junction.lights().controlled_nodes().is_empty());
    assert_eq!(
        junction.command(JunctionCommand::DisableTimed { node: NodeId(1) }),
        ControlResult::Error(ControlError::NotTimed(NodeId(1)))
    );
}

#[test]
fn test_paused_group_keeps_program_when_arm_is_added() {
    let mut junction = two_node_program();
    junction.command(JunctionCommand::SetTimedActive {
        node: NodeId(2),
        active: false,
    });
    junction.add_arm(2, 25);
    junction.tick(5);

    assert!(junction.lights().program_of(NodeId(1)).is_some());
    assert_eq!(junction.resource::<DispatchStats>().programs_lost_total, 0);
    junction.assert_light_source(2, 25, LightSource::Stock);

    junction.command(JunctionCommand::SetTimedActive {
        node: NodeId(1),
        active: true,
    });
    junction.tick(1);
    assert!(junction.lights().program_of(NodeId(2)).is_none());
    assert_eq!(junction.resource::<DispatchStats>().programs_lost_total, 1);
    junction.assert_no_override(1, 11);
}
