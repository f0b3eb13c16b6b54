//! Save/load of junction state through the `SaveableRegistry`.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::commands::JunctionCommand;
use crate::network::{NodeId, SegmentId, VehicleId};
use crate::params::JunctionParams;
use crate::priority::ApproachPosition::Approaching;
use crate::priority::{PriorityClass, PrioritySegments, PriorityVehicles};
use crate::stock_lights::LightPair;
use crate::test_harness::TestJunction;
use crate::traffic_lights::LightSource;
use crate::SaveableRegistry;

fn save(junction: &mut TestJunction) -> BTreeMap<String, Vec<u8>> {
    junction
        .world_mut()
        .resource_scope(|world, registry: Mut<SaveableRegistry>| registry.save_all(world))
}

fn reset(junction: &mut TestJunction) {
    junction
        .world_mut()
        .resource_scope(|world, registry: Mut<SaveableRegistry>| registry.reset_all(world));
}

fn load(junction: &mut TestJunction, extensions: &BTreeMap<String, Vec<u8>>) {
    junction
        .world_mut()
        .resource_scope(|world, registry: Mut<SaveableRegistry>| {
            registry.load_all(world, extensions)
        });
}

#[test]
fn test_fresh_junction_saves_only_params() {
    let mut junction = TestJunction::new().with_crossroads(1);
    let extensions = save(&mut junction);
    assert_eq!(
        extensions.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["junction_params"]
    );
}

#[test]
fn test_lights_and_signs_survive_reload() {
    let mut junction = TestJunction::new()
        .with_crossroads(1)
        .with_crossroads(2)
        .with_sign(2, 21, PriorityClass::Yield);
    junction.command(JunctionCommand::EnableManual { node: NodeId(1) });
    junction.command(JunctionCommand::SetOverrideColor {
        node: NodeId(1),
        segment: SegmentId(13),
        lights: LightPair::green(),
    });
    junction.resource_mut::<JunctionParams>().stop_reduction = 0.8;

    let extensions = save(&mut junction);
    assert_eq!(extensions.len(), 3);

    reset(&mut junction);
    junction.assert_no_override(1, 13);
    assert!(junction.resource::<PrioritySegments>().is_empty());

    load(&mut junction, &extensions);
    junction.assert_override(1, 13, LightPair::green());
    junction.assert_light_source(1, 13, LightSource::Manual);
    assert_eq!(
        junction.resource::<PrioritySegments>().class_of(NodeId(2), SegmentId(21)),
        PriorityClass::Yield
    );
    assert_eq!(junction.resource::<JunctionParams>().stop_reduction, 0.8);
}

#[test]
fn test_vehicles_readmitted_after_load() {
    let mut junction = TestJunction::new()
        .with_crossroads(1)
        .with_sign(1, 12, PriorityClass::Yield);
    junction.observe_vehicle(4, 1, 12, Some(14), Approaching);
    let extensions = save(&mut junction);

    reset(&mut junction);
    load(&mut junction, &extensions);
    assert_eq!(
        junction.resource::<PrioritySegments>().segment_of(VehicleId(4)),
        None
    );

    junction.observe_vehicle(4, 1, 12, Some(14), Approaching);
    assert_eq!(
        junction.resource::<PrioritySegments>().segment_of(VehicleId(4)),
        Some((NodeId(1), SegmentId(12)))
    );
    assert!(junction
        .resource::<PriorityVehicles>()
        .is_tracked(VehicleId(4)));
}

#[test]
fn test_timed_program_resumes_after_load() {
    let mut junction = TestJunction::new().with_crossroads(3);
    junction.command(JunctionCommand::EnableTimed {
        node: NodeId(3),
        members: vec![],
    });
    junction.command(JunctionCommand::AddTimedStep {
        node: NodeId(3),
        duration: 1,
    });
    junction.command(JunctionCommand::AddTimedStep {
        node: NodeId(3),
        duration: 1,
    });
    junction.tick_to(70);
    let step_before = junction.lights().timed_step_index(NodeId(3));

    let extensions = save(&mut junction);
    reset(&mut junction);
    load(&mut junction, &extensions);
    assert_eq!(junction.lights().timed_step_index(NodeId(3)), step_before);

    junction.tick_to(130);
    assert_ne!(junction.lights().timed_step_index(NodeId(3)), step_before);
}
