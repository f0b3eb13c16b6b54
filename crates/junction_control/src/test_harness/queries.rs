//! Query and simulation-tick methods for `TestJunction`.

use bevy::prelude::*;

use crate::commands::{CommandResultLog, JunctionCommand};
use crate::network::{LaneId, NodeId, RoadNetworkView, SegmentId, VehicleId};
use crate::pedestrian_gate::{CrossingDecision, PedestrianCrossingQuery, PedestrianDecisions};
use crate::priority::{
    ApproachPosition, VehicleApproachEvent, VehicleDecision, VehicleDecisions,
    VehicleReleasedEvent,
};
use crate::results::ControlResult;
use crate::traffic_lights::TrafficLightControl;
use crate::TickCounter;

use super::TestJunction;

impl TestJunction {
    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed-update ticks by directly executing the `FixedUpdate`
    /// schedule, bypassing Bevy's time system.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
            std::thread::yield_now();
        }
    }

    /// Tick until the counter reaches `target`. No-op if already past it.
    pub fn tick_to(&mut self, target: u64) {
        while self.current_tick() < target {
            self.tick(1);
        }
    }

    pub fn send_event<E: Event>(&mut self, event: E) {
        self.app.world_mut().send_event(event);
    }

    /// Queue a command, run one tick and return its logged result.
    pub fn command(&mut self, command: JunctionCommand) -> ControlResult {
        self.send_event(command);
        self.tick(1);
        self.resource::<CommandResultLog>()
            .last()
            .map(|(_, result)| result.clone())
            .unwrap_or(ControlResult::Unchanged)
    }

    /// Observe one vehicle for one tick and return its decision.
    pub fn observe_vehicle(
        &mut self,
        vehicle: u32,
        node: u16,
        from_segment: u16,
        to_segment: Option<u16>,
        position: ApproachPosition,
    ) -> Option<VehicleDecision> {
        let event = self.approach(vehicle, node, from_segment, to_segment, position);
        self.send_event(event);
        self.tick(1);
        self.vehicle_decision(vehicle)
    }

    /// Build an approach event on the forward vehicle lane of `from_segment`.
    pub fn approach(
        &self,
        vehicle: u32,
        node: u16,
        from_segment: u16,
        to_segment: Option<u16>,
        position: ApproachPosition,
    ) -> VehicleApproachEvent {
        VehicleApproachEvent {
            vehicle: VehicleId(vehicle),
            node: NodeId(node),
            from_segment: SegmentId(from_segment),
            from_lane: self.vehicle_lane(from_segment),
            to_segment: to_segment.map(SegmentId),
            to_lane: to_segment.map(|s| self.vehicle_lane(s)),
            position,
            speed: 8.0,
        }
    }

    pub fn release_vehicle(&mut self, vehicle: u32) {
        self.send_event(VehicleReleasedEvent {
            vehicle: VehicleId(vehicle),
        });
    }

    /// Ask whether `pedestrian` may cross and run one tick.
    pub fn query_crossing(&mut self, pedestrian: u32, node: u16, segment: u16) -> Option<CrossingDecision> {
        self.send_event(PedestrianCrossingQuery {
            pedestrian,
            node: NodeId(node),
            segment: SegmentId(segment),
        });
        self.tick(1);
        self.resource::<PedestrianDecisions>().get(pedestrian).copied()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn resource_mut<R: Resource>(&mut self) -> Mut<'_, R> {
        self.app.world_mut().resource_mut::<R>()
    }

    pub fn current_tick(&self) -> u64 {
        self.resource::<TickCounter>().0
    }

    pub fn lights(&self) -> &TrafficLightControl {
        self.resource::<TrafficLightControl>()
    }

    pub fn vehicle_decision(&self, vehicle: u32) -> Option<VehicleDecision> {
        self.resource::<VehicleDecisions>()
            .get(VehicleId(vehicle))
            .copied()
    }

    /// First non-pedestrian lane of `segment`.
    pub fn vehicle_lane(&self, segment: u16) -> LaneId {
        let network = self.resource::<RoadNetworkView>();
        network
            .segment(SegmentId(segment))
            .and_then(|s| {
                s.lanes
                    .iter()
                    .copied()
                    .find(|l| network.lane(*l).is_some_and(|lane| !lane.kind.is_pedestrian()))
            })
            .unwrap_or(LaneId(u32::MAX))
    }
}
