//! Builder methods for network, stock light and sign setup.

use crate::network::{LaneDirection, LaneId, LaneKind, NodeId, RoadNetworkView, SegmentId};
use crate::priority::{PriorityClass, PrioritySegments};
use crate::stock_lights::{LightPair, StockLights};

use super::TestJunction;

/// Lane layout used by [`TestJunction::with_crossroads`]: one sidewalk and
/// one lane in each direction.
const CROSSROADS_LANES: [(LaneKind, LaneDirection); 3] = [
    (LaneKind::Pedestrian, LaneDirection::Forward),
    (LaneKind::Vehicle, LaneDirection::Forward),
    (LaneKind::Vehicle, LaneDirection::Backward),
];

impl TestJunction {
    // -----------------------------------------------------------------------
    // Network
    // -----------------------------------------------------------------------

    /// Four-arm node. Arms are segments `node*10+1 ..= node*10+4`, added in
    /// clockwise order, each leading to a dead-end node `500 + segment`.
    pub fn with_crossroads(mut self, node: u16) -> Self {
        let mut network = self.app.world_mut().resource_mut::<RoadNetworkView>();
        for arm in 1..=4u16 {
            let segment = node * 10 + arm;
            network.add_segment(
                SegmentId(segment),
                NodeId(node),
                NodeId(500 + segment),
                &CROSSROADS_LANES,
            );
        }
        self
    }

    /// Add one more arm to an existing node, as a host would when a road is
    /// built onto a junction.
    pub fn add_arm(&mut self, node: u16, segment: u16) -> Vec<LaneId> {
        let mut network = self.app.world_mut().resource_mut::<RoadNetworkView>();
        network.add_segment(
            SegmentId(segment),
            NodeId(node),
            NodeId(500 + segment),
            &CROSSROADS_LANES,
        )
    }

    pub fn remove_segment(&mut self, segment: u16) {
        self.app
            .world_mut()
            .resource_mut::<RoadNetworkView>()
            .remove_segment(SegmentId(segment));
    }

    // -----------------------------------------------------------------------
    // Stock lights and signs
    // -----------------------------------------------------------------------

    /// Record a stock light for the window containing `tick`.
    pub fn with_stock_light(mut self, node: u16, segment: u16, tick: u64, lights: LightPair) -> Self {
        self.app
            .world_mut()
            .resource_mut::<StockLights>()
            .set(NodeId(node), SegmentId(segment), tick, lights);
        self
    }

    /// Classify a segment end directly, bypassing the command queue.
    pub fn with_sign(mut self, node: u16, segment: u16, class: PriorityClass) -> Self {
        self.app.world_mut().resource_scope(
            |world, mut segments: bevy::prelude::Mut<PrioritySegments>| {
                let network = world.resource::<RoadNetworkView>();
                segments.classify_segment(NodeId(node), SegmentId(segment), class, network);
            },
        );
        self
    }
}
