//! Right-of-way arbitration at priority-sign junctions.
//!
//! A movement through a node is a chord between two segment slots. Slots are
//! ordered clockwise around the node, so two chords cross exactly when their
//! endpoints interleave.

use crate::config::MAX_NODE_SEGMENTS;
use crate::network::{NodeId, RoadNetworkView, SegmentId, VehicleId};

use super::registry::PrioritySegments;
use super::types::PriorityClass;
use super::vehicle::{PriorityVehicleState, PriorityVehicles};

/// A movement through a node, as slot indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictPath {
    pub from: usize,
    /// `None` when the vehicle's exit is not known yet.
    pub to: Option<usize>,
}

impl ConflictPath {
    pub fn new(from: usize, to: Option<usize>) -> Self {
        Self { from, to }
    }

    /// Build a path from segment ids. `None` if the origin is not at the node.
    pub fn resolve(
        network: &RoadNetworkView,
        node: NodeId,
        from: SegmentId,
        to: Option<SegmentId>,
    ) -> Option<Self> {
        let from = network.slot_of(node, from)?;
        let to = to.and_then(|s| network.slot_of(node, s));
        Some(Self { from, to })
    }
}

/// Clockwise distance from `from` to `to` around the node.
fn clockwise(from: usize, to: usize) -> usize {
    (to + MAX_NODE_SEGMENTS - from % MAX_NODE_SEGMENTS) % MAX_NODE_SEGMENTS
}

/// Whether two movements through the same node can collide.
pub fn paths_conflict(a: ConflictPath, b: ConflictPath) -> bool {
    if a.from == b.from {
        return false;
    }
    let (Some(a_to), Some(b_to)) = (a.to, b.to) else {
        return true;
    };
    if a_to == b_to {
        return true;
    }
    // Chords sharing any other endpoint meet only at the node edge.
    if a_to == a.from || b_to == b.from || a.from == b_to || b.from == a_to {
        return false;
    }
    let span = clockwise(a.from, a_to);
    let inside = |slot: usize| {
        let d = clockwise(a.from, slot);
        d > 0 && d < span
    };
    inside(b.from) != inside(b_to)
}

/// Whether a vehicle held by a Stop or Yield sign may enter the junction now.
///
/// Denied when a conflicting vehicle on another Main approach is admitted,
/// when a conflicting vehicle of equal or higher precedence is already
/// crossing, or when a conflicting higher-precedence vehicle is waiting.
/// Two waiting vehicles of the same class go in segment id order.
pub fn has_clearance(
    vehicle: VehicleId,
    class: PriorityClass,
    segments: &PrioritySegments,
    vehicles: &PriorityVehicles,
    network: &RoadNetworkView,
) -> bool {
    if class.never_blocks() {
        return true;
    }
    let Some(me) = vehicles.get(vehicle).filter(|s| s.is_tracked()) else {
        return true;
    };
    if network.node(me.node).is_none() {
        return true;
    }
    let Some(my_path) = ConflictPath::resolve(network, me.node, me.from_segment, me.to_segment)
    else {
        return true;
    };

    for other_segment in segments.segments_at(me.node) {
        if other_segment.segment == me.from_segment {
            continue;
        }
        let other_class = other_segment.class;
        for other in other_segment.admitted() {
            if other == vehicle {
                continue;
            }
            let Some(state) = vehicles.get(other).filter(|s| s.node == me.node) else {
                continue;
            };
            if !conflicts_with(network, my_path, state) {
                continue;
            }
            if blocks(class, me.from_segment, other_class, other_segment.segment, state) {
                return false;
            }
        }
    }
    true
}

fn conflicts_with(
    network: &RoadNetworkView,
    my_path: ConflictPath,
    other: &PriorityVehicleState,
) -> bool {
    match ConflictPath::resolve(network, other.node, other.from_segment, other.to_segment) {
        Some(path) => paths_conflict(my_path, path),
        None => false,
    }
}

fn blocks(
    class: PriorityClass,
    my_segment: SegmentId,
    other_class: PriorityClass,
    other_segment: SegmentId,
    other: &PriorityVehicleState,
) -> bool {
    if other_class.never_blocks() {
        return true;
    }
    if other.state == super::types::VehicleJunctionState::Transit {
        return other_class.rank() >= class.rank();
    }
    if other.state.is_waiting() {
        if other_class.rank() > class.rank() {
            return true;
        }
        return other_class == class && other_segment < my_segment;
    }
    false
}
