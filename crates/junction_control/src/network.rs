//! Read-only view of the host road network.
//!
//! The host simulation owns the real network; it mirrors the parts the
//! junction engine needs (node slots, segment lane lists, lane kinds and
//! next-lane links) into [`RoadNetworkView`]. Nothing in this crate mutates
//! the view except the host-facing builder methods.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::config::{MAX_LANE_WALK, MAX_NODE_SEGMENTS};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct NodeId(pub u16);

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct SegmentId(pub u16);

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct LaneId(pub u32);

/// Host vehicle slot. Slots are reused across the vehicle population.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct VehicleId(pub u32);

/// What a lane carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum LaneKind {
    Vehicle,
    Pedestrian,
    Bicycle,
    Parking,
}

impl LaneKind {
    pub fn is_pedestrian(self) -> bool {
        matches!(self, LaneKind::Pedestrian)
    }
}

/// Lane direction relative to the segment's start -> end orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum LaneDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct Lane {
    pub id: LaneId,
    pub segment: SegmentId,
    pub kind: LaneKind,
    pub direction: LaneDirection,
    /// Next lane of the same segment in the host's lane linked list.
    pub next_lane: Option<LaneId>,
}

#[derive(Debug, Clone)]
pub struct RoadSegment {
    pub id: SegmentId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    /// Lanes in host order (the linked list flattened).
    pub lanes: Vec<LaneId>,
}

impl RoadSegment {
    /// The node at the other end of this segment, if `node` is one of its ends.
    pub fn other_node(&self, node: NodeId) -> Option<NodeId> {
        if node == self.start_node {
            Some(self.end_node)
        } else if node == self.end_node {
            Some(self.start_node)
        } else {
            None
        }
    }
}

/// An intersection point. Slots are ordered clockwise around the node; the
/// priority conflict model relies on that order.
#[derive(Debug, Clone, Default)]
pub struct RoadNode {
    pub id: NodeId,
    pub segments: [Option<SegmentId>; MAX_NODE_SEGMENTS],
}

impl RoadNode {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            segments: [None; MAX_NODE_SEGMENTS],
        }
    }

    pub fn incident_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments.iter().flatten().copied()
    }

    pub fn slot_of(&self, segment: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| *s == Some(segment))
    }

    pub fn segment_count(&self) -> usize {
        self.segments.iter().flatten().count()
    }
}

/// Host-populated mirror of the road network.
#[derive(Resource, Default, Debug)]
pub struct RoadNetworkView {
    pub nodes: HashMap<NodeId, RoadNode>,
    pub segments: HashMap<SegmentId, RoadSegment>,
    pub lanes: HashMap<LaneId, Lane>,
    next_lane_id: u32,
    /// Bumped on every structural change.
    pub generation: u32,
}

impl RoadNetworkView {
    pub fn add_node(&mut self, id: NodeId) {
        self.nodes.entry(id).or_insert_with(|| RoadNode::new(id));
        self.generation = self.generation.wrapping_add(1);
    }

    /// Add a segment between two nodes with the given lane layout and attach
    /// it to the first free slot of each end node. Returns the new lane ids in
    /// lane-list order.
    pub fn add_segment(
        &mut self,
        id: SegmentId,
        start_node: NodeId,
        end_node: NodeId,
        lanes: &[(LaneKind, LaneDirection)],
    ) -> Vec<LaneId> {
        self.add_node(start_node);
        self.add_node(end_node);

        let lane_ids: Vec<LaneId> = lanes
            .iter()
            .map(|_| {
                self.next_lane_id += 1;
                LaneId(self.next_lane_id)
            })
            .collect();

        for (i, (&lane_id, &(kind, direction))) in lane_ids.iter().zip(lanes).enumerate() {
            self.lanes.insert(
                lane_id,
                Lane {
                    id: lane_id,
                    segment: id,
                    kind,
                    direction,
                    next_lane: lane_ids.get(i + 1).copied(),
                },
            );
        }

        self.segments.insert(
            id,
            RoadSegment {
                id,
                start_node,
                end_node,
                lanes: lane_ids.clone(),
            },
        );

        for node_id in [start_node, end_node] {
            let Some(node) = self.nodes.get_mut(&node_id) else {
                continue;
            };
            if node.slot_of(id).is_some() {
                continue;
            }
            match node.segments.iter_mut().find(|s| s.is_none()) {
                Some(slot) => *slot = Some(id),
                None => warn!(
                    "RoadNetworkView: node {:?} has no free slot for segment {:?}",
                    node_id, id
                ),
            }
        }

        self.generation = self.generation.wrapping_add(1);
        lane_ids
    }

    /// Detach a segment from its nodes and drop its lanes.
    pub fn remove_segment(&mut self, id: SegmentId) {
        let Some(segment) = self.segments.remove(&id) else {
            return;
        };
        for lane in &segment.lanes {
            self.lanes.remove(lane);
        }
        for node_id in [segment.start_node, segment.end_node] {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                for slot in node.segments.iter_mut() {
                    if *slot == Some(id) {
                        *slot = None;
                    }
                }
            }
        }
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.nodes.get(&id)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&RoadSegment> {
        self.segments.get(&id)
    }

    pub fn lane(&self, id: LaneId) -> Option<&Lane> {
        self.lanes.get(&id)
    }

    /// Incident segments of a node in slot order. Empty for unknown nodes.
    pub fn incident_segments(&self, node: NodeId) -> Vec<SegmentId> {
        self.nodes
            .get(&node)
            .map(|n| n.incident_segments().collect())
            .unwrap_or_default()
    }

    pub fn is_incident(&self, node: NodeId, segment: SegmentId) -> bool {
        self.slot_of(node, segment).is_some()
    }

    pub fn slot_of(&self, node: NodeId, segment: SegmentId) -> Option<usize> {
        self.nodes.get(&node).and_then(|n| n.slot_of(segment))
    }

    /// Follow `next_lane` links starting at `first`. Stops at a missing lane,
    /// at a lane belonging to another segment, at a lane already visited, or
    /// after [`MAX_LANE_WALK`] lanes.
    pub fn lane_chain(&self, first: LaneId) -> Vec<LaneId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(first);
        let mut segment = None;
        while let Some(id) = current {
            if chain.len() >= MAX_LANE_WALK || !visited.insert(id) {
                break;
            }
            let Some(lane) = self.lanes.get(&id) else {
                break;
            };
            if *segment.get_or_insert(lane.segment) != lane.segment {
                break;
            }
            chain.push(id);
            current = lane.next_lane;
        }
        chain
    }

    /// Every reachable lane of a segment, in link order. The walk starts at
    /// the segment's first lane; when a link leads to a lane the network no
    /// longer has, the lane is skipped and the walk resumes from the next
    /// listed lane.
    pub fn segment_lanes(&self, segment: SegmentId) -> Vec<LaneId> {
        let Some(seg) = self.segments.get(&segment) else {
            return Vec::new();
        };
        let mut walked = Vec::new();
        let mut visited = HashSet::new();
        for &start in &seg.lanes {
            if walked.len() >= MAX_LANE_WALK {
                break;
            }
            if visited.contains(&start) {
                continue;
            }
            if !self.lanes.contains_key(&start) {
                debug!("Segment {:?}: skipping unknown lane {:?}", segment, start);
                continue;
            }
            for lane in self.lane_chain(start) {
                if !visited.insert(lane) {
                    break;
                }
                walked.push(lane);
            }
        }
        walked.truncate(MAX_LANE_WALK);
        walked
    }
}
