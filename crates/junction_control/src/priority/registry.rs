//! `PrioritySegments`: every classified segment end plus the system-wide
//! vehicle membership table.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::network::{NodeId, RoadNetworkView, SegmentId, VehicleId};
use crate::results::{ControlError, ControlResult};

use super::segment::PrioritySegment;
use super::types::PriorityClass;
use super::vehicle::PriorityVehicles;

#[derive(Resource, Debug, Default)]
pub struct PrioritySegments {
    pub(super) segments: HashMap<(NodeId, SegmentId), PrioritySegment>,
    /// Which segment each admitted vehicle belongs to. A vehicle is a member
    /// of at most one segment.
    membership: HashMap<VehicleId, (NodeId, SegmentId)>,
}

impl PrioritySegments {
    /// Set the sign on one segment end. `PriorityClass::None` removes the
    /// entry and evicts its members.
    pub fn classify_segment(
        &mut self,
        node: NodeId,
        segment: SegmentId,
        class: PriorityClass,
        network: &RoadNetworkView,
    ) -> ControlResult {
        if !network.is_incident(node, segment) {
            let error = ControlError::SegmentNotAtNode(node, segment);
            warn!("Priority sign rejected: {}", error);
            return ControlResult::Error(error);
        }
        if self.class_of(node, segment) == class {
            return ControlResult::Unchanged;
        }

        if class == PriorityClass::None {
            if let Some(mut removed) = self.segments.remove(&(node, segment)) {
                for vehicle in removed.drain() {
                    self.membership.remove(&vehicle);
                }
            }
        } else {
            self.segments
                .entry((node, segment))
                .or_insert_with(|| PrioritySegment::new(node, segment, class))
                .class = class;
        }
        info!(
            "Priority sign on node {:?} segment {:?} set to {}",
            node,
            segment,
            class.name()
        );
        ControlResult::Success
    }

    /// Sign on a segment end; unclassified ends report `None`.
    pub fn class_of(&self, node: NodeId, segment: SegmentId) -> PriorityClass {
        self.segments
            .get(&(node, segment))
            .map(|s| s.class)
            .unwrap_or_default()
    }

    pub fn get(&self, node: NodeId, segment: SegmentId) -> Option<&PrioritySegment> {
        self.segments.get(&(node, segment))
    }

    /// Classified segment ends of one node, sorted by segment id.
    pub fn segments_at(&self, node: NodeId) -> Vec<&PrioritySegment> {
        let mut found: Vec<&PrioritySegment> =
            self.segments.values().filter(|s| s.node == node).collect();
        found.sort_unstable_by_key(|s| s.segment);
        found
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrioritySegment> {
        self.segments.values()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_of(&self, vehicle: VehicleId) -> Option<(NodeId, SegmentId)> {
        self.membership.get(&vehicle).copied()
    }

    /// Admit a vehicle into a segment, moving it out of any other segment
    /// first. Returns `true` if membership changed.
    pub fn admit(
        &mut self,
        node: NodeId,
        segment: SegmentId,
        vehicle: VehicleId,
        vehicles: &PriorityVehicles,
        network: &RoadNetworkView,
    ) -> bool {
        let key = (node, segment);
        match self.membership.get(&vehicle).copied() {
            Some(current) if current == key => return false,
            Some(_) => {
                self.withdraw(vehicle, vehicles, network);
            }
            None => {}
        }
        let Some(target) = self.segments.get_mut(&key) else {
            return false;
        };
        if !target.admit(vehicle, vehicles, network) {
            return false;
        }
        self.membership.insert(vehicle, key);
        true
    }

    /// Remove a vehicle from whichever segment holds it. Idempotent.
    pub fn withdraw(
        &mut self,
        vehicle: VehicleId,
        vehicles: &PriorityVehicles,
        network: &RoadNetworkView,
    ) -> bool {
        let Some(key) = self.membership.remove(&vehicle) else {
            return false;
        };
        self.segments
            .get_mut(&key)
            .is_some_and(|s| s.withdraw(vehicle, vehicles, network))
    }

    /// Recompute every segment's occupancy, e.g. after the host changed lanes.
    /// Returns members that lost their counted lane; they are no longer
    /// admitted anywhere.
    pub fn recompute_all(
        &mut self,
        vehicles: &PriorityVehicles,
        network: &RoadNetworkView,
    ) -> Vec<VehicleId> {
        let mut dropped = Vec::new();
        for segment in self.segments.values_mut() {
            dropped.extend(segment.recompute_occupancy(vehicles, network));
        }
        for vehicle in &dropped {
            self.membership.remove(vehicle);
        }
        dropped
    }

    /// Drop entries for segment ends that no longer exist in the network.
    /// Returns the evicted vehicles.
    pub fn prune_detached(&mut self, network: &RoadNetworkView) -> Vec<VehicleId> {
        let stale: Vec<(NodeId, SegmentId)> = self
            .segments
            .keys()
            .filter(|(n, s)| !network.is_incident(*n, *s))
            .copied()
            .collect();
        let mut evicted = Vec::new();
        for key in stale {
            if let Some(mut removed) = self.segments.remove(&key) {
                for vehicle in removed.drain() {
                    self.membership.remove(&vehicle);
                    evicted.push(vehicle);
                }
            }
        }
        evicted
    }
}
