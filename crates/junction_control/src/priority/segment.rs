//! Admitted-vehicle set and per-lane occupancy for one priority segment end.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::network::{LaneId, NodeId, RoadNetworkView, SegmentId, VehicleId};

use super::admission::LaneAdmission;
use super::types::PriorityClass;
use super::vehicle::PriorityVehicles;

#[derive(Debug, Clone, Default)]
pub struct PrioritySegment {
    pub node: NodeId,
    pub segment: SegmentId,
    pub class: PriorityClass,
    admitted: HashSet<VehicleId>,
    /// One entry per non-pedestrian lane, in lane-link order.
    lanes: Vec<LaneAdmission>,
}

impl PrioritySegment {
    pub fn new(node: NodeId, segment: SegmentId, class: PriorityClass) -> Self {
        Self {
            node,
            segment,
            class,
            ..Default::default()
        }
    }

    pub fn contains(&self, vehicle: VehicleId) -> bool {
        self.admitted.contains(&vehicle)
    }

    pub fn admitted(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.admitted.iter().copied()
    }

    pub fn admitted_count(&self) -> usize {
        self.admitted.len()
    }

    pub fn lanes(&self) -> &[LaneAdmission] {
        &self.lanes
    }

    /// Admit a tracked vehicle whose origin lane is one of this segment's
    /// vehicle lanes. No-op for members, for vehicles without junction state
    /// and for vehicles reported on a sidewalk or a foreign lane. Returns
    /// `true` if the set changed.
    pub fn admit(
        &mut self,
        vehicle: VehicleId,
        vehicles: &PriorityVehicles,
        network: &RoadNetworkView,
    ) -> bool {
        if self.admitted.contains(&vehicle) {
            return false;
        }
        let Some(state) = vehicles.get(vehicle).filter(|s| s.is_tracked()) else {
            return false;
        };
        let counted = counted_lanes(self.segment, network);
        if !counted.contains(&state.from_lane) {
            debug!(
                "PrioritySegment {:?}/{:?}: vehicle {:?} is not on a counted lane ({:?})",
                self.node, self.segment, vehicle, state.from_lane
            );
            return false;
        }
        self.admitted.insert(vehicle);
        self.rebuild(&counted, vehicles);
        true
    }

    /// Remove a vehicle. Withdrawing a non-member changes nothing.
    pub fn withdraw(
        &mut self,
        vehicle: VehicleId,
        vehicles: &PriorityVehicles,
        network: &RoadNetworkView,
    ) -> bool {
        if !self.admitted.remove(&vehicle) {
            return false;
        }
        let counted = counted_lanes(self.segment, network);
        self.rebuild(&counted, vehicles);
        true
    }

    /// Rebuild per-lane occupancy after the host changed the network. Members
    /// whose origin lane is no longer counted are dropped and returned, so
    /// the per-lane sum keeps matching the admitted set.
    pub fn recompute_occupancy(
        &mut self,
        vehicles: &PriorityVehicles,
        network: &RoadNetworkView,
    ) -> Vec<VehicleId> {
        let counted = counted_lanes(self.segment, network);
        let mut dropped: Vec<VehicleId> = self
            .admitted
            .iter()
            .copied()
            .filter(|v| {
                !vehicles
                    .get(*v)
                    .is_some_and(|s| s.is_tracked() && counted.contains(&s.from_lane))
            })
            .collect();
        dropped.sort_unstable();
        for vehicle in &dropped {
            self.admitted.remove(vehicle);
        }
        self.rebuild(&counted, vehicles);
        dropped
    }

    /// Count members per lane with one pass over the walked lane list.
    fn rebuild(&mut self, counted: &[LaneId], vehicles: &PriorityVehicles) {
        let mut per_lane: HashMap<LaneId, u32> = HashMap::new();
        for vehicle in &self.admitted {
            if let Some(state) = vehicles.get(*vehicle) {
                *per_lane.entry(state.from_lane).or_insert(0) += 1;
            }
        }
        self.lanes = counted
            .iter()
            .map(|&lane| LaneAdmission {
                lane,
                occupancy: per_lane.get(&lane).copied().unwrap_or(0),
            })
            .collect();
    }

    pub fn lane_occupancy(&self, lane: LaneId) -> u32 {
        self.lanes
            .iter()
            .find(|l| l.lane == lane)
            .map(|l| l.occupancy)
            .unwrap_or(0)
    }

    /// Sum over all lanes; equals the number of admitted vehicles.
    pub fn total_occupancy(&self) -> u32 {
        self.lanes.iter().map(|l| l.occupancy).sum()
    }

    /// Remove every member, returning them.
    pub(super) fn drain(&mut self) -> Vec<VehicleId> {
        self.lanes.clear();
        self.admitted.drain().collect()
    }
}

/// Non-pedestrian lanes of a segment, following the host's lane links.
fn counted_lanes(segment: SegmentId, network: &RoadNetworkView) -> Vec<LaneId> {
    network
        .segment_lanes(segment)
        .into_iter()
        .filter(|id| network.lane(*id).is_some_and(|l| !l.kind.is_pedestrian()))
        .collect()
}
