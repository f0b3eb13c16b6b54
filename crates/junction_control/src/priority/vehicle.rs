//! Per-vehicle junction state and its transition function.

use bevy::prelude::*;

use crate::config::MAX_VEHICLE_SLOTS;
use crate::network::{LaneId, NodeId, SegmentId, VehicleId};

use super::types::{ApproachPosition, PriorityClass, VehicleApproachEvent, VehicleJunctionState};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorityVehicleState {
    pub state: VehicleJunctionState,
    pub node: NodeId,
    pub from_segment: SegmentId,
    pub from_lane: LaneId,
    pub to_segment: Option<SegmentId>,
    pub to_lane: Option<LaneId>,
    pub last_speed: f32,
    pub speed_reduction: f32,
    pub wait_ticks: u32,
    pub stopped: bool,
    pub entered_tick: u64,
}

impl PriorityVehicleState {
    /// Start tracking from a first observation.
    pub fn begin(approach: &VehicleApproachEvent, tick: u64) -> Self {
        Self {
            state: VehicleJunctionState::Enter,
            node: approach.node,
            from_segment: approach.from_segment,
            from_lane: approach.from_lane,
            to_segment: approach.to_segment,
            to_lane: approach.to_lane,
            last_speed: approach.speed,
            entered_tick: tick,
            ..Default::default()
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.state != VehicleJunctionState::None
    }

    /// Same junction approach as this record.
    pub fn matches(&self, node: NodeId, segment: SegmentId) -> bool {
        self.node == node && self.from_segment == segment
    }
}

/// Inputs to one state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionInput {
    pub class: PriorityClass,
    /// The arbitration policy grants clearance this tick.
    pub clear: bool,
    pub position: ApproachPosition,
}

/// Pure vehicle junction state machine.
///
/// `None -> Enter` on first observation, `Enter/Stop -> Transit` with
/// clearance, `Enter/Stop -> Stop` without it, `Transit -> Stop` only while
/// still approaching the stop line, and any tracked state `-> Leave` once
/// the vehicle is past it.
pub fn next_state(current: VehicleJunctionState, input: TransitionInput) -> VehicleJunctionState {
    use VehicleJunctionState as S;

    let clear = input.clear || input.class.never_blocks();
    match (current, input.position) {
        (S::None, ApproachPosition::Beyond) => S::None,
        (S::None, _) => S::Enter,
        (S::Leave, _) => S::None,
        (_, ApproachPosition::Beyond) => S::Leave,
        (S::Enter | S::Stop, _) if clear => S::Transit,
        (S::Enter | S::Stop, _) => S::Stop,
        (S::Transit, ApproachPosition::Approaching) if !clear => S::Stop,
        (S::Transit, _) => S::Transit,
    }
}

/// Vehicle state arena indexed by host vehicle slot.
#[derive(Resource, Debug, Default)]
pub struct PriorityVehicles {
    slots: Vec<PriorityVehicleState>,
}

impl PriorityVehicles {
    pub fn get(&self, vehicle: VehicleId) -> Option<&PriorityVehicleState> {
        self.slots.get(vehicle.0 as usize)
    }

    pub fn get_mut(&mut self, vehicle: VehicleId) -> Option<&mut PriorityVehicleState> {
        self.slots.get_mut(vehicle.0 as usize)
    }

    /// Slot for a vehicle, growing the arena on demand. `None` for ids past
    /// [`MAX_VEHICLE_SLOTS`].
    pub fn slot_mut(&mut self, vehicle: VehicleId) -> Option<&mut PriorityVehicleState> {
        let index = vehicle.0 as usize;
        if index >= MAX_VEHICLE_SLOTS {
            return None;
        }
        if index >= self.slots.len() {
            self.slots.resize(index + 1, PriorityVehicleState::default());
        }
        self.slots.get_mut(index)
    }

    pub fn state(&self, vehicle: VehicleId) -> VehicleJunctionState {
        self.get(vehicle).map(|s| s.state).unwrap_or_default()
    }

    pub fn is_tracked(&self, vehicle: VehicleId) -> bool {
        self.get(vehicle).is_some_and(PriorityVehicleState::is_tracked)
    }

    /// Return a slot to its defaults so the host can reuse it.
    pub fn reset(&mut self, vehicle: VehicleId) {
        if let Some(slot) = self.get_mut(vehicle) {
            *slot = PriorityVehicleState::default();
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_tracked()).count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
