use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::network::{LaneId, NodeId, SegmentId, VehicleId};

/// Right-of-way sign on one segment end.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum PriorityClass {
    /// Unclassified. Behaves like `Main`.
    #[default]
    None,
    Main,
    Stop,
    Yield,
}

impl PriorityClass {
    /// Precedence when two approaches compete: Main outranks Yield outranks Stop.
    pub fn rank(self) -> u8 {
        match self {
            PriorityClass::None | PriorityClass::Main => 2,
            PriorityClass::Yield => 1,
            PriorityClass::Stop => 0,
        }
    }

    /// Main and unclassified approaches never wait for anyone.
    pub fn never_blocks(self) -> bool {
        matches!(self, PriorityClass::None | PriorityClass::Main)
    }

    pub fn name(self) -> &'static str {
        match self {
            PriorityClass::None => "None",
            PriorityClass::Main => "Main",
            PriorityClass::Stop => "Stop",
            PriorityClass::Yield => "Yield",
        }
    }
}

/// Junction state of one vehicle.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum VehicleJunctionState {
    #[default]
    None,
    /// First observed approaching a classified segment.
    Enter,
    /// Allowed to cross.
    Transit,
    /// Held at the sign.
    Stop,
    /// Past the stop line; the slot is reset right after.
    Leave,
}

impl VehicleJunctionState {
    /// Waiting for clearance (not yet committed to crossing).
    pub fn is_waiting(self) -> bool {
        matches!(self, VehicleJunctionState::Enter | VehicleJunctionState::Stop)
    }
}

/// Where a vehicle is relative to the node's stop line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApproachPosition {
    Approaching,
    AtStopLine,
    Beyond,
}

/// Per-tick observation of a vehicle near a junction, sent by the host.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct VehicleApproachEvent {
    pub vehicle: VehicleId,
    pub node: NodeId,
    pub from_segment: SegmentId,
    pub from_lane: LaneId,
    /// Segment the vehicle will leave the node on, when its route knows it.
    pub to_segment: Option<SegmentId>,
    pub to_lane: Option<LaneId>,
    pub position: ApproachPosition,
    pub speed: f32,
}

/// Host released a vehicle slot (despawned, teleported, path reset).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleReleasedEvent {
    pub vehicle: VehicleId,
}

/// Arbitration result for one vehicle this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleDecision {
    pub vehicle: VehicleId,
    pub state: VehicleJunctionState,
    /// The vehicle may keep moving through the junction.
    pub may_proceed: bool,
    /// Fraction of speed to remove (0 = none, 1 = halt).
    pub speed_reduction: f32,
}

/// Decisions produced this tick, in event order. Cleared every tick.
#[derive(Resource, Debug, Default)]
pub struct VehicleDecisions {
    pub decisions: Vec<VehicleDecision>,
}

impl VehicleDecisions {
    pub fn get(&self, vehicle: VehicleId) -> Option<&VehicleDecision> {
        self.decisions.iter().rev().find(|d| d.vehicle == vehicle)
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
    }
}
