//! Core records for custom traffic light control.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::network::{NodeId, SegmentId};
use crate::stock_lights::LightPair;

/// Where the light shown on a segment end comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum LightSource {
    /// Host simulation cycles the light itself.
    Stock,
    /// Explicit per-segment override set by the user.
    Manual,
    /// Override written by a timed program.
    Timed,
}

/// Explicit light colours for one node/segment pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct LightOverride {
    pub node: NodeId,
    pub segment: SegmentId,
    pub lights: LightPair,
    /// Tick of the last colour change.
    pub last_change_tick: u64,
    /// Ticks the current colours have been shown, refreshed by the node step.
    pub displayed_ticks: u64,
}

impl LightOverride {
    pub fn new(node: NodeId, segment: SegmentId, lights: LightPair, tick: u64) -> Self {
        Self {
            node,
            segment,
            lights,
            last_change_tick: tick,
            displayed_ticks: 0,
        }
    }

    /// Change colours, resetting the change timer only when something differs.
    pub fn set_lights(&mut self, lights: LightPair, tick: u64) -> bool {
        if self.lights == lights {
            return false;
        }
        self.lights = lights;
        self.last_change_tick = tick;
        self.displayed_ticks = 0;
        true
    }
}

/// Per-node control record. Present only while manual or timed control is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct IntersectionController {
    pub node: NodeId,
    pub manual: bool,
    pub timed: bool,
    pub timed_active: bool,
}

impl IntersectionController {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            ..Default::default()
        }
    }

    /// Light source for segments that carry an override.
    pub fn mode(&self) -> LightSource {
        if self.timed {
            LightSource::Timed
        } else if self.manual {
            LightSource::Manual
        } else {
            LightSource::Stock
        }
    }

    pub fn is_detached(&self) -> bool {
        !self.manual && !self.timed
    }
}

/// Result of stepping one node for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// The node's timed program advanced on this call.
    pub advanced: bool,
    /// Nodes whose timed program was found inconsistent and removed.
    pub cleared: Vec<NodeId>,
}

/// Which signal of a segment end an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum LightChannel {
    Vehicle,
    Pedestrian,
}
