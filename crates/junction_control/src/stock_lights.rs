//! Stock (host-computed) traffic light states.
//!
//! The host keeps two light records per node/segment pair and alternates
//! between them every 256 ticks: the record for tick `t` is
//! `windows[(t >> 8) & 1]`. Reading `t - 256` therefore yields the previous
//! window, which is what manual seeding and pedestrian gating consume.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::LIGHT_WINDOW_BITS;
use crate::network::{NodeId, SegmentId};

/// Four-phase light state used for both vehicle and pedestrian signals.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum LightState {
    Green,
    RedToGreen,
    #[default]
    Red,
    GreenToRed,
}

impl LightState {
    pub fn is_green(self) -> bool {
        matches!(self, LightState::Green)
    }

    /// Red or about to turn red.
    pub fn is_red_phase(self) -> bool {
        matches!(self, LightState::Red | LightState::GreenToRed)
    }

    /// Collapse to the two colours manual control can express.
    pub fn seeded(self) -> Self {
        if self.is_green() {
            LightState::Green
        } else {
            LightState::Red
        }
    }
}

/// Vehicle and pedestrian colour for one segment end.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub struct LightPair {
    pub vehicle: LightState,
    pub pedestrian: LightState,
}

impl LightPair {
    pub fn new(vehicle: LightState, pedestrian: LightState) -> Self {
        Self {
            vehicle,
            pedestrian,
        }
    }

    pub fn green() -> Self {
        Self::new(LightState::Green, LightState::Green)
    }

    pub fn red() -> Self {
        Self::new(LightState::Red, LightState::Red)
    }
}

/// One 256-tick window of stock light state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockLightWindow {
    pub lights: LightPair,
    /// Vehicles are waiting at the light.
    pub vehicles_waiting: bool,
    /// Pedestrians have requested the crossing; set once per window.
    pub pedestrians_latched: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct StockLightSlot {
    windows: [StockLightWindow; 2],
}

/// Index of the window a tick falls into.
#[inline]
pub fn window_index(tick: u64) -> usize {
    ((tick >> LIGHT_WINDOW_BITS) & 1) as usize
}

/// Host-populated stock light table.
#[derive(Resource, Default, Debug)]
pub struct StockLights {
    slots: HashMap<(NodeId, SegmentId), StockLightSlot>,
}

impl StockLights {
    /// Record the stock light computed for `tick`. Clears both waiting flags
    /// for that window.
    pub fn set(&mut self, node: NodeId, segment: SegmentId, tick: u64, lights: LightPair) {
        let slot = self.slots.entry((node, segment)).or_default();
        slot.windows[window_index(tick)] = StockLightWindow {
            lights,
            vehicles_waiting: false,
            pedestrians_latched: false,
        };
    }

    pub fn get(&self, node: NodeId, segment: SegmentId, tick: u64) -> Option<StockLightWindow> {
        self.slots
            .get(&(node, segment))
            .map(|slot| slot.windows[window_index(tick)])
    }

    /// Latch the pedestrian request for the window containing `tick`.
    /// Returns `true` only the first time the latch is set.
    pub fn latch_pedestrians(&mut self, node: NodeId, segment: SegmentId, tick: u64) -> bool {
        let Some(slot) = self.slots.get_mut(&(node, segment)) else {
            return false;
        };
        let window = &mut slot.windows[window_index(tick)];
        if window.pedestrians_latched {
            return false;
        }
        window.pedestrians_latched = true;
        true
    }

    pub fn remove_node(&mut self, node: NodeId) {
        self.slots.retain(|(n, _), _| *n != node);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
