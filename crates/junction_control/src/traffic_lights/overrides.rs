//! Manual light overrides (the storage behind manual and timed control).
//!
//! A segment end is manually lit exactly when it has an entry here; absence of
//! an entry means the host's stock light applies.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::SEED_WINDOW_OFFSET;
use crate::network::{NodeId, RoadNetworkView, SegmentId};
use crate::stock_lights::{LightPair, StockLights};

use super::types::LightOverride;

#[derive(Debug, Default, Clone)]
pub struct LightOverrides {
    entries: HashMap<(NodeId, SegmentId), LightOverride>,
}

impl LightOverrides {
    pub fn get(&self, node: NodeId, segment: SegmentId) -> Option<&LightOverride> {
        self.entries.get(&(node, segment))
    }

    pub fn get_mut(&mut self, node: NodeId, segment: SegmentId) -> Option<&mut LightOverride> {
        self.entries.get_mut(&(node, segment))
    }

    pub fn contains(&self, node: NodeId, segment: SegmentId) -> bool {
        self.entries.contains_key(&(node, segment))
    }

    pub fn insert(&mut self, entry: LightOverride) {
        self.entries.insert((entry.node, entry.segment), entry);
    }

    pub fn remove(&mut self, node: NodeId, segment: SegmentId) -> Option<LightOverride> {
        self.entries.remove(&(node, segment))
    }

    /// Drop every override of a node. Returns how many were removed.
    pub fn remove_node(&mut self, node: NodeId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(n, _), _| *n != node);
        before - self.entries.len()
    }

    pub fn count_for(&self, node: NodeId) -> usize {
        self.entries.keys().filter(|(n, _)| *n == node).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightOverride> {
        self.entries.values()
    }

    /// Seed an override for every incident segment of `node` that has none,
    /// copying the stock light of the previous 256-tick window: green stays
    /// green, anything else becomes red. Returns how many overrides were added.
    pub fn seed_from_stock(
        &mut self,
        node: NodeId,
        network: &RoadNetworkView,
        stock: &StockLights,
        tick: u64,
    ) -> usize {
        let observed_tick = tick.wrapping_sub(SEED_WINDOW_OFFSET);
        let mut seeded = 0;
        for segment in network.incident_segments(node) {
            if self.contains(node, segment) {
                continue;
            }
            let lights = stock
                .get(node, segment, observed_tick)
                .map(|w| LightPair::new(w.lights.vehicle.seeded(), w.lights.pedestrian.seeded()))
                .unwrap_or_else(LightPair::red);
            self.insert(LightOverride::new(node, segment, lights, tick));
            seeded += 1;
        }
        debug!("Seeded {} light overrides on node {:?}", seeded, node);
        seeded
    }
}
