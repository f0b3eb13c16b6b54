//! Save/load for priority signs. Only classifications are persisted;
//! admissions are rebuilt from the next observations after a load.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::network::{NodeId, SegmentId};
use crate::Saveable;

use super::registry::PrioritySegments;
use super::segment::PrioritySegment;
use super::types::PriorityClass;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PrioritySnapshot {
    /// `(node, segment, class)` sorted by node then segment.
    pub signs: Vec<(NodeId, SegmentId, PriorityClass)>,
}

impl PrioritySegments {
    pub fn snapshot(&self) -> PrioritySnapshot {
        let mut signs: Vec<(NodeId, SegmentId, PriorityClass)> = self
            .iter()
            .map(|s| (s.node, s.segment, s.class))
            .collect();
        signs.sort_unstable_by_key(|(n, s, _)| (*n, *s));
        PrioritySnapshot { signs }
    }

    pub fn from_snapshot(snapshot: PrioritySnapshot) -> Self {
        let mut registry = Self::default();
        for (node, segment, class) in snapshot.signs {
            if class == PriorityClass::None {
                continue;
            }
            registry
                .segments
                .insert((node, segment), PrioritySegment::new(node, segment, class));
        }
        registry
    }
}

impl Saveable for PrioritySegments {
    const SAVE_KEY: &'static str = "junction_priority";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.is_empty() {
            return None;
        }
        Some(bitcode::encode(&self.snapshot()))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let snapshot: PrioritySnapshot = crate::decode_snapshot(Self::SAVE_KEY, bytes);
        Self::from_snapshot(snapshot)
    }
}
