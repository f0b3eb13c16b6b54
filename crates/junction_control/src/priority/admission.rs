use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::network::LaneId;

/// Occupancy of one lane of a priority segment: how many admitted vehicles
/// entered the junction from this lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct LaneAdmission {
    pub lane: LaneId,
    pub occupancy: u32,
}

impl LaneAdmission {
    pub fn new(lane: LaneId) -> Self {
        Self { lane, occupancy: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy == 0
    }
}
