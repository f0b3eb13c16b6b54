//! Runtime tunables for priority-sign arbitration.
//!
//! The speed reduction applied to vehicles held at a Stop/Yield sign is a
//! tunable curve, not a correctness contract. The only hard requirement is
//! monotonicity: more vehicles queued on the vehicle's own lane never yields a
//! smaller reduction. The fixed timing constants live in [`crate::config`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::priority::PriorityClass;
use crate::SaveableAppExt;

#[derive(Resource, Debug, Clone, Serialize, Deserialize, bitcode::Encode, bitcode::Decode)]
pub struct JunctionParams {
    /// Reduction applied to a held Yield vehicle with an empty queue (0..=1).
    pub yield_base_reduction: f32,
    /// Extra reduction per vehicle queued on the same lane.
    pub yield_reduction_per_vehicle: f32,
    /// Cap for Yield reductions.
    pub yield_max_reduction: f32,
    /// Reduction applied to a held Stop vehicle. Stop signs bring traffic to a halt.
    pub stop_reduction: f32,
}

impl Default for JunctionParams {
    fn default() -> Self {
        Self {
            yield_base_reduction: 0.5,
            yield_reduction_per_vehicle: 0.1,
            yield_max_reduction: 0.9,
            stop_reduction: 1.0,
        }
    }
}

impl JunctionParams {
    /// Fraction of speed removed from a vehicle held at a sign, given the
    /// occupancy of its own lane (the vehicle itself included).
    pub fn speed_reduction(&self, class: PriorityClass, lane_occupancy: u32) -> f32 {
        match class {
            PriorityClass::Stop => self.stop_reduction.clamp(0.0, 1.0),
            PriorityClass::Yield => {
                let queued = lane_occupancy.saturating_sub(1) as f32;
                (self.yield_base_reduction + queued * self.yield_reduction_per_vehicle.max(0.0))
                    .min(self.yield_max_reduction)
                    .clamp(0.0, 1.0)
            }
            PriorityClass::None | PriorityClass::Main => 0.0,
        }
    }
}

impl crate::Saveable for JunctionParams {
    const SAVE_KEY: &'static str = "junction_params";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        // Always saved so tuned curves survive a reload.
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_snapshot(Self::SAVE_KEY, bytes)
    }
}

pub struct JunctionParamsPlugin;

impl Plugin for JunctionParamsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<JunctionParams>()
            .register_saveable::<JunctionParams>();
    }
}
