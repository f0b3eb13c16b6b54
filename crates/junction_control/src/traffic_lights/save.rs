//! Save/load for `TrafficLightControl`.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::Saveable;

use super::controller::TrafficLightControl;
use super::timed::TimedProgram;
use super::types::{IntersectionController, LightOverride};

/// Serializable form of all custom light control, sorted for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct LightControlSnapshot {
    pub controllers: Vec<IntersectionController>,
    pub overrides: Vec<LightOverride>,
    pub programs: Vec<TimedProgram>,
}

impl TrafficLightControl {
    pub fn snapshot(&self) -> LightControlSnapshot {
        let mut controllers: Vec<IntersectionController> =
            self.controllers.values().copied().collect();
        controllers.sort_unstable_by_key(|c| c.node);

        let mut overrides: Vec<LightOverride> = self.overrides.iter().copied().collect();
        overrides.sort_unstable_by_key(|o| (o.node, o.segment));

        let mut programs: Vec<TimedProgram> = self.programs.iter().cloned().collect();
        programs.sort_unstable_by_key(|p| p.id);

        LightControlSnapshot {
            controllers,
            overrides,
            programs,
        }
    }

    pub fn from_snapshot(snapshot: LightControlSnapshot) -> Self {
        let mut control = Self::default();
        for ctrl in snapshot.controllers {
            control.controllers.insert(ctrl.node, ctrl);
        }
        for entry in snapshot.overrides {
            control.overrides.insert(entry);
        }
        for program in snapshot.programs {
            control.programs.insert(program);
        }
        control
    }
}

impl Saveable for TrafficLightControl {
    const SAVE_KEY: &'static str = "junction_lights";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        // Nothing to save when every node runs stock lights
        if self.controllers.is_empty() && self.overrides.is_empty() {
            return None;
        }
        Some(bitcode::encode(&self.snapshot()))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let snapshot: LightControlSnapshot = crate::decode_snapshot(Self::SAVE_KEY, bytes);
        Self::from_snapshot(snapshot)
    }
}
