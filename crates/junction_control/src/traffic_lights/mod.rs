mod controller;
mod overrides;
mod plugin;
mod save;
mod timed;
mod types;

pub use controller::TrafficLightControl;
pub use overrides::LightOverrides;
pub use plugin::TrafficLightsPlugin;
pub use save::LightControlSnapshot;
pub use timed::{program_clock, GroupId, TimedProgram, TimedPrograms, TimedStep};
pub use types::{IntersectionController, LightChannel, LightOverride, LightSource, StepOutcome};
