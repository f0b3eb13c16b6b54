mod admission;
mod arbitration;
mod plugin;
mod registry;
mod save;
mod segment;
mod systems;
mod types;
mod vehicle;

pub use admission::LaneAdmission;
pub use arbitration::{has_clearance, paths_conflict, ConflictPath};
pub use plugin::PriorityPlugin;
pub use registry::PrioritySegments;
pub use save::PrioritySnapshot;
pub use segment::PrioritySegment;
pub use systems::{
    release_priority_vehicle, release_vehicles, update_priority_tick, update_priority_vehicle,
    update_priority_vehicles,
};
pub use types::{
    ApproachPosition, PriorityClass, VehicleApproachEvent, VehicleDecision, VehicleDecisions,
    VehicleJunctionState, VehicleReleasedEvent,
};
pub use vehicle::{next_state, PriorityVehicleState, PriorityVehicles, TransitionInput};
