//! Fixed behavioural constants for the junction control engine.
//!
//! These values mirror the host simulation's timing so that custom control
//! stays in step with stock behaviour. Runtime tunables live in
//! [`crate::params::JunctionParams`] instead.

/// Maximum number of segments incident to a single node.
pub const MAX_NODE_SEGMENTS: usize = 8;

/// Timed programs run on a slowed clock: one program tick per `1 << 6` raw ticks.
pub const TIMED_CLOCK_SHIFT: u32 = 6;

/// Stock light states are stored per 256-tick window (`tick >> 8`).
pub const LIGHT_WINDOW_BITS: u32 = 8;
pub const LIGHT_WINDOW_TICKS: u64 = 1 << LIGHT_WINDOW_BITS;

/// Manual/timed seeding reads the stock light from the previous window.
pub const SEED_WINDOW_OFFSET: u64 = LIGHT_WINDOW_TICKS;

/// Pedestrians wait this many ticks into a red-to-green window before crossing.
pub const PEDESTRIAN_GREEN_DWELL_TICKS: u64 = 60;

/// After this many ticks of a red window the pedestrian request is latched.
pub const PEDESTRIAN_RED_LATCH_TICKS: u64 = 196;

/// Divisor used to derive a node's phase offset inside the light window.
pub const PEDESTRIAN_PHASE_DIVISOR: u64 = 32768;

/// Upper bound on lanes visited per segment when walking lane lists.
pub const MAX_LANE_WALK: usize = 64;

/// Upper bound on tracked vehicle slots (host vehicle buffer size).
pub const MAX_VEHICLE_SLOTS: usize = 65536;
