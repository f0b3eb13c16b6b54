//! User-facing junction commands (tools, UI panels, scripted agents).
//!
//! Commands arrive as [`JunctionCommand`] events and are applied at the start
//! of each fixed tick, before any node is stepped. Every result is recorded
//! in the [`CommandResultLog`] ring buffer.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::network::{NodeId, RoadNetworkView, SegmentId};
use crate::priority::{PriorityClass, PrioritySegments};
use crate::results::ControlResult;
use crate::stock_lights::{LightPair, LightState, StockLights};
use crate::traffic_lights::{LightChannel, TrafficLightControl};
use crate::{SimulationSet, TickCounter};

/// Maximum number of entries retained in the result log.
const MAX_LOG_ENTRIES: usize = 64;

#[derive(Event, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum JunctionCommand {
    EnableManual {
        node: NodeId,
    },
    DisableManual {
        node: NodeId,
    },
    /// `members` are added to `node`'s group; `node` itself is always included.
    EnableTimed {
        node: NodeId,
        members: Vec<NodeId>,
    },
    DisableTimed {
        node: NodeId,
    },
    SetOverrideColor {
        node: NodeId,
        segment: SegmentId,
        lights: LightPair,
    },
    SetChannelColor {
        node: NodeId,
        segment: SegmentId,
        channel: LightChannel,
        state: LightState,
    },
    AddTimedStep {
        node: NodeId,
        duration: u32,
    },
    SetTimedActive {
        node: NodeId,
        active: bool,
    },
    ClassifySegment {
        node: NodeId,
        segment: SegmentId,
        class: PriorityClass,
    },
}

/// Ring buffer of the last [`MAX_LOG_ENTRIES`] command/result pairs.
#[derive(Resource, Debug, Clone, Default)]
pub struct CommandResultLog {
    entries: Vec<(JunctionCommand, ControlResult)>,
}

impl CommandResultLog {
    pub fn push(&mut self, command: JunctionCommand, result: ControlResult) {
        if self.entries.len() >= MAX_LOG_ENTRIES {
            self.entries.remove(0);
        }
        self.entries.push((command, result));
    }

    /// Return the last `n` entries (or fewer if the log is shorter).
    pub fn last_n(&self, n: usize) -> &[(JunctionCommand, ControlResult)] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn last(&self) -> Option<&(JunctionCommand, ControlResult)> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply one command. Rejections leave every resource untouched.
pub fn apply_command(
    command: &JunctionCommand,
    tick: u64,
    control: &mut TrafficLightControl,
    priority: &mut PrioritySegments,
    network: &RoadNetworkView,
    stock: &StockLights,
) -> ControlResult {
    match command {
        JunctionCommand::EnableManual { node } => control.enable_manual(*node, network, stock, tick),
        JunctionCommand::DisableManual { node } => control.disable_manual(*node),
        JunctionCommand::EnableTimed { node, members } => {
            control.enable_timed(*node, members, network, stock, tick)
        }
        JunctionCommand::DisableTimed { node } => control.disable_timed(*node),
        JunctionCommand::SetOverrideColor {
            node,
            segment,
            lights,
        } => control.set_override_color(*node, *segment, *lights, network, tick),
        JunctionCommand::SetChannelColor {
            node,
            segment,
            channel,
            state,
        } => control.set_channel_color(*node, *segment, *channel, *state, network, tick),
        JunctionCommand::AddTimedStep { node, duration } => {
            control.add_timed_step(*node, *duration)
        }
        JunctionCommand::SetTimedActive { node, active } => {
            control.set_timed_active(*node, *active)
        }
        JunctionCommand::ClassifySegment {
            node,
            segment,
            class,
        } => priority.classify_segment(*node, *segment, *class, network),
    }
}

pub fn handle_junction_commands(
    mut commands: EventReader<JunctionCommand>,
    tick: Res<TickCounter>,
    network: Res<RoadNetworkView>,
    stock: Res<StockLights>,
    mut control: ResMut<TrafficLightControl>,
    mut priority: ResMut<PrioritySegments>,
    mut log: ResMut<CommandResultLog>,
) {
    for command in commands.read() {
        let result = apply_command(
            command,
            tick.0,
            &mut control,
            &mut priority,
            &network,
            &stock,
        );
        log.push(command.clone(), result);
    }
}

pub struct CommandsPlugin;

impl Plugin for CommandsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandResultLog>()
            .add_event::<JunctionCommand>()
            .add_systems(
                FixedUpdate,
                handle_junction_commands
                    .after(crate::advance_tick)
                    .in_set(SimulationSet::PreSim),
            );
    }
}
