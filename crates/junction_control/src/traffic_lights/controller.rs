//! `TrafficLightControl`: per-node manual/timed light control.
//!
//! A node is in exactly one of three modes. Stock means no controller record
//! and no overrides. Manual means a controller with `manual` set and one
//! override per incident segment. Timed means a controller with `timed` set,
//! membership in exactly one [`TimedProgram`] group, and overrides written by
//! that program.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::network::{NodeId, RoadNetworkView, SegmentId};
use crate::results::{ControlError, ControlResult};
use crate::stock_lights::{LightPair, LightState, StockLights};

use super::overrides::LightOverrides;
use super::timed::{TimedProgram, TimedPrograms, TimedStep};
use super::types::{IntersectionController, LightChannel, LightOverride, LightSource, StepOutcome};

#[derive(Resource, Debug, Default)]
pub struct TrafficLightControl {
    pub(super) controllers: HashMap<NodeId, IntersectionController>,
    pub(super) overrides: LightOverrides,
    pub(super) programs: TimedPrograms,
}

impl TrafficLightControl {
    // =========================================================================
    // Queries
    // =========================================================================

    pub fn controller(&self, node: NodeId) -> Option<&IntersectionController> {
        self.controllers.get(&node)
    }

    /// Nodes with a controller record, sorted by id.
    pub fn controlled_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.controllers.keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    /// Whether the node runs manual or timed control instead of stock lights.
    pub fn has_custom_simulation(&self, node: NodeId) -> bool {
        self.controllers
            .get(&node)
            .is_some_and(|c| !c.is_detached())
    }

    pub fn get_override_color(&self, node: NodeId, segment: SegmentId) -> Option<LightPair> {
        self.overrides.get(node, segment).map(|o| o.lights)
    }

    pub fn get_override(&self, node: NodeId, segment: SegmentId) -> Option<&LightOverride> {
        self.overrides.get(node, segment)
    }

    pub fn overrides(&self) -> &LightOverrides {
        &self.overrides
    }

    pub fn programs(&self) -> &TimedPrograms {
        &self.programs
    }

    pub fn program_of(&self, node: NodeId) -> Option<&TimedProgram> {
        self.programs.program_of(node)
    }

    /// Current step index of the node's timed program.
    pub fn timed_step_index(&self, node: NodeId) -> Option<usize> {
        self.programs.step_index(node)
    }

    /// Which mechanism decides the light shown on a segment end.
    pub fn light_source(&self, node: NodeId, segment: SegmentId) -> LightSource {
        if !self.overrides.contains(node, segment) {
            return LightSource::Stock;
        }
        match self.controllers.get(&node).map(IntersectionController::mode) {
            Some(LightSource::Timed) => LightSource::Timed,
            _ => LightSource::Manual,
        }
    }

    // =========================================================================
    // Manual control
    // =========================================================================

    /// Switch a node to manual control, seeding every unlit segment from the
    /// stock light of the previous 256-tick window.
    pub fn enable_manual(
        &mut self,
        node: NodeId,
        network: &RoadNetworkView,
        stock: &StockLights,
        tick: u64,
    ) -> ControlResult {
        if network.node(node).is_none() {
            return reject(ControlError::UnknownNode(node));
        }
        let existing = self.controllers.get(&node).copied();
        if existing.is_some_and(|c| c.timed) {
            return reject(ControlError::TimedActive(node));
        }

        let seeded = self.overrides.seed_from_stock(node, network, stock, tick);
        if existing.is_some_and(|c| c.manual) && seeded == 0 {
            return ControlResult::Unchanged;
        }

        self.controllers
            .entry(node)
            .or_insert_with(|| IntersectionController::new(node))
            .manual = true;
        info!("Manual lights enabled on node {:?} ({} segments seeded)", node, seeded);
        ControlResult::Success
    }

    /// Drop all overrides of a manual node and hand it back to stock lights.
    pub fn disable_manual(&mut self, node: NodeId) -> ControlResult {
        match self.controllers.get(&node) {
            None => return reject(ControlError::NotManual(node)),
            Some(c) if c.timed => return reject(ControlError::TimedActive(node)),
            Some(c) if !c.manual => return reject(ControlError::NotManual(node)),
            Some(_) => {}
        }

        let removed = self.overrides.remove_node(node);
        self.controllers.remove(&node);
        info!("Manual lights disabled on node {:?} ({} overrides removed)", node, removed);
        ControlResult::Success
    }

    /// Set both colours of one segment end. The node must be under manual or
    /// timed control.
    pub fn set_override_color(
        &mut self,
        node: NodeId,
        segment: SegmentId,
        lights: LightPair,
        network: &RoadNetworkView,
        tick: u64,
    ) -> ControlResult {
        if !network.is_incident(node, segment) {
            return reject(ControlError::SegmentNotAtNode(node, segment));
        }
        if !self.has_custom_simulation(node) {
            return reject(ControlError::NotControlled(node));
        }

        match self.overrides.get_mut(node, segment) {
            Some(entry) => {
                if entry.set_lights(lights, tick) {
                    ControlResult::Success
                } else {
                    ControlResult::Unchanged
                }
            }
            None => {
                // Segment attached after control was enabled.
                self.overrides
                    .insert(LightOverride::new(node, segment, lights, tick));
                ControlResult::Success
            }
        }
    }

    /// Set a single channel of one segment end, keeping the other colour.
    pub fn set_channel_color(
        &mut self,
        node: NodeId,
        segment: SegmentId,
        channel: LightChannel,
        state: LightState,
        network: &RoadNetworkView,
        tick: u64,
    ) -> ControlResult {
        let mut lights = self
            .get_override_color(node, segment)
            .unwrap_or_else(LightPair::red);
        match channel {
            LightChannel::Vehicle => lights.vehicle = state,
            LightChannel::Pedestrian => lights.pedestrian = state,
        }
        self.set_override_color(node, segment, lights, network, tick)
    }

    // =========================================================================
    // Timed control
    // =========================================================================

    /// Start a timed program for `node` plus `members`. The group keeps
    /// `node` first and drops duplicates.
    pub fn enable_timed(
        &mut self,
        node: NodeId,
        members: &[NodeId],
        network: &RoadNetworkView,
        stock: &StockLights,
        tick: u64,
    ) -> ControlResult {
        let mut group = Vec::with_capacity(members.len() + 1);
        group.push(node);
        group.extend_from_slice(members);
        self.enable_timed_group(&group, network, stock, tick)
    }

    /// Start a timed program for an explicit member list.
    pub fn enable_timed_group(
        &mut self,
        members: &[NodeId],
        network: &RoadNetworkView,
        stock: &StockLights,
        tick: u64,
    ) -> ControlResult {
        let mut group: Vec<NodeId> = Vec::with_capacity(members.len());
        for &member in members {
            if !group.contains(&member) {
                group.push(member);
            }
        }
        if group.is_empty() {
            return reject(ControlError::EmptyGroup);
        }
        if let Some(&unknown) = group.iter().find(|m| network.node(**m).is_none()) {
            return reject(ControlError::UnknownNode(unknown));
        }
        if let Some(&taken) = group.iter().find(|m| self.programs.group_of(**m).is_some()) {
            return reject(ControlError::AlreadyInGroup(taken));
        }

        for &member in &group {
            self.overrides.seed_from_stock(member, network, stock, tick);
            let ctrl = self
                .controllers
                .entry(member)
                .or_insert_with(|| IntersectionController::new(member));
            ctrl.manual = false;
            ctrl.timed = true;
            ctrl.timed_active = true;
        }

        let id = self.programs.create(group.clone());
        info!("Timed program {:?} enabled on nodes {:?}", id, group);
        ControlResult::Success
    }

    /// Tear down the whole timed group the node belongs to.
    pub fn disable_timed(&mut self, node: NodeId) -> ControlResult {
        let Some(program) = self.programs.remove_group_of(node) else {
            return reject(ControlError::NotTimed(node));
        };
        for member in &program.members {
            self.overrides.remove_node(*member);
            self.controllers.remove(member);
        }
        info!(
            "Timed program {:?} disabled on nodes {:?}",
            program.id, program.members
        );
        ControlResult::Success
    }

    /// Append a step that snapshots the current overrides of every group member.
    pub fn add_timed_step(&mut self, node: NodeId, duration: u32) -> ControlResult {
        let Self {
            programs,
            overrides,
            ..
        } = self;
        let Some(program) = programs.program_of_mut(node) else {
            return reject(ControlError::NotTimed(node));
        };

        let mut lights: Vec<(NodeId, SegmentId, LightPair)> = overrides
            .iter()
            .filter(|o| program.contains(o.node))
            .map(|o| (o.node, o.segment, o.lights))
            .collect();
        lights.sort_unstable_by_key(|(n, s, _)| (*n, *s));

        program.steps.push(TimedStep { duration, lights });
        debug!(
            "Timed program {:?}: step {} added ({} program ticks)",
            program.id,
            program.steps.len() - 1,
            duration
        );
        ControlResult::Success
    }

    /// Pause or resume the node's timed program without removing it.
    pub fn set_timed_active(&mut self, node: NodeId, active: bool) -> ControlResult {
        let Some(program) = self.programs.program_of_mut(node) else {
            return reject(ControlError::NotTimed(node));
        };
        if program.active == active {
            return ControlResult::Unchanged;
        }
        program.active = active;
        let members = program.members.clone();
        for member in &members {
            if let Some(ctrl) = self.controllers.get_mut(member) {
                ctrl.timed_active = active;
            }
        }
        info!(
            "Timed program on nodes {:?} {}",
            members,
            if active { "resumed" } else { "paused" }
        );
        ControlResult::Success
    }

    // =========================================================================
    // Per-tick step
    // =========================================================================

    /// Advance the node's timed program (if any) and refresh display
    /// durations. A running timed node with an unlit incident segment has
    /// lost its program; the whole group is reset to stock and reported as
    /// cleared. Paused groups are left alone until they resume.
    pub fn step(&mut self, node: NodeId, network: &RoadNetworkView, tick: u64) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let Some(ctrl) = self.controllers.get(&node).copied() else {
            return outcome;
        };

        if ctrl.timed && ctrl.timed_active {
            let Self {
                programs,
                overrides,
                ..
            } = self;
            if let Some(program) = programs.program_of_mut(node) {
                outcome.advanced = program.advance(tick, overrides);
            }
        }

        for segment in network.incident_segments(node) {
            match self.overrides.get_mut(node, segment) {
                Some(entry) => {
                    entry.displayed_ticks = tick.saturating_sub(entry.last_change_tick);
                }
                None if ctrl.timed && ctrl.timed_active => {
                    outcome.cleared = self.repair_lost_program(node);
                    break;
                }
                None => {}
            }
        }
        outcome
    }

    /// Reset every node of the node's timed group to stock. Returns the
    /// cleared nodes.
    pub fn repair_lost_program(&mut self, node: NodeId) -> Vec<NodeId> {
        let members = match self.programs.remove_group_of(node) {
            Some(program) => program.members,
            None => vec![node],
        };
        for member in &members {
            self.overrides.remove_node(*member);
            let detached = match self.controllers.get_mut(member) {
                Some(ctrl) => {
                    ctrl.timed = false;
                    ctrl.timed_active = false;
                    ctrl.is_detached()
                }
                None => false,
            };
            if detached {
                self.controllers.remove(member);
            }
        }
        warn!(
            "Timed program lost at node {:?}; reset nodes {:?} to stock lights",
            node, members
        );
        members
    }

    /// Forget a node entirely, e.g. after the host deleted it. Any timed
    /// group it belonged to is repaired.
    pub fn forget_node(&mut self, node: NodeId) {
        if self.programs.group_of(node).is_some() {
            self.repair_lost_program(node);
        }
        self.overrides.remove_node(node);
        self.controllers.remove(&node);
    }
}

fn reject(error: ControlError) -> ControlResult {
    warn!("Light control request rejected: {}", error);
    ControlResult::Error(error)
}
