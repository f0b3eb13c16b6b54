//! Timed light programs shared by a group of nodes.
//!
//! A program owns one step cursor for the whole group, so members can never
//! drift apart. Programs run on a slowed clock (`tick >> TIMED_CLOCK_SHIFT`)
//! and advance at most once per clock value no matter how many member nodes
//! are stepped in that window.

use std::collections::HashMap;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::TIMED_CLOCK_SHIFT;
use crate::network::{NodeId, SegmentId};
use crate::stock_lights::LightPair;

use super::overrides::LightOverrides;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct GroupId(pub u32);

/// One phase of a timed program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TimedStep {
    /// Length of the step in program ticks (64 raw ticks each). Zero acts as one.
    pub duration: u32,
    /// Colours shown during the step, per member segment end.
    pub lights: Vec<(NodeId, SegmentId, LightPair)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TimedProgram {
    pub id: GroupId,
    /// Member nodes in insertion order, without duplicates.
    pub members: Vec<NodeId>,
    pub steps: Vec<TimedStep>,
    pub cursor: usize,
    /// Program ticks spent in the current step.
    pub elapsed: u32,
    pub active: bool,
    /// Slow-clock value of the last advance.
    pub last_clock: Option<u64>,
    /// Total program ticks since activation.
    pub program_ticks: u64,
}

/// Slow clock value for a raw tick.
#[inline]
pub fn program_clock(tick: u64) -> u64 {
    tick >> TIMED_CLOCK_SHIFT
}

impl TimedProgram {
    pub fn new(id: GroupId, members: Vec<NodeId>) -> Self {
        Self {
            id,
            members,
            steps: Vec::new(),
            cursor: 0,
            elapsed: 0,
            active: true,
            last_clock: None,
            program_ticks: 0,
        }
    }

    pub fn step_index(&self) -> usize {
        self.cursor
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Advance one program tick if the slow clock moved since the last call.
    /// Returns `true` when the program advanced.
    pub fn advance(&mut self, tick: u64, overrides: &mut LightOverrides) -> bool {
        if !self.active {
            return false;
        }
        let clock = program_clock(tick);
        if self.last_clock == Some(clock) {
            return false;
        }
        self.last_clock = Some(clock);
        self.program_ticks += 1;

        if self.steps.is_empty() {
            return true;
        }
        self.cursor = self.cursor.min(self.steps.len() - 1);
        self.elapsed += 1;
        if self.elapsed >= self.steps[self.cursor].duration.max(1) {
            self.elapsed = 0;
            self.cursor = (self.cursor + 1) % self.steps.len();
            self.apply_current_step(overrides, tick);
        }
        true
    }

    /// Write the current step's colours into existing overrides. Segment ends
    /// without an override are left alone; the node step treats them as a
    /// lost program. Returns how many overrides changed colour.
    pub fn apply_current_step(&self, overrides: &mut LightOverrides, tick: u64) -> usize {
        let Some(step) = self.steps.get(self.cursor) else {
            return 0;
        };
        step.lights
            .iter()
            .filter(|(node, segment, lights)| {
                overrides
                    .get_mut(*node, *segment)
                    .is_some_and(|entry| entry.set_lights(*lights, tick))
            })
            .count()
    }
}

/// Arena of timed programs plus a member -> group side table.
#[derive(Debug, Default, Clone)]
pub struct TimedPrograms {
    programs: HashMap<GroupId, TimedProgram>,
    member_group: HashMap<NodeId, GroupId>,
    next_id: u32,
}

impl TimedPrograms {
    /// Register a new program. Members must not belong to another group; the
    /// caller validates that.
    pub fn create(&mut self, members: Vec<NodeId>) -> GroupId {
        self.next_id += 1;
        let id = GroupId(self.next_id);
        self.insert(TimedProgram::new(id, members));
        id
    }

    /// Insert a fully built program (used when restoring a save).
    pub fn insert(&mut self, program: TimedProgram) {
        self.next_id = self.next_id.max(program.id.0);
        for &member in &program.members {
            self.member_group.insert(member, program.id);
        }
        self.programs.insert(program.id, program);
    }

    pub fn group_of(&self, node: NodeId) -> Option<GroupId> {
        self.member_group.get(&node).copied()
    }

    pub fn get(&self, group: GroupId) -> Option<&TimedProgram> {
        self.programs.get(&group)
    }

    pub fn get_mut(&mut self, group: GroupId) -> Option<&mut TimedProgram> {
        self.programs.get_mut(&group)
    }

    pub fn program_of(&self, node: NodeId) -> Option<&TimedProgram> {
        self.group_of(node).and_then(|g| self.programs.get(&g))
    }

    pub fn program_of_mut(&mut self, node: NodeId) -> Option<&mut TimedProgram> {
        let group = self.group_of(node)?;
        self.programs.get_mut(&group)
    }

    /// Remove a whole group, returning it so callers can clean up members.
    pub fn remove_group(&mut self, group: GroupId) -> Option<TimedProgram> {
        let program = self.programs.remove(&group)?;
        for member in &program.members {
            if self.member_group.get(member) == Some(&group) {
                self.member_group.remove(member);
            }
        }
        Some(program)
    }

    pub fn remove_group_of(&mut self, node: NodeId) -> Option<TimedProgram> {
        let group = self.group_of(node)?;
        self.remove_group(group)
    }

    pub fn step_index(&self, node: NodeId) -> Option<usize> {
        self.program_of(node).map(TimedProgram::step_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedProgram> {
        self.programs.values()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
