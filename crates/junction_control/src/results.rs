//! Results of user-facing control requests (light modes, priority signs).
//!
//! Per-tick simulation never fails; only explicit requests can be rejected,
//! and a rejected request leaves all state unchanged.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::network::{NodeId, SegmentId};

/// Outcome of a user-facing control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ControlResult {
    Success,
    /// Request was already satisfied; nothing changed.
    Unchanged,
    Error(ControlError),
}

impl ControlResult {
    /// `true` for both `Success` and `Unchanged`.
    pub fn is_success(&self) -> bool {
        matches!(self, ControlResult::Success | ControlResult::Unchanged)
    }

    pub fn error(&self) -> Option<&ControlError> {
        match self {
            ControlResult::Error(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ControlError {
    UnknownNode(NodeId),
    SegmentNotAtNode(NodeId, SegmentId),
    /// Node has neither manual nor timed control.
    NotControlled(NodeId),
    NotManual(NodeId),
    NotTimed(NodeId),
    /// Node belongs to a timed program; disable it first.
    TimedActive(NodeId),
    /// Node already belongs to another timed program.
    AlreadyInGroup(NodeId),
    EmptyGroup,
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::UnknownNode(n) => write!(f, "node {} is not in the network", n.0),
            ControlError::SegmentNotAtNode(n, s) => {
                write!(f, "segment {} is not incident to node {}", s.0, n.0)
            }
            ControlError::NotControlled(n) => {
                write!(f, "node {} has no custom light control", n.0)
            }
            ControlError::NotManual(n) => write!(f, "node {} is not in manual mode", n.0),
            ControlError::NotTimed(n) => write!(f, "node {} has no timed program", n.0),
            ControlError::TimedActive(n) => {
                write!(f, "node {} is controlled by a timed program", n.0)
            }
            ControlError::AlreadyInGroup(n) => {
                write!(f, "node {} already belongs to a timed program", n.0)
            }
            ControlError::EmptyGroup => write!(f, "timed program needs at least one node"),
        }
    }
}
