//! Modal interpreter state
//!
//! Modal groups are persistent states that affect all subsequent commands
//! until changed by another command in the same group. The interpreter
//! never mutates a state it has handed out; each command is processed
//! against a copy which becomes authoritative only if parsing succeeds.

use millstream_core::Position;
use serde::{Deserialize, Serialize};

use crate::code::Code;

/// The pair of axes used to interpret arc and offset words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plane {
    /// G17
    XY,
    /// G18
    ZX,
    /// G19
    YZ,
    /// G17.1
    UV,
    /// G18.1
    WU,
    /// G19.1
    VW,
}

impl Plane {
    /// Plane selected by a plane-group code
    pub fn from_code(code: Code) -> Option<Plane> {
        match code {
            Code::G17 => Some(Plane::XY),
            Code::G18 => Some(Plane::ZX),
            Code::G19 => Some(Plane::YZ),
            Code::G17_1 => Some(Plane::UV),
            Code::G18_1 => Some(Plane::WU),
            Code::G19_1 => Some(Plane::VW),
            _ => None,
        }
    }

    /// First in-plane axis of a position
    pub fn axis0(&self, p: &Position) -> f64 {
        match self {
            Plane::XY | Plane::UV => p.x,
            Plane::ZX | Plane::WU => p.z,
            Plane::YZ | Plane::VW => p.y,
        }
    }

    /// Second in-plane axis of a position
    pub fn axis1(&self, p: &Position) -> f64 {
        match self {
            Plane::XY | Plane::UV => p.y,
            Plane::ZX | Plane::WU => p.x,
            Plane::YZ | Plane::VW => p.z,
        }
    }

    /// The axis perpendicular to the plane (helical component)
    pub fn linear(&self, p: &Position) -> f64 {
        match self {
            Plane::XY | Plane::UV => p.z,
            Plane::ZX | Plane::WU => p.y,
            Plane::YZ | Plane::VW => p.x,
        }
    }

    /// Set the first in-plane axis of a position
    pub fn set_axis0(&self, p: &mut Position, value: f64) {
        match self {
            Plane::XY | Plane::UV => p.x = value,
            Plane::ZX | Plane::WU => p.z = value,
            Plane::YZ | Plane::VW => p.y = value,
        }
    }

    /// Set the second in-plane axis of a position
    pub fn set_axis1(&self, p: &mut Position, value: f64) {
        match self {
            Plane::XY | Plane::UV => p.y = value,
            Plane::ZX | Plane::WU => p.x = value,
            Plane::YZ | Plane::VW => p.z = value,
        }
    }

    /// Set the perpendicular axis of a position
    pub fn set_linear(&self, p: &mut Position, value: f64) {
        match self {
            Plane::XY | Plane::UV => p.z = value,
            Plane::ZX | Plane::WU => p.y = value,
            Plane::YZ | Plane::VW => p.x = value,
        }
    }
}

/// Immutable-per-step snapshot of interpreter state
///
/// A `ModalState` produced for command *N* is a pure function of the
/// command history: replaying the interpreter over the same prefix of
/// commands reproduces it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    /// Units group: true for G21 (mm), false for G20 (inch)
    pub is_metric: bool,
    /// Distance group: true for G90 (absolute), false for G91 (incremental)
    pub absolute_mode: bool,
    /// Arc distance group: true for G90.1, false for G91.1
    pub absolute_ijk_mode: bool,
    /// Active plane for arcs and offsets
    pub plane: Plane,
    /// Last motion-group code, reused for modal continuation
    pub last_motion_command: Option<Code>,
    /// Endpoint of the most recently processed motion command
    pub current_point: Position,
    /// Active feed rate (F word)
    pub feed: f64,
    /// Active spindle speed (S word)
    pub spindle_speed: f64,
    /// Sequence number of the command this state resulted from
    pub sequence: i64,
}

impl ModalState {
    /// Initial state: metric, absolute, incremental IJK, XY plane, at the
    /// origin, before any command (`sequence == -1`).
    pub fn new() -> Self {
        Self {
            is_metric: true,
            absolute_mode: true,
            absolute_ijk_mode: false,
            plane: Plane::XY,
            last_motion_command: None,
            current_point: Position::origin(),
            feed: 0.0,
            spindle_speed: 0.0,
            sequence: -1,
        }
    }
}

impl Default for ModalState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_matches_machine_defaults() {
        let state = ModalState::new();
        assert!(state.is_metric);
        assert!(state.absolute_mode);
        assert!(!state.absolute_ijk_mode);
        assert_eq!(state.plane, Plane::XY);
        assert_eq!(state.current_point, Position::origin());
        assert_eq!(state.sequence, -1);
        assert!(state.last_motion_command.is_none());
    }

    #[test]
    fn plane_axis_selection() {
        let p = Position::new(1.0, 2.0, 3.0);
        assert_eq!(Plane::XY.axis0(&p), 1.0);
        assert_eq!(Plane::XY.axis1(&p), 2.0);
        assert_eq!(Plane::XY.linear(&p), 3.0);

        assert_eq!(Plane::ZX.axis0(&p), 3.0);
        assert_eq!(Plane::ZX.axis1(&p), 1.0);
        assert_eq!(Plane::ZX.linear(&p), 2.0);

        assert_eq!(Plane::YZ.axis0(&p), 2.0);
        assert_eq!(Plane::YZ.axis1(&p), 3.0);
        assert_eq!(Plane::YZ.linear(&p), 1.0);
    }

    #[test]
    fn rotary_variants_share_axis_mapping() {
        let p = Position::new(1.0, 2.0, 3.0);
        assert_eq!(Plane::UV.axis0(&p), Plane::XY.axis0(&p));
        assert_eq!(Plane::WU.axis1(&p), Plane::ZX.axis1(&p));
        assert_eq!(Plane::VW.linear(&p), Plane::YZ.linear(&p));
    }
}
