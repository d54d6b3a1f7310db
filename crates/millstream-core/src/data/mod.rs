//! Data models for positions, units, and controller status
//!
//! This module provides:
//! - 3-axis position tracking
//! - Unit management (MM, INCH)
//! - Controller state and status reports pushed in from the transport layer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine coordinate units (millimeters or inches)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    /// Millimeters (metric)
    MM,
    /// Inches (imperial)
    INCH,
}

impl Units {
    /// Scale factor for converting a value between units
    pub fn scale(from: Units, to: Units) -> f64 {
        match (from, to) {
            (Units::MM, Units::INCH) => 1.0 / 25.4,
            (Units::INCH, Units::MM) => 25.4,
            _ => 1.0,
        }
    }

    /// Convert a value from one unit to another
    pub fn convert(value: f64, from: Units, to: Units) -> f64 {
        value * Units::scale(from, to)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::MM => write!(f, "mm"),
            Units::INCH => write!(f, "in"),
        }
    }
}

/// A 3-axis machine position
///
/// Axis values may be NaN in intermediate computations to mark an axis
/// as "absent" from a command word; positions stored in interpreter
/// state are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The machine origin
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Scale all axes by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean distance to another position in the XY plane
    pub fn distance_xy(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::origin()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Controller state as reported by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    /// Not connected to any controller
    Disconnected,
    /// Connected and idle, ready for commands
    Idle,
    /// Executing a G-code program
    Run,
    /// Program paused, awaiting resume
    Hold,
    /// Manual jog/movement mode
    Jog,
    /// Machine alarm state (requires manual intervention)
    Alarm,
    /// Check mode (dry-run without machine movement)
    Check,
    /// Safety door interlock triggered
    Door,
    /// Homing cycle in progress
    Home,
    /// Low-power sleep state
    Sleep,
}

/// Override percentages reported by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverridePercents {
    /// Feed rate override percentage
    pub feed: i32,
    /// Spindle speed override percentage
    pub spindle: i32,
}

impl Default for OverridePercents {
    fn default() -> Self {
        Self {
            feed: 100,
            spindle: 100,
        }
    }
}

/// A status report pushed in from the controller/transport layer
///
/// The override manager consumes these asynchronously; the rest of the
/// core never blocks on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerStatus {
    /// Current machine state
    pub state: ControllerState,
    /// Current override percentages
    pub overrides: OverridePercents,
}

impl ControllerStatus {
    /// Create a new status report
    pub fn new(state: ControllerState, feed: i32, spindle: i32) -> Self {
        Self {
            state,
            overrides: OverridePercents { feed, spindle },
        }
    }
}
