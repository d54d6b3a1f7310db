//! # Millstream Core
//!
//! Core types and error taxonomy for Millstream, the machine-facing
//! "brain" of a CNC G-code sender. Provides the shared data models
//! (positions, units, controller status) used by the interpreter and
//! communication layers.

pub mod data;
pub mod error;

pub use data::{ControllerState, ControllerStatus, OverridePercents, Position, Units};
pub use error::GcodeError;
