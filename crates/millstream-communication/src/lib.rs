//! Command streaming buffer and real-time override control.
//!
//! This crate covers the hand-off between prepared G-code and the
//! transmission loop: a FIFO buffer with a single-slot look-ahead
//! ([`CommandBuffer`]) and a feedback loop that steers the controller's
//! feed/spindle override percentages toward a target ([`OverrideManager`]).

pub mod buffer;
pub mod command;
pub mod override_manager;

pub use buffer::CommandBuffer;
pub use command::GcodeCommand;
pub use override_manager::{
    OverrideCommand, OverrideCommandSender, OverrideManager, OverrideType,
    DEFAULT_SETTLE_INTERVAL,
};
