//! G-Code interpreter and transformation pipeline
//!
//! This module provides:
//! - G-Code command parsing with modal state tracking
//! - Point segment emission for visualization and CAM consumers
//! - Stateless token/geometry utilities
//! - Command processor pipeline with order-preserving expansion
//! - Whole-program statistics for two-phase transforms

pub mod code;
pub mod parser;
pub mod pipeline;
pub mod point_segment;
pub mod preprocessor;
pub mod processors;
pub mod state;
pub mod stats;

pub use code::Code;
pub use parser::{GcodeMeta, GcodeParser, DEFAULT_MAX_COMMAND_LENGTH};
pub use pipeline::{CommandProcessor, ProcessorHandle, ProcessorPipeline};
pub use point_segment::{ArcProperties, PointSegment};
pub use state::{ModalState, Plane};
pub use stats::ProgramStats;
