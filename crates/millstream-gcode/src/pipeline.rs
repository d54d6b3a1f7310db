//! Command processor pipeline
//!
//! An ordered list of polymorphic command processors. Registration order
//! is a load-bearing part of the contract: whitespace stripping must run
//! before tokenizing-dependent processors, comment removal before
//! splitters that assume comment-free text.

use millstream_core::GcodeError;
use std::sync::Arc;
use tracing::warn;

use crate::parser;
use crate::state::ModalState;

/// Trait for G-Code command processors
///
/// Processors implement transformations, validations, and expansions of
/// G-Code commands. Most return a single command; an expander may return
/// many; return an empty vector to drop the command.
///
/// Processors that need whole-file statistics (bounding box, center of
/// mass) are constructed with pre-computed parameters from a prior scan
/// pass; see [`crate::stats::ProgramStats`].
pub trait CommandProcessor: Send + Sync {
    /// Name/identifier of this processor
    fn name(&self) -> &str;

    /// Short description of what this processor does
    fn description(&self) -> &str;

    /// Process a single command against the current modal state
    fn process(&self, command: &str, state: &ModalState) -> Result<Vec<String>, GcodeError>;
}

/// Arc-wrapped processor for thread-safe sharing
pub type ProcessorHandle = Arc<dyn CommandProcessor>;

/// Ordered collection of command processors
///
/// Each processor consumes every element currently in the working list
/// exactly once, in order; its own output is never re-fed to itself but
/// is fed to every subsequent processor.
#[derive(Default)]
pub struct ProcessorPipeline {
    processors: Vec<ProcessorHandle>,
}

impl ProcessorPipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Register a processor; insertion order is significant
    pub fn register(&mut self, processor: ProcessorHandle) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// List registered processors as (name, description) pairs
    pub fn list_processors(&self) -> Vec<(&str, &str)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.description()))
            .collect()
    }

    /// Remove all processors
    pub fn clear(&mut self) {
        self.processors.clear();
    }

    /// Apply all processors to a command, threading the modal state
    /// through intermediate results. Does not modify `initial_state`.
    pub fn preprocess(
        &self,
        command: &str,
        initial_state: &ModalState,
        max_command_length: usize,
    ) -> Result<Vec<String>, GcodeError> {
        let mut working = vec![command.to_string()];

        for processor in &self.processors {
            let mut temp_state = *initial_state;
            let mut next = Vec::new();

            for cmd in working.drain(..) {
                // An expander changes the last motion command, which would
                // make a following implicit-motion line parse wrongly;
                // pin it back to the state before this command.
                temp_state.last_motion_command = initial_state.last_motion_command;

                let intermediate = processor.process(&cmd, &temp_state).map_err(|e| {
                    warn!(processor = processor.name(), command = %cmd, error = %e,
                        "command processor failed");
                    GcodeError::ProcessorFailed {
                        processor: processor.name().to_string(),
                        command: cmd.clone(),
                        reason: e.to_string(),
                    }
                })?;

                for produced in &intermediate {
                    temp_state = advance_state(produced, temp_state, max_command_length)?;
                }

                next.extend(intermediate);
            }

            working = next;
        }

        Ok(working)
    }
}

/// Statically process one command to carry the modal state forward
fn advance_state(
    command: &str,
    state: ModalState,
    max_command_length: usize,
) -> Result<ModalState, GcodeError> {
    let metas = parser::process_command(command, state.sequence, &state, max_command_length)?;
    Ok(metas.last().map(|m| m.state).unwrap_or(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Suffixer(&'static str);

    impl CommandProcessor for Suffixer {
        fn name(&self) -> &str {
            "suffixer"
        }
        fn description(&self) -> &str {
            "appends a marker"
        }
        fn process(&self, command: &str, _state: &ModalState) -> Result<Vec<String>, GcodeError> {
            Ok(vec![format!("{}{}", command, self.0)])
        }
    }

    struct Duplicator;

    impl CommandProcessor for Duplicator {
        fn name(&self) -> &str {
            "duplicator"
        }
        fn description(&self) -> &str {
            "emits every command twice"
        }
        fn process(&self, command: &str, _state: &ModalState) -> Result<Vec<String>, GcodeError> {
            Ok(vec![command.to_string(), command.to_string()])
        }
    }

    #[test]
    fn processors_run_in_insertion_order() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline.register(Arc::new(Suffixer("A")));
        pipeline.register(Arc::new(Suffixer("B")));

        let out = pipeline.preprocess("G1X1", &ModalState::new(), 50).unwrap();
        assert_eq!(out, vec!["G1X1AB"]);
    }

    #[test]
    fn expansion_feeds_later_processors_but_not_itself() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline.register(Arc::new(Duplicator));
        pipeline.register(Arc::new(Suffixer("!")));

        let out = pipeline.preprocess("G1X1", &ModalState::new(), 50).unwrap();
        // Duplicated once (not recursively), then each suffixed.
        assert_eq!(out, vec!["G1X1!", "G1X1!"]);
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let pipeline = ProcessorPipeline::new();
        let out = pipeline.preprocess("G1 X1", &ModalState::new(), 50).unwrap();
        assert_eq!(out, vec!["G1 X1"]);
    }
}
