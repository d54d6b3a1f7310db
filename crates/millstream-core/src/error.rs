//! Error handling for Millstream
//!
//! Provides error types for the interpreter and communication layers.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors related to G-Code parsing and processing.
/// The interpreter is deliberately permissive: malformed numeric words
/// degrade to an "absent" sentinel instead of failing, so the only hard
/// parse failure is a command that exceeds the configured length limit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Command exceeds the configured maximum length
    #[error("Command at line {line} is {length} characters long, exceeds maximum of {max}")]
    CommandTooLong {
        /// The line number of the offending command.
        line: i64,
        /// The actual command length in characters.
        length: usize,
        /// The configured maximum length.
        max: usize,
    },

    /// A command processor failed while transforming a command
    #[error("Processor '{processor}' failed on command '{command}': {reason}")]
    ProcessorFailed {
        /// The name of the processor that failed.
        processor: String,
        /// The command being processed.
        command: String,
        /// The reason for the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_their_context() {
        let err = GcodeError::CommandTooLong {
            line: 12,
            length: 80,
            max: 50,
        };
        assert_eq!(
            err.to_string(),
            "Command at line 12 is 80 characters long, exceeds maximum of 50"
        );

        let err = GcodeError::ProcessorFailed {
            processor: "arc_expander".into(),
            command: "G2 X1".into(),
            reason: "bad geometry".into(),
        };
        assert!(err.to_string().contains("arc_expander"));
        assert!(err.to_string().contains("G2 X1"));
    }
}
