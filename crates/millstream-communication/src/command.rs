//! A single G-code command as tracked by the streaming layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One command in flight through the transmission loop.
///
/// Lifecycle: created, marked sent when written to the transport, marked
/// done when the controller acknowledges it. The response (ok/error text)
/// is recorded alongside the done flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcodeCommand {
    text: String,
    sequence: i64,
    sent: bool,
    done: bool,
    response: Option<String>,
}

impl GcodeCommand {
    pub fn new(text: impl Into<String>, sequence: i64) -> Self {
        Self {
            text: text.into(),
            sequence,
            sent: false,
            done: false,
            response: None,
        }
    }

    /// The command text, without a line terminator.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Controller response recorded by `mark_done`, if any.
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Mark the command as written to the transport.
    pub fn mark_sent(&mut self) {
        debug_assert!(!self.sent, "command {} sent twice", self.sequence);
        self.sent = true;
    }

    /// Mark the command as acknowledged by the controller.
    pub fn mark_done(&mut self, response: Option<String>) {
        debug_assert!(self.sent, "command {} done before sent", self.sequence);
        self.done = true;
        self.response = response;
    }
}

impl fmt::Display for GcodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.sequence, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_flags() {
        let mut cmd = GcodeCommand::new("G0 X1", 3);
        assert_eq!(cmd.text(), "G0 X1");
        assert_eq!(cmd.sequence(), 3);
        assert!(!cmd.is_sent());
        assert!(!cmd.is_done());

        cmd.mark_sent();
        assert!(cmd.is_sent());
        assert!(!cmd.is_done());

        cmd.mark_done(Some("ok".into()));
        assert!(cmd.is_done());
        assert_eq!(cmd.response(), Some("ok"));
    }
}
