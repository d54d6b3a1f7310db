//! FIFO command buffer with a single-slot look-ahead.
//!
//! One producer appends prepared command text, one consumer promotes
//! commands into the "current" slot and streams them. The current slot
//! never becomes empty once populated: `next_command` leaves it unchanged
//! when the queue is drained, so the transmission loop always has a
//! command to inspect mid-stream. Both sides mutate the same slot, so the
//! owner must wrap the buffer in a lock when the threads differ.

use std::collections::VecDeque;

use crate::command::GcodeCommand;

#[derive(Debug, Default)]
pub struct CommandBuffer {
    queue: VecDeque<GcodeCommand>,
    current: Option<GcodeCommand>,
    sequence: i64,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command with the next sequence number and enqueue it.
    ///
    /// If there is no current command, or the current one has already been
    /// sent, the oldest queued command is promoted to current immediately,
    /// so `current()` is observable right after the first append. Returns
    /// a copy of the command that was created.
    pub fn append(&mut self, text: &str) -> GcodeCommand {
        let command = GcodeCommand::new(text, self.sequence);
        self.sequence += 1;
        self.queue.push_back(command.clone());

        let promote = match &self.current {
            None => true,
            Some(c) => c.is_sent(),
        };
        if promote {
            self.current = self.queue.pop_front();
        }

        command
    }

    /// The command in the look-ahead slot, if any.
    pub fn current(&self) -> Option<&GcodeCommand> {
        self.current.as_ref()
    }

    /// Mutable access to the look-ahead slot, for marking sent/done.
    pub fn current_mut(&mut self) -> Option<&mut GcodeCommand> {
        self.current.as_mut()
    }

    /// Promote the next queued command into the current slot.
    ///
    /// When the queue is empty the current slot is left unchanged; the
    /// returned reference is whatever occupies the slot afterwards.
    pub fn next_command(&mut self) -> Option<&GcodeCommand> {
        if let Some(next) = self.queue.pop_front() {
            self.current = Some(next);
        }
        self.current.as_ref()
    }

    /// Number of queued commands not yet promoted to current.
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.current.is_none()
    }

    /// Drop all queued commands, the current slot, and restart numbering.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
        self.sequence = 0;
    }
}
