//! Property tests for the look-ahead invariants of the command buffer.

use millstream_communication::CommandBuffer;
use proptest::prelude::*;

proptest! {
    /// With no advancing, the look-ahead slot always holds the first
    /// appended command.
    #[test]
    fn current_is_first_appended_without_advance(count in 1usize..50) {
        let mut buffer = CommandBuffer::new();
        for i in 0..count {
            buffer.append(&format!("G4 P{i}"));
        }
        prop_assert_eq!(buffer.current().unwrap().text(), "G4 P0");
        prop_assert_eq!(buffer.size(), count - 1);
    }

    /// Advancing once per append drains the queue and parks the last
    /// command in the slot.
    #[test]
    fn advancing_once_per_append_drains_to_last(count in 1usize..50) {
        let mut buffer = CommandBuffer::new();
        for i in 0..count {
            buffer.append(&format!("G4 P{i}"));
        }
        for _ in 0..count {
            buffer.next_command();
        }
        prop_assert_eq!(buffer.size(), 0);
        let last = format!("G4 P{}", count - 1);
        prop_assert_eq!(buffer.current().unwrap().text(), last.as_str());
    }

    /// The slot never becomes empty once populated, whatever the
    /// interleaving of appends and advances.
    #[test]
    fn slot_never_empties_once_populated(ops in proptest::collection::vec(any::<bool>(), 1..100)) {
        let mut buffer = CommandBuffer::new();
        buffer.append("G21");
        for (i, append) in ops.iter().enumerate() {
            if *append {
                buffer.append(&format!("G4 P{i}"));
            } else {
                buffer.next_command();
            }
            prop_assert!(buffer.current().is_some());
        }
    }
}
