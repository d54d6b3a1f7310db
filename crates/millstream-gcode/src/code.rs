//! G-code word lookup
//!
//! The interpreter only assigns meaning to the motion/plane/units/distance
//! subset below. Any other G word is logged and skipped so that unknown
//! dialect extensions never fail parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recognized G code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
    /// Rapid positioning
    G0,
    /// Linear interpolation
    G1,
    /// Clockwise arc
    G2,
    /// Counter-clockwise arc
    G3,
    /// XY plane selection
    G17,
    /// ZX plane selection
    G18,
    /// YZ plane selection
    G19,
    /// UV plane selection
    G17_1,
    /// WU plane selection
    G18_1,
    /// VW plane selection
    G19_1,
    /// Units: inches
    G20,
    /// Units: millimeters
    G21,
    /// Absolute distance mode
    G90,
    /// Absolute arc (IJK) distance mode
    G90_1,
    /// Incremental distance mode
    G91,
    /// Incremental arc (IJK) distance mode
    G91_1,
}

impl Code {
    /// Look up a code from the numeric portion of a G word, e.g. "0", "02",
    /// "17.1". Returns `None` for anything the interpreter has no semantics
    /// for.
    pub fn from_number(number: &str) -> Option<Code> {
        let value: f64 = number.trim().parse().ok()?;
        let whole = value.trunc() as i32;
        let tenth = ((value - value.trunc()) * 10.0).round() as i32;

        match (whole, tenth) {
            (0, 0) => Some(Code::G0),
            (1, 0) => Some(Code::G1),
            (2, 0) => Some(Code::G2),
            (3, 0) => Some(Code::G3),
            (17, 0) => Some(Code::G17),
            (18, 0) => Some(Code::G18),
            (19, 0) => Some(Code::G19),
            (17, 1) => Some(Code::G17_1),
            (18, 1) => Some(Code::G18_1),
            (19, 1) => Some(Code::G19_1),
            (20, 0) => Some(Code::G20),
            (21, 0) => Some(Code::G21),
            (90, 0) => Some(Code::G90),
            (90, 1) => Some(Code::G90_1),
            (91, 0) => Some(Code::G91),
            (91, 1) => Some(Code::G91_1),
            _ => None,
        }
    }

    /// Look up a code from a full word like "G2", "g02" or "G17.1"
    pub fn lookup(word: &str) -> Option<Code> {
        if word.len() < 2 || !word.is_char_boundary(1) {
            return None;
        }
        let (letter, number) = word.split_at(1);
        if !letter.eq_ignore_ascii_case("G") {
            return None;
        }
        Code::from_number(number)
    }

    /// Whether this code belongs to the motion modal group
    pub fn is_motion(self) -> bool {
        matches!(self, Code::G0 | Code::G1 | Code::G2 | Code::G3)
    }

    /// Whether this code selects an arc/offset plane
    pub fn is_plane(self) -> bool {
        matches!(
            self,
            Code::G17 | Code::G18 | Code::G19 | Code::G17_1 | Code::G18_1 | Code::G19_1
        )
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::G0 => "G0",
            Code::G1 => "G1",
            Code::G2 => "G2",
            Code::G3 => "G3",
            Code::G17 => "G17",
            Code::G18 => "G18",
            Code::G19 => "G19",
            Code::G17_1 => "G17.1",
            Code::G18_1 => "G18.1",
            Code::G19_1 => "G19.1",
            Code::G20 => "G20",
            Code::G21 => "G21",
            Code::G90 => "G90",
            Code::G90_1 => "G90.1",
            Code::G91 => "G91",
            Code::G91_1 => "G91.1",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_handles_leading_zeros_and_case() {
        assert_eq!(Code::lookup("G0"), Some(Code::G0));
        assert_eq!(Code::lookup("g00"), Some(Code::G0));
        assert_eq!(Code::lookup("G02"), Some(Code::G2));
        assert_eq!(Code::lookup("g17.1"), Some(Code::G17_1));
        assert_eq!(Code::lookup("G90.1"), Some(Code::G90_1));
    }

    #[test]
    fn lookup_rejects_unknown_words() {
        assert_eq!(Code::lookup("G38.2"), None);
        assert_eq!(Code::lookup("M3"), None);
        assert_eq!(Code::lookup("G"), None);
        assert_eq!(Code::lookup("Gfoo"), None);
    }

    #[test]
    fn motion_group_membership() {
        assert!(Code::G0.is_motion());
        assert!(Code::G3.is_motion());
        assert!(!Code::G17.is_motion());
        assert!(!Code::G90.is_motion());
    }
}
