//! Whole-program statistics
//!
//! The pre-scan half of the two-phase transform contract: geometric
//! processors (translate, rotate, mirror) need global file statistics
//! before the transform pass can run. Streaming single-pass transforms of
//! that family are deliberately unsupported.

use millstream_core::{GcodeError, Position};

use crate::parser::GcodeParser;

/// Bounding box and counts accumulated over a full program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramStats {
    /// Minimum coordinate reached on each axis
    pub min: Position,
    /// Maximum coordinate reached on each axis
    pub max: Position,
    /// Number of input lines scanned
    pub command_count: usize,
    /// Number of motion segments produced
    pub segment_count: usize,
}

impl ProgramStats {
    /// An empty accumulator
    pub fn new() -> Self {
        Self {
            min: Position::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Position::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            command_count: 0,
            segment_count: 0,
        }
    }

    /// Scan a whole program, interpreting each line in order
    pub fn scan<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, GcodeError> {
        let mut parser = GcodeParser::new();
        let mut stats = Self::new();

        for line in lines {
            stats.command_count += 1;
            for meta in parser.add_command(line)? {
                if let Some(segment) = meta.point {
                    stats.expand(segment.point);
                }
            }
        }

        Ok(stats)
    }

    /// Fold one endpoint into the bounding box
    pub fn expand(&mut self, p: Position) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
        self.segment_count += 1;
    }

    /// Center of the bounding box, or the origin for an empty program
    pub fn center(&self) -> Position {
        if self.segment_count == 0 {
            return Position::origin();
        }
        Position::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Extents of the bounding box, or zero for an empty program
    pub fn size(&self) -> Position {
        if self.segment_count == 0 {
            return Position::origin();
        }
        Position::new(
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}

impl Default for ProgramStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_computes_bounds_and_counts() {
        let program = ["G21 G90", "G0 X-5 Y-5", "G1 X15 Y5 F100", "G1 Z-2"];
        let stats = ProgramStats::scan(program).unwrap();

        assert_eq!(stats.command_count, 4);
        assert_eq!(stats.segment_count, 3);
        assert_eq!(stats.min, Position::new(-5.0, -5.0, -2.0));
        assert_eq!(stats.max, Position::new(15.0, 5.0, 0.0));
        assert_eq!(stats.center(), Position::new(5.0, 0.0, -1.0));
        assert_eq!(stats.size(), Position::new(20.0, 10.0, 2.0));
    }

    #[test]
    fn empty_program_has_origin_center() {
        let stats = ProgramStats::scan([]).unwrap();
        assert_eq!(stats.segment_count, 0);
        assert_eq!(stats.center(), Position::origin());
        assert_eq!(stats.size(), Position::origin());
    }
}
