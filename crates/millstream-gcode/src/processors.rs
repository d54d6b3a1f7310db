//! Command processor implementations
//!
//! Text-level transforms applied ahead of the interpreter. Order matters:
//! whitespace and comment handling come first, expansion and geometric
//! transforms afterwards.

use millstream_core::{GcodeError, Position};

use crate::parser;
use crate::pipeline::CommandProcessor;
use crate::preprocessor;
use crate::state::ModalState;

/// Removes leading and trailing whitespace from commands
///
/// Typically the first processor in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceProcessor;

impl WhitespaceProcessor {
    /// Create a new whitespace processor
    pub fn new() -> Self {
        Self
    }
}

impl CommandProcessor for WhitespaceProcessor {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn description(&self) -> &str {
        "Removes leading and trailing whitespace"
    }

    fn process(&self, command: &str, _state: &ModalState) -> Result<Vec<String>, GcodeError> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            Ok(vec![])
        } else {
            Ok(vec![trimmed.to_string()])
        }
    }
}

/// Removes G-code comments
///
/// Handles parenthesised `(...)` comments, semicolon-to-end-of-line
/// comments, and the `%` program-end marker.
#[derive(Debug, Clone, Default)]
pub struct CommentProcessor;

impl CommentProcessor {
    /// Create a new comment processor
    pub fn new() -> Self {
        Self
    }
}

impl CommandProcessor for CommentProcessor {
    fn name(&self) -> &str {
        "comment"
    }

    fn description(&self) -> &str {
        "Removes comments (parentheses, semicolon, and % marker)"
    }

    fn process(&self, command: &str, _state: &ModalState) -> Result<Vec<String>, GcodeError> {
        let stripped = preprocessor::remove_comment(command);
        if stripped.is_empty() {
            Ok(vec![])
        } else {
            Ok(vec![stripped])
        }
    }
}

/// Removes empty lines left over after comment and whitespace processing
#[derive(Debug, Clone, Default)]
pub struct EmptyLineRemoverProcessor;

impl EmptyLineRemoverProcessor {
    /// Create a new empty line remover
    pub fn new() -> Self {
        Self
    }
}

impl CommandProcessor for EmptyLineRemoverProcessor {
    fn name(&self) -> &str {
        "empty_line_remover"
    }

    fn description(&self) -> &str {
        "Removes empty lines"
    }

    fn process(&self, command: &str, _state: &ModalState) -> Result<Vec<String>, GcodeError> {
        if command.trim().is_empty() {
            Ok(vec![])
        } else {
            Ok(vec![command.to_string()])
        }
    }
}

/// Truncates decimal values to a fixed precision
///
/// Controllers with small parse buffers choke on long coordinate strings;
/// four decimal places is below the resolution of any hobby machine.
#[derive(Debug, Clone)]
pub struct DecimalProcessor {
    precision: usize,
}

impl DecimalProcessor {
    /// Create a decimal processor with the default precision (4 places)
    pub fn new() -> Self {
        Self { precision: 4 }
    }

    /// Create a decimal processor with a specific precision
    pub fn with_precision(precision: usize) -> Self {
        Self { precision }
    }
}

impl Default for DecimalProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandProcessor for DecimalProcessor {
    fn name(&self) -> &str {
        "decimal"
    }

    fn description(&self) -> &str {
        "Truncates decimal values to a configured precision"
    }

    fn process(&self, command: &str, _state: &ModalState) -> Result<Vec<String>, GcodeError> {
        Ok(vec![preprocessor::truncate_decimals(self.precision, command)])
    }
}

/// Expands arc commands (G2/G3) into linear segments
///
/// For controllers without native arc support. Relies on the threaded
/// modal state for the start point, plane, and IJK distance mode.
#[derive(Debug, Clone)]
pub struct ArcExpanderProcessor {
    segment_length: f64,
    precision: usize,
}

impl ArcExpanderProcessor {
    /// Create an arc expander emitting segments of roughly the given
    /// length (in the active units)
    pub fn new(segment_length: f64) -> Self {
        debug_assert!(segment_length > 0.0, "segment length must be positive");
        Self {
            segment_length,
            precision: 4,
        }
    }
}

impl CommandProcessor for ArcExpanderProcessor {
    fn name(&self) -> &str {
        "arc_expander"
    }

    fn description(&self) -> &str {
        "Expands arc commands into linear segments"
    }

    fn process(&self, command: &str, state: &ModalState) -> Result<Vec<String>, GcodeError> {
        let metas = parser::process_command(command, state.sequence, state, usize::MAX)?;

        let arc = metas.iter().find_map(|m| m.point.filter(|p| p.is_arc()));
        let Some(segment) = arc else {
            return Ok(vec![command.to_string()]);
        };
        let props = segment.arc.expect("arc segment without properties");

        let points = preprocessor::generate_points_along_arc(
            state.current_point,
            segment.point,
            props.center,
            props.is_clockwise,
            props.radius,
            self.segment_length,
            props.plane,
        );

        let mut expanded = Vec::with_capacity(points.len().saturating_sub(1));
        for (index, point) in points.iter().enumerate().skip(1) {
            let mut line = format!(
                "G1X{}Y{}Z{}",
                preprocessor::format_coordinate(point.x, self.precision),
                preprocessor::format_coordinate(point.y, self.precision),
                preprocessor::format_coordinate(point.z, self.precision),
            );
            if index == 1 && state.feed > 0.0 {
                line.push_str(&format!(
                    "F{}",
                    preprocessor::format_coordinate(state.feed, self.precision)
                ));
            }
            expanded.push(line);
        }

        Ok(expanded)
    }
}

/// Translates motion commands by a fixed offset
///
/// Two-phase transform: the offset is pre-computed from a whole-program
/// scan (e.g. to move the program center onto the machine origin) and
/// baked in at construction. Only rewrites absolute-mode coordinates;
/// incremental moves are translation-invariant.
#[derive(Debug, Clone)]
pub struct TranslateProcessor {
    offset: Position,
    precision: usize,
}

impl TranslateProcessor {
    /// Create a translator with a pre-computed offset
    pub fn new(offset: Position) -> Self {
        Self {
            offset,
            precision: 4,
        }
    }

    fn shift(&self, word: &str, state: &ModalState) -> Option<String> {
        let mut chars = word.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let value: f64 = chars.as_str().parse().ok()?;

        let shifted = match letter {
            'X' | 'Y' | 'Z' if state.absolute_mode => {
                let delta = match letter {
                    'X' => self.offset.x,
                    'Y' => self.offset.y,
                    _ => self.offset.z,
                };
                value + delta
            }
            'I' | 'J' | 'K' if state.absolute_ijk_mode => {
                let delta = match letter {
                    'I' => self.offset.x,
                    'J' => self.offset.y,
                    _ => self.offset.z,
                };
                value + delta
            }
            _ => return None,
        };

        Some(format!(
            "{}{}",
            letter,
            preprocessor::format_coordinate(shifted, self.precision)
        ))
    }
}

impl CommandProcessor for TranslateProcessor {
    fn name(&self) -> &str {
        "translate"
    }

    fn description(&self) -> &str {
        "Translates motion commands by a pre-computed offset"
    }

    fn process(&self, command: &str, state: &ModalState) -> Result<Vec<String>, GcodeError> {
        let words = preprocessor::split_command(command);
        if words.is_empty() {
            return Ok(vec![command.to_string()]);
        }

        let rewritten: Vec<String> = words
            .iter()
            .map(|w| self.shift(w, state).unwrap_or_else(|| w.clone()))
            .collect();

        Ok(vec![rewritten.join("")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProcessorPipeline;
    use std::sync::Arc;

    #[test]
    fn whitespace_and_comment_and_empty_interact() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline.register(Arc::new(CommentProcessor::new()));
        pipeline.register(Arc::new(WhitespaceProcessor::new()));
        pipeline.register(Arc::new(EmptyLineRemoverProcessor::new()));

        let state = ModalState::new();
        assert_eq!(
            pipeline.preprocess("  G1 X1 (comment)  ", &state, 50).unwrap(),
            vec!["G1 X1"]
        );
        assert!(pipeline.preprocess("(only a comment)", &state, 50).unwrap().is_empty());
    }

    #[test]
    fn decimal_processor_truncates() {
        let p = DecimalProcessor::with_precision(3);
        let out = p.process("G1 X1.23456", &ModalState::new()).unwrap();
        assert_eq!(out, vec!["G1 X1.235"]);
    }

    #[test]
    fn arc_expander_replaces_arc_with_lines() {
        let expander = ArcExpanderProcessor::new(1.0);
        let mut state = ModalState::new();
        state.current_point = Position::new(0.0, 0.0, 0.0);
        state.feed = 200.0;

        let out = expander.process("G2 X10 Y0 I5 J0", &state).unwrap();
        assert!(out.len() > 2);
        assert!(out.iter().all(|l| l.starts_with("G1")));
        assert!(out[0].contains("F200"));
        assert!(out.last().unwrap().contains("X10"));

        // Every expanded endpoint stays on the arc, within the rounding
        // of the emitted 4-decimal coordinates.
        let center = Position::new(5.0, 0.0, 0.0);
        for line in &out {
            let args = preprocessor::split_command(line);
            let p = Position::new(
                preprocessor::parse_coord(&args, 'X'),
                preprocessor::parse_coord(&args, 'Y'),
                0.0,
            );
            assert!((p.distance_xy(&center) - 5.0).abs() < 1e-3);
        }
    }

    #[test]
    fn arc_expander_passes_lines_through() {
        let expander = ArcExpanderProcessor::new(1.0);
        let out = expander.process("G1 X5", &ModalState::new()).unwrap();
        assert_eq!(out, vec!["G1 X5"]);
    }

    #[test]
    fn translate_shifts_absolute_coordinates() {
        let translator = TranslateProcessor::new(Position::new(-5.0, 10.0, 0.0));
        let out = translator
            .process("G1X10Y10Z1F100", &ModalState::new())
            .unwrap();
        assert_eq!(out, vec!["G1X5Y20Z1F100"]);
    }

    #[test]
    fn translate_leaves_incremental_moves_alone() {
        let translator = TranslateProcessor::new(Position::new(-5.0, 10.0, 0.0));
        let mut state = ModalState::new();
        state.absolute_mode = false;

        let out = translator.process("G1X10Y10", &state).unwrap();
        assert_eq!(out, vec!["G1X10Y10"]);
    }

    #[test]
    fn translate_leaves_incremental_ijk_alone() {
        let translator = TranslateProcessor::new(Position::new(1.0, 1.0, 0.0));
        let out = translator.process("G2X10Y0I5J0", &ModalState::new()).unwrap();
        // XY shift, IJ untouched under incremental IJK mode.
        assert_eq!(out, vec!["G2X11Y1I5J0"]);
    }
}
