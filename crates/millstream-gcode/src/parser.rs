//! G-Code interpreter with modal state tracking
//!
//! Parses one command at a time against an explicit [`ModalState`] and
//! emits point segments plus a state snapshot per resolved code. The
//! static entry point never mutates its inputs, so replaying the same
//! command history always yields the same states and segments.

use millstream_core::{GcodeError, Position, Units};
use tracing::warn;

use crate::code::Code;
use crate::pipeline::{ProcessorHandle, ProcessorPipeline};
use crate::point_segment::PointSegment;
use crate::preprocessor;
use crate::state::{ModalState, Plane};

/// Default maximum command length accepted by the interpreter. Controllers
/// with small serial buffers reject anything longer.
pub const DEFAULT_MAX_COMMAND_LENGTH: usize = 50;

/// An intermediate object with all metadata for a processed command
#[derive(Debug, Clone)]
pub struct GcodeMeta {
    /// The original command this meta object was produced from
    pub command: String,
    /// The resolved code, if any
    pub code: Option<Code>,
    /// Interpreter state after processing the command
    pub state: ModalState,
    /// Endpoint of the command, for motion commands
    pub point: Option<PointSegment>,
}

/// G-Code parser
///
/// Owns the authoritative modal state and an ordered processor pipeline.
/// The state advances only when a command parses successfully; a failed
/// command leaves it untouched.
pub struct GcodeParser {
    state: ModalState,
    pipeline: ProcessorPipeline,
    max_command_length: usize,
}

impl GcodeParser {
    /// Create a new parser at the initial modal state
    pub fn new() -> Self {
        Self {
            state: ModalState::new(),
            pipeline: ProcessorPipeline::new(),
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
        }
    }

    /// Override the maximum accepted command length
    pub fn with_max_command_length(mut self, max: usize) -> Self {
        debug_assert!(max > 0, "command length limit must be positive");
        self.max_command_length = max;
        self
    }

    /// The configured maximum command length
    pub fn max_command_length(&self) -> usize {
        self.max_command_length
    }

    /// Reset the parser to the initial state, keeping processors
    pub fn reset(&mut self) {
        self.state = ModalState::new();
    }

    /// Current modal state snapshot
    pub fn current_state(&self) -> ModalState {
        self.state
    }

    /// Register a command processor; insertion order is significant
    pub fn add_processor(&mut self, processor: ProcessorHandle) {
        self.pipeline.register(processor);
    }

    /// Remove all registered processors
    pub fn reset_processors(&mut self) {
        self.pipeline.clear();
    }

    /// Number of registered processors
    pub fn processor_count(&self) -> usize {
        self.pipeline.processor_count()
    }

    /// Process a command with an implicit, monotonically increasing line
    /// number and advance the parser state.
    pub fn add_command(&mut self, command: &str) -> Result<Vec<GcodeMeta>, GcodeError> {
        self.add_command_with_line(command, self.state.sequence + 1)
    }

    /// Process a command with an explicit line number and advance the
    /// parser state. On error the previous state is retained.
    pub fn add_command_with_line(
        &mut self,
        command: &str,
        line: i64,
    ) -> Result<Vec<GcodeMeta>, GcodeError> {
        let metas = process_command(command, line, &self.state, self.max_command_length)?;
        if let Some(meta) = metas.last() {
            self.state = meta.state;
        }
        Ok(metas)
    }

    /// Apply all command processors to a command without changing the
    /// parser state. See [`ProcessorPipeline::preprocess`].
    pub fn preprocess_command(&self, command: &str) -> Result<Vec<String>, GcodeError> {
        self.pipeline
            .preprocess(command, &self.state, self.max_command_length)
    }
}

impl Default for GcodeParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Process a single command against an input state without mutating it.
///
/// Returns one meta object per resolved code, each carrying a state
/// snapshot; a line with no recognizable words yields an empty vector.
/// The only hard failure is a command exceeding `max_command_length`.
pub fn process_command(
    command: &str,
    line: i64,
    input_state: &ModalState,
    max_command_length: usize,
) -> Result<Vec<GcodeMeta>, GcodeError> {
    if command.len() > max_command_length {
        return Err(GcodeError::CommandTooLong {
            line,
            length: command.len(),
            max: max_command_length,
        });
    }

    let args = preprocessor::split_command(command);
    if args.is_empty() {
        return Ok(Vec::new());
    }

    let mut state = *input_state;
    state.sequence = line;

    // Last occurrence wins for repeated F/S words.
    let mut recognized = false;
    if let Some(feed) = last_word_value(&args, 'F') {
        state.feed = feed;
        recognized = true;
    }
    if let Some(speed) = last_word_value(&args, 'S') {
        state.spindle_speed = speed;
        recognized = true;
    }

    let mut g_codes = collect_g_codes(&args);
    let has_axis_words = preprocessor::has_axis_words(&args);

    // Modal continuation: axis words with no motion code reuse the
    // previous motion mode.
    if has_axis_words && !g_codes.iter().any(|c| c.is_motion()) {
        if let Some(previous) = state.last_motion_command {
            g_codes.push(previous);
        }
    }

    if g_codes.is_empty() && !recognized {
        return Ok(Vec::new());
    }

    let mut results = Vec::with_capacity(g_codes.len());
    for code in &g_codes {
        results.push(handle_g_code(*code, &args, command, line, &mut state));
    }

    // Lines like "F100" change state without motion; surface the snapshot
    // so callers and the pipeline can adopt it.
    if results.is_empty() {
        results.push(GcodeMeta {
            command: command.to_string(),
            code: None,
            state,
            point: None,
        });
    }

    Ok(results)
}

fn last_word_value(args: &[String], letter: char) -> Option<f64> {
    preprocessor::parse_codes(args, letter)
        .iter()
        .rev()
        .find_map(|v| v.parse::<f64>().ok())
}

fn collect_g_codes(args: &[String]) -> Vec<Code> {
    let mut codes = Vec::new();
    for word in preprocessor::parse_codes(args, 'G') {
        match Code::from_number(&word) {
            Some(code) => {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
            None => warn!(word = %word, "unknown gcode word, skipping"),
        }
    }
    codes
}

fn handle_g_code(
    code: Code,
    args: &[String],
    command: &str,
    line: i64,
    state: &mut ModalState,
) -> GcodeMeta {
    let mut point = None;

    match code {
        Code::G0 | Code::G1 => {
            if let Some(next) =
                preprocessor::update_point_with_command(args, state.current_point, state.absolute_mode)
            {
                point = Some(linear_segment(next, code == Code::G0, line, state));
            }
        }
        Code::G2 | Code::G3 => {
            if let Some(next) =
                preprocessor::update_point_with_command(args, state.current_point, state.absolute_mode)
            {
                point = Some(arc_segment(next, code == Code::G2, args, line, state));
            }
        }
        Code::G17 | Code::G18 | Code::G19 | Code::G17_1 | Code::G18_1 | Code::G19_1 => {
            if let Some(plane) = Plane::from_code(code) {
                state.plane = plane;
            }
        }
        Code::G20 => {
            if state.is_metric {
                state.current_point = state
                    .current_point
                    .scaled(Units::scale(Units::MM, Units::INCH));
            }
            state.is_metric = false;
        }
        Code::G21 => {
            if !state.is_metric {
                state.current_point = state
                    .current_point
                    .scaled(Units::scale(Units::INCH, Units::MM));
            }
            state.is_metric = true;
        }
        Code::G90 => state.absolute_mode = true,
        Code::G91 => state.absolute_mode = false,
        Code::G90_1 => state.absolute_ijk_mode = true,
        Code::G91_1 => state.absolute_ijk_mode = false,
    }

    if code.is_motion() {
        state.last_motion_command = Some(code);
    }

    if let Some(segment) = point.as_mut() {
        segment.feed = state.feed;
    }

    GcodeMeta {
        command: command.to_string(),
        code: Some(code),
        state: *state,
        point,
    }
}

fn linear_segment(next: Position, fast_traverse: bool, line: i64, state: &mut ModalState) -> PointSegment {
    let mut ps = PointSegment::new(next, line);

    ps.is_metric = state.is_metric;
    ps.is_fast_traverse = fast_traverse;
    ps.is_z_movement = state.current_point.x == next.x
        && state.current_point.y == next.y
        && state.current_point.z != next.z;

    state.current_point = next;
    ps
}

fn arc_segment(
    next: Position,
    clockwise: bool,
    args: &[String],
    line: i64,
    state: &mut ModalState,
) -> PointSegment {
    let plane = state.plane;
    let center = preprocessor::update_center_with_command(
        args,
        state.current_point,
        next,
        state.absolute_ijk_mode,
        clockwise,
        plane,
    );

    let mut radius = preprocessor::parse_coord(args, 'R');
    if radius.is_nan() {
        radius = ((plane.axis0(&state.current_point) - plane.axis0(&center)).powi(2)
            + (plane.axis1(&state.current_point) - plane.axis1(&center)).powi(2))
        .sqrt();
    }

    let mut ps = PointSegment::arc(next, line, center, radius, clockwise, plane);
    ps.is_metric = state.is_metric;

    state.current_point = next;
    ps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(metas: &[GcodeMeta]) -> Vec<PointSegment> {
        metas.iter().filter_map(|m| m.point).collect()
    }

    #[test]
    fn linear_move_with_feed_and_modes() {
        let mut parser = GcodeParser::new();
        let metas = parser.add_command("G90 G21 G1 X10 Y0 F500").unwrap();
        let points = segments(&metas);

        assert_eq!(points.len(), 1);
        let ps = points[0];
        assert_eq!(ps.point, Position::new(10.0, 0.0, 0.0));
        assert!(!ps.is_arc());
        assert!(!ps.is_fast_traverse);
        assert_eq!(ps.feed, 500.0);
        assert_eq!(parser.current_state().current_point, ps.point);
    }

    #[test]
    fn modal_continuation_reuses_previous_motion() {
        let mut parser = GcodeParser::new();
        parser.add_command("G1 X10").unwrap();
        let metas = parser.add_command("X20").unwrap();
        let points = segments(&metas);

        assert_eq!(points.len(), 1);
        assert_eq!(metas[0].code, Some(Code::G1));
        assert_eq!(points[0].point, Position::new(20.0, 0.0, 0.0));
        assert!(!points[0].is_fast_traverse);
    }

    #[test]
    fn rapid_moves_are_fast_traverse() {
        let mut parser = GcodeParser::new();
        let metas = parser.add_command("G0 Z5").unwrap();
        let points = segments(&metas);
        assert!(points[0].is_fast_traverse);
        assert!(points[0].is_z_movement);
    }

    #[test]
    fn incremental_mode_accumulates() {
        let mut parser = GcodeParser::new();
        parser.add_command("G91").unwrap();
        parser.add_command("G1 X5 Y5").unwrap();
        let metas = parser.add_command("G1 X5 Z-1").unwrap();
        let points = segments(&metas);
        assert_eq!(points[0].point, Position::new(10.0, 5.0, -1.0));
    }

    #[test]
    fn absolute_then_inverse_incremental_returns_home() {
        let mut parser = GcodeParser::new();
        parser.add_command("G1 X12.5 Y-3 Z2").unwrap();
        parser.add_command("G91").unwrap();
        parser.add_command("G1 X-12.5 Y3 Z-2").unwrap();

        let p = parser.current_state().current_point;
        assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9 && p.z.abs() < 1e-9);
    }

    #[test]
    fn arc_center_from_ijk_offsets() {
        let mut parser = GcodeParser::new();
        parser.add_command("G0 X0 Y0").unwrap();
        let metas = parser.add_command("G2 X10 Y0 I5 J0").unwrap();
        let points = segments(&metas);

        let ps = points[0];
        assert!(ps.is_arc());
        assert!(ps.is_clockwise());
        assert_eq!(ps.center().unwrap(), Position::new(5.0, 0.0, 0.0));
        assert!((ps.radius() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn arc_radius_consistency_between_ijk_and_r() {
        let mut parser = GcodeParser::new();
        parser.add_command("G0 X0 Y0").unwrap();
        let ij = segments(&parser.add_command("G2 X10 Y0 I5 J0").unwrap())[0];

        let mut parser = GcodeParser::new();
        parser.add_command("G0 X0 Y0").unwrap();
        let r = segments(&parser.add_command("G2 X10 Y0 R5").unwrap())[0];

        assert!((ij.radius() - r.radius()).abs() < 1e-6);
        let ci = ij.center().unwrap();
        let cr = r.center().unwrap();
        assert!((ci.x - cr.x).abs() < 1e-6 && (ci.y - cr.y).abs() < 1e-6);
    }

    #[test]
    fn counterclockwise_arc_flag() {
        let mut parser = GcodeParser::new();
        let metas = parser.add_command("G3 X10 Y0 I5 J0").unwrap();
        assert!(!segments(&metas)[0].is_clockwise());
    }

    #[test]
    fn plane_selection_applies_to_arcs() {
        let mut parser = GcodeParser::new();
        parser.add_command("G18").unwrap();
        assert_eq!(parser.current_state().plane, Plane::ZX);

        let metas = parser.add_command("G2 X0 Z10 I0 K5").unwrap();
        let ps = segments(&metas)[0];
        assert_eq!(ps.arc.unwrap().plane, Plane::ZX);
        assert_eq!(ps.center().unwrap(), Position::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn units_switch_converts_current_point() {
        let mut parser = GcodeParser::new();
        parser.add_command("G1 X25.4").unwrap();
        parser.add_command("G20").unwrap();
        assert!((parser.current_state().current_point.x - 1.0).abs() < 1e-9);
        parser.add_command("G21").unwrap();
        assert!((parser.current_state().current_point.x - 25.4).abs() < 1e-9);
    }

    #[test]
    fn too_long_command_fails_without_corrupting_state() {
        let mut parser = GcodeParser::new();
        parser.add_command("G1 X10").unwrap();
        let before = parser.current_state();

        let long = format!("G1 X{}", "9".repeat(60));
        let err = parser.add_command(&long).unwrap_err();
        assert!(matches!(err, GcodeError::CommandTooLong { length, max: 50, .. } if length > 50));
        assert_eq!(parser.current_state(), before);
    }

    #[test]
    fn comment_only_line_produces_nothing() {
        let mut parser = GcodeParser::new();
        assert!(parser.add_command("(just a comment)").unwrap().is_empty());
        assert!(parser.add_command("").unwrap().is_empty());
    }

    #[test]
    fn feed_only_line_updates_state_without_motion() {
        let mut parser = GcodeParser::new();
        let metas = parser.add_command("F250").unwrap();
        assert_eq!(metas.len(), 1);
        assert!(metas[0].point.is_none());
        assert_eq!(parser.current_state().feed, 250.0);
    }

    #[test]
    fn last_feed_word_wins() {
        let mut parser = GcodeParser::new();
        parser.add_command("G1 X1 F100 F200").unwrap();
        assert_eq!(parser.current_state().feed, 200.0);
    }

    #[test]
    fn unknown_codes_are_ignored() {
        let mut parser = GcodeParser::new();
        let metas = parser.add_command("G53 G1 X5").unwrap();
        let points = segments(&metas);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].point, Position::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn explicit_line_numbers_are_preserved() {
        let mut parser = GcodeParser::new();
        let metas = parser.add_command_with_line("G1 X1", 42).unwrap();
        assert_eq!(metas[0].state.sequence, 42);
        assert_eq!(segments(&metas)[0].line_number, 42);
    }

    #[test]
    fn sequence_increments_across_commands() {
        let mut parser = GcodeParser::new();
        parser.add_command("G1 X1").unwrap();
        parser.add_command("G1 X2").unwrap();
        assert_eq!(parser.current_state().sequence, 1);
    }

    #[test]
    fn replay_is_deterministic() {
        let program = ["G21 G90", "G1 X10 Y5 F300", "G2 X20 Y5 I5 J0", "G91", "G1 Z-2"];

        let run = || {
            let mut parser = GcodeParser::new();
            let mut out = Vec::new();
            for line in program {
                out.extend(parser.add_command(line).unwrap().into_iter().map(|m| m.state));
            }
            (out, parser.current_state())
        };

        assert_eq!(run(), run());
    }
}
