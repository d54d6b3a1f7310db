//! Two-phase transform flow: scan the whole program for its bounding box,
//! construct the geometric processor from the result, then run the
//! transform pass through the pipeline.

use std::sync::Arc;

use millstream_core::Position;
use millstream_gcode::processors::{
    CommentProcessor, TranslateProcessor, WhitespaceProcessor,
};
use millstream_gcode::{GcodeParser, ProgramStats};

#[test]
fn centering_a_program_via_prescan() {
    let program = ["G21 G90", "G0 X10 Y10", "G1 X30 Y10 F200", "G1 X30 Y30", "G1 X10 Y30"];

    // Pass 1: statistics over the untransformed program.
    let stats = ProgramStats::scan(program).unwrap();
    assert_eq!(stats.center(), Position::new(20.0, 20.0, 0.0));

    // Pass 2: translate so the bounding-box center lands on the origin.
    let center = stats.center();
    let offset = Position::new(-center.x, -center.y, 0.0);

    let mut parser = GcodeParser::new();
    parser.add_processor(Arc::new(CommentProcessor::new()));
    parser.add_processor(Arc::new(WhitespaceProcessor::new()));
    parser.add_processor(Arc::new(TranslateProcessor::new(offset)));

    let mut transformed = Vec::new();
    for line in program {
        for cmd in parser.preprocess_command(line).unwrap() {
            // State advances on the original line; the transformed text is
            // what would be streamed.
            transformed.push(cmd);
        }
        parser.add_command(line).unwrap();
    }

    let recentered = ProgramStats::scan(transformed.iter().map(String::as_str)).unwrap();
    assert!(recentered.center().distance_xy(&Position::origin()) < 1e-9);
    assert_eq!(recentered.size(), stats.size());
}
