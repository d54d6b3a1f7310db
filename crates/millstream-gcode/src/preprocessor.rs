//! Stateless command preprocessor utilities
//!
//! Tokenizing, comment handling, coordinate extraction, and the arc math
//! shared by the interpreter and the processor pipeline. Malformed numeric
//! words degrade to a NaN "absent" sentinel rather than failing; the
//! interpreter is deliberately tolerant of garbled files.

use millstream_core::Position;
use regex::Regex;
use std::sync::OnceLock;

use crate::state::Plane;

fn comment_regex() -> &'static Regex {
    static COMMENT: OnceLock<Regex> = OnceLock::new();
    COMMENT.get_or_init(|| Regex::new(r"\([^)]*\)|;.*|%.*$").expect("invalid comment pattern"))
}

/// Remove comments within parentheses, after a semicolon, and the `%`
/// program-end marker.
pub fn remove_comment(command: &str) -> String {
    comment_regex().replace_all(command, "").trim().to_string()
}

/// Extract the first comment in a command, without its delimiters
pub fn parse_comment(command: &str) -> Option<String> {
    if let Some(start) = command.find('(') {
        let rest = &command[start + 1..];
        let end = rest.find(')').unwrap_or(rest.len());
        return Some(rest[..end].to_string());
    }
    command
        .find(';')
        .map(|pos| command[pos + 1..].to_string())
}

/// Split a command into address/value words, ignoring embedded separators.
///
/// Comments are kept together as single tokens so later stages can skip
/// them; whitespace between a letter and its number is tolerated.
pub fn split_command(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut sb = String::new();
    let mut read_numeric = false;
    let mut read_line_comment = false;
    let mut read_block_comment = false;

    for c in command.chars() {
        if c == '(' && !read_line_comment && !read_block_comment {
            if !sb.is_empty() {
                words.push(std::mem::take(&mut sb));
            }
            read_numeric = false;
            sb.push(c);
            read_block_comment = true;
            continue;
        } else if read_block_comment && c == ')' {
            read_block_comment = false;
            sb.push(c);
            words.push(std::mem::take(&mut sb));
            continue;
        } else if c == ';' && !read_line_comment && !read_block_comment {
            if !sb.is_empty() {
                words.push(std::mem::take(&mut sb));
            }
            read_numeric = false;
            sb.push(c);
            read_line_comment = true;
            continue;
        }

        if read_line_comment || read_block_comment {
            sb.push(c);
        } else if c.is_whitespace() {
            continue;
        } else if read_numeric && !c.is_ascii_digit() && c != '.' {
            // Hit a word boundary: a letter after a number starts a new word.
            read_numeric = false;
            if !sb.is_empty() {
                words.push(std::mem::take(&mut sb));
            }
            if c.is_alphabetic() {
                sb.push(c);
            }
        } else if c.is_ascii_digit() || c == '.' || c == '-' {
            sb.push(c);
            read_numeric = true;
        } else if c.is_alphabetic() {
            sb.push(c);
        }
    }

    if !sb.is_empty() {
        words.push(sb);
    }

    words
}

/// Collect the value portions of every word with the given address letter,
/// in order of appearance.
pub fn parse_codes(args: &[String], letter: char) -> Vec<String> {
    let address = letter.to_ascii_uppercase();
    args.iter()
        .filter(|s| {
            s.chars()
                .next()
                .map(|c| c.to_ascii_uppercase() == address)
                .unwrap_or(false)
        })
        .map(|s| s[1..].to_string())
        .collect()
}

/// Find the first word with the given address letter, e.g. "X-0.5"
pub fn extract_word<'a>(args: &'a [String], letter: char) -> Option<&'a String> {
    let address = letter.to_ascii_uppercase();
    args.iter().find(|s| {
        s.chars()
            .next()
            .map(|c| c.to_ascii_uppercase() == address)
            .unwrap_or(false)
    })
}

/// Parse the numeric value of a word. NaN marks "absent": a missing word
/// and a malformed number are indistinguishable by design.
pub fn parse_coord(args: &[String], letter: char) -> f64 {
    match extract_word(args, letter) {
        Some(word) if word.len() > 1 => word[1..].parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Whether the command contains any axis words
pub fn has_axis_words(args: &[String]) -> bool {
    args.iter().any(|t| {
        t.len() > 1
            && matches!(
                t.chars().next().map(|c| c.to_ascii_uppercase()),
                Some('X') | Some('Y') | Some('Z')
            )
    })
}

/// Compute the next point from a command's axis words.
///
/// Absolute mode replaces an axis when its word is present; incremental
/// mode adds to it; an absent axis is untouched. Returns `None` when the
/// command carries no axis words at all.
pub fn update_point_with_command(
    args: &[String],
    initial: Position,
    absolute_mode: bool,
) -> Option<Position> {
    let x = parse_coord(args, 'X');
    let y = parse_coord(args, 'Y');
    let z = parse_coord(args, 'Z');

    if x.is_nan() && y.is_nan() && z.is_nan() {
        return None;
    }

    Some(update_point(initial, x, y, z, absolute_mode))
}

/// Merge explicit coordinates into a point; NaN marks an absent axis.
pub fn update_point(initial: Position, x: f64, y: f64, z: f64, absolute_mode: bool) -> Position {
    let mut next = initial;

    if absolute_mode {
        if !x.is_nan() {
            next.x = x;
        }
        if !y.is_nan() {
            next.y = y;
        }
        if !z.is_nan() {
            next.z = z;
        }
    } else {
        if !x.is_nan() {
            next.x += x;
        }
        if !y.is_nan() {
            next.y += y;
        }
        if !z.is_nan() {
            next.z += z;
        }
    }

    next
}

/// Compute an arc center from I/J/K offsets, or from an R word when no
/// offsets are given.
pub fn update_center_with_command(
    args: &[String],
    initial: Position,
    next_point: Position,
    absolute_ijk_mode: bool,
    clockwise: bool,
    plane: Plane,
) -> Position {
    let i = parse_coord(args, 'I');
    let j = parse_coord(args, 'J');
    let k = parse_coord(args, 'K');

    if i.is_nan() && j.is_nan() && k.is_nan() {
        let radius = parse_coord(args, 'R');
        return convert_r_to_center(initial, next_point, radius, absolute_ijk_mode, clockwise, plane);
    }

    update_point(initial, i, j, k, absolute_ijk_mode)
}

/// Convert R-word syntax to a center point.
///
/// The sign handling matches the GRBL firmware convention: the shorter of
/// the two candidate arcs is chosen, flipped for counter-clockwise motion,
/// and flipped again when a negative radius explicitly requests the longer
/// arc.
pub fn convert_r_to_center(
    start: Position,
    end: Position,
    radius: f64,
    absolute_ijk_mode: bool,
    clockwise: bool,
    plane: Plane,
) -> Position {
    let x = plane.axis0(&end) - plane.axis0(&start);
    let y = plane.axis1(&end) - plane.axis1(&start);

    let mut h_x2_div_d = (-(4.0 * radius * radius - x * x - y * y).sqrt()) / x.hypot(y);

    if !clockwise {
        h_x2_div_d = -h_x2_div_d;
    }
    if radius < 0.0 {
        h_x2_div_d = -h_x2_div_d;
    }

    let offset_x = 0.5 * (x - (y * h_x2_div_d));
    let offset_y = 0.5 * (y + (x * h_x2_div_d));

    let mut center = Position::origin();
    if !absolute_ijk_mode {
        plane.set_axis0(&mut center, plane.axis0(&start) + offset_x);
        plane.set_axis1(&mut center, plane.axis1(&start) + offset_y);
    } else {
        plane.set_axis0(&mut center, offset_x);
        plane.set_axis1(&mut center, offset_y);
    }

    center
}

/// Angle in radians of a line going from `start` to `end`, in `[0, 2*PI)`
pub fn get_angle(start: &Position, end: &Position, plane: Plane) -> f64 {
    let delta_x = plane.axis0(end) - plane.axis0(start);
    let delta_y = plane.axis1(end) - plane.axis1(start);

    if delta_x == 0.0 {
        return if delta_y > 0.0 {
            std::f64::consts::PI / 2.0
        } else {
            std::f64::consts::PI * 3.0 / 2.0
        };
    }

    let angle = (delta_y / delta_x).atan().abs();
    if delta_x > 0.0 && delta_y >= 0.0 {
        angle
    } else if delta_x < 0.0 && delta_y >= 0.0 {
        std::f64::consts::PI - angle
    } else if delta_x < 0.0 && delta_y < 0.0 {
        std::f64::consts::PI + angle
    } else {
        std::f64::consts::PI * 2.0 - angle
    }
}

/// Sweep in radians between two angles for the given rotation direction.
/// Matching angles are a full circle, not an empty arc.
pub fn calculate_sweep(start_angle: f64, mut end_angle: f64, clockwise: bool) -> f64 {
    use std::f64::consts::PI;

    if start_angle == end_angle {
        return PI * 2.0;
    }

    // An end angle of 0 really means 360.
    if end_angle == 0.0 {
        end_angle = PI * 2.0;
    }

    if !clockwise && end_angle < start_angle {
        (PI * 2.0 - start_angle) + end_angle
    } else if clockwise && end_angle > start_angle {
        (PI * 2.0 - end_angle) + start_angle
    } else {
        (end_angle - start_angle).abs()
    }
}

/// Generate the points along an arc, including the end point (the start
/// point itself is the first element). The helical (out-of-plane) axis is
/// interpolated linearly across the sweep.
pub fn generate_points_along_arc(
    start: Position,
    end: Position,
    center: Position,
    clockwise: bool,
    radius: f64,
    segment_length: f64,
    plane: Plane,
) -> Vec<Position> {
    let mut r = radius;
    if r == 0.0 {
        r = ((plane.axis0(&start) - plane.axis0(&center)).powi(2)
            + (plane.axis1(&start) - plane.axis1(&center)).powi(2))
        .sqrt();
    }

    let start_angle = get_angle(&center, &start, plane);
    let end_angle = get_angle(&center, &end, plane);
    let sweep = calculate_sweep(start_angle, end_angle, clockwise);

    let arc_length = sweep * r;
    let num_points = if segment_length > 0.0 {
        ((arc_length / segment_length).ceil() as usize).max(1)
    } else {
        20
    };

    let mut next_point = start;
    let mut points = Vec::with_capacity(num_points + 1);

    let linear_increment = (plane.linear(&end) - plane.linear(&start)) / num_points as f64;
    let mut linear_pos = plane.linear(&next_point);

    for i in 0..num_points {
        let mut angle = if clockwise {
            start_angle - i as f64 * sweep / num_points as f64
        } else {
            start_angle + i as f64 * sweep / num_points as f64
        };
        if angle >= std::f64::consts::PI * 2.0 {
            angle -= std::f64::consts::PI * 2.0;
        }

        plane.set_axis0(&mut next_point, angle.cos() * r + plane.axis0(&center));
        plane.set_axis1(&mut next_point, angle.sin() * r + plane.axis1(&center));
        plane.set_linear(&mut next_point, linear_pos);
        linear_pos += linear_increment;

        points.push(next_point);
    }

    points.push(end);
    points
}

/// Truncate every decimal in a command to at most `length` decimal places
pub fn truncate_decimals(length: usize, command: &str) -> String {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"\d+\.\d+").expect("invalid decimal pattern"));

    number
        .replace_all(command, |caps: &regex::Captures<'_>| {
            match caps[0].parse::<f64>() {
                Ok(value) => format_coordinate(value, length),
                Err(_) => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Format a coordinate value with at most `precision` decimal places,
/// trailing zeros stripped.
pub fn format_coordinate(value: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Scale the F word of a command to a percentage of its programmed value
pub fn override_speed(command: &str, percent: f64) -> String {
    static FEED: OnceLock<Regex> = OnceLock::new();
    let feed = FEED.get_or_init(|| Regex::new(r"(?i)F([0-9.]+)").expect("invalid feed pattern"));

    feed.replace_all(command, |caps: &regex::Captures<'_>| {
        match caps[1].parse::<f64>() {
            Ok(original) => format!("F{}", original * percent / 100.0),
            Err(_) => caps[0].to_string(),
        }
    })
    .to_string()
}
