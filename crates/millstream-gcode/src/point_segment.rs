//! Point segments emitted by the interpreter
//!
//! An optimized line segment which only stores the endpoint; a sequence of
//! point segments implicitly defines a polyline/arc-chain where each
//! segment starts at the previous segment's endpoint.

use millstream_core::{Position, Units};
use serde::{Deserialize, Serialize};

use crate::state::Plane;

/// Arc geometry attached to a segment produced by G2/G3
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcProperties {
    /// Center of rotation
    pub center: Position,
    /// Arc radius
    pub radius: f64,
    /// Direction of rotation
    pub is_clockwise: bool,
    /// Plane the arc was specified in
    pub plane: Plane,
}

/// The endpoint of a single processed motion command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSegment {
    /// Endpoint of the motion
    pub point: Position,
    /// Line number of the command that produced this segment
    pub line_number: i64,
    /// Feed rate active for this motion
    pub feed: f64,
    /// Whether the endpoint is in millimeters
    pub is_metric: bool,
    /// Endpoint differs from the start only along Z (visualization hint)
    pub is_z_movement: bool,
    /// Rapid (G0) rather than feed move
    pub is_fast_traverse: bool,
    /// Arc geometry, present for G2/G3 segments
    pub arc: Option<ArcProperties>,
}

impl PointSegment {
    /// Create a linear segment ending at `point`
    pub fn new(point: Position, line_number: i64) -> Self {
        Self {
            point,
            line_number,
            feed: 0.0,
            is_metric: true,
            is_z_movement: false,
            is_fast_traverse: false,
            arc: None,
        }
    }

    /// Create an arc segment ending at `point`
    pub fn arc(
        point: Position,
        line_number: i64,
        center: Position,
        radius: f64,
        is_clockwise: bool,
        plane: Plane,
    ) -> Self {
        Self {
            arc: Some(ArcProperties {
                center,
                radius,
                is_clockwise,
                plane,
            }),
            ..Self::new(point, line_number)
        }
    }

    /// Whether this segment is an arc
    pub fn is_arc(&self) -> bool {
        self.arc.is_some()
    }

    /// Arc center, if this segment is an arc
    pub fn center(&self) -> Option<Position> {
        self.arc.map(|a| a.center)
    }

    /// Arc radius, 0.0 for linear segments
    pub fn radius(&self) -> f64 {
        self.arc.map(|a| a.radius).unwrap_or(0.0)
    }

    /// Direction of rotation, false for linear segments
    pub fn is_clockwise(&self) -> bool {
        self.arc.map(|a| a.is_clockwise).unwrap_or(false)
    }

    /// Normalize an imperial segment to millimeters
    pub fn convert_to_metric(&mut self) {
        if self.is_metric {
            return;
        }
        self.is_metric = true;

        let scale = Units::scale(Units::INCH, Units::MM);
        self.point = self.point.scaled(scale);
        if let Some(arc) = self.arc.as_mut() {
            arc.center = arc.center.scaled(scale);
            arc.radius *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_segment_has_no_arc_properties() {
        let ps = PointSegment::new(Position::new(1.0, 2.0, 3.0), 7);
        assert!(!ps.is_arc());
        assert_eq!(ps.radius(), 0.0);
        assert!(!ps.is_clockwise());
        assert_eq!(ps.center(), None);
    }

    #[test]
    fn convert_to_metric_scales_endpoint_and_center() {
        let mut ps = PointSegment::arc(
            Position::new(1.0, 0.0, 0.0),
            0,
            Position::new(0.5, 0.0, 0.0),
            0.5,
            true,
            Plane::XY,
        );
        ps.is_metric = false;

        ps.convert_to_metric();

        assert!(ps.is_metric);
        assert!((ps.point.x - 25.4).abs() < 1e-9);
        assert!((ps.center().unwrap().x - 12.7).abs() < 1e-9);
        assert!((ps.radius() - 12.7).abs() < 1e-9);

        // Converting twice is a no-op.
        ps.convert_to_metric();
        assert!((ps.point.x - 25.4).abs() < 1e-9);
    }
}
