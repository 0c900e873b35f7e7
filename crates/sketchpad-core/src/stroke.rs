//! Freehand stroke: an ordered point list plus color and width.

use crate::geometry::{Color, Point};
use kurbo::{BezPath, Rect};
use std::sync::Arc;

/// A single continuous drag.
///
/// Points are appended while the stroke is active; once committed the
/// stroke is shared behind an [`Arc`] and never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<Point>,
    color: Color,
    width: f64,
}

/// Shared, frozen stroke as stored in the document and in history snapshots.
pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    /// Start a stroke at `start`. Returns `None` unless `width` is finite and positive.
    pub fn new(start: Point, color: Color, width: f64) -> Option<Self> {
        Self::from_points(vec![start], color, width)
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, color: Color, width: f64) -> Option<Self> {
        if !(width.is_finite() && width > 0.0) {
            return None;
        }
        Some(Self { points, color, width })
    }

    /// Append a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the points in drawing order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get the stroke color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Get the stroke width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True for a tap: exactly one point, rendered as a dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    /// Freeze into a shareable reference.
    pub fn freeze(self) -> StrokeRef {
        Arc::new(self)
    }

    /// Polyline through all points: move to the first, line to each following one.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };

        path.move_to(*first);
        for point in rest {
            path.line_to(*point);
        }

        path
    }

    /// Bounding box of the painted area, including half the stroke width.
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };

        let rect = self
            .points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |rect, p| rect.union_pt(*p));

        let half = self.width / 2.0;
        rect.inflate(half, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    #[test]
    fn test_rejects_non_positive_width() {
        assert!(Stroke::new(Point::ZERO, Color::BLACK, 0.0).is_none());
        assert!(Stroke::new(Point::ZERO, Color::BLACK, -2.0).is_none());
        assert!(Stroke::new(Point::ZERO, Color::BLACK, f64::NAN).is_none());
        assert!(Stroke::new(Point::ZERO, Color::BLACK, 0.5).is_some());
    }

    #[test]
    fn test_add_points() {
        let mut stroke = Stroke::new(Point::new(1.0, 1.0), Color::BLACK, 3.0).unwrap();
        assert!(stroke.is_dot());
        stroke.add_point(Point::new(2.0, 2.0));
        stroke.add_point(Point::new(3.0, 1.0));
        assert_eq!(stroke.len(), 3);
        assert!(!stroke.is_dot());
    }

    #[test]
    fn test_to_path_is_polyline() {
        let stroke = Stroke::from_points(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
            Color::BLACK,
            2.0,
        )
        .unwrap();

        let elements: Vec<PathEl> = stroke.to_path().elements().to_vec();
        assert_eq!(
            elements,
            vec![
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::LineTo(Point::new(10.0, 0.0)),
                PathEl::LineTo(Point::new(10.0, 10.0)),
            ]
        );
    }

    #[test]
    fn test_empty_path() {
        let stroke = Stroke::from_points(Vec::new(), Color::BLACK, 2.0).unwrap();
        assert!(stroke.is_empty());
        assert!(stroke.to_path().elements().is_empty());
        assert_eq!(stroke.bounds(), Rect::ZERO);
    }

    #[test]
    fn test_bounds_include_width() {
        let stroke = Stroke::from_points(
            vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0)],
            Color::BLACK,
            4.0,
        )
        .unwrap();

        let bounds = stroke.bounds();
        assert!((bounds.x0 - 8.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 18.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 32.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 42.0).abs() < f64::EPSILON);
    }
}
