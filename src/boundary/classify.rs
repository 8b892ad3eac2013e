use crate::math::{effective_tolerance, Point3};

use super::bounding_box::DomainBox;
use super::side::{BoundaryCombo, BoundarySide, Dimension, Extreme};

/// Decides which sides of the domain box a point touches.
///
/// A point touches a side when its coordinate along the side's axis is
/// strictly within `tolerance` of the box face. Pure function of geometry.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryClassifier {
    bbox: DomainBox,
    dim: Dimension,
    tolerance: f64,
}

impl BoundaryClassifier {
    /// Creates a classifier using the box's own tolerance.
    #[must_use]
    pub fn new(bbox: DomainBox, dim: Dimension) -> Self {
        Self {
            bbox,
            dim,
            tolerance: bbox.tolerance(),
        }
    }

    /// Overrides the tolerance. It is floored at
    /// [`MIN_TOLERANCE`](crate::math::MIN_TOLERANCE).
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = effective_tolerance(tolerance);
        self
    }

    /// The tolerance in use.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the single side an element with this centroid belongs to.
    ///
    /// Sides are tested in canonical order and the first hit wins, so an
    /// element squeezed onto an edge of a flat box resolves deterministically.
    #[must_use]
    pub fn classify(&self, centroid: &Point3) -> Option<BoundarySide> {
        self.dim
            .sides()
            .iter()
            .copied()
            .find(|side| self.touches(*side, centroid))
    }

    /// Returns every side the node lies on (0 to 3 in 3D, 0 to 2 in 2D).
    #[must_use]
    pub fn sides_touched_by_node(&self, position: &Point3) -> BoundaryCombo {
        self.dim
            .sides()
            .iter()
            .copied()
            .filter(|side| self.touches(*side, position))
            .collect()
    }

    /// Returns `true` if `point` lies on the box face of `side`.
    #[must_use]
    pub fn touches(&self, side: BoundarySide, point: &Point3) -> bool {
        let (axis, extreme) = side.axis(self.dim);
        match extreme {
            Extreme::Min => point[axis] < self.bbox.min[axis] + self.tolerance,
            Extreme::Max => point[axis] > self.bbox.max[axis] - self.tolerance,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::boundary::side::BoundarySide::{Back, Bottom, Front, Left, Right};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_cube() -> DomainBox {
        DomainBox::from_points(&[p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0)], 1e-6).unwrap()
    }

    #[test]
    fn face_centroids_map_to_their_side() {
        let c = BoundaryClassifier::new(unit_cube(), Dimension::Three);
        assert_eq!(c.classify(&p(0.5, 0.5, 0.0)), Some(Bottom));
        assert_eq!(c.classify(&p(0.0, 0.5, 0.5)), Some(Left));
        assert_eq!(c.classify(&p(1.0, 0.5, 0.5)), Some(Right));
        assert_eq!(c.classify(&p(0.5, 0.0, 0.5)), Some(Front));
        assert_eq!(c.classify(&p(0.5, 1.0, 0.5)), Some(Back));
        // The top is a free surface.
        assert_eq!(c.classify(&p(0.5, 0.5, 1.0)), None);
        assert_eq!(c.classify(&p(0.5, 0.5, 0.5)), None);
    }

    #[test]
    fn corner_node_touches_three_sides() {
        let c = BoundaryClassifier::new(unit_cube(), Dimension::Three);
        let sides = c.sides_touched_by_node(&p(0.0, 1.0, 0.0));
        assert_eq!(sides.code(), "BLK");
        assert_eq!(c.sides_touched_by_node(&p(0.5, 0.5, 0.5)).len(), 0);
        assert_eq!(c.sides_touched_by_node(&p(1.0, 0.5, 0.0)).code(), "BR");
    }

    #[test]
    fn two_dimensional_sides_use_y_for_bottom() {
        let bbox =
            DomainBox::from_points(&[p(0.0, -10.0, 0.0), p(20.0, 0.0, 0.0)], 1e-6).unwrap();
        let c = BoundaryClassifier::new(bbox, Dimension::Two);
        assert_eq!(c.classify(&p(5.0, -10.0, 0.0)), Some(Bottom));
        assert_eq!(c.sides_touched_by_node(&p(20.0, -10.0, 0.0)).code(), "BR");
        // Front/back do not exist in 2D.
        assert_eq!(c.sides_touched_by_node(&p(0.0, -5.0, 0.0)).code(), "L");
    }

    #[test]
    fn zero_tolerance_is_floored() {
        let c = BoundaryClassifier::new(unit_cube(), Dimension::Three).with_tolerance(0.0);
        assert_eq!(c.tolerance(), 1e-12);
        assert!(c.touches(Bottom, &p(0.5, 0.5, 1e-15)));
        assert!(!c.touches(Bottom, &p(0.5, 0.5, 1e-9)));
    }
}
