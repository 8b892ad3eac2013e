use crate::error::{GeometryError, Result};
use crate::math::{centroid, Matrix2, Point3, Vector3};
use crate::mesh::ElementId;

/// Reference coordinates of the bilinear quad corners, in winding order.
const REFERENCE: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// A quadrilateral rebuilt as an axis-aligned rectangle of equal area.
#[derive(Debug, Clone)]
pub struct CorrectedQuad {
    /// Corrected corners; corner `i` corresponds to input corner `i`.
    pub corners: [Point3; 4],
    /// Centroid shared by the input and the corrected quad.
    pub centroid: Point3,
    /// Unit normal of the input winding (`J1 x J2`).
    pub normal: Vector3,
    /// In-plane axis aligned with the canonical tangent.
    pub x_axis: Vector3,
    /// In-plane axis `normal x x_axis`.
    pub y_axis: Vector3,
    /// Centroid-Jacobian area `4 |J1 x J2|`, preserved by the correction.
    pub area: f64,
}

impl CorrectedQuad {
    /// Returns the input corner indices in canonical order for a side.
    ///
    /// The first corner is the one farthest along both `tangent` and
    /// `bitangent`; the rest follow counterclockwise about `direction`, so
    /// that extruding along `direction` gives a positive volume.
    #[must_use]
    pub fn canonical_order(
        &self,
        direction: &Vector3,
        tangent: &Vector3,
        bitangent: &Vector3,
    ) -> [usize; 4] {
        let mut first = 0;
        let mut best = f64::NEG_INFINITY;
        for (i, corner) in self.corners.iter().enumerate() {
            let d = corner - self.centroid;
            let score = d.dot(tangent) + d.dot(bitangent);
            if score > best {
                best = score;
                first = i;
            }
        }

        if self.normal.dot(direction) >= 0.0 {
            [first, (first + 1) % 4, (first + 2) % 4, (first + 3) % 4]
        } else {
            [first, (first + 3) % 4, (first + 2) % 4, (first + 1) % 4]
        }
    }
}

/// Removes in-plane distortion from a quadrilateral face.
///
/// The bilinear Jacobian is evaluated at the centroid and projected onto a
/// frame whose first axis is the canonical tangent of the side (projected
/// onto the face plane). The cross-coupling terms are dropped and the
/// remaining diagonal is rescaled so the area is unchanged. The written
/// mesh nodes are never moved; the result only drives extrusion and corner
/// ordering.
pub struct CorrectDistortion {
    corners: [Point3; 4],
    tangent: Vector3,
    element: ElementId,
}

impl CorrectDistortion {
    /// Creates a new `CorrectDistortion` operation.
    #[must_use]
    pub fn new(corners: [Point3; 4], tangent: Vector3) -> Self {
        Self {
            corners,
            tangent,
            element: 0,
        }
    }

    /// Sets the element id reported on failure.
    #[must_use]
    pub fn for_element(mut self, element: ElementId) -> Self {
        self.element = element;
        self
    }

    /// Executes the correction.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Singular`] if the Jacobian vanishes (zero-area
    /// face) or if the tangent is normal to the face.
    pub fn execute(&self) -> Result<CorrectedQuad> {
        let [p0, p1, p2, p3] = self.corners;
        let center = centroid(&self.corners);

        // dX/dxi and dX/deta at (0, 0).
        let j1 = (-p0.coords + p1.coords + p2.coords - p3.coords) * 0.25;
        let j2 = (-p0.coords - p1.coords + p2.coords + p3.coords) * 0.25;

        let cross = j1.cross(&j2);
        let cross_norm = cross.norm();
        let scale = j1.norm_squared() + j2.norm_squared();
        if cross_norm <= 1e-12 * scale || cross_norm == 0.0 {
            return Err(self.singular());
        }
        let normal = cross / cross_norm;

        let x_axis = self.tangent - normal * self.tangent.dot(&normal);
        let x_len = x_axis.norm();
        if x_len < 1e-9 * self.tangent.norm() || x_len == 0.0 {
            return Err(self.singular());
        }
        let x_axis = x_axis / x_len;
        let y_axis = normal.cross(&x_axis);

        let local = Matrix2::new(
            x_axis.dot(&j1),
            x_axis.dot(&j2),
            y_axis.dot(&j1),
            y_axis.dot(&j2),
        );
        let target = local.determinant().abs();

        // Keep the dominant coupling; a face whose xi axis runs along y_axis
        // keeps its anti-diagonal.
        let diagonal = (local[(0, 0)] * local[(1, 1)]).abs();
        let anti = (local[(0, 1)] * local[(1, 0)]).abs();
        let mut aligned = if diagonal >= anti {
            Matrix2::new(local[(0, 0)], 0.0, 0.0, local[(1, 1)])
        } else {
            Matrix2::new(0.0, local[(0, 1)], local[(1, 0)], 0.0)
        };
        let current = aligned.determinant().abs();
        if current == 0.0 {
            return Err(self.singular());
        }
        aligned *= (target / current).sqrt();

        let corners = REFERENCE.map(|(xi, eta)| {
            let u = aligned[(0, 0)] * xi + aligned[(0, 1)] * eta;
            let v = aligned[(1, 0)] * xi + aligned[(1, 1)] * eta;
            center + x_axis * u + y_axis * v
        });

        Ok(CorrectedQuad {
            corners,
            centroid: center,
            normal,
            x_axis,
            y_axis,
            area: 4.0 * cross_norm,
        })
    }

    fn singular(&self) -> crate::AbsorbError {
        GeometryError::Singular {
            element: self.element,
        }
        .into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Half the cross product of the diagonals, equal to `4 |J1 x J2|`.
    fn diagonal_area(c: &[Point3; 4]) -> f64 {
        0.5 * (c[2] - c[0]).cross(&(c[3] - c[1])).norm()
    }

    fn rectangle_area(c: &[Point3; 4]) -> f64 {
        (c[1] - c[0]).cross(&(c[3] - c[0])).norm()
    }

    fn assert_is_rectangle(q: &CorrectedQuad) {
        let c = &q.corners;
        for i in 0..4 {
            let a = c[(i + 1) % 4] - c[i];
            let b = c[(i + 3) % 4] - c[i];
            assert!(a.dot(&b).abs() < 1e-12, "corner {i} is not square");
        }
    }

    #[test]
    fn rectangle_is_unchanged() {
        let corners = [p(0.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        let q = CorrectDistortion::new(corners, Vector3::x()).execute().unwrap();
        for (a, b) in q.corners.iter().zip(&corners) {
            assert_relative_eq!(a, b, epsilon = 1e-14);
        }
        assert_relative_eq!(q.area, 2.0);
        assert_relative_eq!(q.normal, Vector3::z());
    }

    #[test]
    fn skewed_quad_becomes_axis_aligned() {
        let corners = [p(0.0, 0.0, 0.0), p(2.0, 0.3, 0.0), p(2.4, 1.5, 0.0), p(0.2, 1.1, 0.0)];
        let q = CorrectDistortion::new(corners, Vector3::x()).execute().unwrap();
        assert_is_rectangle(&q);
        assert_relative_eq!(q.x_axis, Vector3::x(), epsilon = 1e-15);
        let edge = q.corners[1] - q.corners[0];
        assert!(edge.y.abs() < 1e-12 && edge.z.abs() < 1e-12);
        assert_relative_eq!(rectangle_area(&q.corners), diagonal_area(&corners), max_relative = 1e-12);
    }

    #[test]
    fn rotated_winding_keeps_anti_diagonal() {
        // xi runs along +y here.
        let corners = [p(1.0, 0.0, 0.0), p(1.0, 3.0, 0.0), p(0.0, 3.0, 0.0), p(0.0, 0.0, 0.0)];
        let q = CorrectDistortion::new(corners, Vector3::x()).execute().unwrap();
        assert_is_rectangle(&q);
        for (a, b) in q.corners.iter().zip(&corners) {
            assert_relative_eq!(a, b, epsilon = 1e-14);
        }
    }

    #[test]
    fn non_planar_quads_preserve_area() {
        let cases = [
            [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.1), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.1)],
            [p(0.0, 0.0, 0.0), p(2.0, 0.2, -0.3), p(2.5, 1.7, 0.2), p(-0.1, 1.2, 0.05)],
            [p(3.0, 0.0, 1.0), p(3.0, 1.2, 1.4), p(3.3, 1.0, 2.6), p(2.8, -0.2, 2.1)],
        ];
        let tangents = [Vector3::x(), Vector3::x(), Vector3::y()];
        for (corners, tangent) in cases.iter().zip(tangents) {
            let q = CorrectDistortion::new(*corners, tangent).execute().unwrap();
            assert_is_rectangle(&q);
            let expected = diagonal_area(corners);
            assert_relative_eq!(q.area, expected, max_relative = 1e-9);
            assert_relative_eq!(rectangle_area(&q.corners), expected, max_relative = 1e-9);
            assert_relative_eq!(
                crate::math::centroid(&q.corners),
                crate::math::centroid(corners),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn collinear_corners_are_singular() {
        let corners = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(3.0, 0.0, 0.0)];
        let result = CorrectDistortion::new(corners, Vector3::x())
            .for_element(42)
            .execute();
        assert!(matches!(
            result,
            Err(crate::AbsorbError::Geometry(GeometryError::Singular { element: 42 }))
        ));
    }

    #[test]
    fn tangent_normal_to_face_is_singular() {
        let corners = [p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 1.0, 1.0), p(0.0, 0.0, 1.0)];
        assert!(CorrectDistortion::new(corners, Vector3::x()).execute().is_err());
    }

    #[test]
    fn canonical_order_starts_at_far_corner() {
        let v = Vector3::new(0.0, 0.0, -1.0);
        let t = Vector3::x();
        let b = v.cross(&t);
        let base = [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)];
        let windings = [
            base,
            [base[2], base[3], base[0], base[1]],
            [base[3], base[2], base[1], base[0]],
        ];
        for corners in windings {
            let q = CorrectDistortion::new(corners, t).execute().unwrap();
            let order = q.canonical_order(&v, &t, &b);
            let ordered = order.map(|i| corners[i]);
            // b = -y for the bottom side: start at max x, min y.
            assert_eq!(ordered[0], p(1.0, 0.0, 0.0));
            let n = (ordered[1] - ordered[0]).cross(&(ordered[3] - ordered[0]));
            assert!(n.dot(&v) > 0.0);
        }
    }
}
