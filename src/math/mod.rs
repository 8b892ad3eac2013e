pub mod position_key;

pub use position_key::{PositionIndex, PositionKey};

/// 3D point type. 2D meshes use `z = 0`.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 2x2 matrix, used for in-plane Jacobians.
pub type Matrix2 = nalgebra::Matrix2<f64>;

/// Smallest tolerance ever used for geometric equality tests.
pub const MIN_TOLERANCE: f64 = 1e-12;

/// Floors a requested tolerance at [`MIN_TOLERANCE`].
///
/// Negative and `NaN` requests are floored as well.
#[must_use]
pub fn effective_tolerance(tolerance: f64) -> f64 {
    if tolerance > MIN_TOLERANCE {
        tolerance
    } else {
        MIN_TOLERANCE
    }
}

/// Arithmetic mean of a set of points. Returns the origin for an empty slice.
#[must_use]
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_floored() {
        assert_eq!(effective_tolerance(0.0), MIN_TOLERANCE);
        assert_eq!(effective_tolerance(-1.0), MIN_TOLERANCE);
        assert_eq!(effective_tolerance(f64::NAN), MIN_TOLERANCE);
        assert_eq!(effective_tolerance(1e-6), 1e-6);
    }

    #[test]
    fn centroid_of_square() {
        let c = centroid(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]);
        assert_eq!(c, Point3::new(1.0, 1.0, 0.0));
    }
}
