use crate::error::{ConfigurationError, Result};
use crate::math::{effective_tolerance, Point3};

/// Share of the largest box dimension used as extrusion length.
pub const EXTRUSION_RATIO: f64 = 0.05;

/// Units in the last place of the largest coordinate below which the
/// tolerance is never set.
const RESOLUTION_ULPS: f64 = 16.0;

/// Axis-aligned bounding box of the boundary-tagged nodes.
///
/// Computed once per generation pass and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct DomainBox {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
    extrusion_size: f64,
    tolerance: f64,
}

impl DomainBox {
    /// Builds the box enclosing `points`.
    ///
    /// `relative_tolerance` is scaled by the largest box dimension; the
    /// result is floored at [`MIN_TOLERANCE`](crate::math::MIN_TOLERANCE)
    /// and at a few ulps of the largest coordinate magnitude, so boxes far
    /// from the origin never ask for a tolerance finer than `f64` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::EmptyBoundarySet`] for an empty point
    /// set and [`ConfigurationError::DegenerateBoundingBox`] when every
    /// point coincides.
    pub fn from_points<'a>(
        points: impl IntoIterator<Item = &'a Point3>,
        relative_tolerance: f64,
    ) -> Result<Self> {
        let mut iter = points.into_iter();
        let first = iter.next().ok_or(ConfigurationError::EmptyBoundarySet)?;
        let (min, max) = iter.fold((*first, *first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));

        let size = (max - min).max();
        let magnitude = min.coords.abs().max().max(max.coords.abs().max());
        if !(size.is_finite() && size > 0.0) {
            return Err(ConfigurationError::DegenerateBoundingBox { size }.into());
        }

        Ok(Self {
            min,
            max,
            extrusion_size: EXTRUSION_RATIO * size,
            tolerance: effective_tolerance(relative_tolerance * size)
                .max(RESOLUTION_ULPS * f64::EPSILON * magnitude),
        })
    }

    /// Largest dimension of the box.
    #[must_use]
    pub fn max_size(&self) -> f64 {
        (self.max - self.min).max()
    }

    /// Length of every extrusion derived from this box.
    #[must_use]
    pub fn extrusion_size(&self) -> f64 {
        self.extrusion_size
    }

    /// Tolerance for all geometric equality tests of the pass.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}
