use crate::boundary::Dimension;
use crate::error::{ConfigurationError, Result};

/// Identifier of a solver time series.
pub type TimeSeriesId = u32;

/// Optional velocity input applied to bottom elements (`-fx`, `-fy`, `-fz`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VelocityInput {
    pub fx: Option<TimeSeriesId>,
    pub fy: Option<TimeSeriesId>,
    pub fz: Option<TimeSeriesId>,
}

impl VelocityInput {
    /// Returns `true` if no component is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fx.is_none() && self.fy.is_none() && self.fz.is_none()
    }
}

/// Settings of one generation pass, validated once when a session starts.
#[derive(Debug, Clone)]
pub struct AbsorbingConfig {
    pub dimension: Dimension,
    /// Shear modulus of the absorbed medium.
    pub shear_modulus: f64,
    pub poisson_ratio: f64,
    pub density: f64,
    /// Out-of-plane thickness, written for 2D elements only.
    pub thickness: f64,
    /// Tolerance relative to the largest bounding-box dimension.
    pub relative_tolerance: f64,
    /// Number of solver processes; more than one wraps output in
    /// per-process conditionals.
    pub process_count: u32,
    pub velocity: VelocityInput,
}

impl AbsorbingConfig {
    /// Creates a configuration with the given material constants.
    #[must_use]
    pub fn new(dimension: Dimension, shear_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Self {
            dimension,
            shear_modulus,
            poisson_ratio,
            density,
            thickness: 1.0,
            relative_tolerance: 1e-6,
            process_count: 1,
            velocity: VelocityInput::default(),
        }
    }

    /// Sets the 2D thickness.
    #[must_use]
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// Sets the relative tolerance.
    #[must_use]
    pub fn with_relative_tolerance(mut self, relative_tolerance: f64) -> Self {
        self.relative_tolerance = relative_tolerance;
        self
    }

    /// Sets the number of solver processes.
    #[must_use]
    pub fn with_process_count(mut self, process_count: u32) -> Self {
        self.process_count = process_count;
        self
    }

    /// Sets the velocity input of bottom elements.
    #[must_use]
    pub fn with_velocity(mut self, velocity: VelocityInput) -> Self {
        self.velocity = velocity;
        self
    }

    /// Checks every value once, before any geometry is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name, value, reason| {
            Err(ConfigurationError::InvalidParameter {
                name,
                value,
                reason,
            }
            .into())
        };

        if !(self.shear_modulus.is_finite() && self.shear_modulus > 0.0) {
            return invalid("shear_modulus", self.shear_modulus, "must be positive");
        }
        if !(self.poisson_ratio > -1.0 && self.poisson_ratio < 0.5) {
            return invalid("poisson_ratio", self.poisson_ratio, "must lie in (-1, 0.5)");
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return invalid("density", self.density, "must be positive");
        }
        if self.dimension == Dimension::Two && !(self.thickness.is_finite() && self.thickness > 0.0)
        {
            return invalid("thickness", self.thickness, "must be positive");
        }
        if !(self.relative_tolerance.is_finite() && self.relative_tolerance >= 0.0) {
            return invalid(
                "relative_tolerance",
                self.relative_tolerance,
                "must be zero or positive",
            );
        }
        if self.process_count == 0 {
            return invalid("process_count", 0.0, "at least one process is required");
        }
        if let (Dimension::Two, Some(ts)) = (self.dimension, self.velocity.fz) {
            return invalid("fz", f64::from(ts), "not available in 2D");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_name(config: &AbsorbingConfig) -> Option<&'static str> {
        match config.validate() {
            Err(crate::AbsorbError::Configuration(ConfigurationError::InvalidParameter {
                name,
                ..
            })) => Some(name),
            _ => None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = AbsorbingConfig::new(Dimension::Three, 1.0e8, 0.3, 2000.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.process_count, 1);
        assert!(config.velocity.is_empty());
    }

    #[test]
    fn material_constants_are_checked() {
        let base = AbsorbingConfig::new(Dimension::Three, 1.0e8, 0.3, 2000.0);
        let mut c = base.clone();
        c.shear_modulus = 0.0;
        assert_eq!(invalid_name(&c), Some("shear_modulus"));
        let mut c = base.clone();
        c.poisson_ratio = 0.5;
        assert_eq!(invalid_name(&c), Some("poisson_ratio"));
        let mut c = base;
        c.density = f64::NAN;
        assert_eq!(invalid_name(&c), Some("density"));
    }

    #[test]
    fn thickness_only_matters_in_2d() {
        let three = AbsorbingConfig::new(Dimension::Three, 1.0, 0.2, 1.0).with_thickness(0.0);
        assert!(three.validate().is_ok());
        let two = AbsorbingConfig::new(Dimension::Two, 1.0, 0.2, 1.0).with_thickness(0.0);
        assert_eq!(invalid_name(&two), Some("thickness"));
    }

    #[test]
    fn process_count_and_velocity_are_checked() {
        let c = AbsorbingConfig::new(Dimension::Three, 1.0, 0.2, 1.0).with_process_count(0);
        assert_eq!(invalid_name(&c), Some("process_count"));

        let velocity = VelocityInput {
            fz: Some(3),
            ..VelocityInput::default()
        };
        let c = AbsorbingConfig::new(Dimension::Two, 1.0, 0.2, 1.0).with_velocity(velocity);
        assert_eq!(invalid_name(&c), Some("fz"));
        let c = AbsorbingConfig::new(Dimension::Three, 1.0, 0.2, 1.0).with_velocity(velocity);
        assert!(c.validate().is_ok());
    }
}
