//! Trainable step sizes of the learned leapfrog.

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use super::config::check_step_size;
use crate::error::{ConfigError, ShapeError, ShapeKind};
use crate::Real;

/// One position and one momentum step size per leapfrog step.
///
/// The kernel only reads them, they are written by an external optimizer through
/// [`StepSizes::set_xeps`] and [`StepSizes::set_veps`] which keep them strictly positive.
/// Fixed step sizes (see [`crate::dynamics::DynamicsConfig::eps_fixed`]) refuse every write.
///
/// # Example
/// ```
/// # use lattice_l2hmc::dynamics::StepSizes;
/// let mut step_sizes = StepSizes::new(3, 0.1_f64);
/// step_sizes.set_xeps(2, 0.05_f64).unwrap();
/// assert_eq!(step_sizes.xeps(2), Some(0.05_f64));
/// assert!(step_sizes.set_veps(0, -1_f64).is_err());
/// assert!(step_sizes.set_veps(3, 1_f64).is_err());
///
/// let mut fixed = step_sizes.with_fixed(true);
/// assert!(fixed.set_xeps(0, 0.2_f64).is_err());
/// assert_eq!(fixed.xeps(2), Some(0.05_f64));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct StepSizes {
    xeps: Vec<Real>,
    veps: Vec<Real>,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    fixed: bool,
}

impl StepSizes {
    /// Every step size set to `eps`.
    #[must_use]
    pub fn new(nleapfrog: usize, eps: Real) -> Self {
        Self {
            xeps: vec![eps; nleapfrog],
            veps: vec![eps; nleapfrog],
            fixed: false,
        }
    }

    /// Set whether the step sizes are fixed.
    #[must_use]
    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Whether the step sizes refuse writes.
    #[must_use]
    #[inline]
    pub const fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Create the store from the step sizes.
    ///
    /// # Errors
    /// Returns [`ConfigError::ParameterMismatch`] if the vectors have different lengths and
    /// [`ConfigError::NonPositiveStepSize`] if a value is not strictly positive.
    pub fn from_vecs(xeps: Vec<Real>, veps: Vec<Real>) -> Result<Self, ConfigError> {
        ShapeError::check(ShapeKind::StepSize, xeps.len(), veps.len())?;
        for eps in xeps.iter().chain(veps.iter()) {
            check_step_size(*eps)?;
        }
        Ok(Self {
            xeps,
            veps,
            fixed: false,
        })
    }

    /// Check that there is one value per leapfrog step and that the values are valid.
    ///
    /// # Errors
    /// Same as [`StepSizes::from_vecs`].
    pub fn check(&self, nleapfrog: usize) -> Result<(), ConfigError> {
        ShapeError::check(ShapeKind::StepSize, nleapfrog, self.xeps.len())?;
        ShapeError::check(ShapeKind::StepSize, nleapfrog, self.veps.len())?;
        for eps in self.xeps.iter().chain(self.veps.iter()) {
            check_step_size(*eps)?;
        }
        Ok(())
    }

    /// Position step size of a step.
    #[must_use]
    #[inline]
    pub fn xeps(&self, step: usize) -> Option<Real> {
        self.xeps.get(step).copied()
    }

    /// Momentum step size of a step.
    #[must_use]
    #[inline]
    pub fn veps(&self, step: usize) -> Option<Real> {
        self.veps.get(step).copied()
    }

    /// Both step sizes `(xeps, veps)` of a step.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `step` is out of range.
    pub fn get(&self, step: usize) -> Result<(Real, Real), ShapeError> {
        self.xeps(step)
            .zip(self.veps(step))
            .ok_or_else(|| ShapeError::new(ShapeKind::StepSize, self.nleapfrog(), step))
    }

    /// Number of leapfrog steps.
    #[must_use]
    #[inline]
    pub fn nleapfrog(&self) -> usize {
        self.xeps.len()
    }

    /// All the position step sizes.
    #[must_use]
    #[inline]
    pub fn xeps_slice(&self) -> &[Real] {
        &self.xeps
    }

    /// All the momentum step sizes.
    #[must_use]
    #[inline]
    pub fn veps_slice(&self) -> &[Real] {
        &self.veps
    }

    /// Set the position step size of a step.
    ///
    /// # Errors
    /// Returns [`ConfigError::FixedStepSize`] if the step sizes are fixed,
    /// [`ConfigError::NonPositiveStepSize`] if `eps` is not strictly positive and
    /// [`ConfigError::ParameterMismatch`] if `step` is out of range.
    pub fn set_xeps(&mut self, step: usize, eps: Real) -> Result<(), ConfigError> {
        if self.fixed {
            return Err(ConfigError::FixedStepSize);
        }
        check_step_size(eps)?;
        let nleapfrog = self.nleapfrog();
        let value = self
            .xeps
            .get_mut(step)
            .ok_or_else(|| ShapeError::new(ShapeKind::StepSize, nleapfrog, step))?;
        *value = eps;
        Ok(())
    }

    /// Set the momentum step size of a step.
    ///
    /// # Errors
    /// Same as [`StepSizes::set_xeps`].
    pub fn set_veps(&mut self, step: usize, eps: Real) -> Result<(), ConfigError> {
        if self.fixed {
            return Err(ConfigError::FixedStepSize);
        }
        check_step_size(eps)?;
        let nleapfrog = self.nleapfrog();
        let value = self
            .veps
            .get_mut(step)
            .ok_or_else(|| ShapeError::new(ShapeKind::StepSize, nleapfrog, step))?;
        *value = eps;
        Ok(())
    }
}
