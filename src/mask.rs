//! Binary masks splitting the position update of each leapfrog step in two half-updates.
//!
//! A [`Mask`] `m` selects the coordinates that are *read* by the first position half-update,
//! the coordinates of the complement `1 - m` are *written*. The second half-update swaps the
//! roles so that each coordinate is updated exactly once per leapfrog step.

use std::ops::Index;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ShapeError, ShapeKind};
use crate::{RVector, Real};

/// A binary mask over the coordinates of one chain.
///
/// # Example
/// ```
/// use lattice_l2hmc::mask::Mask;
/// use nalgebra::DVector;
///
/// let mask = Mask::new(vec![true, false, true, false]);
/// let sum = mask.as_float() + mask.complement().as_float();
/// assert_eq!(sum, DVector::from_element(4, 1_f64));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    /// Create a mask from its bits.
    #[must_use]
    #[inline]
    pub const fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// The all-zero mask of length `xdim`.
    #[must_use]
    #[inline]
    pub fn zeros(xdim: usize) -> Self {
        Self::new(vec![false; xdim])
    }

    /// Uniform random partition with `xdim / 2` coordinates selected.
    #[must_use]
    pub fn random<R>(xdim: usize, rng: &mut R) -> Self
    where
        R: rand::Rng + ?Sized,
    {
        let mut bits = vec![false; xdim];
        for index in rand::seq::index::sample(rng, xdim, xdim / 2) {
            bits[index] = true;
        }
        Self::new(bits)
    }

    /// The complement `1 - m`.
    #[must_use]
    pub fn complement(&self) -> Self {
        Self::new(self.bits.iter().map(|bit| !bit).collect())
    }

    /// The mask as a vector of `0` and `1`.
    #[must_use]
    pub fn as_float(&self) -> RVector {
        RVector::from_iterator(self.len(), self.bits.iter().map(|bit| Real::from(u8::from(*bit))))
    }

    /// Keep the selected coordinates of `x` and set the others to zero, `m * x`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `x` does not have the same length as the mask.
    pub fn apply(&self, x: &RVector) -> Result<RVector, ShapeError> {
        ShapeError::check(ShapeKind::Mask, self.len(), x.len())?;
        Ok(RVector::from_fn(x.len(), |i, _| if self.bits[i] { x[i] } else { 0_f64 }))
    }

    /// Take the selected coordinates from `on` and the other ones from `off`,
    /// `m * on + (1 - m) * off`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the inputs do not have the same length as the mask.
    pub fn select(&self, on: &RVector, off: &RVector) -> Result<RVector, ShapeError> {
        ShapeError::check(ShapeKind::Mask, self.len(), on.len())?;
        ShapeError::check(ShapeKind::Mask, self.len(), off.len())?;
        Ok(RVector::from_fn(on.len(), |i, _| {
            if self.bits[i] {
                on[i]
            }
            else {
                off[i]
            }
        }))
    }

    /// Sum of `values` over the selected coordinates.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `values` does not have the same length as the mask.
    pub fn masked_sum(&self, values: &RVector) -> Result<Real, ShapeError> {
        ShapeError::check(ShapeKind::Mask, self.len(), values.len())?;
        Ok(self
            .bits
            .iter()
            .zip(values.iter())
            .filter(|(bit, _)| **bit)
            .map(|(_, value)| value)
            .sum())
    }

    /// Number of selected coordinates.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    /// Length of the mask.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the mask has length zero.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    getter!(
        /// The bits of the mask.
        pub,
        bits,
        [bool]
    );
}

impl Index<usize> for Mask {
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.bits[index]
    }
}

/// One [`Mask`] per leapfrog step, fixed at construction and persisted with the trained
/// parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MaskSet {
    masks: Vec<Mask>,
}

impl MaskSet {
    /// Create a set from the masks.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroLeapfrog`] if `masks` is empty and a
    /// [`ConfigError::ParameterMismatch`] if the masks do not all have the same length.
    pub fn new(masks: Vec<Mask>) -> Result<Self, ConfigError> {
        let first = masks.first().ok_or(ConfigError::ZeroLeapfrog)?;
        for mask in &masks {
            ShapeError::check(ShapeKind::Mask, first.len(), mask.len())?;
        }
        Ok(Self { masks })
    }

    /// Independent random masks, one per leapfrog step.
    ///
    /// # Example
    /// ```
    /// use lattice_l2hmc::mask::MaskSet;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let masks = MaskSet::random(8, 3, &mut rng);
    /// assert_eq!(masks.nleapfrog(), 3);
    /// assert!(masks.iter().all(|mask| mask.count_ones() == 4));
    /// ```
    #[must_use]
    pub fn random<R>(xdim: usize, nleapfrog: usize, rng: &mut R) -> Self
    where
        R: rand::Rng + ?Sized,
    {
        Self {
            masks: (0..nleapfrog).map(|_| Mask::random(xdim, rng)).collect(),
        }
    }

    /// All-zero masks, the whole position is then updated by the first half-update.
    #[must_use]
    pub fn zeros(xdim: usize, nleapfrog: usize) -> Self {
        Self {
            masks: vec![Mask::zeros(xdim); nleapfrog],
        }
    }

    /// Get the mask of a leapfrog step.
    #[must_use]
    #[inline]
    pub fn get(&self, step: usize) -> Option<&Mask> {
        self.masks.get(step)
    }

    /// Number of masks.
    #[must_use]
    #[inline]
    pub fn nleapfrog(&self) -> usize {
        self.masks.len()
    }

    /// Length of the masks.
    #[must_use]
    #[inline]
    pub fn xdim(&self) -> usize {
        self.masks.first().map_or(0, Mask::len)
    }

    /// Iterate over the masks.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Mask> + '_ {
        self.masks.iter()
    }

    /// Check that the set matches `nleapfrog` and `xdim`.
    ///
    /// # Errors
    /// Returns [`ConfigError::ParameterMismatch`] if the number or the length of the masks differ.
    pub fn check(&self, xdim: usize, nleapfrog: usize) -> Result<(), ConfigError> {
        ShapeError::check(ShapeKind::Mask, nleapfrog, self.nleapfrog())?;
        ShapeError::check(ShapeKind::Mask, xdim, self.xdim())?;
        Ok(())
    }
}
