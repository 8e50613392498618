//! Flat manifold.

use rand_distr::{Distribution, StandardNormal};
#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use super::{check_links, check_same_len, Group, GroupKind};
use crate::error::{ShapeError, ShapeKind};
use crate::{RVector, Real};

/// The flat manifold `R^n`. Positions are updated by addition and encoded as themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Euclidean {}

impl Euclidean {
    /// Create the group.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {}
    }
}

impl Group for Euclidean {
    fn kind(&self) -> GroupKind {
        GroupKind::Euclidean
    }

    fn link_size(&self) -> usize {
        1
    }

    /// Standard normal coordinates.
    fn random<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        Ok(RVector::from_fn(xdim, |_, _| StandardNormal.sample(rng)))
    }

    fn random_momentum<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        self.random(xdim, rng)
    }

    fn kinetic_energy(&self, v: &RVector) -> Result<Real, ShapeError> {
        check_links(self.link_size(), v.len())?;
        Ok(v.norm_squared() / 2_f64)
    }

    fn update_gauge(&self, x: &RVector, step: &RVector) -> Result<RVector, ShapeError> {
        check_same_len(ShapeKind::Momentum, x, step)?;
        Ok(x + step)
    }

    fn group_to_vec(&self, x: &RVector) -> RVector {
        x.clone()
    }

    fn vec_to_group(&self, v: &RVector) -> Result<RVector, ShapeError> {
        Ok(v.clone())
    }
}
