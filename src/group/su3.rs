//! SU(3) matrices stored as reals.

use rand_distr::StandardNormal;
#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use super::{check_links, check_same_len, Group, GroupKind};
use crate::error::{ShapeError, ShapeKind};
use crate::field::Su3Adjoint;
use crate::su3::{
    matrix_from_reals, matrix_su3_exp_i, matrix_to_reals, orthonormalize_matrix,
    project_to_su3_lie, random_su3, MATRIX_REAL_SIZE,
};
use crate::{CMatrix3, RVector, Real};

/// SU(3) links, each one stored as [`MATRIX_REAL_SIZE`] reals (see [`crate::su3::matrix_to_reals`]).
///
/// Momenta use the same layout and are hermitian traceless matrices `P = p^a T^a`.
/// The kinetic energy is `Tr(P^2) = |p|^2 / 2` and a position moves as `U <- exp(i P) U`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Su3 {}

impl Su3 {
    /// Create the group.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {}
    }

    /// Apply `f` on each link matrix of `v` and write the result in a new vector.
    fn map_links(v: &RVector, mut f: impl FnMut(usize, CMatrix3) -> CMatrix3) -> RVector {
        let mut out = RVector::zeros(v.len());
        for (index, (link, out_link)) in v
            .as_slice()
            .chunks_exact(MATRIX_REAL_SIZE)
            .zip(out.as_mut_slice().chunks_exact_mut(MATRIX_REAL_SIZE))
            .enumerate()
        {
            matrix_to_reals(&f(index, matrix_from_reals(link)), out_link);
        }
        out
    }

    /// Project each link back onto SU(3), removing the numerical drift.
    #[must_use]
    pub fn reunitarize(&self, x: &RVector) -> RVector {
        Self::map_links(x, |_, m| orthonormalize_matrix(&m))
    }
}

impl Group for Su3 {
    fn kind(&self) -> GroupKind {
        GroupKind::Su3
    }

    fn link_size(&self) -> usize {
        MATRIX_REAL_SIZE
    }

    /// Haar distributed links.
    fn random<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        check_links(self.link_size(), xdim)?;
        Ok(Self::map_links(&RVector::zeros(xdim), |_, _| random_su3(rng)))
    }

    fn random_momentum<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        check_links(self.link_size(), xdim)?;
        Ok(Self::map_links(&RVector::zeros(xdim), |_, _| {
            Su3Adjoint::random(rng, &StandardNormal).to_matrix()
        }))
    }

    fn kinetic_energy(&self, v: &RVector) -> Result<Real, ShapeError> {
        check_links(self.link_size(), v.len())?;
        Ok(v.as_slice()
            .chunks_exact(MATRIX_REAL_SIZE)
            .map(|link| Su3Adjoint::from_matrix(&matrix_from_reals(link)).trace_squared())
            .sum())
    }

    fn update_gauge(&self, x: &RVector, step: &RVector) -> Result<RVector, ShapeError> {
        check_links(self.link_size(), x.len())?;
        check_same_len(ShapeKind::Momentum, x, step)?;
        let steps = step.as_slice();
        Ok(Self::map_links(x, |index, link| {
            let start = index * MATRIX_REAL_SIZE;
            let p = matrix_from_reals(&steps[start..start + MATRIX_REAL_SIZE]);
            matrix_su3_exp_i(&project_to_su3_lie(&p)) * link
        }))
    }

    fn project_tangent(&self, v: &RVector) -> RVector {
        Self::map_links(v, |_, m| project_to_su3_lie(&m))
    }

    fn group_to_vec(&self, x: &RVector) -> RVector {
        x.clone()
    }

    fn vec_to_group(&self, v: &RVector) -> Result<RVector, ShapeError> {
        check_links(self.link_size(), v.len())?;
        Ok(v.clone())
    }
}
