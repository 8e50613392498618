//! U(1) phases.

use std::f64::consts::PI;

use rand_distr::{Distribution, StandardNormal, Uniform};
#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use super::{check_links, check_same_len, Group, GroupKind};
use crate::error::{ShapeError, ShapeKind};
use crate::{RVector, Real};

/// U(1) phases, one angle in `(-pi, pi]` per link.
///
/// The kinetic energy is the flat one, `|v|^2 / 2`. The coupling functions see the angles
/// through `[cos x, sin x]` so that they are continuous across the branch cut.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct U1Phase {}

impl U1Phase {
    /// Create the group.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {}
    }

    /// Bring an angle in `(-pi, pi]`.
    ///
    /// # Example
    /// ```
    /// # use lattice_l2hmc::group::U1Phase;
    /// # use std::f64::consts::PI;
    /// assert!((U1Phase::wrap(3_f64 * PI / 2_f64) + PI / 2_f64).abs() < 1E-12_f64);
    /// assert_eq!(U1Phase::wrap(-PI), PI);
    /// ```
    #[must_use]
    #[inline]
    pub fn wrap(angle: Real) -> Real {
        let wrapped = PI - (PI - angle).rem_euclid(2_f64 * PI);
        if wrapped <= -PI {
            wrapped + 2_f64 * PI
        }
        else {
            wrapped
        }
    }
}

impl Group for U1Phase {
    fn kind(&self) -> GroupKind {
        GroupKind::U1
    }

    fn link_size(&self) -> usize {
        1
    }

    fn is_angular(&self) -> bool {
        true
    }

    fn random<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        let d = Uniform::new_inclusive(-PI, PI);
        Ok(RVector::from_fn(xdim, |_, _| Self::wrap(d.sample(rng))))
    }

    fn random_momentum<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        Ok(RVector::from_fn(xdim, |_, _| StandardNormal.sample(rng)))
    }

    fn kinetic_energy(&self, v: &RVector) -> Result<Real, ShapeError> {
        check_links(self.link_size(), v.len())?;
        Ok(v.norm_squared() / 2_f64)
    }

    fn update_gauge(&self, x: &RVector, step: &RVector) -> Result<RVector, ShapeError> {
        check_same_len(ShapeKind::Momentum, x, step)?;
        Ok((x + step).map(Self::wrap))
    }

    fn group_to_vec(&self, x: &RVector) -> RVector {
        let n = x.len();
        RVector::from_fn(2 * n, |i, _| {
            if i < n {
                x[i].cos()
            }
            else {
                x[i - n].sin()
            }
        })
    }

    fn vec_to_group(&self, v: &RVector) -> Result<RVector, ShapeError> {
        ShapeError::check(ShapeKind::GroupElement, v.len() - v.len() % 2, v.len())?;
        let n = v.len() / 2;
        Ok(RVector::from_fn(n, |i, _| v[n + i].atan2(v[i])))
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn wrap_range() {
        for angle in [-7_f64, -PI, -1_f64, 0_f64, 1_f64, PI, 4_f64, 10_f64, 100_f64] {
            let wrapped = U1Phase::wrap(angle);
            assert!(wrapped > -PI && wrapped <= PI, "{angle} -> {wrapped}");
            assert!((wrapped.sin() - angle.sin()).abs() < 1E-12_f64);
            assert!((wrapped.cos() - angle.cos()).abs() < 1E-12_f64);
        }
    }

    #[test]
    fn update_gauge_stays_in_range() {
        let group = U1Phase::new();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let x = group.random(16, &mut rng).unwrap();
        let step = group.random_momentum(16, &mut rng).unwrap() * 10_f64;
        let y = group.update_gauge(&x, &step).unwrap();
        assert!(y.iter().all(|a| *a > -PI && *a <= PI));
        let back = group.update_gauge(&y, &-step).unwrap();
        let diff = (back - &x).map(U1Phase::wrap);
        assert!(diff.amax() < 1E-10_f64);
        assert_eq!(group.group_to_vec(&x).len(), 32);
        assert!(group.vec_to_group(&RVector::zeros(3)).is_err());
    }
}
