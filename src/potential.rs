//! Potentials (actions) the chains are sampled from.
//!
//! The lattice actions themselves live outside of this crate, the kernel only uses the
//! [`Potential`] trait: the target density is `exp(-beta * action(x))`.

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{RVector, Real};

/// An action and its gradient.
///
/// Implementations must be pure and thread safe, the kernel evaluates them for many chains in
/// parallel.
pub trait Potential: Sync {
    /// The action `S(x)`.
    fn action(&self, x: &RVector) -> Real;

    /// The gradient of the action with respect to the position.
    ///
    /// For [`crate::group::Su3`] positions it is the Lie derivative written as one hermitian
    /// traceless matrix per link, in the layout of [`crate::su3::matrix_to_reals`]: the matrix
    /// `dS/dw^a T^a` where `w^a` moves the link as `U <- exp(i w^a T^a) U`.
    fn grad_action(&self, x: &RVector) -> RVector;

    /// The potential energy `beta * S(x)`.
    fn potential(&self, x: &RVector, beta: Real) -> Real {
        beta * self.action(x)
    }

    /// The force `beta * dS/dx`.
    fn grad_potential(&self, x: &RVector, beta: Real) -> RVector {
        self.grad_action(x) * beta
    }
}

/// Quadratic action `k |x|^2 / 2`.
///
/// # Example
/// ```
/// # use lattice_l2hmc::potential::{Harmonic, Potential};
/// # use nalgebra::DVector;
/// let potential = Harmonic::new(2_f64);
/// let x = DVector::from_element(3, 1_f64);
/// assert_eq!(potential.action(&x), 3_f64);
/// assert_eq!(potential.grad_potential(&x, 0.5_f64), DVector::from_element(3, 1_f64));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Harmonic {
    stiffness: Real,
}

impl Harmonic {
    /// Create the potential with stiffness `k`.
    #[must_use]
    #[inline]
    pub const fn new(stiffness: Real) -> Self {
        Self { stiffness }
    }

    getter_copy!(
        /// The stiffness `k`.
        pub const,
        stiffness,
        Real
    );
}

impl Potential for Harmonic {
    fn action(&self, x: &RVector) -> Real {
        self.stiffness * x.norm_squared() / 2_f64
    }

    fn grad_action(&self, x: &RVector) -> RVector {
        x * self.stiffness
    }
}

/// Periodic action `sum_i (1 - cos x_i)`, a toy target for U(1) phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CosineAction {}

impl CosineAction {
    /// Create the potential.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {}
    }
}

impl Potential for CosineAction {
    fn action(&self, x: &RVector) -> Real {
        x.iter().map(|angle| 1_f64 - angle.cos()).sum()
    }

    fn grad_action(&self, x: &RVector) -> RVector {
        x.map(Real::sin)
    }
}

/// Potential defined by two closures, the action and its gradient.
///
/// # Example
/// ```
/// # use lattice_l2hmc::potential::{FnPotential, Potential};
/// # use nalgebra::DVector;
/// let quartic = FnPotential::new(
///     |x: &DVector<f64>| x.iter().map(|el| el.powi(4)).sum(),
///     |x: &DVector<f64>| x.map(|el| 4_f64 * el.powi(3)),
/// );
/// assert_eq!(quartic.action(&DVector::from_element(2, 1_f64)), 2_f64);
/// ```
#[derive(Clone, Copy)]
pub struct FnPotential<A, G> {
    action: A,
    grad: G,
}

impl<A, G> FnPotential<A, G>
where
    A: Fn(&RVector) -> Real + Sync,
    G: Fn(&RVector) -> RVector + Sync,
{
    /// Create the potential from the action and its gradient.
    pub fn new(action: A, grad: G) -> Self {
        Self { action, grad }
    }
}

impl<A, G> std::fmt::Debug for FnPotential<A, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPotential").finish_non_exhaustive()
    }
}

impl<A, G> Potential for FnPotential<A, G>
where
    A: Fn(&RVector) -> Real + Sync,
    G: Fn(&RVector) -> RVector + Sync,
{
    fn action(&self, x: &RVector) -> Real {
        (self.action)(x)
    }

    fn grad_action(&self, x: &RVector) -> RVector {
        (self.grad)(x)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Central finite difference of the action.
    fn numerical_grad(potential: &impl Potential, x: &RVector) -> RVector {
        let h = 1E-6_f64;
        RVector::from_fn(x.len(), |i, _| {
            let mut plus = x.clone();
            plus[i] += h;
            let mut minus = x.clone();
            minus[i] -= h;
            (potential.action(&plus) - potential.action(&minus)) / (2_f64 * h)
        })
    }

    #[test]
    fn gradients() {
        let x = RVector::from_vec(vec![0.3_f64, -1.2_f64, 2.5_f64, 0_f64]);
        let harmonic = Harmonic::new(1.5_f64);
        assert_eq_vector!(harmonic.grad_action(&x), numerical_grad(&harmonic, &x), 1E-6_f64);
        let cosine = CosineAction::new();
        assert_eq_vector!(cosine.grad_action(&x), numerical_grad(&cosine, &x), 1E-6_f64);
        assert!((cosine.potential(&x, 2_f64) - 2_f64 * cosine.action(&x)).abs() < 1E-12_f64);
        let closure = FnPotential::new(|x: &RVector| harmonic.action(x), |x: &RVector| harmonic.grad_action(x));
        assert_eq!(closure.grad_potential(&x, 3_f64), harmonic.grad_potential(&x, 3_f64));
        assert_eq!(format!("{closure:?}"), "FnPotential { .. }");
    }
}
