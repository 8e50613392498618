//! Represent the fields on the lattice that are not group elements, i.e. the elements
//! of the Lie algebra used as SU(3) momenta.

use std::ops::{Index, IndexMut, Mul, Neg};

use na::ComplexField;
#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use super::{su3, su3::GENERATORS, CMatrix3, Complex, Real, Vector8, I};

/// Adjoint representation of SU(3), it is su(3) (i.e. the lie algebra).
/// See [`su3::GENERATORS`] to view the order of generators.
/// Note that the generators are normalize such that `Tr[T^a T^b] = \delta^{ab} / 2`
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Su3Adjoint {
    data: Vector8<Real>,
}

impl Su3Adjoint {
    /// create a new Su3Adjoint representation where `M = M^a T^a`, where `T` are generators given in [`su3::GENERATORS`].
    /// # Example
    /// ```
    /// use lattice_l2hmc::{field::Su3Adjoint, Vector8};
    ///
    /// let su3 = Su3Adjoint::new(Vector8::<f64>::from_element(1_f64));
    /// ```
    #[must_use]
    #[inline]
    pub const fn new(data: Vector8<Real>) -> Self {
        Self { data }
    }

    /// create a new Su3Adjoint representation where `M = M^a T^a`, where `T` are generators given in [`su3::GENERATORS`].
    #[must_use]
    #[inline]
    pub fn new_from_array(data: [Real; 8]) -> Self {
        Self::new(Vector8::from(data))
    }

    getter!(
        /// get the data inside the Su3Adjoint.
        pub const,
        data,
        Vector8<Real>
    );

    /// return the su(3) (Lie algebra) matrix.
    /// # Example
    /// ```
    /// # use lattice_l2hmc::{field::Su3Adjoint, su3::GENERATORS};
    /// let su3 = Su3Adjoint::new_from_array([1_f64, 0_f64, 0_f64, 0_f64, 0_f64, 0_f64, 0_f64, 0_f64]);
    /// assert_eq!(su3.to_matrix(), *GENERATORS[0]);
    /// ```
    #[inline]
    #[must_use]
    pub fn to_matrix(&self) -> CMatrix3 {
        self.data
            .iter()
            .enumerate()
            .map(|(pos, el)| *GENERATORS[pos] * Complex::from(el))
            .sum::<CMatrix3>()
    }

    /// Get the coefficients of an hermitian traceless matrix, `M^a = 2 Re Tr(T^a M)`.
    ///
    /// The antihermitian or trace part of the matrix is discarded.
    /// # Example
    /// ```
    /// # use lattice_l2hmc::field::Su3Adjoint;
    /// let su3 = Su3Adjoint::new_from_array([1_f64, 2_f64, 3_f64, 4_f64, 5_f64, 6_f64, 7_f64, 8_f64]);
    /// let back = Su3Adjoint::from_matrix(&su3.to_matrix());
    /// assert!((su3.data() - back.data()).norm() < 1E-12_f64);
    /// ```
    #[inline]
    #[must_use]
    pub fn from_matrix(matrix: &CMatrix3) -> Self {
        Self::new(Vector8::from_fn(|index, _| {
            2_f64 * (*GENERATORS[index] * matrix).trace().real()
        }))
    }

    /// Return the SU(3) matrix associated with this generator, `exp(i v^a T^a)`.
    #[inline]
    #[must_use]
    pub fn to_su3(&self) -> CMatrix3 {
        su3::su3_exp_i(self)
    }

    /// create a new random SU3 adjoint.
    /// # Example
    /// ```
    /// use lattice_l2hmc::field::Su3Adjoint;
    ///
    /// let mut rng = rand::thread_rng();
    /// let distribution = rand::distributions::Uniform::from(-1_f64..1_f64);
    /// let su3 = Su3Adjoint::random(&mut rng, &distribution);
    /// ```
    #[inline]
    #[must_use]
    pub fn random<R>(rng: &mut R, d: &impl rand_distr::Distribution<Real>) -> Self
    where
        R: rand::Rng + ?Sized,
    {
        Self {
            data: Vector8::<Real>::from_fn(|_, _| d.sample(rng)),
        }
    }

    /// Returns the trace of the square of the matrix, `Tr(X^2) = |v|^2 / 2`.
    #[inline]
    #[must_use]
    pub fn trace_squared(&self) -> Real {
        self.data.norm_squared() / 2_f64
    }

    /// Return the t coeff `t = - 1/2 * Tr(X^2)`.
    /// Used for [`su3::su3_exp_i`]
    #[inline]
    #[must_use]
    pub fn t(&self) -> Complex {
        -Complex::from(self.trace_squared() / 2_f64)
    }

    /// Return the d coeff `d = i * det(X)`.
    /// Used for [`su3::su3_exp_i`]
    #[inline]
    #[must_use]
    pub fn d(&self) -> Complex {
        self.to_matrix().determinant() * I
    }

    /// Return the number of data. This number is 8
    #[allow(clippy::unused_self)]
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        8
    }
}

impl Default for Su3Adjoint {
    /// Return the zero element.
    #[inline]
    fn default() -> Self {
        Self::new(Vector8::from_element(0_f64))
    }
}

impl Mul<Real> for Su3Adjoint {
    type Output = Self;

    #[inline]
    fn mul(mut self, rhs: Real) -> Self::Output {
        self.data *= rhs;
        self
    }
}

impl Neg for Su3Adjoint {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.data)
    }
}

impl Index<usize> for Su3Adjoint {
    type Output = Real;

    #[inline]
    fn index(&self, pos: usize) -> &Self::Output {
        &self.data[pos]
    }
}

impl IndexMut<usize> for Su3Adjoint {
    #[inline]
    fn index_mut(&mut self, pos: usize) -> &mut Self::Output {
        &mut self.data[pos]
    }
}

impl From<Vector8<Real>> for Su3Adjoint {
    #[inline]
    fn from(v: Vector8<Real>) -> Self {
        Self::new(v)
    }
}

impl From<Su3Adjoint> for Vector8<Real> {
    #[inline]
    fn from(v: Su3Adjoint) -> Self {
        v.data
    }
}

impl From<Su3Adjoint> for CMatrix3 {
    #[inline]
    fn from(v: Su3Adjoint) -> Self {
        v.to_matrix()
    }
}
