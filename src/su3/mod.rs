//! SU(3) matrices and su(3), the Lie algebra of SU(3).
//!
//! The module defines the SU(3) generator we use the same matrices as on
//! [wikipedia](https://en.wikipedia.org/w/index.php?title=Gell-Mann_matrices&oldid=988659438#Matrices)
//! **divided by two** such that `Tr(T^a T^b) = \delta^{ab} /2 `.
//!
//! It also defines the encoding of a 3x3 complex matrix into 18 reals used by
//! [`crate::group::Su3`] to store a link inside a chain vector.

mod factorial;

use na::ComplexField;
use rand_distr::{Distribution, Uniform};

use self::factorial::FACTORIAL_STORAGE_STAT;
use super::{field::Su3Adjoint, CMatrix3, Complex, Real, I, ZERO};

/// Number of reals used to store a [`CMatrix3`] in a chain vector.
pub const MATRIX_REAL_SIZE: usize = 18;


/// SU(3) generator
/// ```textrust
/// 0    0.5  0
/// 0.5  0    0
/// 0    0    0
/// ```
pub const GENERATOR_1: CMatrix3 = CMatrix3::new(
    ZERO,
    Complex::new(0.5_f64, 0_f64),
    ZERO,
    // ---
    Complex::new(0.5_f64, 0_f64),
    ZERO,
    ZERO,
    // ---
    ZERO,
    ZERO,
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0   -i/2   0
/// i/2  0     0
/// 0    0     0
/// ```
pub const GENERATOR_2: CMatrix3 = CMatrix3::new(
    ZERO,
    Complex::new(0_f64, -0.5_f64),
    ZERO,
    // ---
    Complex::new(0_f64, 0.5_f64),
    ZERO,
    ZERO,
    // ---
    ZERO,
    ZERO,
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0.5  0    0
/// 0   -0.5  0
/// 0    0    0
/// ```
pub const GENERATOR_3: CMatrix3 = CMatrix3::new(
    Complex::new(0.5_f64, 0_f64),
    ZERO,
    ZERO,
    // ---
    ZERO,
    Complex::new(-0.5_f64, 0_f64),
    ZERO,
    // ---
    ZERO,
    ZERO,
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0    0    0.5
/// 0    0    0
/// 0.5  0    0
/// ```
pub const GENERATOR_4: CMatrix3 = CMatrix3::new(
    ZERO,
    ZERO,
    Complex::new(0.5_f64, 0_f64),
    // ---
    ZERO,
    ZERO,
    ZERO,
    // ---
    Complex::new(0.5_f64, 0_f64),
    ZERO,
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0    0   -i/2
/// 0    0    0
/// i/2  0    0
/// ```
pub const GENERATOR_5: CMatrix3 = CMatrix3::new(
    ZERO,
    ZERO,
    Complex::new(0_f64, -0.5_f64),
    // ---
    ZERO,
    ZERO,
    ZERO,
    // ---
    Complex::new(0_f64, 0.5_f64),
    ZERO,
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0    0    0
/// 0    0    0.5
/// 0    0.5  0
/// ```
pub const GENERATOR_6: CMatrix3 = CMatrix3::new(
    ZERO,
    ZERO,
    ZERO,
    // ---
    ZERO,
    ZERO,
    Complex::new(0.5_f64, 0_f64),
    // ---
    ZERO,
    Complex::new(0.5_f64, 0_f64),
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0    0    0
/// 0    0   -i/2
/// 0    i/2  0
/// ```
pub const GENERATOR_7: CMatrix3 = CMatrix3::new(
    ZERO,
    ZERO,
    ZERO,
    // ---
    ZERO,
    ZERO,
    Complex::new(0_f64, -0.5_f64),
    // ---
    ZERO,
    Complex::new(0_f64, 0.5_f64),
    ZERO,
);

/// SU(3) generator
/// ```textrust
/// 0.5/sqrt(3)  0            0
/// 0            0.5/sqrt(3)  0
/// 0            0           -1/sqrt(3)
/// ```
pub const GENERATOR_8: CMatrix3 = CMatrix3::new(
    Complex::new(ONE_OVER_2_SQRT_3, 0_f64),
    ZERO,
    ZERO,
    // ---
    ZERO,
    Complex::new(ONE_OVER_2_SQRT_3, 0_f64),
    ZERO,
    // ---
    ZERO,
    ZERO,
    Complex::new(MINUS_ONE_OVER_SQRT_3, 0_f64),
);

/// -1/sqrt(3), used for [`GENERATOR_8`].
const MINUS_ONE_OVER_SQRT_3: f64 = -0.577_350_269_189_625_8_f64;
/// 2/sqrt(3), used for [`GENERATOR_8`].
const ONE_OVER_2_SQRT_3: f64 = 0.288_675_134_594_812_9_f64;

/// list of SU(3) generators
/// they are normalize such that `Tr(T^a T^b) = \frac{1}{2}\delta^{ab}`
pub const GENERATORS: [&CMatrix3; 8] = [
    &GENERATOR_1,
    &GENERATOR_2,
    &GENERATOR_3,
    &GENERATOR_4,
    &GENERATOR_5,
    &GENERATOR_6,
    &GENERATOR_7,
    &GENERATOR_8,
];

/// number of step for the computation of matrix exponential using the Cayley–Hamilton theorem.
const N: usize = 26;

/// Coefficients `(q0, q1, q2)` such that `exp(i X) = q0 + q1 X + q2 X^2`
/// for `X` hermitian traceless with `t = -Tr(X^2) / 2` and `d = i det(X)`.
#[allow(clippy::as_conversions)] // no try into for f64
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::missing_panics_doc)] // does not panic
#[inline]
fn exp_i_coefficients(t: Complex, d: Complex) -> (Complex, Complex, Complex) {
    /// numbers of loops: `N - 1`
    const N_LOOP: usize = N - 1;
    let inverse_factorial = |i: usize| {
        Complex::from(
            1_f64
                / *FACTORIAL_STORAGE_STAT
                    .try_get_factorial(i)
                    .expect("always exist") as f64,
        )
    };
    let mut q0: Complex = inverse_factorial(N_LOOP);
    let mut q1: Complex = ZERO;
    let mut q2: Complex = ZERO;
    for i in (0..N_LOOP).rev() {
        let q0_n = inverse_factorial(i) + d * q2;
        let q1_n = I * (q0 - t * q2);
        let q2_n = I * q1;

        q0 = q0_n;
        q1 = q1_n;
        q2 = q2_n;
    }
    (q0, q1, q2)
}

/// give the SU3 matrix from the adjoint rep, i.e compute `exp(i v^a T^a )`
///
/// The algorithm use is much more efficient the diagonalization method.
/// It use the Cayley–Hamilton theorem. If you wish to find more about it you can read the
/// [OpenQCD](https://luscher.web.cern.ch/luscher/openQCD/) documentation that can be found
/// [here](https://github.com/sa2c/OpenQCD-AVX512/blob/master/doc/su3_fcts.pdf) or by downloading a release.
/// Note that the documentation above explain the algorithm for exp(X) here it is a modified version for
/// exp(i X).
///
/// # Example
/// ```
/// # use lattice_l2hmc::{assert_matrix_is_su_3, field::Su3Adjoint, su3::su3_exp_i, Vector8};
/// let v = Su3Adjoint::new(Vector8::from_element(0.3_f64));
/// assert_matrix_is_su_3!(su3_exp_i(&v), 1E-10_f64);
/// ```
#[inline]
#[must_use]
pub fn su3_exp_i(su3_adj: &Su3Adjoint) -> CMatrix3 {
    let (q0, q1, q2) = exp_i_coefficients(su3_adj.t(), su3_adj.d());
    let m = su3_adj.to_matrix();
    CMatrix3::from_diagonal_element(q0) + m * q1 + m * m * q2
}

/// the input must be a su(3) matrix (hermitian traceless), gives `exp(i X)`.
///
/// See [`su3_exp_i`] for the algorithm.
///
/// # Panics
/// The input matrix must be an su(3) (Lie algebra of SU(3)) matrix or approximately su(3),
/// otherwise the function will panic in debug mod, in release the output gives unexpected values.
/// Use [`project_to_su3_lie`] if the input may contain numerical noise.
#[inline]
#[must_use]
pub fn matrix_su3_exp_i(matrix: &CMatrix3) -> CMatrix3 {
    debug_assert!(
        is_matrix_su3_lie(matrix, f64::EPSILON * 1_000_f64),
        "the matrix is not sufficiently close to an su3 lie"
    );
    let d: Complex = matrix.determinant() * I;
    let t: Complex = -Complex::from(0.5_f64) * (matrix * matrix).trace();
    let (q0, q1, q2) = exp_i_coefficients(t, d);
    CMatrix3::from_diagonal_element(q0) + matrix * q1 + matrix * matrix * q2
}

/// Return the hermitian traceless part of a matrix, `(M + M^†) / 2 - Tr(M) / 3`.
///
/// # Example
/// ```
/// # use lattice_l2hmc::su3::{is_matrix_su3_lie, project_to_su3_lie};
/// # use lattice_l2hmc::{CMatrix3, Complex};
/// let m = CMatrix3::from_fn(|i, j| Complex::new(i as f64, j as f64));
/// assert!(is_matrix_su3_lie(&project_to_su3_lie(&m), 1E-12_f64));
/// ```
#[inline]
#[must_use]
pub fn project_to_su3_lie(matrix: &CMatrix3) -> CMatrix3 {
    let hermitian = (matrix + matrix.adjoint()) * Complex::from(0.5_f64);
    let trace = hermitian.trace() / Complex::from(3_f64);
    hermitian - CMatrix3::from_diagonal_element(trace)
}

/// Create a [`CMatrix3`] of the form `[v1, v2, v1* x v2*]` where v1* is the conjugate of v1 and
/// `x` is the cross product.
#[inline]
#[must_use]
fn create_matrix_from_2_vector(
    v1: na::Vector3<Complex>,
    v2: na::Vector3<Complex>,
) -> CMatrix3 {
    let cross_vec: na::Vector3<Complex> = v1.conjugate().cross(&v2.conjugate());
    let iter = v1.iter().chain(v2.iter()).chain(cross_vec.iter()).copied();
    CMatrix3::from_iterator(iter)
}

/// get an orthonormalize matrix from two vector.
#[inline]
#[must_use]
fn ortho_matrix_from_2_vector(v1: na::Vector3<Complex>, v2: na::Vector3<Complex>) -> CMatrix3 {
    let v1_new = v1.try_normalize(f64::EPSILON).unwrap_or(v1);
    let v2_temp = v2 - v1_new * v1_new.conjugate().dot(&v2);
    let v2_new = v2_temp.try_normalize(f64::EPSILON).unwrap_or(v2_temp);
    create_matrix_from_2_vector(v1_new, v2_new)
}

/// Try orthonormalize the given matrix, projecting it back to SU(3).
#[inline]
#[must_use]
pub fn orthonormalize_matrix(matrix: &CMatrix3) -> CMatrix3 {
    let v1 = na::Vector3::from_iterator(matrix.column(0).iter().copied());
    let v2 = na::Vector3::from_iterator(matrix.column(1).iter().copied());
    ortho_matrix_from_2_vector(v1, v2)
}

/// Generate Uniformly distributed SU(3) matrix.
///
/// The two first columns are drawn from an isotropic gaussian distribution and orthonormalized,
/// the last one is fixed by the determinant. This gives the Haar measure.
///
/// # Example
/// ```
/// # use lattice_l2hmc::{assert_matrix_is_su_3, su3::random_su3};
/// # use rand::SeedableRng;
/// # let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// for _ in 0..10 {
///     assert_matrix_is_su_3!(random_su3(&mut rng), 9_f64 * f64::EPSILON);
/// }
/// ```
#[inline]
#[must_use]
pub fn random_su3<Rng>(rng: &mut Rng) -> CMatrix3
where
    Rng: rand::Rng + ?Sized,
{
    let d = rand_distr::StandardNormal;
    let mut v1 = random_vec_3(rng, &d);
    while v1.norm() <= f64::EPSILON {
        v1 = random_vec_3(rng, &d);
    }
    let mut v2 = random_vec_3(rng, &d);
    while v1.dot(&v2).modulus() <= f64::EPSILON {
        v2 = random_vec_3(rng, &d);
    }
    ortho_matrix_from_2_vector(v1, v2)
}

/// get a random [`nalgebra::Vector3<Complex>`].
#[inline]
#[must_use]
fn random_vec_3<Rng>(rng: &mut Rng, d: &impl Distribution<Real>) -> na::Vector3<Complex>
where
    Rng: rand::Rng + ?Sized,
{
    na::Vector3::from_fn(|_, _| Complex::new(d.sample(rng), d.sample(rng)))
}

/// Crate a random 3x3 Matrix, used for tests.
#[doc(hidden)]
#[inline]
#[must_use]
pub fn random_matrix_3<R: rand::Rng + ?Sized>(rng: &mut R) -> CMatrix3 {
    let d = Uniform::from(-10_f64..10_f64);
    CMatrix3::from_fn(|_, _| Complex::new(d.sample(rng), d.sample(rng)))
}

/// Return wether the input matrix is SU(3) up to epsilon.
#[inline]
#[must_use]
pub fn is_matrix_su3(m: &CMatrix3, epsilon: f64) -> bool {
    ((m.determinant() - Complex::from(1_f64)).modulus_squared() < epsilon)
        && ((m * m.adjoint() - CMatrix3::identity()).norm() < epsilon)
}

/// Returns wether the given matrix is in the lie algebra su(3) that generates SU(3) up to epsilon.
#[inline]
#[must_use]
pub fn is_matrix_su3_lie(matrix: &CMatrix3, epsilon: Real) -> bool {
    matrix.trace().modulus() < epsilon && (matrix - matrix.adjoint()).norm() < epsilon
}

/// Write the matrix in 18 reals, row-major with the real part before the imaginary part.
///
/// # Panics
/// Panics if `out` is not of length [`MATRIX_REAL_SIZE`].
#[inline]
pub fn matrix_to_reals(matrix: &CMatrix3, out: &mut [Real]) {
    assert_eq!(out.len(), MATRIX_REAL_SIZE);
    for i in 0..3 {
        for j in 0..3 {
            let el = matrix[(i, j)];
            out[2 * (3 * i + j)] = el.re;
            out[2 * (3 * i + j) + 1] = el.im;
        }
    }
}

/// Read a matrix from 18 reals, inverse of [`matrix_to_reals`].
///
/// # Panics
/// Panics if `data` is not of length [`MATRIX_REAL_SIZE`].
///
/// # Example
/// ```
/// # use lattice_l2hmc::su3::{matrix_from_reals, matrix_to_reals, random_su3};
/// # use rand::SeedableRng;
/// # let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let m = random_su3(&mut rng);
/// let mut data = [0_f64; 18];
/// matrix_to_reals(&m, &mut data);
/// assert_eq!(matrix_from_reals(&data), m);
/// ```
#[inline]
#[must_use]
pub fn matrix_from_reals(data: &[Real]) -> CMatrix3 {
    assert_eq!(data.len(), MATRIX_REAL_SIZE);
    CMatrix3::from_fn(|i, j| Complex::new(data[2 * (3 * i + j)], data[2 * (3 * i + j) + 1]))
}
