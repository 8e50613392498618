//! Module for testes

use std::f64::consts::PI;

use nalgebra::ComplexField;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::Uniform;

use super::{field::*, su3::*, CMatrix3, Complex, Vector8, I, ZERO};

mod dynamics;

/// Defines a small value to compare f64.
const EPSILON: f64 = 0.000_000_001_f64;

const SEED_RNG: u64 = 0x45_78_93_f4_4a_b0_67_f0;

/// test [`su3_exp_i`] and [`Su3Adjoint::to_su3`] on the first two generators
#[allow(clippy::similar_names)] // factor_i and factor_mi are too similar. For this test it is not too confusing
fn test_exp_su3(factor: f64) {
    let one = Complex::from(1_f64);
    let factor_i = Complex::from(factor) * I;
    let m_g1_exp = CMatrix3::new(
        factor_i.cosh(),
        factor_i.sinh(),
        ZERO,
        // ---
        factor_i.sinh(),
        factor_i.cosh(),
        ZERO,
        // ---
        ZERO,
        ZERO,
        one,
    );
    let mut v1 = Vector8::zeros();
    v1[0] = factor * 2_f64;
    let gen1_equiv = Su3Adjoint::new(v1);
    assert_eq_matrix!(gen1_equiv.to_su3(), m_g1_exp, EPSILON);
    assert_eq_matrix!(su3_exp_i(&gen1_equiv), m_g1_exp, EPSILON);

    let factor_mi = factor_i * I;
    let m_g2_exp = CMatrix3::new(
        factor_mi.cos(),
        -factor_mi.sin(),
        ZERO,
        // ---
        factor_mi.sin(),
        factor_mi.cos(),
        ZERO,
        // ---
        ZERO,
        ZERO,
        one,
    );
    let mut v2 = Vector8::zeros();
    v2[1] = factor * 2_f64;
    let gen2_equiv = Su3Adjoint::new(v2);
    assert_eq_matrix!(gen2_equiv.to_su3(), m_g2_exp, EPSILON);
    assert_eq_matrix!(su3_exp_i(&gen2_equiv), m_g2_exp, EPSILON);
}

#[test]
/// basic test of [`su3_exp_i`] and [`Su3Adjoint::to_su3`]
fn test_exp_basic() {
    test_exp_su3(1_f64);
    test_exp_su3(2_f64);
    test_exp_su3(-1.254_f64);
    test_exp_su3(4.254_f64);
}

#[test]
/// test equivalence of [`su3_exp_i`] and the nalgebra matrix exponential
fn equivalence_exp_i() {
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let d = Uniform::from(-PI..PI);
    for i in 0..8 {
        let mut vec = Vector8::zeros();
        vec[i] = 1_f64;
        let v = Su3Adjoint::new(vec);
        let exp_r = su3_exp_i(&v);
        let exp_l = (v.to_matrix() * I).exp();
        assert_eq_matrix!(exp_r, exp_l, EPSILON);
    }
    for _ in 0_u32..100_u32 {
        let v = Su3Adjoint::random(&mut rng, &d);
        let exp_r = su3_exp_i(&v);
        let exp_l = (v.to_matrix() * I).exp();
        assert_eq_matrix!(exp_r, exp_l, EPSILON);
        assert!(is_matrix_su3(&exp_r, EPSILON));
    }
}

#[test]
/// the momentum encoding of the group and the adjoint representation agree
fn adjoint_round_trip() {
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let d = Uniform::from(-1_f64..1_f64);
    for _ in 0_u32..20_u32 {
        let v = Su3Adjoint::random(&mut rng, &d);
        let m = v.to_matrix();
        assert!(is_matrix_su3_lie(&m, EPSILON));
        let mut reals = [0_f64; MATRIX_REAL_SIZE];
        matrix_to_reals(&m, &mut reals);
        let back = Su3Adjoint::from_matrix(&matrix_from_reals(&reals));
        assert!((back.data() - v.data()).norm() < EPSILON);
    }
}
