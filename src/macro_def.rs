//! defines macro
//!
//! # getter!
//! getter that return a reference
//! ## Examples
//! ```ignore
//! struct a {b: usize}
//! impl a {
//!     getter!(pub, b, usize);
//! }
//! ```
//! ```ignore
//! struct a {b: usize}
//! impl a {
//!     getter!(pub const, b, usize);
//! }
//! ```
//! # getter_copy!
//! create a getter that copy the value.
//! ## Examples
//! ```ignore
//! struct a {b: usize}
//! impl a {
//!     getter_copy!(pub const, b, usize);
//! }
//! ```

macro_rules! getter {
    ($(#[$meta:meta])* $v:vis const, $i:ident, $t:ty) => {
        $(#[$meta])*
        #[must_use]
        #[inline]
        $v const fn $i(&self) -> &$t {
            &self.$i
        }
    };
    ($(#[$meta:meta])* $v:vis, $i:ident, $t:ty) => {
        $(#[$meta])*
        #[must_use]
        #[inline]
        $v fn $i(&self) -> &$t {
            &self.$i
        }
    };
}

macro_rules! getter_copy {
    ($(#[$meta:meta])* $v:vis const, $i:ident, $t:ty) => {
        $(#[$meta])*
        #[must_use]
        #[inline]
        $v const fn $i(&self) -> $t {
            self.$i
        }
    };
    ($(#[$meta:meta])* $v:vis, $i:ident, $t:ty) => {
        $(#[$meta])*
        #[must_use]
        #[inline]
        $v fn $i(&self) -> $t {
            self.$i
        }
    };
}

#[macro_export]
/// assert if two matrices are approximatively the same
macro_rules! assert_eq_matrix {
    ($e:expr, $e2:expr, $epsilon:expr) => {
        assert!(($e - $e2).norm() < $epsilon, "assertion failed: norm `{} > {}`", ($e - $e2).norm(), $epsilon)
    };
    ($e:expr, $e2:expr, $epsilon:expr, $($arg:tt)+) => {
        assert!(($e - $e2).norm() < $epsilon, "assertion failed: norm `{} > {}` : {}", ($e - $e2).norm(), $epsilon, format_args!($($arg)*))
    };
}

#[macro_export]
/// assert that two real vectors are the same component wise up to epsilon (max norm).
macro_rules! assert_eq_vector {
    ($e:expr, $e2:expr, $epsilon:expr) => {{
        let diff = (&$e - &$e2).amax();
        assert!(diff < $epsilon, "assertion failed: max difference `{} > {}`", diff, $epsilon)
    }};
    ($e:expr, $e2:expr, $epsilon:expr, $($arg:tt)+) => {{
        let diff = (&$e - &$e2).amax();
        assert!(diff < $epsilon, "assertion failed: max difference `{} > {}` : {}", diff, $epsilon, format_args!($($arg)*))
    }};
}

#[macro_export]
/// assert if the matrix is SU(3) (special unitary)
macro_rules! assert_matrix_is_su_3 {
    ($m:expr, $epsilon:expr) => {{
        use nalgebra::ComplexField;
        assert!(
            ($m.determinant() - nalgebra::Complex::from(1_f64)).modulus() < $epsilon,
            "determinant {} of {} is not of norm 1",
            $m.determinant().modulus(),
            $m
        );
        assert!(
            ($m * $m.adjoint() - nalgebra::Matrix3::identity()).norm() < $epsilon,
            "The matrix is not unitary {}",
            $m
        );
    }};
}
