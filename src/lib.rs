//! # Lattice L2HMC
//!
//! ![](https://img.shields.io/badge/language-Rust-orange)
//!
//! Learned-proposal Hybrid Monte Carlo ("L2HMC") for lattice gauge field configurations.
//!
//! This library provides a Hamiltonian Monte Carlo transition kernel whose leapfrog update is
//! augmented by trainable, invertible coordinate transformations ("coupling functions").
//! The kernel keeps track of the log of the Jacobian determinant of those transformations such that
//! the Metropolis-Hastings test stays exact, and it combines a forward and a backward trajectory
//! through a random direction bit per chain to keep the Markov chain time-reversible.
//!
//! **Features**:
//! - U(1) phases, SU(3) matrices and a flat manifold through the [`group::Group`] trait;
//! - Learned (augmented) leapfrog with masked position half-updates and log-Jacobian tracking;
//! - Angle-preserving ("NCP") position updates for U(1);
//! - Plain HMC as a configuration switch sharing the same state and acceptance machinery;
//! - Batched, parallel (rayon) and reproducible: each chain owns its random number generator;
//! - Serde support for the configuration and the trained parameters;
//! - Native rust;
//!
//! **Not implemented (external collaborators)**:
//! - Neural network bodies, training loops and optimizers;
//! - Lattice actions. Only a [`potential::Potential`] trait and toy potentials are provided.
//!
//! ## Usage
//!
//! Let us run a few transitions of plain leapfrog-like dynamics (identity coupling functions) on
//! a flat 8 dimensional target.
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use lattice_l2hmc::{
//!     coupling::{CouplingNetworks, IdentityCoupling},
//!     dynamics::{Beta, Dynamics, DynamicsConfig},
//!     group::GroupKind,
//!     potential::Harmonic,
//!     rng::chain_rngs,
//! };
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0); // change with your seed
//! let config = DynamicsConfig::new(GroupKind::Euclidean, 8, 2, 0.1_f64)?;
//! let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
//! let dynamics = Dynamics::new(config, Harmonic::new(1_f64), networks, &mut rng)?;
//!
//! let mut rngs = chain_rngs(0x45_78_93_f4, 4);
//! let mut x = vec![nalgebra::DVector::zeros(8); 4];
//! for _ in 0..10 {
//!     let transition = dynamics.apply_transition_batch(&x, &Beta::Scalar(1_f64), &mut rngs)?;
//!     println!("acceptance rate {}", transition.acceptance_rate());
//!     x = transition.into_positions();
//! }
//! #     Ok(())
//! # }
//! ```
//!
//! ## Discussion about Random Number Generators (RNGs)
//!
//! This library use the trait [`rand::Rng`] any time a random number generator is needed and it
//! never uses a global generator. The choice of RNG is up to the user of the library.
//!
//! - **Recomanded** [`rand_xoshiro::Xoshiro256PlusPlus`](https://docs.rs/rand_xoshiro/0.6.0/rand_xoshiro/struct.Xoshiro256PlusPlus.html)
//! Non-cryptographic. It has good performance and statistical quality, reproducible, and has useful `jump` function.
//! The `jump` function is used by [`rng::chain_rngs`] to give one independent stream per chain.
//! - [`rand::rngs::StdRng`](https://docs.rs/rand/0.8.3/rand/rngs/struct.StdRng.html) cryptographic secure, can be seeded.
//! It is determinist but not reproducible between platform. It is however slow.

#![warn(clippy::cast_sign_loss)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::cast_possible_wrap)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::cognitive_complexity)]
#![warn(clippy::float_cmp_const)]
#![warn(clippy::implicit_hasher)]
#![warn(clippy::implicit_saturating_sub)]
#![warn(clippy::imprecise_flops)]
#![warn(clippy::large_types_passed_by_value)]
#![warn(clippy::macro_use_imports)]
#![warn(clippy::manual_ok_or)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::suboptimal_flops)]
#![warn(clippy::todo)]
#![warn(clippy::trivially_copy_pass_by_ref)]
#![warn(clippy::unreadable_literal)]
#![warn(clippy::unseparated_literal_suffix)]
#![warn(clippy::unused_self)]
#![warn(clippy::missing_errors_doc)]
#![warn(missing_docs)]

extern crate nalgebra as na;

pub use na::ComplexField;
pub use rand::{Rng, SeedableRng};
pub use rand_distr::Distribution;

#[macro_use]
mod macro_def;
pub mod coupling;
pub mod dynamics;
pub mod error;
pub mod field;
pub mod group;
pub mod integrator;
pub mod mask;
pub mod metrics;
pub mod potential;
pub mod prelude;
pub mod rng;
pub mod simulation;
pub mod statistics;
pub mod su3;

#[cfg(test)]
mod test;

/// alias for [`f64`]
pub type Real = f64;
/// easy to use allias for [`nalgebra::Complex::<Real>`]
pub type Complex = na::Complex<Real>;
/// alias for [`nalgebra::SVector::<N, 8>`]
pub type Vector8<N> = na::SVector<N, 8>;
/// alias for [`nalgebra::Matrix3<nalgebra::Complex>`]
pub type CMatrix3 = na::Matrix3<Complex>;
/// alias for a dynamically sized vector of [`Real`], the storage of one chain.
pub type RVector = na::DVector<Real>;

/// Complex I
const I: Complex = Complex::new(0_f64, 1_f64);
/// Complex 0
const ZERO: Complex = Complex::new(0_f64, 0_f64);
