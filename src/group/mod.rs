//! Field manifolds the chains live on.
//!
//! A position `x` of one chain is stored as a [`RVector`] of length `xdim`. How those reals are
//! interpreted is given by a [`Group`]:
//! - [`U1Phase`]: one angle in `(-pi, pi]` per link;
//! - [`Su3`]: one SU(3) matrix per link, stored as [`crate::su3::MATRIX_REAL_SIZE`] reals;
//! - [`Euclidean`]: the flat manifold `R^xdim`, used for toy targets.
//!
//! The transition kernel is written once against the [`Group`] trait. [`Manifold`] dispatches
//! between the implementations from a [`GroupKind`] tag read from the configuration.

mod euclidean;
mod su3;
mod u1;

use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

pub use self::euclidean::Euclidean;
pub use self::su3::Su3;
pub use self::u1::U1Phase;
use crate::error::{ConfigError, ShapeError, ShapeKind};
use crate::{RVector, Real};

/// Tag of the supported groups, as read from a configuration.
///
/// # Example
/// ```
/// use lattice_l2hmc::group::GroupKind;
///
/// assert_eq!("su3".parse::<GroupKind>(), Ok(GroupKind::Su3));
/// assert_eq!("U1".parse::<GroupKind>(), Ok(GroupKind::U1));
/// assert!("SU2".parse::<GroupKind>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum GroupKind {
    /// U(1) phases.
    U1,
    /// SU(3) matrices.
    #[cfg_attr(feature = "serde-serialize", serde(rename = "SU3"))]
    Su3,
    /// Flat manifold.
    Euclidean,
}

impl GroupKind {
    /// All the supported groups.
    pub const ALL: [Self; 3] = [Self::U1, Self::Su3, Self::Euclidean];
}

impl Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U1 => "U1",
            Self::Su3 => "SU3",
            Self::Euclidean => "Euclidean",
        };
        write!(f, "{name}")
    }
}

impl FromStr for GroupKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ConfigError::InvalidGroup(s.to_owned()))
    }
}

/// Capabilities of a field manifold needed by the transition kernel.
///
/// All the methods are pure functions of their inputs, the randomness is given explicitly.
pub trait Group: Sync {
    /// The tag of the group.
    fn kind(&self) -> GroupKind;

    /// Number of reals used to store one group element.
    fn link_size(&self) -> usize;

    /// Whether the elements are angles, i.e. whether angle preserving updates are defined.
    fn is_angular(&self) -> bool {
        false
    }

    /// Check that `xdim` reals can hold a whole number of group elements.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroDimension`] if `xdim == 0` and
    /// [`ConfigError::IncompatibleDimension`] if `xdim` is not a multiple of [`Group::link_size`].
    fn check_dim(&self, xdim: usize) -> Result<(), ConfigError> {
        if xdim == 0 {
            Err(ConfigError::ZeroDimension)
        }
        else if xdim % self.link_size() != 0 {
            Err(ConfigError::IncompatibleDimension {
                group: self.kind(),
                xdim,
            })
        }
        else {
            Ok(())
        }
    }

    /// Random element of the manifold stored in `xdim` reals.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `xdim` is not a multiple of [`Group::link_size`].
    fn random<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized;

    /// Random momentum distributed as `exp(-kinetic_energy(v))`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `xdim` is not a multiple of [`Group::link_size`].
    fn random_momentum<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized;

    /// Kinetic energy of the momentum `v`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the length of `v` is not a multiple of [`Group::link_size`].
    fn kinetic_energy(&self, v: &RVector) -> Result<Real, ShapeError>;

    /// Move `x` along the tangent increment `step` and return an element of the manifold.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `x` and `step` have different lengths.
    fn update_gauge(&self, x: &RVector, step: &RVector) -> Result<RVector, ShapeError>;

    /// Project a vector onto the tangent space (the Lie algebra for matrix groups).
    /// The identity for flat and angular groups.
    fn project_tangent(&self, v: &RVector) -> RVector {
        v.clone()
    }

    /// Numerical encoding of a position fed to the coupling functions.
    fn group_to_vec(&self, x: &RVector) -> RVector;

    /// Inverse of [`Group::group_to_vec`].
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `v` is not a valid encoding length.
    fn vec_to_group(&self, v: &RVector) -> Result<RVector, ShapeError>;
}

/// Check that `found` is a multiple of `link_size`.
fn check_links(link_size: usize, found: usize) -> Result<(), ShapeError> {
    ShapeError::check(
        ShapeKind::GroupElement,
        found - found % link_size,
        found,
    )
}

/// Check that two arrays have the same length.
fn check_same_len(kind: ShapeKind, expected: &RVector, found: &RVector) -> Result<(), ShapeError> {
    ShapeError::check(kind, expected.len(), found.len())
}

/// Runtime choice of the group, built from a [`GroupKind`].
///
/// # Example
/// ```
/// use lattice_l2hmc::group::{Group, GroupKind, Manifold};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let group = Manifold::from(GroupKind::U1);
/// let x = group.random(4, &mut rng).unwrap();
/// assert!(x.iter().all(|angle| angle.abs() <= std::f64::consts::PI));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Manifold {
    /// See [`U1Phase`].
    U1(U1Phase),
    /// See [`Su3`].
    Su3(Su3),
    /// See [`Euclidean`].
    Euclidean(Euclidean),
}

impl From<GroupKind> for Manifold {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::U1 => Self::U1(U1Phase::new()),
            GroupKind::Su3 => Self::Su3(Su3::new()),
            GroupKind::Euclidean => Self::Euclidean(Euclidean::new()),
        }
    }
}

/// Forward a method call to the group inside the enum.
macro_rules! dispatch {
    ($self:ident, $group:ident => $e:expr) => {
        match $self {
            Manifold::U1($group) => $e,
            Manifold::Su3($group) => $e,
            Manifold::Euclidean($group) => $e,
        }
    };
}

impl Group for Manifold {
    fn kind(&self) -> GroupKind {
        dispatch!(self, g => g.kind())
    }

    fn link_size(&self) -> usize {
        dispatch!(self, g => g.link_size())
    }

    fn is_angular(&self) -> bool {
        dispatch!(self, g => g.is_angular())
    }

    fn random<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        dispatch!(self, g => g.random(xdim, rng))
    }

    fn random_momentum<R>(&self, xdim: usize, rng: &mut R) -> Result<RVector, ShapeError>
    where
        R: rand::Rng + ?Sized,
    {
        dispatch!(self, g => g.random_momentum(xdim, rng))
    }

    fn kinetic_energy(&self, v: &RVector) -> Result<Real, ShapeError> {
        dispatch!(self, g => g.kinetic_energy(v))
    }

    fn update_gauge(&self, x: &RVector, step: &RVector) -> Result<RVector, ShapeError> {
        dispatch!(self, g => g.update_gauge(x, step))
    }

    fn project_tangent(&self, v: &RVector) -> RVector {
        dispatch!(self, g => g.project_tangent(v))
    }

    fn group_to_vec(&self, x: &RVector) -> RVector {
        dispatch!(self, g => g.group_to_vec(x))
    }

    fn vec_to_group(&self, v: &RVector) -> Result<RVector, ShapeError> {
        dispatch!(self, g => g.vec_to_group(v))
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use super::*;

    const SEED_RNG: u64 = 0x45_78_93_f4_4a_b0_67_f0;

    #[test]
    fn parse_kind() {
        for kind in GroupKind::ALL {
            assert_eq!(kind.to_string().parse::<GroupKind>(), Ok(kind));
            assert_eq!(
                kind.to_string().to_lowercase().parse::<GroupKind>(),
                Ok(kind)
            );
            assert_eq!(Manifold::from(kind).kind(), kind);
        }
        assert_eq!(
            "SO3".parse::<GroupKind>(),
            Err(ConfigError::InvalidGroup("SO3".to_owned()))
        );
    }

    #[test]
    fn dimension_check() {
        let su3 = Manifold::from(GroupKind::Su3);
        assert!(su3.check_dim(36).is_ok());
        assert_eq!(
            su3.check_dim(8),
            Err(ConfigError::IncompatibleDimension {
                group: GroupKind::Su3,
                xdim: 8
            })
        );
        assert_eq!(
            Manifold::from(GroupKind::U1).check_dim(0),
            Err(ConfigError::ZeroDimension)
        );
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED_RNG);
        assert!(su3.random(20, &mut rng).is_err());
        assert!(su3.random_momentum(20, &mut rng).is_err());
    }

    #[test]
    fn encoding_round_trip() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED_RNG);
        for kind in GroupKind::ALL {
            let group = Manifold::from(kind);
            let xdim = 2 * group.link_size();
            let x = group.random(xdim, &mut rng).unwrap();
            let back = group.vec_to_group(&group.group_to_vec(&x)).unwrap();
            assert_eq_vector!(back, x, 1E-12_f64, "group {}", kind);
        }
    }

    #[test]
    fn kinetic_energy_non_negative() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(SEED_RNG);
        for kind in GroupKind::ALL {
            let group = Manifold::from(kind);
            let xdim = 3 * group.link_size();
            for _ in 0_u32..20_u32 {
                let v = group.random_momentum(xdim, &mut rng).unwrap();
                assert!(group.kinetic_energy(&v).unwrap() >= 0_f64);
            }
            let zero = RVector::zeros(xdim);
            assert_eq!(group.kinetic_energy(&zero).unwrap(), 0_f64);
            let x = group.random(xdim, &mut rng).unwrap();
            assert!(group.update_gauge(&x, &RVector::zeros(xdim + 1)).is_err());
        }
    }
}
