//! Defines different error types.
//!
//! Note that numerical degeneracy (a non finite acceptance probability) is never an error:
//! it is recovered by forcing a rejection, see
//! [`crate::dynamics::Dynamics::compute_accept_prob`].

use std::error::Error;
use std::fmt::{self, Display};

use crate::group::GroupKind;

/// What kind of array had a wrong length, see [`ShapeError`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    /// The position `x` of a state.
    Position,
    /// The conjugate momentum `v` of a state.
    Momentum,
    /// The gradient of the potential.
    Force,
    /// One of the outputs of a coupling function.
    CouplingOutput,
    /// The input of a coupling function.
    CouplingInput,
    /// A binary mask.
    Mask,
    /// The number of inverse coupling `beta` given for a batch.
    Beta,
    /// The number of random number generators given for a batch.
    Rng,
    /// The size of an array is not compatible with the group element size.
    GroupElement,
    /// The step sizes of a leapfrog step.
    StepSize,
    /// A weight or a bias of a coupling function.
    CouplingParameter,
}

impl Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::Momentum => "momentum",
            Self::Force => "force",
            Self::CouplingOutput => "coupling output",
            Self::CouplingInput => "coupling input",
            Self::Mask => "mask",
            Self::Beta => "beta",
            Self::Rng => "random number generator",
            Self::GroupElement => "group element",
            Self::StepSize => "step sizes",
            Self::CouplingParameter => "coupling parameter",
        };
        write!(f, "{name}")
    }
}

/// Length mismatch between arrays that should have the same shape.
///
/// Arrays are never broadcast silently, this error is raised where the mismatch is found.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ShapeError {
    kind: ShapeKind,
    expected: usize,
    found: usize,
}

impl ShapeError {
    /// Create a new error.
    #[must_use]
    pub const fn new(kind: ShapeKind, expected: usize, found: usize) -> Self {
        Self {
            kind,
            expected,
            found,
        }
    }

    /// Return `Ok(())` if `expected == found`, an error otherwise.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the two sizes differ.
    pub const fn check(kind: ShapeKind, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        }
        else {
            Err(Self::new(kind, expected, found))
        }
    }

    getter_copy!(
        /// What array had the wrong size.
        pub const,
        kind,
        ShapeKind
    );

    getter_copy!(
        /// The expected length.
        pub const,
        expected,
        usize
    );

    getter_copy!(
        /// The length found.
        pub const,
        found,
        usize
    );
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shape mismatch for the {}: expected length {}, found {}",
            self.kind, self.expected, self.found
        )
    }
}

impl Error for ShapeError {}

/// Configuration error. They are detected at construction time, never during sampling.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The group tag is not one of the supported groups.
    InvalidGroup(String),
    /// `nleapfrog` must be strictly greater than 0.
    ZeroLeapfrog,
    /// `xdim` must be strictly greater than 0.
    ZeroDimension,
    /// The dimension is not a multiple of the number of reals of a group element.
    IncompatibleDimension {
        /// The group.
        group: GroupKind,
        /// The dimension given.
        xdim: usize,
    },
    /// Step size must be finite and strictly positive.
    NonPositiveStepSize(f64),
    /// The angle preserving (NCP) position update is only defined for angular groups.
    NcpRequiresAngularGroup(GroupKind),
    /// The learned position update is not exactly invertible on this group.
    NonInvertibleConfiguration(GroupKind),
    /// The number of coupling networks does not match the configuration.
    NetworkCount {
        /// Expected number.
        expected: usize,
        /// Number given.
        found: usize,
    },
    /// The masks, the step sizes or the coupling networks do not match the configuration.
    ParameterMismatch(ShapeError),
    /// The step sizes are fixed by the configuration and cannot be written.
    FixedStepSize,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGroup(tag) => write!(
                f,
                "configuration error: unsupported group `{tag}`, expected one of `U1`, `SU3`, `Euclidean`"
            ),
            Self::ZeroLeapfrog => write!(
                f,
                "configuration error: `nleapfrog` must be strictly greater than 0"
            ),
            Self::ZeroDimension => write!(
                f,
                "configuration error: `xdim` must be strictly greater than 0"
            ),
            Self::IncompatibleDimension { group, xdim } => write!(
                f,
                "configuration error: dimension {xdim} is incompatible with the group {group}"
            ),
            Self::NonPositiveStepSize(eps) => write!(
                f,
                "configuration error: step size must be strictly positive, got {eps}"
            ),
            Self::NcpRequiresAngularGroup(group) => write!(
                f,
                "configuration error: NCP position updates require an angular group, got {group}"
            ),
            Self::NonInvertibleConfiguration(group) => write!(
                f,
                "configuration error: learned updates are not exactly invertible on {group}, use the HMC mode"
            ),
            Self::NetworkCount { expected, found } => write!(
                f,
                "configuration error: expected {expected} coupling networks, found {found}"
            ),
            Self::ParameterMismatch(error) => {
                write!(f, "configuration error: parameters do not match: {error}")
            }
            Self::FixedStepSize => write!(
                f,
                "configuration error: the step sizes are fixed and cannot be written"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ParameterMismatch(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ShapeError> for ConfigError {
    fn from(err: ShapeError) -> Self {
        Self::ParameterMismatch(err)
    }
}

/// Error returned by the transition kernel.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub enum DynamicsError {
    /// Shape mismatch, see [`ShapeError`].
    Shape(ShapeError),
    /// Configuration error, see [`ConfigError`].
    Config(ConfigError),
}

impl From<ShapeError> for DynamicsError {
    fn from(err: ShapeError) -> Self {
        Self::Shape(err)
    }
}

impl From<ConfigError> for DynamicsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl Display for DynamicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(error) => write!(f, "{error}"),
            Self::Config(error) => write!(f, "{error}"),
        }
    }
}

impl Error for DynamicsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shape(error) => Some(error),
            Self::Config(error) => Some(error),
        }
    }
}

/// Error while saving or restoring the trained parameters.
#[cfg(feature = "serde-serialize")]
#[non_exhaustive]
#[derive(Debug)]
pub enum PersistError {
    /// Input / output error.
    Io(std::io::Error),
    /// (De)serialization error.
    Serialization(bincode::Error),
    /// The restored parameters are not consistent with their configuration.
    Config(ConfigError),
}

#[cfg(feature = "serde-serialize")]
impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(feature = "serde-serialize")]
impl From<bincode::Error> for PersistError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err)
    }
}

#[cfg(feature = "serde-serialize")]
impl From<ConfigError> for PersistError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "serde-serialize")]
impl Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Serialization(error) => write!(f, "serialization error: {error}"),
            Self::Config(error) => write!(f, "{error}"),
        }
    }
}

#[cfg(feature = "serde-serialize")]
impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Serialization(error) => Some(error),
            Self::Config(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shape_check() {
        assert!(ShapeError::check(ShapeKind::Mask, 4, 4).is_ok());
        let err = ShapeError::check(ShapeKind::Momentum, 4, 5).unwrap_err();
        assert_eq!(err.kind(), ShapeKind::Momentum);
        assert_eq!(err.expected(), 4);
        assert_eq!(err.found(), 5);
        assert_eq!(
            err.to_string(),
            "shape mismatch for the momentum: expected length 4, found 5"
        );
    }

    #[test]
    fn error_source() {
        let shape = ShapeError::new(ShapeKind::Force, 2, 3);
        let error = DynamicsError::from(shape);
        assert!(error.source().is_some());
        let config = ConfigError::from(shape);
        assert!(config.source().is_some());
        assert!(ConfigError::ZeroLeapfrog.source().is_none());
        assert!(!ConfigError::InvalidGroup("SU2".to_owned())
            .to_string()
            .is_empty());
    }
}
