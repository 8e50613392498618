//! Leapfrog integrators used by the transition kernel.
//!
//! The transition kernel ([`crate::dynamics::Dynamics::transition_kernel`]) is written once
//! against [`LeapfrogIntegrator`]. Two implementations are given:
//! - [`AugmentedLeapfrog`], the learned leapfrog: momentum updates and masked position
//!   half-updates parametrized by coupling functions, tracking the log-Jacobian;
//! - [`HmcLeapfrog`], the plain leapfrog of the group, volume preserving.
//!
//! For both, a [`Direction::Backward`] trajectory is the exact inverse of a
//! [`Direction::Forward`] one: running a forward trajectory and then a backward one from the
//! result gives back the initial state, and the log-Jacobians are opposite.

mod augmented;
mod hmc;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

pub use self::augmented::AugmentedLeapfrog;
pub use self::hmc::HmcLeapfrog;
use crate::error::{DynamicsError, ShapeError};
use crate::simulation::State;
use crate::Real;

/// Direction of a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Steps `0, 1, .., n - 1` with the forward sub-updates.
    Forward,
    /// Steps `n - 1, .., 0` with the inverse sub-updates.
    Backward,
}

impl Direction {
    /// The other direction.
    #[must_use]
    #[inline]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// [`Direction::Forward`] if `forward` is true.
    #[must_use]
    #[inline]
    pub const fn from_bit(forward: bool) -> Self {
        if forward {
            Self::Forward
        }
        else {
            Self::Backward
        }
    }

    /// Index of the physical step updated at the position `step` of a trajectory of
    /// `nleapfrog` steps.
    ///
    /// # Example
    /// ```
    /// # use lattice_l2hmc::integrator::Direction;
    /// assert_eq!(Direction::Forward.physical_step(0, 4), 0);
    /// assert_eq!(Direction::Backward.physical_step(0, 4), 3);
    /// ```
    #[must_use]
    #[inline]
    pub const fn physical_step(self, step: usize, nleapfrog: usize) -> usize {
        match self {
            Self::Forward => step,
            Self::Backward => nleapfrog - step - 1,
        }
    }
}

/// A full leapfrog step of a trajectory.
pub trait LeapfrogIntegrator {
    /// Number of leapfrog steps of a trajectory.
    fn nleapfrog(&self) -> usize;

    /// The step sizes `(xeps, veps)` used by the physical step `step`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `step` is out of range.
    fn step_sizes(&self, step: usize) -> Result<(Real, Real), ShapeError>;

    /// Run the leapfrog step at position `step` of a trajectory in the given direction.
    /// Returns the new state and the log-Jacobian of the step.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent or if a coupling network is missing.
    fn leapfrog(
        &self,
        step: usize,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Real), DynamicsError>;
}

impl<T: LeapfrogIntegrator + ?Sized> LeapfrogIntegrator for &T {
    fn nleapfrog(&self) -> usize {
        (**self).nleapfrog()
    }

    fn step_sizes(&self, step: usize) -> Result<(Real, Real), ShapeError> {
        (**self).step_sizes(step)
    }

    fn leapfrog(
        &self,
        step: usize,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Real), DynamicsError> {
        (**self).leapfrog(step, state, direction)
    }
}
