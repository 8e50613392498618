//! Snapshots of a chain used by the transition kernel.
//!
//! A [`State`] is never mutated: every sub-update of the integrator builds a new one.

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::error::{ShapeError, ShapeKind};
use crate::{RVector, Real};

/// Position, momentum and inverse coupling of one chain at one instant.
///
/// # Example
/// ```
/// # use lattice_l2hmc::simulation::State;
/// # use nalgebra::DVector;
/// let state = State::new(DVector::zeros(4), DVector::from_element(4, 1_f64), 2_f64).unwrap();
/// assert_eq!(state.flip_momentum().v(), &DVector::from_element(4, -1_f64));
/// assert!(State::new(DVector::zeros(4), DVector::zeros(3), 2_f64).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct State {
    x: RVector,
    v: RVector,
    beta: Real,
}

impl State {
    /// Create a new state.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `x` and `v` do not have the same length.
    pub fn new(x: RVector, v: RVector, beta: Real) -> Result<Self, ShapeError> {
        ShapeError::check(ShapeKind::Momentum, x.len(), v.len())?;
        Ok(Self { x, v, beta })
    }

    getter!(
        /// The position.
        pub const,
        x,
        RVector
    );

    getter!(
        /// The conjugate momentum.
        pub const,
        v,
        RVector
    );

    getter_copy!(
        /// The inverse coupling.
        pub const,
        beta,
        Real
    );

    /// Length of the position.
    #[must_use]
    #[inline]
    pub fn xdim(&self) -> usize {
        self.x.len()
    }

    /// Same state with a new position.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the length of `x` changes.
    pub fn with_x(&self, x: RVector) -> Result<Self, ShapeError> {
        ShapeError::check(ShapeKind::Position, self.xdim(), x.len())?;
        Ok(Self {
            x,
            v: self.v.clone(),
            beta: self.beta,
        })
    }

    /// Same state with a new momentum.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the length of `v` differs from the position one.
    pub fn with_v(&self, v: RVector) -> Result<Self, ShapeError> {
        ShapeError::check(ShapeKind::Momentum, self.xdim(), v.len())?;
        Ok(Self {
            x: self.x.clone(),
            v,
            beta: self.beta,
        })
    }

    /// Same state with the momentum reversed.
    #[must_use]
    pub fn flip_momentum(&self) -> Self {
        Self {
            x: self.x.clone(),
            v: -&self.v,
            beta: self.beta,
        }
    }

    /// Consume the state and return its position.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // false positive
    pub fn into_x(self) -> RVector {
        self.x
    }
}

/// The states of one sampling step: initial, proposed by the integrator and kept after the
/// accept / reject test.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MonteCarloStates {
    init: State,
    proposed: State,
    out: State,
}

impl MonteCarloStates {
    /// Bundle the states.
    #[must_use]
    #[inline]
    pub const fn new(init: State, proposed: State, out: State) -> Self {
        Self {
            init,
            proposed,
            out,
        }
    }

    getter!(
        /// The state before the transition.
        pub const,
        init,
        State
    );

    getter!(
        /// The state proposed by the integrator.
        pub const,
        proposed,
        State
    );

    getter!(
        /// The state after the accept / reject test.
        pub const,
        out,
        State
    );

    /// Consume self and return the state after the accept / reject test.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // false positive
    pub fn into_out(self) -> State {
        self.out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_updates() {
        let state = State::new(RVector::zeros(3), RVector::from_element(3, 2_f64), 1_f64).unwrap();
        let moved = state.with_x(RVector::from_element(3, 1_f64)).unwrap();
        assert_eq!(moved.v(), state.v());
        assert_eq!(moved.beta(), 1_f64);
        assert!(state.with_x(RVector::zeros(2)).is_err());
        assert!(state.with_v(RVector::zeros(4)).is_err());
        assert_eq!(state.flip_momentum().flip_momentum(), state);
        let states = MonteCarloStates::new(state.clone(), moved.clone(), state.clone());
        assert_eq!(states.proposed(), &moved);
        assert_eq!(states.into_out().into_x(), RVector::zeros(3));
    }
}
