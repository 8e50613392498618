//! Plain leapfrog of the group.

use super::{Direction, LeapfrogIntegrator};
use crate::error::{DynamicsError, ShapeError, ShapeKind};
use crate::group::Group;
use crate::potential::Potential;
use crate::simulation::State;
use crate::{RVector, Real};

/// Plain HMC leapfrog: `v <- v - eps / 2 f`, `x <- retract(x, eps v)`, `v <- v - eps / 2 f`.
///
/// It preserves the volume, the log-Jacobian is always `0`. The backward step runs
/// `v <- v + eps / 2 f`, `x <- retract(x, -eps v)`, `v <- v + eps / 2 f`.
#[derive(Debug, Clone, Copy)]
pub struct HmcLeapfrog<'a, G, P> {
    group: &'a G,
    potential: &'a P,
    eps: Real,
    nleapfrog: usize,
}

impl<'a, G, P> HmcLeapfrog<'a, G, P>
where
    G: Group,
    P: Potential,
{
    /// Create the integrator.
    #[must_use]
    pub const fn new(group: &'a G, potential: &'a P, eps: Real, nleapfrog: usize) -> Self {
        Self {
            group,
            potential,
            eps,
            nleapfrog,
        }
    }

    getter_copy!(
        /// The step size.
        pub const,
        eps,
        Real
    );

    /// The force, projected on the tangent space of the group.
    fn force(&self, state: &State) -> Result<RVector, ShapeError> {
        let force = self.potential.grad_potential(state.x(), state.beta());
        ShapeError::check(ShapeKind::Force, state.xdim(), force.len())?;
        Ok(self.group.project_tangent(&force))
    }

    /// Half momentum update.
    fn kick(&self, state: &State, sign: Real) -> Result<State, ShapeError> {
        let force = self.force(state)?;
        state.with_v(state.v() + force * (sign * self.eps / 2_f64))
    }
}

impl<'a, G, P> LeapfrogIntegrator for HmcLeapfrog<'a, G, P>
where
    G: Group,
    P: Potential,
{
    fn nleapfrog(&self) -> usize {
        self.nleapfrog
    }

    fn step_sizes(&self, _step: usize) -> Result<(Real, Real), ShapeError> {
        Ok((self.eps, self.eps))
    }

    fn leapfrog(
        &self,
        _step: usize,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Real), DynamicsError> {
        let sign = match direction {
            Direction::Forward => -1_f64,
            Direction::Backward => 1_f64,
        };
        let state = self.kick(state, sign)?;
        let x = self
            .group
            .update_gauge(state.x(), &(state.v() * (-sign * self.eps)))?;
        let state = self.kick(&state.with_x(x)?, sign)?;
        Ok((state, 0_f64))
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;

    use super::*;
    use crate::group::{GroupKind, Manifold};
    use crate::potential::{CosineAction, Harmonic};

    #[test]
    fn backward_inverts_forward() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x45_78_93_f4);
        let potential = CosineAction::new();
        for kind in [GroupKind::U1, GroupKind::Euclidean] {
            let group = Manifold::from(kind);
            let integrator = HmcLeapfrog::new(&group, &potential, 0.1_f64, 5);
            let state = State::new(
                group.random(10, &mut rng).unwrap(),
                group.random_momentum(10, &mut rng).unwrap(),
                2_f64,
            )
            .unwrap();
            let (forward, logdet) = integrator.leapfrog(0, &state, Direction::Forward).unwrap();
            assert_eq!(logdet, 0_f64);
            let (back, _) = integrator.leapfrog(0, &forward, Direction::Backward).unwrap();
            assert_eq_vector!(back.x().clone(), state.x().clone(), 1E-10_f64);
            assert_eq_vector!(back.v().clone(), state.v().clone(), 1E-10_f64);
        }
    }

    #[test]
    fn harmonic_step() {
        let group = Manifold::from(GroupKind::Euclidean);
        let potential = Harmonic::new(1_f64);
        let integrator = HmcLeapfrog::new(&group, &potential, 0.5_f64, 1);
        let state = State::new(RVector::from_element(1, 1_f64), RVector::zeros(1), 1_f64).unwrap();
        let (out, _) = integrator.leapfrog(0, &state, Direction::Forward).unwrap();
        // v = -0.25, x = 1 - 0.125, v = -0.25 - 0.25 * 0.875
        assert!((out.x()[0] - 0.875_f64).abs() < 1E-12_f64);
        assert!((out.v()[0] + 0.468_75_f64).abs() < 1E-12_f64);
    }
}
