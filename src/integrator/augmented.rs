//! Learned (augmented) leapfrog.

use super::{Direction, LeapfrogIntegrator};
use crate::coupling::{CouplingFunction, CouplingInput, CouplingNetworks, CouplingOutput, NetWeight, NetWeights};
use crate::dynamics::StepSizes;
use crate::error::{ConfigError, DynamicsError, ShapeError, ShapeKind};
use crate::group::{Group, U1Phase};
use crate::mask::{Mask, MaskSet};
use crate::potential::Potential;
use crate::simulation::State;
use crate::{RVector, Real};

/// Leapfrog whose sub-updates are parametrized by coupling functions.
///
/// A forward leapfrog step `i` with mask `m` runs
/// 1. `v <- v exp(eps s / 2) - eps / 2 (f exp(eps q) + t)`, log-Jacobian `sum(eps s / 2)`;
/// 2. the position half-update reading `m x`, writing the coordinates of `1 - m`;
/// 3. the position half-update reading `(1 - m) x`, writing the coordinates of `m`;
/// 4. the momentum update again, with the force at the new position.
///
/// A position half-update writes `x exp(eps s) + eps (v exp(eps q) + t)`, with log-Jacobian
/// `sum((1 - m) eps s)`, or the angle preserving (NCP) transform
/// `2 atan(tan(x / 2) exp(eps s)) + eps (v exp(eps q) + t)` wrapped in `(-pi, pi]`, with
/// log-Jacobian `sum((1 - m) log(exp(eps s) / (cos^2(x / 2) + exp(2 eps s) sin^2(x / 2))))`.
///
/// The backward step runs the inverse of each sub-update in the reverse order.
#[derive(Debug)]
pub struct AugmentedLeapfrog<'a, G, P, C> {
    group: &'a G,
    potential: &'a P,
    networks: &'a CouplingNetworks<C>,
    masks: &'a MaskSet,
    step_sizes: &'a StepSizes,
    net_weights: NetWeights,
    use_ncp: bool,
}

impl<'a, G, P, C> AugmentedLeapfrog<'a, G, P, C>
where
    G: Group,
    P: Potential,
    C: CouplingFunction,
{
    /// Create the integrator. The number of steps is the number of masks.
    #[must_use]
    pub const fn new(
        group: &'a G,
        potential: &'a P,
        networks: &'a CouplingNetworks<C>,
        masks: &'a MaskSet,
        step_sizes: &'a StepSizes,
        net_weights: NetWeights,
        use_ncp: bool,
    ) -> Self {
        Self {
            group,
            potential,
            networks,
            masks,
            step_sizes,
            net_weights,
            use_ncp,
        }
    }

    /// The force `beta dS/dx` at the position of the state.
    fn force(&self, state: &State) -> Result<RVector, ShapeError> {
        let force = self.potential.grad_potential(state.x(), state.beta());
        ShapeError::check(ShapeKind::Force, state.xdim(), force.len())?;
        Ok(force)
    }

    fn missing_network(&self) -> DynamicsError {
        ConfigError::NetworkCount {
            expected: self.nleapfrog(),
            found: self.networks.len(),
        }
        .into()
    }

    /// Evaluate a coupling function and check its output.
    fn call(
        net: &C,
        input: &CouplingInput<'_>,
        weight: NetWeight,
    ) -> Result<CouplingOutput, ShapeError> {
        let output = net.evaluate(input)?;
        output.check(input.xdim())?;
        Ok(output.weighted(weight))
    }

    /// Momentum update of the physical step `step`.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent or if the network is missing.
    pub fn update_v(
        &self,
        step: usize,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Real), DynamicsError> {
        let (_, eps) = self.step_sizes.get(step)?;
        let force = self.force(state)?;
        let encoded = self.group.group_to_vec(state.x());
        let net = self.networks.vnet(step).ok_or_else(|| self.missing_network())?;
        let output = Self::call(
            net,
            &CouplingInput::new(&encoded, &force, step, self.nleapfrog()),
            self.net_weights.v,
        )?;

        let jac = output.scale() * (eps / 2_f64);
        let exp_q = (output.transformation() * eps).map(Real::exp);
        let kick = (force.component_mul(&exp_q) + output.translation()) * (eps / 2_f64);
        let (v, logdet) = match direction {
            Direction::Forward => (
                jac.map(Real::exp).component_mul(state.v()) - kick,
                jac.sum(),
            ),
            Direction::Backward => (
                jac.map(|el| (-el).exp()).component_mul(&(state.v() + kick)),
                -jac.sum(),
            ),
        };
        Ok((state.with_v(v)?, logdet))
    }

    /// Position half-update of the physical step `step`: the network reads `mask * x` and the
    /// coordinates of the complement of `mask` are written.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent or if the network is missing.
    pub fn update_x(
        &self,
        step: usize,
        state: &State,
        mask: &Mask,
        first: bool,
        direction: Direction,
    ) -> Result<(State, Real), DynamicsError> {
        let (eps, _) = self.step_sizes.get(step)?;
        let masked = mask.apply(state.x())?;
        let encoded = self.group.group_to_vec(&masked);
        let net = self
            .networks
            .xnet(step, first)
            .ok_or_else(|| self.missing_network())?;
        let output = Self::call(
            net,
            &CouplingInput::new(&encoded, state.v(), step, self.nleapfrog()),
            self.net_weights.x,
        )?;

        let s = output.scale() * eps;
        let exp_q = (output.transformation() * eps).map(Real::exp);
        let shift = (state.v().component_mul(&exp_q) + output.translation()) * eps;
        let (updated, logdet) = match (direction, self.use_ncp) {
            (Direction::Forward, false) => (
                state.x().component_mul(&s.map(Real::exp)) + shift,
                s,
            ),
            (Direction::Backward, false) => (
                s.map(|el| (-el).exp()).component_mul(&(state.x() - shift)),
                -s,
            ),
            (Direction::Forward, true) => ncp_forward(state.x(), &s, &shift),
            (Direction::Backward, true) => ncp_backward(state.x(), &s, &shift),
        };
        let x = mask.select(state.x(), &updated)?;
        let logdet = mask.complement().masked_sum(&logdet)?;
        Ok((state.with_x(x)?, logdet))
    }
}

/// Angle preserving update `2 atan(tan(x / 2) exp(s)) + shift` and its log-Jacobian.
fn ncp_forward(x: &RVector, s: &RVector, shift: &RVector) -> (RVector, RVector) {
    let updated = RVector::from_fn(x.len(), |i, _| {
        let half = x[i] / 2_f64;
        U1Phase::wrap(2_f64 * (half.tan() * s[i].exp()).atan() + shift[i])
    });
    let logdet = RVector::from_fn(x.len(), |i, _| ncp_logdet(x[i] / 2_f64, s[i]));
    (updated, logdet)
}

/// Exact inverse of [`ncp_forward`].
fn ncp_backward(x: &RVector, s: &RVector, shift: &RVector) -> (RVector, RVector) {
    let shifted = (x - shift).map(U1Phase::wrap);
    let updated = RVector::from_fn(x.len(), |i, _| {
        2_f64 * ((-s[i]).exp() * (shifted[i] / 2_f64).tan()).atan()
    });
    let logdet = RVector::from_fn(x.len(), |i, _| ncp_logdet(shifted[i] / 2_f64, -s[i]));
    (updated, logdet)
}

/// `log(exp(s) / (cos^2(h) + exp(2 s) sin^2(h)))`.
fn ncp_logdet(half: Real, s: Real) -> Real {
    let cos = half.cos();
    let sin = half.sin() * s.exp();
    s - cos.mul_add(cos, sin * sin).ln()
}

impl<'a, G, P, C> LeapfrogIntegrator for AugmentedLeapfrog<'a, G, P, C>
where
    G: Group,
    P: Potential,
    C: CouplingFunction,
{
    fn nleapfrog(&self) -> usize {
        self.masks.nleapfrog()
    }

    fn step_sizes(&self, step: usize) -> Result<(Real, Real), ShapeError> {
        self.step_sizes.get(step)
    }

    fn leapfrog(
        &self,
        step: usize,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Real), DynamicsError> {
        let nleapfrog = self.nleapfrog();
        let physical = direction.physical_step(step, nleapfrog);
        let mask = self
            .masks
            .get(physical)
            .ok_or_else(|| ShapeError::new(ShapeKind::Mask, nleapfrog, physical))?;
        let complement = mask.complement();
        let (first_mask, first, second_mask, second) = match direction {
            Direction::Forward => (mask, true, &complement, false),
            Direction::Backward => (&complement, false, mask, true),
        };

        let (state, logdet_v1) = self.update_v(physical, state, direction)?;
        let (state, logdet_x1) = self.update_x(physical, &state, first_mask, first, direction)?;
        let (state, logdet_x2) = self.update_x(physical, &state, second_mask, second, direction)?;
        let (state, logdet_v2) = self.update_v(physical, &state, direction)?;
        Ok((state, logdet_v1 + logdet_x1 + logdet_x2 + logdet_v2))
    }
}
