//! The L2HMC transition kernel.
//!
//! [`Dynamics`] owns the configuration, the group, the potential, the coupling networks, the
//! masks and the step sizes. One transition of one chain ([`Dynamics::apply_transition`]):
//! 1. draws two independent momenta, one for a forward and one for a backward trajectory;
//! 2. draws a direction bit with probability one half and runs the transition kernel in that
//!    direction with the corresponding momentum;
//! 3. computes the acceptance probability
//!    `exp(min(0, H(init) - H(proposed) + sumlogdet))` and keeps the proposal iff it is
//!    greater than a uniform draw.
//!
//! Chains of a batch are independent, [`Dynamics::apply_transition_batch`] runs them in
//! parallel, each chain drawing from its own generator.
//!
//! # Example
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use lattice_l2hmc::coupling::{AffineCoupling, CouplingNetworks};
//! use lattice_l2hmc::dynamics::{Dynamics, DynamicsConfig};
//! use lattice_l2hmc::group::GroupKind;
//! use lattice_l2hmc::potential::CosineAction;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(0); // change with your seed
//! let xdim = 16;
//! let config = DynamicsConfig::new(GroupKind::U1, xdim, 4, 0.1_f64)?
//!     .with_ncp(true)
//!     .with_separate_networks(true);
//! // the networks read the encoded position [cos x, sin x] and either the force or the momentum
//! let mut networks =
//!     CouplingNetworks::build(&config, |_| AffineCoupling::zeros(2 * xdim, xdim, xdim));
//! for net in networks.iter_mut() {
//!     *net = AffineCoupling::random(2 * xdim, xdim, xdim, 0.01_f64, &mut rng)?;
//! }
//! let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;
//!
//! let state = dynamics.random_state(1_f64, &mut rng)?;
//! let (dx, dv) = dynamics.test_reversibility(&state)?;
//! assert!(dx < 1E-8_f64 && dv < 1E-8_f64);
//!
//! let transition = dynamics.apply_transition(state.x(), 1_f64, &mut rng)?;
//! assert!((0_f64..=1_f64).contains(&transition.metrics().acc()));
//! #     Ok(())
//! # }
//! ```

mod batch;
mod config;
#[cfg(feature = "serde-serialize")]
mod persistence;
mod step_size;

use rand::Rng;

pub use self::batch::BatchTransition;
pub use self::config::{Beta, DynamicsConfig};
#[cfg(feature = "serde-serialize")]
pub use self::persistence::DynamicsParameters;
pub use self::step_size::StepSizes;
use crate::coupling::{CouplingFunction, CouplingNetworks};
use crate::error::{ConfigError, DynamicsError, ShapeError};
use crate::group::{Group, Manifold};
use crate::integrator::{AugmentedLeapfrog, Direction, HmcLeapfrog, LeapfrogIntegrator};
use crate::mask::MaskSet;
use crate::metrics::{StepMetrics, Trajectory, TrajectoryBuilder, TransitionMetrics};
use crate::potential::Potential;
use crate::simulation::{MonteCarloStates, State};
use crate::{RVector, Real};

/// Acceptance probability `exp(min(0, dh))` where `dh = H(init) - H(proposed) + sumlogdet`.
///
/// A `NaN` difference gives `0`, i.e. a forced rejection, and a warning is logged.
///
/// # Example
/// ```
/// # use lattice_l2hmc::dynamics::acceptance_probability;
/// assert_eq!(acceptance_probability(1_f64), 1_f64);
/// assert_eq!(acceptance_probability(f64::INFINITY), 1_f64);
/// assert_eq!(acceptance_probability(f64::NEG_INFINITY), 0_f64);
/// assert_eq!(acceptance_probability(f64::NAN), 0_f64);
/// assert!((acceptance_probability(-1_f64) - (-1_f64).exp()).abs() < 1E-15_f64);
/// ```
#[must_use]
pub fn acceptance_probability(dh: Real) -> Real {
    // f64::min ignores NaN, it has to be tested first.
    if dh.is_nan() {
        log::warn!("energy difference is NaN, the proposal is rejected");
        return 0_f64;
    }
    let prob = dh.min(0_f64).exp();
    if prob.is_finite() {
        prob
    }
    else {
        log::warn!("acceptance probability {prob} is not finite, the proposal is rejected");
        0_f64
    }
}

/// A proposal of the integrator with its acceptance probability.
#[derive(Clone, Debug, PartialEq)]
pub struct Proposal {
    init: State,
    proposed: State,
    trajectory: Trajectory,
    direction: Direction,
    acc: Real,
    acc_hmc: Option<Real>,
}

impl Proposal {
    getter!(
        /// The initial state.
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
        /// The trajectory metrics.
        pub const,
        trajectory,
        Trajectory
    );

    getter_copy!(
        /// Direction of the trajectory.
        pub const,
        direction,
        Direction
    );

    getter_copy!(
        /// Acceptance probability.
        pub const,
        acc,
        Real
    );

    getter_copy!(
        /// Plain HMC acceptance probability, if computed.
        pub const,
        acc_hmc,
        Option<Real>
    );

    /// Run the accept / reject test against one uniform draw.
    fn accept_reject<R>(self, rng: &mut R) -> Transition
    where
        R: Rng + ?Sized,
    {
        let uniform: Real = rng.gen();
        let accepted = self.acc > uniform;
        let (out, sumlogdet) = if accepted {
            (self.proposed.clone(), self.trajectory.sumlogdet())
        }
        else {
            (self.init.clone(), 0_f64)
        };
        let history = self.trajectory.history().to_vec();
        Transition {
            states: MonteCarloStates::new(self.init, self.proposed, out),
            metrics: TransitionMetrics::new(
                self.acc,
                self.acc_hmc,
                accepted,
                sumlogdet,
                self.direction,
                history,
            ),
        }
    }
}

/// Result of one transition of one chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    states: MonteCarloStates,
    metrics: TransitionMetrics,
}

impl Transition {
    getter!(
        /// Initial, proposed and kept states.
        pub const,
        states,
        MonteCarloStates
    );

    getter!(
        /// Metrics of the transition.
        pub const,
        metrics,
        TransitionMetrics
    );

    /// The position kept after the accept / reject test.
    #[must_use]
    #[inline]
    pub fn x(&self) -> &RVector {
        self.states.out().x()
    }

    /// Consume self and return the kept position.
    #[must_use]
    pub fn into_x(self) -> RVector {
        self.states.into_out().into_x()
    }
}

/// The L2HMC dynamics, see the [module documentation](self).
#[derive(Clone, Debug)]
pub struct Dynamics<P, C> {
    config: DynamicsConfig,
    group: Manifold,
    potential: P,
    networks: CouplingNetworks<C>,
    masks: MaskSet,
    step_sizes: StepSizes,
}

impl<P, C> Dynamics<P, C>
where
    P: Potential,
    C: CouplingFunction,
{
    /// Create the dynamics, drawing the masks with `rng` and setting every step size to
    /// [`DynamicsConfig::eps`].
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the configuration is invalid (see
    /// [`DynamicsConfig::validate`]) or if the networks do not match it.
    pub fn new<R>(
        config: DynamicsConfig,
        potential: P,
        networks: CouplingNetworks<C>,
        rng: &mut R,
    ) -> Result<Self, ConfigError>
    where
        R: Rng + ?Sized,
    {
        config.validate()?;
        networks.check(&config)?;
        let masks = if config.zero_masks() {
            MaskSet::zeros(config.xdim(), config.nleapfrog())
        }
        else {
            MaskSet::random(config.xdim(), config.nleapfrog(), rng)
        };
        let step_sizes = StepSizes::new(config.nleapfrog(), config.eps()).with_fixed(config.eps_fixed());
        Ok(Self {
            group: Manifold::from(config.group()),
            config,
            potential,
            networks,
            masks,
            step_sizes,
        })
    }

    /// Create the dynamics from all of its parts.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the parts are not consistent with the configuration.
    pub fn from_parts(
        config: DynamicsConfig,
        potential: P,
        networks: CouplingNetworks<C>,
        masks: MaskSet,
        step_sizes: StepSizes,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        networks.check(&config)?;
        masks.check(config.xdim(), config.nleapfrog())?;
        step_sizes.check(config.nleapfrog())?;
        let step_sizes = step_sizes.with_fixed(config.eps_fixed());
        Ok(Self {
            group: Manifold::from(config.group()),
            config,
            potential,
            networks,
            masks,
            step_sizes,
        })
    }

    getter!(
        /// The configuration.
        pub const,
        config,
        DynamicsConfig
    );

    getter!(
        /// The group of the positions.
        pub const,
        group,
        Manifold
    );

    getter!(
        /// The potential.
        pub const,
        potential,
        P
    );

    getter!(
        /// The coupling networks.
        pub const,
        networks,
        CouplingNetworks<C>
    );

    getter!(
        /// The masks, one per leapfrog step.
        pub const,
        masks,
        MaskSet
    );

    getter!(
        /// The step sizes.
        pub const,
        step_sizes,
        StepSizes
    );

    /// Mutable access to the networks, for an external optimizer.
    pub fn networks_mut(&mut self) -> &mut CouplingNetworks<C> {
        &mut self.networks
    }

    /// Mutable access to the step sizes, for an external optimizer.
    pub fn step_sizes_mut(&mut self) -> &mut StepSizes {
        &mut self.step_sizes
    }

    /// Random position and momentum with the given inverse coupling.
    ///
    /// # Errors
    /// Never errors for a validated configuration.
    pub fn random_state<R>(&self, beta: Real, rng: &mut R) -> Result<State, DynamicsError>
    where
        R: Rng + ?Sized,
    {
        let x = self.group.random(self.config.xdim(), rng)?;
        let v = self.group.random_momentum(self.config.xdim(), rng)?;
        Ok(State::new(x, v, beta)?)
    }

    /// The Hamiltonian `H = kinetic_energy(v) + beta * action(x)`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the momentum does not hold whole group elements.
    pub fn hamiltonian(&self, state: &State) -> Result<Real, ShapeError> {
        Ok(self.group.kinetic_energy(state.v())?
            + self.potential.potential(state.x(), state.beta()))
    }

    /// Check the length of a position given by the caller.
    fn check_position(&self, x: &RVector) -> Result<(), ShapeError> {
        ShapeError::check(crate::error::ShapeKind::Position, self.config.xdim(), x.len())
    }

    /// The learned leapfrog.
    fn augmented_integrator(&self) -> AugmentedLeapfrog<'_, Manifold, P, C> {
        AugmentedLeapfrog::new(
            &self.group,
            &self.potential,
            &self.networks,
            &self.masks,
            &self.step_sizes,
            self.config.net_weights(),
            self.config.use_ncp(),
        )
    }

    /// Run all the steps of `integrator` from `state`, continuing `builder`.
    fn integrate<I>(
        &self,
        integrator: &I,
        state: State,
        direction: Direction,
        builder: TrajectoryBuilder,
    ) -> Result<(State, TrajectoryBuilder), DynamicsError>
    where
        I: LeapfrogIntegrator,
    {
        let nleapfrog = integrator.nleapfrog();
        (0..nleapfrog).try_fold((state, builder), |(state, builder), step| -> Result<_, DynamicsError> {
            let (state, logdet) = integrator.leapfrog(step, &state, direction)?;
            let builder = builder.add_logdet(logdet);
            let builder = if builder.is_verbose() {
                let physical = direction.physical_step(step, nleapfrog);
                let (xeps, veps) = integrator.step_sizes(physical)?;
                let energy = self.hamiltonian(&state)?;
                let logdet = builder.sumlogdet();
                builder.record(StepMetrics::after_step(physical, energy, logdet, xeps, veps))
            }
            else {
                builder
            };
            Ok((state, builder))
        })
    }

    /// Start a trajectory, recording the initial energy if verbose.
    fn start_trajectory(&self, state: &State) -> Result<TrajectoryBuilder, ShapeError> {
        let builder = TrajectoryBuilder::new(self.config.verbose());
        if builder.is_verbose() {
            Ok(builder.record(StepMetrics::initial(self.hamiltonian(state)?)))
        }
        else {
            Ok(builder)
        }
    }

    /// Run a full trajectory of `integrator`.
    fn run_trajectory<I>(
        &self,
        integrator: &I,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Trajectory), DynamicsError>
    where
        I: LeapfrogIntegrator,
    {
        let builder = self.start_trajectory(state)?;
        let (state, builder) = self.integrate(integrator, state.clone(), direction, builder)?;
        Ok((state, builder.build()))
    }

    /// The transition kernel: run `nleapfrog` leapfrog steps in the given direction and return
    /// the proposed state and the trajectory metrics.
    ///
    /// Uses the learned leapfrog, or the plain HMC leapfrog if [`DynamicsConfig::hmc`].
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent.
    pub fn transition_kernel(
        &self,
        state: &State,
        direction: Direction,
    ) -> Result<(State, Trajectory), DynamicsError> {
        self.check_position(state.x())?;
        if self.config.hmc() {
            self.transition_kernel_hmc(state, direction, None, None)
        }
        else {
            self.run_trajectory(&self.augmented_integrator(), state, direction)
        }
    }

    /// Plain HMC transition kernel, optionally overriding the step size (default
    /// [`DynamicsConfig::eps_hmc`]) and the number of steps (default
    /// [`DynamicsConfig::nleapfrog`]). The log-Jacobian is zero.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent or if the overrides are invalid.
    pub fn transition_kernel_hmc(
        &self,
        state: &State,
        direction: Direction,
        eps: Option<Real>,
        nleapfrog: Option<usize>,
    ) -> Result<(State, Trajectory), DynamicsError> {
        self.check_position(state.x())?;
        let eps = eps.unwrap_or_else(|| self.config.eps_hmc());
        config::check_step_size(eps)?;
        let nleapfrog = nleapfrog.unwrap_or_else(|| self.config.nleapfrog());
        if nleapfrog == 0 {
            return Err(ConfigError::ZeroLeapfrog.into());
        }
        let integrator = HmcLeapfrog::new(&self.group, &self.potential, eps, nleapfrog);
        self.run_trajectory(&integrator, state, direction)
    }

    /// Forward trajectory, momentum flip, backward trajectory.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent.
    pub fn transition_kernel_fb(&self, state: &State) -> Result<(State, Trajectory), DynamicsError> {
        self.check_position(state.x())?;
        let builder = self.start_trajectory(state)?;
        let (proposed, builder) = if self.config.hmc() {
            let integrator = HmcLeapfrog::new(
                &self.group,
                &self.potential,
                self.config.eps_hmc(),
                self.config.nleapfrog(),
            );
            self.integrate_fb(&integrator, state, builder)?
        }
        else {
            self.integrate_fb(&self.augmented_integrator(), state, builder)?
        };
        Ok((proposed, builder.build()))
    }

    fn integrate_fb<I>(
        &self,
        integrator: &I,
        state: &State,
        builder: TrajectoryBuilder,
    ) -> Result<(State, TrajectoryBuilder), DynamicsError>
    where
        I: LeapfrogIntegrator,
    {
        let (state, builder) = self.integrate(integrator, state.clone(), Direction::Forward, builder)?;
        self.integrate(integrator, state.flip_momentum(), Direction::Backward, builder)
    }

    /// Acceptance probability of `proposed` given `init`, see [`acceptance_probability`].
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if a momentum does not hold whole group elements.
    pub fn compute_accept_prob(
        &self,
        init: &State,
        proposed: &State,
        sumlogdet: Real,
    ) -> Result<Real, ShapeError> {
        let dh = self.hamiltonian(init)? - self.hamiltonian(proposed)? + sumlogdet;
        Ok(acceptance_probability(dh))
    }

    /// Plain HMC acceptance probability `exp(min(0, beta (H(init) - H(proposed))))`,
    /// ignoring the log-Jacobian.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if a momentum does not hold whole group elements.
    pub fn compute_accept_prob_hmc(&self, init: &State, proposed: &State) -> Result<Real, ShapeError> {
        let dh = init.beta() * (self.hamiltonian(init)? - self.hamiltonian(proposed)?);
        Ok(acceptance_probability(dh))
    }

    /// Build a [`Proposal`] out of a trajectory.
    fn proposal(
        &self,
        init: State,
        proposed: State,
        trajectory: Trajectory,
        direction: Direction,
    ) -> Result<Proposal, DynamicsError> {
        let acc = self.compute_accept_prob(&init, &proposed, trajectory.sumlogdet())?;
        let acc_hmc = if self.config.compute_hmc_acceptance() {
            Some(self.compute_accept_prob_hmc(&init, &proposed)?)
        }
        else {
            None
        };
        Ok(Proposal {
            init,
            proposed,
            trajectory,
            direction,
            acc,
            acc_hmc,
        })
    }

    /// Run the transition kernel from `init` in the given direction.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent.
    pub fn generate_proposal(&self, init: State, direction: Direction) -> Result<Proposal, DynamicsError> {
        let (proposed, trajectory) = self.transition_kernel(&init, direction)?;
        self.proposal(init, proposed, trajectory, direction)
    }

    /// One transition of the chain at `x`, see the [module documentation](self).
    ///
    /// Uses [`Dynamics::apply_transition_fb`] if [`DynamicsConfig::merge_directions`].
    /// The generator is used, in this order, for the forward momentum, the backward momentum,
    /// the direction bit and the accept / reject draw.
    ///
    /// Only the trajectory of the chosen direction is integrated. The output has the same law
    /// as integrating both directions and selecting one with the direction bit, but the
    /// metrics of the other direction do not exist. Call [`Dynamics::generate_proposal`] in
    /// each direction to get both.
    ///
    /// # Errors
    /// Returns an error if `x` does not have length [`DynamicsConfig::xdim`].
    pub fn apply_transition<R>(&self, x: &RVector, beta: Real, rng: &mut R) -> Result<Transition, DynamicsError>
    where
        R: Rng + ?Sized,
    {
        if self.config.merge_directions() {
            return self.apply_transition_fb(x, beta, rng);
        }
        self.check_position(x)?;
        let v_forward = self.group.random_momentum(self.config.xdim(), rng)?;
        let v_backward = self.group.random_momentum(self.config.xdim(), rng)?;
        let direction = Direction::from_bit(rng.gen_bool(0.5_f64));
        let v = match direction {
            Direction::Forward => v_forward,
            Direction::Backward => v_backward,
        };
        let proposal = self.generate_proposal(State::new(x.clone(), v, beta)?, direction)?;
        Ok(proposal.accept_reject(rng))
    }

    /// One transition running forward, flipping the momentum and running backward, with a
    /// single momentum draw.
    ///
    /// # Errors
    /// Returns an error if `x` does not have length [`DynamicsConfig::xdim`].
    pub fn apply_transition_fb<R>(&self, x: &RVector, beta: Real, rng: &mut R) -> Result<Transition, DynamicsError>
    where
        R: Rng + ?Sized,
    {
        self.check_position(x)?;
        let v = self.group.random_momentum(self.config.xdim(), rng)?;
        let init = State::new(x.clone(), v, beta)?;
        let (proposed, trajectory) = self.transition_kernel_fb(&init)?;
        let proposal = self.proposal(init, proposed, trajectory, Direction::Forward)?;
        Ok(proposal.accept_reject(rng))
    }

    /// One plain HMC transition in the forward direction, see
    /// [`Dynamics::transition_kernel_hmc`] for the overrides.
    ///
    /// # Errors
    /// Returns an error if `x` does not have length [`DynamicsConfig::xdim`] or if the
    /// overrides are invalid.
    pub fn apply_transition_hmc<R>(
        &self,
        x: &RVector,
        beta: Real,
        eps: Option<Real>,
        nleapfrog: Option<usize>,
        rng: &mut R,
    ) -> Result<Transition, DynamicsError>
    where
        R: Rng + ?Sized,
    {
        self.check_position(x)?;
        let v = self.group.random_momentum(self.config.xdim(), rng)?;
        let init = State::new(x.clone(), v, beta)?;
        let (proposed, trajectory) = self.transition_kernel_hmc(&init, Direction::Forward, eps, nleapfrog)?;
        let proposal = self.proposal(init, proposed, trajectory, Direction::Forward)?;
        Ok(proposal.accept_reject(rng))
    }

    /// Run the transition kernel forward then backward from `state` and return the largest
    /// absolute differences `(dx, dv)` with the initial position and momentum.
    ///
    /// # Errors
    /// Returns an error if the shapes are inconsistent.
    pub fn test_reversibility(&self, state: &State) -> Result<(Real, Real), DynamicsError> {
        let (forward, _) = self.transition_kernel(state, Direction::Forward)?;
        let (back, _) = self.transition_kernel(&forward, Direction::Backward)?;
        Ok((
            (back.x() - state.x()).amax(),
            (back.v() - state.v()).amax(),
        ))
    }
}
