//! Monte-Carlo driver, see the trait [`MonteCarlo`].
//!
//! This is one of the way to carry out simulation: a batch of positions is progressively
//! changed by applying the L2HMC transition to every chain.

use rand::Rng;

use crate::coupling::CouplingFunction;
use crate::dynamics::{BatchTransition, Beta, Dynamics};
use crate::error::DynamicsError;
use crate::potential::Potential;
use crate::{RVector, Real};

/// Monte-Carlo algorithm, giving the next batch of positions in the simulation.
/// It is also a Markov chain.
///
/// # Example
/// ```
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use lattice_l2hmc::coupling::{CouplingNetworks, IdentityCoupling};
/// use lattice_l2hmc::dynamics::{Beta, Dynamics, DynamicsConfig};
/// use lattice_l2hmc::group::GroupKind;
/// use lattice_l2hmc::potential::CosineAction;
/// use lattice_l2hmc::rng::chain_rngs;
/// use lattice_l2hmc::simulation::{L2hmcSampler, MonteCarlo};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0); // change with your seed
/// let config = DynamicsConfig::new(GroupKind::U1, 8, 4, 0.1_f64)?;
/// let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
/// let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;
/// let mut sampler = L2hmcSampler::new(dynamics, Beta::Scalar(2_f64), chain_rngs(1, 4))?;
///
/// let mut x = sampler.random_positions()?;
/// // Realistically you want more steps than 10
/// for _ in 0..10 {
///     x = sampler.next_element(x)?;
///     // operation to track the progress or the evolution
///     assert!((0_f64..=1_f64).contains(&sampler.acceptance_rate_last()));
/// }
/// #     Ok(())
/// # }
/// ```
pub trait MonteCarlo {
    /// Error returned while getting the next element.
    type Error;

    /// Do one Monte Carlo simulation step on every chain.
    ///
    /// # Errors
    /// Return an error if the simulation failed.
    fn next_element(&mut self, x: Vec<RVector>) -> Result<Vec<RVector>, Self::Error>;
}

/// L2HMC sampler over a batch of chains, keeping diagnostics of the last step.
#[derive(Clone, Debug)]
pub struct L2hmcSampler<P, C, R> {
    dynamics: Dynamics<P, C>,
    beta: Beta,
    rngs: Vec<R>,
    last: Option<BatchTransition>,
}

impl<P, C, R> L2hmcSampler<P, C, R>
where
    P: Potential,
    C: CouplingFunction,
    R: Rng + Send,
{
    /// Create the sampler with one generator per chain.
    ///
    /// # Errors
    /// Returns an error if `beta` does not have one value per generator.
    pub fn new(dynamics: Dynamics<P, C>, beta: Beta, rngs: Vec<R>) -> Result<Self, DynamicsError> {
        beta.check(rngs.len())?;
        Ok(Self {
            dynamics,
            beta,
            rngs,
            last: None,
        })
    }

    getter!(
        /// The dynamics.
        pub const,
        dynamics,
        Dynamics<P, C>
    );

    getter!(
        /// The inverse coupling of the chains.
        pub const,
        beta,
        Beta
    );

    /// Mutable access to the dynamics, to update its parameters between steps.
    pub fn dynamics_mut(&mut self) -> &mut Dynamics<P, C> {
        &mut self.dynamics
    }

    /// Number of chains.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.rngs.len()
    }

    /// Draw a random position for every chain, each from its own generator.
    ///
    /// # Errors
    /// Never errors for a validated configuration.
    pub fn random_positions(&mut self) -> Result<Vec<RVector>, DynamicsError> {
        let xdim = self.dynamics.config().xdim();
        let group = self.dynamics.group();
        self.rngs
            .iter_mut()
            .map(|rng| Ok(crate::group::Group::random(group, xdim, rng)?))
            .collect()
    }

    /// The transitions of the last step, [`None`] before the first step.
    #[must_use]
    pub const fn last_transition(&self) -> Option<&BatchTransition> {
        self.last.as_ref()
    }

    /// Acceptance probabilities of the last step, empty before the first step.
    #[must_use]
    pub fn prob_replace_last(&self) -> Vec<Real> {
        self.last
            .iter()
            .flat_map(BatchTransition::iter)
            .map(|t| t.metrics().acc())
            .collect()
    }

    /// Accept decisions of the last step, empty before the first step.
    #[must_use]
    pub fn has_replace_last(&self) -> Vec<bool> {
        self.last
            .iter()
            .flat_map(BatchTransition::iter)
            .map(|t| t.metrics().acc_mask())
            .collect()
    }

    /// Fraction of the chains that accepted their proposal at the last step.
    #[must_use]
    pub fn acceptance_rate_last(&self) -> Real {
        self.last
            .as_ref()
            .map_or(0_f64, BatchTransition::acceptance_rate)
    }

    /// Give the generators back.
    #[allow(clippy::missing_const_for_fn)] // false positive
    pub fn rngs_owned(self) -> Vec<R> {
        self.rngs
    }
}

impl<P, C, R> MonteCarlo for L2hmcSampler<P, C, R>
where
    P: Potential,
    C: CouplingFunction,
    R: Rng + Send,
{
    type Error = DynamicsError;

    fn next_element(&mut self, x: Vec<RVector>) -> Result<Vec<RVector>, Self::Error> {
        let transition = self
            .dynamics
            .apply_transition_batch(&x, &self.beta, &mut self.rngs)?;
        let positions = transition.positions();
        self.last = Some(transition);
        Ok(positions)
    }
}
