//! Batched transitions, one independent chain per row.

use std::collections::BTreeMap;

use rand::Rng;
use rayon::prelude::*;

use super::{Beta, Dynamics, Transition};
use crate::coupling::CouplingFunction;
use crate::error::{DynamicsError, ShapeError, ShapeKind};
use crate::potential::Potential;
use crate::{RVector, Real};

impl<P, C> Dynamics<P, C>
where
    P: Potential,
    C: CouplingFunction,
{
    /// Apply [`Dynamics::apply_transition`] to every chain of the batch in parallel.
    ///
    /// Chain `i` uses `rngs[i]` and `beta.get(i)`, so the result does not depend on the
    /// scheduling of the threads.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if there is not one generator (or one beta) per chain, or the
    /// first error of a chain.
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
    ///
    /// let config = DynamicsConfig::new(GroupKind::U1, 4, 3, 0.2_f64)?.with_zero_masks(true);
    /// let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    /// let mut rngs = chain_rngs(7, 3);
    /// let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rngs[0])?;
    ///
    /// let x = vec![nalgebra::DVector::from_element(4, 0.5_f64); 3];
    /// let beta = Beta::PerSample(vec![1_f64, 2_f64, 3_f64]);
    /// let transition = dynamics.apply_transition_batch(&x, &beta, &mut rngs)?;
    /// assert_eq!(transition.len(), 3);
    /// assert_eq!(transition.metric("acc").map(|acc| acc.len()), Some(3));
    /// assert!(transition.metric("acc_hmc").is_none());
    ///
    /// let wrong_beta = Beta::PerSample(vec![1_f64]);
    /// assert!(dynamics.apply_transition_batch(&x, &wrong_beta, &mut rngs).is_err());
    /// #     Ok(())
    /// # }
    /// ```
    pub fn apply_transition_batch<R>(
        &self,
        x: &[RVector],
        beta: &Beta,
        rngs: &mut [R],
    ) -> Result<BatchTransition, DynamicsError>
    where
        R: Rng + Send,
    {
        ShapeError::check(ShapeKind::Rng, x.len(), rngs.len())?;
        beta.check(x.len())?;
        let transitions = x
            .par_iter()
            .zip(rngs.par_iter_mut())
            .enumerate()
            .map(|(index, (x, rng))| {
                let beta = beta
                    .get(index)
                    .ok_or_else(|| ShapeError::new(ShapeKind::Beta, index + 1, index))?;
                self.apply_transition(x, beta, rng)
            })
            .collect::<Result<Vec<_>, DynamicsError>>()?;
        let batch = BatchTransition::new(transitions);
        log::debug!(
            "batch of {} chains, acceptance rate {}",
            batch.len(),
            batch.acceptance_rate()
        );
        Ok(batch)
    }
}

/// Transitions of a batch of chains.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct BatchTransition {
    transitions: Vec<Transition>,
}

impl BatchTransition {
    /// Bundle the transitions, one per chain.
    #[must_use]
    pub const fn new(transitions: Vec<Transition>) -> Self {
        Self { transitions }
    }

    getter!(
        /// The transition of every chain.
        pub,
        transitions,
        [Transition]
    );

    /// Number of chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Iterate over the transitions.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter()
    }

    /// Fraction of accepted proposals, `0` for an empty batch.
    #[must_use]
    pub fn acceptance_rate(&self) -> Real {
        if self.is_empty() {
            return 0_f64;
        }
        #[allow(clippy::cast_precision_loss)]
        let len = self.len() as Real;
        let accepted = self.iter().filter(|t| t.metrics().acc_mask()).count();
        #[allow(clippy::cast_precision_loss)]
        let accepted = accepted as Real;
        accepted / len
    }

    /// The kept positions, in the order of the chains.
    #[must_use]
    pub fn positions(&self) -> Vec<RVector> {
        self.iter().map(|t| t.x().clone()).collect()
    }

    /// Consume self and return the kept positions, in the order of the chains.
    #[must_use]
    pub fn into_positions(self) -> Vec<RVector> {
        self.transitions.into_iter().map(Transition::into_x).collect()
    }

    /// Values of the metric `name` for every chain, see
    /// [`crate::metrics::TransitionMetrics::iter`] for the names.
    ///
    /// Returns [`None`] if a chain does not have this metric.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<Vec<Real>> {
        self.iter()
            .map(|t| {
                t.metrics()
                    .iter()
                    .find_map(|(key, value)| (key == name).then(|| value))
            })
            .collect()
    }

    /// Every metric of the batch, keyed by name.
    #[must_use]
    pub fn metrics(&self) -> BTreeMap<&'static str, Vec<Real>> {
        let mut map: BTreeMap<&'static str, Vec<Real>> = BTreeMap::new();
        for transition in self.iter() {
            for (key, value) in transition.metrics().iter() {
                map.entry(key).or_default().push(value);
            }
        }
        map
    }
}

impl IntoIterator for BatchTransition {
    type Item = Transition;
    type IntoIter = std::vec::IntoIter<Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.into_iter()
    }
}
