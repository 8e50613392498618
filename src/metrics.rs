//! Metrics produced by the transition kernel.
//!
//! Per step records are built by a [`TrajectoryBuilder`] that is consumed and returned at each
//! step, no accumulator is shared between calls.

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::integrator::Direction;
use crate::Real;

/// Diagnostics of one point of a trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct StepMetrics {
    step: Option<usize>,
    energy: Real,
    logdet: Real,
    xeps: Option<Real>,
    veps: Option<Real>,
}

impl StepMetrics {
    /// Record of the initial state, before any leapfrog step.
    #[must_use]
    #[inline]
    pub const fn initial(energy: Real) -> Self {
        Self {
            step: None,
            energy,
            logdet: 0_f64,
            xeps: None,
            veps: None,
        }
    }

    /// Record after the leapfrog step `step` with cumulative log-Jacobian `logdet`.
    #[must_use]
    #[inline]
    pub const fn after_step(step: usize, energy: Real, logdet: Real, xeps: Real, veps: Real) -> Self {
        Self {
            step: Some(step),
            energy,
            logdet,
            xeps: Some(xeps),
            veps: Some(veps),
        }
    }

    getter_copy!(
        /// The leapfrog step, `None` for the initial record.
        pub const,
        step,
        Option<usize>
    );

    getter_copy!(
        /// The Hamiltonian of the state.
        pub const,
        energy,
        Real
    );

    getter_copy!(
        /// Cumulative log-Jacobian since the start of the trajectory.
        pub const,
        logdet,
        Real
    );

    getter_copy!(
        /// Position step size of the step.
        pub const,
        xeps,
        Option<Real>
    );

    getter_copy!(
        /// Momentum step size of the step.
        pub const,
        veps,
        Option<Real>
    );

    /// `energy - logdet`.
    #[must_use]
    #[inline]
    pub fn logprob(&self) -> Real {
        self.energy - self.logdet
    }
}

/// Result of one trajectory: total log-Jacobian and optional history.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Trajectory {
    sumlogdet: Real,
    history: Vec<StepMetrics>,
}

impl Trajectory {
    getter_copy!(
        /// Sum of the log-Jacobians of every sub-update.
        pub const,
        sumlogdet,
        Real
    );

    getter!(
        /// The per step history, empty if not verbose.
        pub,
        history,
        [StepMetrics]
    );
}

/// Builder of a [`Trajectory`].
///
/// # Example
/// ```
/// # use lattice_l2hmc::metrics::{StepMetrics, TrajectoryBuilder};
/// let trajectory = TrajectoryBuilder::new(true)
///     .record(StepMetrics::initial(1_f64))
///     .add_logdet(0.5_f64)
///     .record(StepMetrics::after_step(0, 1.2_f64, 0.5_f64, 0.1_f64, 0.1_f64))
///     .build();
/// assert_eq!(trajectory.sumlogdet(), 0.5_f64);
/// assert_eq!(trajectory.history().len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryBuilder {
    sumlogdet: Real,
    history: Option<Vec<StepMetrics>>,
}

impl TrajectoryBuilder {
    /// New builder, the history is only kept if `verbose`.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            sumlogdet: 0_f64,
            history: verbose.then(Vec::new),
        }
    }

    /// Whether the history is kept.
    #[must_use]
    #[inline]
    pub const fn is_verbose(&self) -> bool {
        self.history.is_some()
    }

    getter_copy!(
        /// Log-Jacobian accumulated so far.
        pub const,
        sumlogdet,
        Real
    );

    /// Add a log-Jacobian contribution.
    #[must_use]
    #[inline]
    pub fn add_logdet(mut self, logdet: Real) -> Self {
        self.sumlogdet += logdet;
        self
    }

    /// Append a record to the history, ignored if not verbose.
    #[must_use]
    pub fn record(mut self, metrics: StepMetrics) -> Self {
        if let Some(history) = self.history.as_mut() {
            history.push(metrics);
        }
        self
    }

    /// Finish the trajectory.
    #[must_use]
    pub fn build(self) -> Trajectory {
        Trajectory {
            sumlogdet: self.sumlogdet,
            history: self.history.unwrap_or_default(),
        }
    }
}

/// Metrics of one transition of one chain.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TransitionMetrics {
    acc: Real,
    acc_hmc: Option<Real>,
    acc_mask: bool,
    sumlogdet: Real,
    direction: Direction,
    history: Vec<StepMetrics>,
}

impl TransitionMetrics {
    /// Bundle the metrics.
    #[must_use]
    pub const fn new(
        acc: Real,
        acc_hmc: Option<Real>,
        acc_mask: bool,
        sumlogdet: Real,
        direction: Direction,
        history: Vec<StepMetrics>,
    ) -> Self {
        Self {
            acc,
            acc_hmc,
            acc_mask,
            sumlogdet,
            direction,
            history,
        }
    }

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

    getter_copy!(
        /// Whether the proposal was accepted.
        pub const,
        acc_mask,
        bool
    );

    getter_copy!(
        /// Log-Jacobian of the kept state: the proposal one if accepted, `0` otherwise.
        pub const,
        sumlogdet,
        Real
    );

    getter_copy!(
        /// Direction of the proposal.
        pub const,
        direction,
        Direction
    );

    getter!(
        /// History of the proposal trajectory, empty if not verbose.
        pub,
        history,
        [StepMetrics]
    );

    /// Iterate over the scalar metrics as `(name, value)`.
    ///
    /// The names are `acc`, `acc_mask`, `sumlogdet` and `acc_hmc` if it was computed.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Real)> + '_ {
        [
            Some(("acc", self.acc)),
            Some(("acc_mask", Real::from(u8::from(self.acc_mask)))),
            Some(("sumlogdet", self.sumlogdet)),
            self.acc_hmc.map(|acc_hmc| ("acc_hmc", acc_hmc)),
        ]
        .into_iter()
        .flatten()
    }
}
