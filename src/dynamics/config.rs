//! Configuration of the dynamics.

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::coupling::NetWeights;
use crate::error::{ConfigError, ShapeError, ShapeKind};
use crate::group::{Group, GroupKind, Manifold};
use crate::Real;

/// Configuration of [`super::Dynamics`].
///
/// [`DynamicsConfig::new`] checks the sizes and the step size, the complete check
/// ([`DynamicsConfig::validate`]) is done again by [`super::Dynamics::new`] such that
/// configurations built with the `with_*` methods or deserialized are also checked.
///
/// # Example
/// ```
/// # use std::error::Error;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// use lattice_l2hmc::dynamics::DynamicsConfig;
/// use lattice_l2hmc::group::GroupKind;
///
/// let config = DynamicsConfig::new(GroupKind::U1, 64, 10, 0.05_f64)?
///     .with_ncp(true)
///     .with_verbose(true);
/// config.validate()?;
///
/// let su3 = DynamicsConfig::new(GroupKind::Su3, 4 * 18, 10, 0.05_f64)?;
/// // learned updates are not exactly invertible on SU(3)
/// assert!(su3.validate().is_err());
/// su3.with_hmc(true).validate()?;
/// #     Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DynamicsConfig {
    group: GroupKind,
    xdim: usize,
    nleapfrog: usize,
    eps: Real,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    eps_hmc: Option<Real>,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    eps_fixed: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    use_ncp: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    verbose: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    hmc: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    merge_directions: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    zero_masks: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    use_separate_networks: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    use_split_xnets: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    compute_hmc_acceptance: bool,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    net_weights: NetWeights,
}

/// Step sizes must be finite and strictly positive.
pub(crate) fn check_step_size(eps: Real) -> Result<(), ConfigError> {
    if eps.is_finite() && eps > 0_f64 {
        Ok(())
    }
    else {
        Err(ConfigError::NonPositiveStepSize(eps))
    }
}

impl DynamicsConfig {
    /// Create a configuration with every option off.
    ///
    /// # Errors
    /// - [`ConfigError::ZeroLeapfrog`] if `nleapfrog == 0`;
    /// - [`ConfigError::ZeroDimension`] or [`ConfigError::IncompatibleDimension`] if `xdim`
    ///   cannot hold group elements;
    /// - [`ConfigError::NonPositiveStepSize`] if `eps` is not strictly positive.
    pub fn new(group: GroupKind, xdim: usize, nleapfrog: usize, eps: Real) -> Result<Self, ConfigError> {
        let config = Self {
            group,
            xdim,
            nleapfrog,
            eps,
            eps_hmc: None,
            eps_fixed: false,
            use_ncp: false,
            verbose: false,
            hmc: false,
            merge_directions: false,
            zero_masks: false,
            use_separate_networks: false,
            use_split_xnets: false,
            compute_hmc_acceptance: false,
            net_weights: NetWeights::default(),
        };
        config.validate_sizes()?;
        Ok(config)
    }

    /// Check the sizes and the step sizes.
    fn validate_sizes(&self) -> Result<(), ConfigError> {
        if self.nleapfrog == 0 {
            return Err(ConfigError::ZeroLeapfrog);
        }
        Manifold::from(self.group).check_dim(self.xdim)?;
        check_step_size(self.eps)?;
        check_step_size(self.eps_hmc())
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    /// Same errors as [`DynamicsConfig::new`] and
    /// - [`ConfigError::NcpRequiresAngularGroup`] if NCP updates are asked on a non angular group;
    /// - [`ConfigError::NonInvertibleConfiguration`] if learned updates are asked on SU(3).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_sizes()?;
        let group = Manifold::from(self.group);
        if self.use_ncp && !group.is_angular() {
            return Err(ConfigError::NcpRequiresAngularGroup(self.group));
        }
        if !self.hmc && self.group == GroupKind::Su3 {
            return Err(ConfigError::NonInvertibleConfiguration(self.group));
        }
        Ok(())
    }

    getter_copy!(
        /// The group of the positions.
        pub const,
        group,
        GroupKind
    );

    getter_copy!(
        /// Number of reals of a position.
        pub const,
        xdim,
        usize
    );

    getter_copy!(
        /// Number of leapfrog steps of a trajectory.
        pub const,
        nleapfrog,
        usize
    );

    getter_copy!(
        /// Initial step size of the learned leapfrog.
        pub const,
        eps,
        Real
    );

    /// Step size of the plain HMC leapfrog, defaults to [`DynamicsConfig::eps`].
    #[must_use]
    #[inline]
    pub fn eps_hmc(&self) -> Real {
        self.eps_hmc.unwrap_or(self.eps)
    }

    getter_copy!(
        /// Whether the step sizes keep the value [`DynamicsConfig::eps`] instead of being trained.
        pub const,
        eps_fixed,
        bool
    );

    getter_copy!(
        /// Whether position updates on angles use the angle preserving (NCP) transform.
        pub const,
        use_ncp,
        bool
    );

    getter_copy!(
        /// Whether the trajectories record a per step history.
        pub const,
        verbose,
        bool
    );

    getter_copy!(
        /// Whether the dynamics is plain HMC.
        pub const,
        hmc,
        bool
    );

    getter_copy!(
        /// Whether a transition runs forward then backward with one momentum draw.
        pub const,
        merge_directions,
        bool
    );

    getter_copy!(
        /// Whether the masks are all zero.
        pub const,
        zero_masks,
        bool
    );

    getter_copy!(
        /// Whether there is one set of networks per leapfrog step.
        pub const,
        use_separate_networks,
        bool
    );

    getter_copy!(
        /// Whether the two position half-updates use different networks.
        /// Only used with [`DynamicsConfig::use_separate_networks`].
        pub const,
        use_split_xnets,
        bool
    );

    getter_copy!(
        /// Whether the plain HMC acceptance is computed alongside the learned one.
        pub const,
        compute_hmc_acceptance,
        bool
    );

    getter_copy!(
        /// The weights applied on the coupling outputs.
        pub const,
        net_weights,
        NetWeights
    );

    /// Set the plain HMC step size.
    #[must_use]
    pub const fn with_eps_hmc(mut self, eps_hmc: Real) -> Self {
        self.eps_hmc = Some(eps_hmc);
        self
    }

    /// Set [`DynamicsConfig::eps_fixed`].
    #[must_use]
    pub const fn with_eps_fixed(mut self, eps_fixed: bool) -> Self {
        self.eps_fixed = eps_fixed;
        self
    }

    /// Set [`DynamicsConfig::use_ncp`].
    #[must_use]
    pub const fn with_ncp(mut self, use_ncp: bool) -> Self {
        self.use_ncp = use_ncp;
        self
    }

    /// Set [`DynamicsConfig::verbose`].
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set [`DynamicsConfig::hmc`].
    #[must_use]
    pub const fn with_hmc(mut self, hmc: bool) -> Self {
        self.hmc = hmc;
        self
    }

    /// Set [`DynamicsConfig::merge_directions`].
    #[must_use]
    pub const fn with_merge_directions(mut self, merge_directions: bool) -> Self {
        self.merge_directions = merge_directions;
        self
    }

    /// Set [`DynamicsConfig::zero_masks`].
    #[must_use]
    pub const fn with_zero_masks(mut self, zero_masks: bool) -> Self {
        self.zero_masks = zero_masks;
        self
    }

    /// Set [`DynamicsConfig::use_separate_networks`].
    #[must_use]
    pub const fn with_separate_networks(mut self, use_separate_networks: bool) -> Self {
        self.use_separate_networks = use_separate_networks;
        self
    }

    /// Set [`DynamicsConfig::use_split_xnets`].
    #[must_use]
    pub const fn with_split_xnets(mut self, use_split_xnets: bool) -> Self {
        self.use_split_xnets = use_split_xnets;
        self
    }

    /// Set [`DynamicsConfig::compute_hmc_acceptance`].
    #[must_use]
    pub const fn with_hmc_acceptance(mut self, compute_hmc_acceptance: bool) -> Self {
        self.compute_hmc_acceptance = compute_hmc_acceptance;
        self
    }

    /// Set [`DynamicsConfig::net_weights`].
    #[must_use]
    pub const fn with_net_weights(mut self, net_weights: NetWeights) -> Self {
        self.net_weights = net_weights;
        self
    }
}

/// Inverse coupling of a batch: one value for every chain or one value per chain.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum Beta {
    /// Same value for every chain.
    Scalar(Real),
    /// One value per chain.
    PerSample(Vec<Real>),
}

impl Beta {
    /// Check that there is a value for each of the `batch` chains.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if [`Beta::PerSample`] does not have `batch` values.
    pub fn check(&self, batch: usize) -> Result<(), ShapeError> {
        match self {
            Self::Scalar(_) => Ok(()),
            Self::PerSample(betas) => ShapeError::check(ShapeKind::Beta, batch, betas.len()),
        }
    }

    /// Value of the chain `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Real> {
        match self {
            Self::Scalar(beta) => Some(*beta),
            Self::PerSample(betas) => betas.get(index).copied(),
        }
    }
}

impl From<Real> for Beta {
    fn from(beta: Real) -> Self {
        Self::Scalar(beta)
    }
}

impl From<Vec<Real>> for Beta {
    fn from(betas: Vec<Real>) -> Self {
        Self::PerSample(betas)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation() {
        assert_eq!(
            DynamicsConfig::new(GroupKind::U1, 8, 0, 0.1_f64),
            Err(ConfigError::ZeroLeapfrog)
        );
        assert_eq!(
            DynamicsConfig::new(GroupKind::U1, 8, 2, 0_f64),
            Err(ConfigError::NonPositiveStepSize(0_f64))
        );
        assert!(DynamicsConfig::new(GroupKind::U1, 8, 2, f64::NAN).is_err());
        assert!(DynamicsConfig::new(GroupKind::Su3, 17, 2, 0.1_f64).is_err());
        let config = DynamicsConfig::new(GroupKind::Euclidean, 8, 2, 0.1_f64).unwrap();
        assert_eq!(
            config.clone().with_ncp(true).validate(),
            Err(ConfigError::NcpRequiresAngularGroup(GroupKind::Euclidean))
        );
        assert!(config.clone().with_eps_hmc(-1_f64).validate().is_err());
        assert_eq!(config.eps_hmc(), 0.1_f64);
        assert_eq!(config.with_eps_hmc(0.2_f64).eps_hmc(), 0.2_f64);
        let su3 = DynamicsConfig::new(GroupKind::Su3, 18, 2, 0.1_f64).unwrap();
        assert_eq!(
            su3.validate(),
            Err(ConfigError::NonInvertibleConfiguration(GroupKind::Su3))
        );
        assert!(su3.with_hmc(true).validate().is_ok());
    }

    #[test]
    fn beta() {
        assert!(Beta::from(1_f64).check(10).is_ok());
        let beta = Beta::from(vec![1_f64, 2_f64]);
        assert!(beta.check(3).is_err());
        assert_eq!(beta.get(1), Some(2_f64));
        assert_eq!(beta.get(2), None);
    }
}
