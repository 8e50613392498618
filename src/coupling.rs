//! Coupling functions, the parametrized maps of the learned leapfrog.
//!
//! A coupling function is given a primary input (the encoded, possibly masked position, see
//! [`crate::group::Group::group_to_vec`]) and an auxiliary input (the force for momentum updates,
//! the momentum for position updates) and returns a scale `s`, a translation `t` and a
//! transformation `q`, each with one value per coordinate of the chain.
//!
//! The bodies of the coupling functions (usually neural networks) are outside of this crate,
//! they plug in through [`CouplingFunction`]. Two reference implementations are provided:
//! - [`IdentityCoupling`] returns zeros, the learned leapfrog then reduces to plain leapfrog;
//! - [`AffineCoupling`] is a small dense map with trainable weights.

use rand_distr::{Distribution, Normal};
#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::dynamics::DynamicsConfig;
use crate::error::{ConfigError, ShapeError, ShapeKind};
use crate::group::{Group, Manifold};
use crate::{RVector, Real};

/// Input of a [`CouplingFunction`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CouplingInput<'a> {
    primary: &'a RVector,
    auxiliary: &'a RVector,
    step: usize,
    time: [Real; 2],
}

impl<'a> CouplingInput<'a> {
    /// Create the input of the leapfrog step `step` out of `nleapfrog`.
    /// The time encoding is `[cos(2 pi step / nleapfrog), sin(2 pi step / nleapfrog)]`.
    #[must_use]
    #[allow(clippy::as_conversions)] // no try into for f64
    #[allow(clippy::cast_precision_loss)]
    pub fn new(primary: &'a RVector, auxiliary: &'a RVector, step: usize, nleapfrog: usize) -> Self {
        let angle = 2_f64 * std::f64::consts::PI * step as Real / nleapfrog.max(1) as Real;
        Self {
            primary,
            auxiliary,
            step,
            time: [angle.cos(), angle.sin()],
        }
    }

    /// The encoded (and masked for position updates) position.
    #[must_use]
    #[inline]
    pub const fn primary(&self) -> &'a RVector {
        self.primary
    }

    /// The force for momentum updates, the momentum for position updates.
    /// Its length is the dimension of the chain.
    #[must_use]
    #[inline]
    pub const fn auxiliary(&self) -> &'a RVector {
        self.auxiliary
    }

    getter_copy!(
        /// The leapfrog step index.
        pub const,
        step,
        usize
    );

    getter_copy!(
        /// The time encoding of the step.
        pub const,
        time,
        [Real; 2]
    );

    /// Dimension of the chain, the expected length of the outputs.
    #[must_use]
    #[inline]
    pub fn xdim(&self) -> usize {
        self.auxiliary.len()
    }
}

/// Scale, translation and transformation returned by a [`CouplingFunction`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CouplingOutput {
    scale: RVector,
    translation: RVector,
    transformation: RVector,
}

impl CouplingOutput {
    /// Create a new output.
    #[must_use]
    #[inline]
    pub const fn new(scale: RVector, translation: RVector, transformation: RVector) -> Self {
        Self {
            scale,
            translation,
            transformation,
        }
    }

    /// The output of the identity transformation.
    #[must_use]
    pub fn zeros(xdim: usize) -> Self {
        Self::new(RVector::zeros(xdim), RVector::zeros(xdim), RVector::zeros(xdim))
    }

    getter!(
        /// The scale `s`.
        pub const,
        scale,
        RVector
    );

    getter!(
        /// The translation `t`.
        pub const,
        translation,
        RVector
    );

    getter!(
        /// The transformation `q`.
        pub const,
        transformation,
        RVector
    );

    /// Check that every output has length `xdim`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] of kind [`ShapeKind::CouplingOutput`] otherwise.
    pub fn check(&self, xdim: usize) -> Result<(), ShapeError> {
        ShapeError::check(ShapeKind::CouplingOutput, xdim, self.scale.len())?;
        ShapeError::check(ShapeKind::CouplingOutput, xdim, self.translation.len())?;
        ShapeError::check(ShapeKind::CouplingOutput, xdim, self.transformation.len())
    }

    /// Multiply each output by its weight.
    #[must_use]
    pub fn weighted(self, weight: NetWeight) -> Self {
        Self::new(
            self.scale * weight.s(),
            self.translation * weight.t(),
            self.transformation * weight.q(),
        )
    }
}

/// A parametrized map `(primary, auxiliary) -> (s, t, q)`.
///
/// Implementations must be pure: the same input gives the same output, otherwise the
/// backward trajectory does not invert the forward one.
pub trait CouplingFunction: Sync {
    /// Evaluate the function.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the input does not have the expected shape.
    fn evaluate(&self, input: &CouplingInput<'_>) -> Result<CouplingOutput, ShapeError>;

    /// Check the parameters against the lengths of the primary and auxiliary inputs and of
    /// the outputs. Functions without parameters accept every shape.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] of kind [`ShapeKind::CouplingParameter`] if a parameter does
    /// not have the expected shape.
    fn check_shape(&self, _primary_len: usize, _auxiliary_len: usize, _xdim: usize) -> Result<(), ShapeError> {
        Ok(())
    }
}

/// Coupling function whose outputs are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IdentityCoupling {}

impl IdentityCoupling {
    /// Create the identity coupling.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {}
    }
}

impl CouplingFunction for IdentityCoupling {
    fn evaluate(&self, input: &CouplingInput<'_>) -> Result<CouplingOutput, ShapeError> {
        Ok(CouplingOutput::zeros(input.xdim()))
    }
}

/// Affine coupling: `s = c_s tanh(W_s z + b_s)`, `t = W_t z + b_t`, `q = c_q tanh(W_q z + b_q)`
/// where `z = [primary, auxiliary, time]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct AffineCoupling {
    weights: [na::DMatrix<Real>; 3],
    biases: [RVector; 3],
    scale_coeff: Real,
    transformation_coeff: Real,
}

impl AffineCoupling {
    /// Coupling with zero weights, equivalent to [`IdentityCoupling`] until trained.
    #[must_use]
    pub fn zeros(primary_len: usize, auxiliary_len: usize, xdim: usize) -> Self {
        let input_len = primary_len + auxiliary_len + 2;
        Self {
            weights: [
                na::DMatrix::zeros(xdim, input_len),
                na::DMatrix::zeros(xdim, input_len),
                na::DMatrix::zeros(xdim, input_len),
            ],
            biases: [RVector::zeros(xdim), RVector::zeros(xdim), RVector::zeros(xdim)],
            scale_coeff: 1_f64,
            transformation_coeff: 1_f64,
        }
    }

    /// Coupling with weights drawn from `N(0, std^2)` and zero biases.
    ///
    /// # Errors
    /// Returns an error if `std` is negative or not finite.
    pub fn random<R>(
        primary_len: usize,
        auxiliary_len: usize,
        xdim: usize,
        std: Real,
        rng: &mut R,
    ) -> Result<Self, rand_distr::NormalError>
    where
        R: rand::Rng + ?Sized,
    {
        let d = Normal::new(0_f64, std)?;
        let mut coupling = Self::zeros(primary_len, auxiliary_len, xdim);
        for weight in &mut coupling.weights {
            weight.iter_mut().for_each(|el| *el = d.sample(rng));
        }
        Ok(coupling)
    }

    /// Set the factors in front of the `tanh` of the scale and of the transformation.
    #[must_use]
    pub fn with_coefficients(mut self, scale_coeff: Real, transformation_coeff: Real) -> Self {
        self.scale_coeff = scale_coeff;
        self.transformation_coeff = transformation_coeff;
        self
    }

    /// Weights of the scale, translation and transformation, in this order.
    #[must_use]
    #[inline]
    pub const fn weights(&self) -> &[na::DMatrix<Real>; 3] {
        &self.weights
    }

    /// Mutable weights, for an external optimizer.
    #[inline]
    pub fn weights_mut(&mut self) -> &mut [na::DMatrix<Real>; 3] {
        &mut self.weights
    }

    /// Mutable biases, for an external optimizer.
    #[inline]
    pub fn biases_mut(&mut self) -> &mut [RVector; 3] {
        &mut self.biases
    }

    /// Number of trainable parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(|weight| weight.len()).sum::<usize>()
            + self.biases.iter().map(|bias| bias.len()).sum::<usize>()
    }
}

impl CouplingFunction for AffineCoupling {
    fn evaluate(&self, input: &CouplingInput<'_>) -> Result<CouplingOutput, ShapeError> {
        self.check_shape(input.primary().len(), input.auxiliary().len(), input.xdim())?;
        let [ws, wt, wq] = &self.weights;
        let [bs, bt, bq] = &self.biases;
        let z = RVector::from_iterator(
            ws.ncols(),
            input
                .primary()
                .iter()
                .chain(input.auxiliary().iter())
                .chain(input.time().iter())
                .copied(),
        );
        let scale = (ws * &z + bs).map(|el| self.scale_coeff * el.tanh());
        let translation = wt * &z + bt;
        let transformation = (wq * &z + bq).map(|el| self.transformation_coeff * el.tanh());
        Ok(CouplingOutput::new(scale, translation, transformation))
    }

    fn check_shape(&self, primary_len: usize, auxiliary_len: usize, xdim: usize) -> Result<(), ShapeError> {
        let input_len = primary_len + auxiliary_len + 2;
        for (weight, bias) in self.weights.iter().zip(&self.biases) {
            ShapeError::check(ShapeKind::CouplingParameter, xdim, weight.nrows())?;
            ShapeError::check(ShapeKind::CouplingParameter, input_len, weight.ncols())?;
            ShapeError::check(ShapeKind::CouplingParameter, xdim, bias.len())?;
        }
        Ok(())
    }
}

/// Multiplicative factors applied on the outputs of a family of coupling functions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NetWeight {
    s: Real,
    t: Real,
    q: Real,
}

impl NetWeight {
    /// Create the weights.
    #[must_use]
    #[inline]
    pub const fn new(s: Real, t: Real, q: Real) -> Self {
        Self { s, t, q }
    }

    getter_copy!(
        /// Factor on the scale.
        pub const,
        s,
        Real
    );

    getter_copy!(
        /// Factor on the translation.
        pub const,
        t,
        Real
    );

    getter_copy!(
        /// Factor on the transformation.
        pub const,
        q,
        Real
    );
}

impl Default for NetWeight {
    fn default() -> Self {
        Self::new(1_f64, 1_f64, 1_f64)
    }
}

/// [`NetWeight`] of the position and of the momentum coupling functions.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NetWeights {
    /// Weights of the position coupling functions.
    pub x: NetWeight,
    /// Weights of the momentum coupling functions.
    pub v: NetWeight,
}

impl NetWeights {
    /// Create the weights.
    #[must_use]
    #[inline]
    pub const fn new(x: NetWeight, v: NetWeight) -> Self {
        Self { x, v }
    }
}

/// What a coupling function is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkRole {
    /// Momentum update of the given step.
    Momentum {
        /// Leapfrog step, `0` for shared networks.
        step: usize,
    },
    /// First position half-update of the given step (or both half-updates if not split).
    PositionFirst {
        /// Leapfrog step, `0` for shared networks.
        step: usize,
    },
    /// Second position half-update of the given step.
    PositionSecond {
        /// Leapfrog step.
        step: usize,
    },
}

/// The coupling functions used by the learned leapfrog.
///
/// Layouts:
/// - shared: one momentum and one position network for all steps;
/// - separate: one momentum and one position network per step;
/// - separate and split: one momentum network and two position networks (one per
///   half-update) per step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CouplingNetworks<C> {
    vnets: Vec<C>,
    xnets_first: Vec<C>,
    xnets_second: Option<Vec<C>>,
}

impl<C> CouplingNetworks<C> {
    /// Networks shared by every step.
    pub fn shared(vnet: C, xnet: C) -> Self {
        Self {
            vnets: vec![vnet],
            xnets_first: vec![xnet],
            xnets_second: None,
        }
    }

    /// Create the networks from their vectors.
    /// Check them against a configuration with [`CouplingNetworks::check`].
    pub const fn new(vnets: Vec<C>, xnets_first: Vec<C>, xnets_second: Option<Vec<C>>) -> Self {
        Self {
            vnets,
            xnets_first,
            xnets_second,
        }
    }

    /// Build the networks in the layout asked by the configuration, calling `f` for each role.
    ///
    /// # Example
    /// ```
    /// # use std::error::Error;
    /// #
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use lattice_l2hmc::coupling::{CouplingNetworks, IdentityCoupling};
    /// use lattice_l2hmc::dynamics::DynamicsConfig;
    /// use lattice_l2hmc::group::GroupKind;
    ///
    /// let config = DynamicsConfig::new(GroupKind::U1, 16, 4, 0.1_f64)?
    ///     .with_separate_networks(true)
    ///     .with_split_xnets(true);
    /// let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    /// assert_eq!(networks.len(), 12);
    /// networks.check(&config)?;
    /// #     Ok(())
    /// # }
    /// ```
    pub fn build(config: &DynamicsConfig, mut f: impl FnMut(NetworkRole) -> C) -> Self {
        let count = if config.use_separate_networks() {
            config.nleapfrog()
        }
        else {
            1
        };
        let vnets = (0..count).map(|step| f(NetworkRole::Momentum { step })).collect();
        let xnets_first = (0..count)
            .map(|step| f(NetworkRole::PositionFirst { step }))
            .collect();
        let xnets_second = Self::is_split(config).then(|| {
            (0..count)
                .map(|step| f(NetworkRole::PositionSecond { step }))
                .collect()
        });
        Self::new(vnets, xnets_first, xnets_second)
    }

    /// Whether the configuration asks for split position networks.
    fn is_split(config: &DynamicsConfig) -> bool {
        config.use_separate_networks() && config.use_split_xnets()
    }

    /// Momentum network of a step.
    #[must_use]
    pub fn vnet(&self, step: usize) -> Option<&C> {
        Self::pick(&self.vnets, step)
    }

    /// Position network of a step, `first` selects the half-update.
    #[must_use]
    pub fn xnet(&self, step: usize, first: bool) -> Option<&C> {
        match (&self.xnets_second, first) {
            (Some(second), false) => Self::pick(second, step),
            _ => Self::pick(&self.xnets_first, step),
        }
    }

    /// Shared families have one element used for every step.
    fn pick(nets: &[C], step: usize) -> Option<&C> {
        if nets.len() == 1 {
            nets.first()
        }
        else {
            nets.get(step)
        }
    }

    /// Total number of networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vnets.len() + self.xnets_first.len() + self.xnets_second.as_ref().map_or(0, Vec::len)
    }

    /// Whether there is no network.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all the networks.
    pub fn iter(&self) -> impl Iterator<Item = &C> + '_ {
        self.vnets
            .iter()
            .chain(self.xnets_first.iter())
            .chain(self.xnets_second.iter().flatten())
    }

    /// Iterate mutably over all the networks, for an external optimizer.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut C> + '_ {
        self.vnets
            .iter_mut()
            .chain(self.xnets_first.iter_mut())
            .chain(self.xnets_second.iter_mut().flatten())
    }
}

impl<C: CouplingFunction> CouplingNetworks<C> {
    /// Check that the layout and the parameter shapes match the configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::NetworkCount`] if a family does not have the right number of
    /// networks and [`ConfigError::ParameterMismatch`] if a network has parameters of the wrong
    /// shape.
    pub fn check(&self, config: &DynamicsConfig) -> Result<(), ConfigError> {
        let expected = if config.use_separate_networks() {
            config.nleapfrog()
        }
        else {
            1
        };
        let check = |found: usize| {
            if found == expected {
                Ok(())
            }
            else {
                Err(ConfigError::NetworkCount { expected, found })
            }
        };
        check(self.vnets.len())?;
        check(self.xnets_first.len())?;
        match (&self.xnets_second, Self::is_split(config)) {
            (Some(second), true) => check(second.len())?,
            (None, false) => {}
            (Some(second), false) => {
                return Err(ConfigError::NetworkCount {
                    expected: 0,
                    found: second.len(),
                })
            }
            (None, true) => return Err(ConfigError::NetworkCount { expected, found: 0 }),
        }
        let xdim = config.xdim();
        let primary_len = Manifold::from(config.group())
            .group_to_vec(&RVector::zeros(xdim))
            .len();
        self.iter()
            .try_for_each(|net| net.check_shape(primary_len, xdim, xdim))
            .map_err(ConfigError::ParameterMismatch)
    }
}
