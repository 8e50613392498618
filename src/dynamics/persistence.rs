//! Save and restore the trained parameters with [`bincode`].

use std::io::{Read, Write};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{Dynamics, DynamicsConfig, StepSizes};
use crate::coupling::{CouplingFunction, CouplingNetworks};
use crate::error::{ConfigError, PersistError};
use crate::mask::MaskSet;
use crate::potential::Potential;

/// Everything that defines a [`Dynamics`] apart from its potential.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicsParameters<C> {
    config: DynamicsConfig,
    step_sizes: StepSizes,
    masks: MaskSet,
    networks: CouplingNetworks<C>,
}

/// Borrowed [`DynamicsParameters`], serialized identically.
#[derive(Serialize)]
struct ParametersRef<'a, C> {
    config: &'a DynamicsConfig,
    step_sizes: &'a StepSizes,
    masks: &'a MaskSet,
    networks: &'a CouplingNetworks<C>,
}

impl<C> DynamicsParameters<C> {
    getter!(
        /// The configuration.
        pub const,
        config,
        DynamicsConfig
    );

    getter!(
        /// The step sizes.
        pub const,
        step_sizes,
        StepSizes
    );

    getter!(
        /// The masks.
        pub const,
        masks,
        MaskSet
    );

    getter!(
        /// The coupling networks.
        pub const,
        networks,
        CouplingNetworks<C>
    );

    /// Check that the parameters are consistent with the configuration, network parameter
    /// shapes included.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if they are not.
    pub fn validate(&self) -> Result<(), ConfigError>
    where
        C: CouplingFunction,
    {
        self.config.validate()?;
        self.networks.check(&self.config)?;
        self.masks.check(self.config.xdim(), self.config.nleapfrog())?;
        self.step_sizes.check(self.config.nleapfrog())
    }

    /// Write the parameters to `writer`.
    ///
    /// # Errors
    /// Returns an error if the writer fails or if the serialization fails.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), PersistError>
    where
        C: Serialize,
    {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Read parameters from `reader` and validate them.
    ///
    /// # Errors
    /// Returns an error if the reader fails, if the data is not valid or if the parameters are
    /// not consistent with their configuration.
    pub fn load<Rd: Read>(reader: Rd) -> Result<Self, PersistError>
    where
        C: CouplingFunction + DeserializeOwned,
    {
        let parameters: Self = bincode::deserialize_from(reader)?;
        parameters.validate()?;
        Ok(parameters)
    }
}

impl<P, C> Dynamics<P, C>
where
    P: Potential,
    C: CouplingFunction,
{
    /// Copy of the parameters of the dynamics.
    #[must_use]
    pub fn parameters(&self) -> DynamicsParameters<C>
    where
        C: Clone,
    {
        DynamicsParameters {
            config: self.config.clone(),
            step_sizes: self.step_sizes.clone(),
            masks: self.masks.clone(),
            networks: self.networks.clone(),
        }
    }

    /// Rebuild the dynamics from its parameters.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the parameters are inconsistent.
    pub fn from_parameters(parameters: DynamicsParameters<C>, potential: P) -> Result<Self, ConfigError> {
        Self::from_parts(
            parameters.config,
            potential,
            parameters.networks,
            parameters.masks,
            parameters.step_sizes,
        )
    }

    /// Write the configuration, the step sizes, the masks and the networks to `writer`.
    ///
    /// # Errors
    /// Returns an error if the writer fails or if the serialization fails.
    ///
    /// # Example
    /// ```
    /// # use std::error::Error;
    /// #
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use lattice_l2hmc::coupling::{AffineCoupling, CouplingNetworks};
    /// use lattice_l2hmc::dynamics::{Dynamics, DynamicsConfig};
    /// use lattice_l2hmc::group::GroupKind;
    /// use lattice_l2hmc::potential::Harmonic;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0); // change with your seed
    /// let config = DynamicsConfig::new(GroupKind::Euclidean, 6, 2, 0.1_f64)?;
    /// let networks = CouplingNetworks::build(&config, |_| AffineCoupling::zeros(6, 6, 6));
    /// let dynamics = Dynamics::new(config, Harmonic::new(1_f64), networks, &mut rng)?;
    ///
    /// let mut buffer = Vec::new();
    /// dynamics.save_parameters(&mut buffer)?;
    /// let restored = Dynamics::<_, AffineCoupling>::load_parameters(&buffer[..], Harmonic::new(1_f64))?;
    /// assert_eq!(restored.masks(), dynamics.masks());
    /// assert_eq!(restored.networks(), dynamics.networks());
    /// #     Ok(())
    /// # }
    /// ```
    pub fn save_parameters<W: Write>(&self, writer: W) -> Result<(), PersistError>
    where
        C: Serialize,
    {
        let parameters = ParametersRef {
            config: &self.config,
            step_sizes: &self.step_sizes,
            masks: &self.masks,
            networks: &self.networks,
        };
        bincode::serialize_into(writer, &parameters)?;
        log::info!(
            "saved parameters of {} leapfrog steps and {} networks",
            self.config.nleapfrog(),
            self.networks.len()
        );
        Ok(())
    }

    /// Read parameters written by [`Dynamics::save_parameters`] and rebuild the dynamics.
    ///
    /// # Errors
    /// Returns an error if the reader fails, if the data is not valid or if the parameters are
    /// inconsistent.
    pub fn load_parameters<Rd: Read>(reader: Rd, potential: P) -> Result<Self, PersistError>
    where
        C: DeserializeOwned,
    {
        let parameters = DynamicsParameters::load(reader)?;
        log::info!(
            "loaded parameters of {} leapfrog steps",
            parameters.config.nleapfrog()
        );
        Ok(Self::from_parameters(parameters, potential)?)
    }
}
