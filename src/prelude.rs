//! Reexport for easy use,
//! `use lattice_l2hmc::prelude::*`.

pub use super::{
    coupling::{
        AffineCoupling, CouplingFunction, CouplingInput, CouplingNetworks, CouplingOutput,
        IdentityCoupling, NetWeight, NetWeights, NetworkRole,
    },
    dynamics::{BatchTransition, Beta, Dynamics, DynamicsConfig, StepSizes, Transition},
    error::{ConfigError, DynamicsError, ShapeError},
    group::{Group, GroupKind, Manifold},
    integrator::{Direction, LeapfrogIntegrator},
    mask::{Mask, MaskSet},
    metrics::{StepMetrics, Trajectory, TransitionMetrics},
    potential::{CosineAction, FnPotential, Harmonic, Potential},
    rng::chain_rngs,
    simulation::{L2hmcSampler, MonteCarlo, MonteCarloStates, State},
    CMatrix3, Complex, ComplexField, RVector, Real,
};
