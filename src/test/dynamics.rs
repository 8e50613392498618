//! Tests of the transition kernel as a whole.

use std::error::Error;

use approx::assert_abs_diff_eq;
use nalgebra::DVector;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::SEED_RNG;
use crate::coupling::{AffineCoupling, CouplingNetworks, IdentityCoupling};
use crate::dynamics::{Beta, Dynamics, DynamicsConfig};
use crate::error::{ConfigError, DynamicsError, ShapeError, ShapeKind};
use crate::group::{Group, GroupKind, Manifold};
use crate::integrator::{Direction, HmcLeapfrog, LeapfrogIntegrator};
use crate::potential::{CosineAction, FnPotential, Harmonic, Potential};
use crate::rng::chain_rngs;
use crate::simulation::{L2hmcSampler, MonteCarlo, State};
use crate::field::Su3Adjoint;
use crate::group::Su3;
use crate::su3::{
    is_matrix_su3, matrix_from_reals, matrix_to_reals, project_to_su3_lie, random_matrix_3,
    GENERATORS, MATRIX_REAL_SIZE,
};
use crate::{CMatrix3, Complex, RVector, I};

const EPSILON: f64 = 1E-10_f64;

/// Affine couplings with small random weights in the layout of `config`.
fn affine_networks(
    config: &DynamicsConfig,
    primary_len: usize,
    rng: &mut StdRng,
) -> Result<CouplingNetworks<AffineCoupling>, Box<dyn Error>> {
    let xdim = config.xdim();
    let mut networks =
        CouplingNetworks::build(config, |_| AffineCoupling::zeros(primary_len, xdim, xdim));
    for net in networks.iter_mut() {
        *net = AffineCoupling::random(primary_len, xdim, xdim, 0.1_f64, rng)?;
    }
    Ok(networks)
}

fn identity_dynamics(config: DynamicsConfig) -> Result<Dynamics<Harmonic, IdentityCoupling>, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    Ok(Dynamics::new(config, Harmonic::new(1_f64), networks, &mut rng)?)
}

/// Forward then backward kernels give back the state and opposite log-Jacobians.
fn check_reversibility<P: Potential>(config: DynamicsConfig, potential: P) -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let primary_len = Manifold::from(config.group())
        .group_to_vec(&DVector::zeros(config.xdim()))
        .len();
    let networks = affine_networks(&config, primary_len, &mut rng)?;
    let dynamics = Dynamics::new(config, potential, networks, &mut rng)?;
    for _ in 0_u32..10_u32 {
        let state = dynamics.random_state(1.5_f64, &mut rng)?;
        let (dx, dv) = dynamics.test_reversibility(&state)?;
        assert!(dx < 1E-8_f64, "dx = {dx}");
        assert!(dv < 1E-8_f64, "dv = {dv}");

        let (forward, trajectory_forward) = dynamics.transition_kernel(&state, Direction::Forward)?;
        let (_, trajectory_backward) = dynamics.transition_kernel(&forward, Direction::Backward)?;
        assert!(trajectory_forward.sumlogdet().abs() > 0_f64);
        assert_abs_diff_eq!(
            trajectory_forward.sumlogdet(),
            -trajectory_backward.sumlogdet(),
            epsilon = 1E-8_f64
        );
    }
    Ok(())
}

#[test]
fn reversibility_flat() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 6, 4, 0.1_f64)?;
    check_reversibility(config, Harmonic::new(1_f64))?;
    let config = DynamicsConfig::new(GroupKind::U1, 6, 3, 0.2_f64)?
        .with_separate_networks(true)
        .with_split_xnets(true);
    check_reversibility(config, CosineAction::new())
}

#[test]
fn reversibility_ncp() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::U1, 8, 4, 0.25_f64)?
        .with_ncp(true)
        .with_separate_networks(true);
    check_reversibility(config, CosineAction::new())
}

#[test]
fn identity_couplings() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 8, 2, 0.1_f64)?;
    let dynamics = identity_dynamics(config)?;
    let mut rngs = chain_rngs(SEED_RNG, 4);
    let x = vec![DVector::from_element(8, 0.5_f64); 4];
    let batch = dynamics.apply_transition_batch(&x, &Beta::Scalar(1_f64), &mut rngs)?;
    assert_eq!(batch.len(), 4);
    let group = Manifold::from(GroupKind::Euclidean);
    let potential = Harmonic::new(1_f64);
    let reference = HmcLeapfrog::new(&group, &potential, 0.1_f64, 2);
    let energy = |state: &State| (state.x().norm_squared() + state.v().norm_squared()) / 2_f64;
    for transition in batch.iter() {
        let states = transition.states();
        let metrics = transition.metrics();
        assert_eq!(metrics.sumlogdet(), 0_f64);
        let mut expected = states.init().clone();
        for step in 0..2 {
            expected = reference.leapfrog(step, &expected, metrics.direction())?.0;
        }
        assert_eq_vector!(*states.proposed().x(), *expected.x(), EPSILON);
        assert_abs_diff_eq!(
            metrics.acc(),
            (energy(states.init()) - energy(&expected)).min(0_f64).exp(),
            epsilon = EPSILON
        );
        assert!((0_f64..=1_f64).contains(&metrics.acc()));
        if metrics.acc_mask() {
            assert_eq!(states.out(), states.proposed());
        }
        else {
            assert_eq!(states.out(), states.init());
        }
        assert_eq!(states.init().x(), &x[0]);
    }
    Ok(())
}

#[test]
fn hmc_limit() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 6, 5, 0.05_f64)?;
    let learned = identity_dynamics(config.clone())?;
    let hmc = identity_dynamics(config.with_hmc(true))?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let state = learned.random_state(1_f64, &mut rng)?;
    for direction in [Direction::Forward, Direction::Backward] {
        let (a, trajectory) = learned.transition_kernel(&state, direction)?;
        let (b, _) = hmc.transition_kernel(&state, direction)?;
        assert_eq!(trajectory.sumlogdet(), 0_f64);
        assert_eq_vector!(*a.x(), *b.x(), EPSILON);
        assert_eq_vector!(*a.v(), *b.v(), EPSILON);
    }
    Ok(())
}

#[test]
fn hmc_energy_conservation() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 4, 10, 0.01_f64)?.with_hmc(true);
    let dynamics = identity_dynamics(config)?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let state = dynamics.random_state(1_f64, &mut rng)?;
    let (proposed, _) = dynamics.transition_kernel(&state, Direction::Forward)?;
    let dh = dynamics.hamiltonian(&state)? - dynamics.hamiltonian(&proposed)?;
    assert!(dh.abs() < 1E-3_f64);
    assert!(dynamics.compute_accept_prob(&state, &proposed, 0_f64)? > 0.99_f64);
    Ok(())
}

#[test]
fn verbose_history() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::U1, 4, 3, 0.1_f64)?.with_verbose(true);
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let networks = affine_networks(&config, 8, &mut rng)?;
    let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;
    let state = dynamics.random_state(1_f64, &mut rng)?;

    let (_, trajectory) = dynamics.transition_kernel(&state, Direction::Backward)?;
    let history = trajectory.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].step(), None);
    assert_eq!(history[0].logdet(), 0_f64);
    assert_abs_diff_eq!(history[0].energy(), dynamics.hamiltonian(&state)?, epsilon = EPSILON);
    let steps: Vec<_> = history.iter().skip(1).map(|record| record.step()).collect();
    assert_eq!(steps, vec![Some(2), Some(1), Some(0)]);
    assert_eq!(history[3].logdet(), trajectory.sumlogdet());
    assert_eq!(history[1].xeps(), Some(0.1_f64));

    let transition = dynamics.apply_transition(state.x(), 1_f64, &mut rng)?;
    assert_eq!(transition.metrics().history().len(), 4);

    let quiet = DynamicsConfig::new(GroupKind::U1, 4, 3, 0.1_f64)?;
    let dynamics = identity_dynamics(quiet)?;
    let (_, trajectory) = dynamics.transition_kernel(&state, Direction::Forward)?;
    assert!(trajectory.history().is_empty());
    Ok(())
}

#[test]
fn nan_is_rejected() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 4, 2, 0.1_f64)?;
    let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let potential = FnPotential::new(|_: &RVector| f64::NAN, |x: &RVector| RVector::zeros(x.len()));
    let dynamics = Dynamics::new(config, potential, networks, &mut rng)?;
    let x = DVector::from_element(4, 1_f64);
    for _ in 0_u32..5_u32 {
        let transition = dynamics.apply_transition(&x, 1_f64, &mut rng)?;
        assert_eq!(transition.metrics().acc(), 0_f64);
        assert!(!transition.metrics().acc_mask());
        assert_eq!(transition.metrics().sumlogdet(), 0_f64);
        assert_eq!(transition.x(), &x);
    }
    Ok(())
}

#[test]
fn batch_chains_are_independent() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::U1, 6, 3, 0.2_f64)?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let networks = affine_networks(&config, 12, &mut rng)?;
    let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;

    let x: Vec<RVector> = (0..3)
        .map(|_| dynamics.group().random(6, &mut rng))
        .collect::<Result<_, _>>()?;
    let beta = Beta::PerSample(vec![0.5_f64, 1_f64, 2_f64]);
    let mut rngs = chain_rngs(3, 3);
    let saved = rngs.clone();
    let batch = dynamics.apply_transition_batch(&x, &beta, &mut rngs)?;

    for (index, mut rng) in saved.into_iter().enumerate() {
        let single = dynamics.apply_transition(&x[index], beta.get(index).unwrap(), &mut rng)?;
        assert_eq!(&single, &batch.transitions()[index]);
        assert_eq!(rng.gen::<u64>(), rngs[index].gen::<u64>());
    }

    // the first two chains alone give the same result
    let mut rngs = chain_rngs(3, 2);
    let beta = Beta::PerSample(vec![0.5_f64, 1_f64]);
    let smaller = dynamics.apply_transition_batch(&x[..2], &beta, &mut rngs)?;
    assert_eq!(smaller.transitions(), &batch.transitions()[..2]);
    Ok(())
}

#[test]
fn hmc_acceptance_companion() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 4, 3, 0.3_f64)?.with_hmc_acceptance(true);
    let dynamics = identity_dynamics(config)?;
    let mut rngs = chain_rngs(SEED_RNG, 3);
    let x = vec![DVector::from_element(4, 1_f64); 3];

    let batch = dynamics.apply_transition_batch(&x, &Beta::Scalar(1_f64), &mut rngs)?;
    let acc = batch.metric("acc").unwrap();
    let acc_hmc = batch.metric("acc_hmc").unwrap();
    for (a, b) in acc.iter().zip(&acc_hmc) {
        assert_abs_diff_eq!(a, b, epsilon = EPSILON);
    }
    assert_eq!(batch.metrics().len(), 4);

    let batch = dynamics.apply_transition_batch(&x, &Beta::Scalar(2_f64), &mut rngs)?;
    for transition in batch.iter() {
        let states = transition.states();
        let dh = dynamics.hamiltonian(states.init())? - dynamics.hamiltonian(states.proposed())?;
        assert_abs_diff_eq!(
            transition.metrics().acc_hmc().unwrap(),
            (2_f64 * dh).min(0_f64).exp(),
            epsilon = EPSILON
        );
    }
    Ok(())
}

#[test]
fn forward_backward_variant() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::U1, 4, 2, 0.1_f64)?.with_merge_directions(true);
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let networks = affine_networks(&config, 8, &mut rng)?;
    let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;
    let x = dynamics.random_state(1_f64, &mut rng)?.into_x();
    for _ in 0_u32..10_u32 {
        let transition = dynamics.apply_transition(&x, 1_f64, &mut rng)?;
        let metrics = transition.metrics();
        assert_eq!(metrics.direction(), Direction::Forward);
        assert!((0_f64..=1_f64).contains(&metrics.acc()));
        if !metrics.acc_mask() {
            assert_eq!(metrics.sumlogdet(), 0_f64);
            assert_eq!(transition.x(), &x);
        }
    }
    Ok(())
}

#[test]
fn direction_bit() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 2, 1, 0.1_f64)?;
    let dynamics = identity_dynamics(config)?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let x = DVector::zeros(2);
    let mut forward = 0_u32;
    for _ in 0_u32..200_u32 {
        if dynamics.apply_transition(&x, 1_f64, &mut rng)?.metrics().direction() == Direction::Forward {
            forward += 1;
        }
    }
    assert!((60..140).contains(&forward));
    Ok(())
}

/// `S(U) = -sum_l Re Tr(C_l U_l)` with fixed complex sources `C_l`.
struct LinkAction {
    sources: Vec<CMatrix3>,
}

impl LinkAction {
    fn random(links: usize, rng: &mut StdRng) -> Self {
        Self {
            sources: (0..links).map(|_| random_matrix_3(rng)).collect(),
        }
    }
}

impl Potential for LinkAction {
    fn action(&self, x: &RVector) -> f64 {
        x.as_slice()
            .chunks_exact(MATRIX_REAL_SIZE)
            .zip(&self.sources)
            .map(|(link, source)| -(source * matrix_from_reals(link)).trace().re)
            .sum()
    }

    /// `dS/dw^a T^a = -P(i U C) / 2`, `P` being the projection on su(3).
    fn grad_action(&self, x: &RVector) -> RVector {
        let mut grad = RVector::zeros(x.len());
        for ((link, out), source) in x
            .as_slice()
            .chunks_exact(MATRIX_REAL_SIZE)
            .zip(grad.as_mut_slice().chunks_exact_mut(MATRIX_REAL_SIZE))
            .zip(&self.sources)
        {
            let m = matrix_from_reals(link) * source * I;
            matrix_to_reals(&(project_to_su3_lie(&m) * Complex::from(-0.5_f64)), out);
        }
        grad
    }
}

#[test]
fn link_action_lie_derivative() -> Result<(), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let group = Su3::new();
    let potential = LinkAction::random(2, &mut rng);
    let x = group.random(2 * MATRIX_REAL_SIZE, &mut rng)?;
    let grad = potential.grad_action(&x);
    let h = 1E-5_f64;
    for link in 0..2 {
        let derivative = Su3Adjoint::from_matrix(&matrix_from_reals(
            &grad.as_slice()[link * MATRIX_REAL_SIZE..(link + 1) * MATRIX_REAL_SIZE],
        ));
        for (a, generator) in GENERATORS.iter().enumerate() {
            let mut step = RVector::zeros(x.len());
            matrix_to_reals(
                &(*generator * Complex::from(h)),
                &mut step.as_mut_slice()[link * MATRIX_REAL_SIZE..(link + 1) * MATRIX_REAL_SIZE],
            );
            let plus = potential.action(&group.update_gauge(&x, &step)?);
            let minus = potential.action(&group.update_gauge(&x, &-step)?);
            assert_abs_diff_eq!(derivative[a], (plus - minus) / (2_f64 * h), epsilon = 1E-7_f64);
        }
    }
    Ok(())
}

#[test]
fn su3_hmc() -> Result<(), Box<dyn Error>> {
    let links = 2;
    let xdim = links * MATRIX_REAL_SIZE;
    let config = DynamicsConfig::new(GroupKind::Su3, xdim, 10, 0.05_f64)?;
    let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let potential = LinkAction::random(links, &mut rng);
    assert_eq!(
        Dynamics::new(config.clone(), Harmonic::new(0.1_f64), networks.clone(), &mut rng).unwrap_err(),
        ConfigError::NonInvertibleConfiguration(GroupKind::Su3)
    );

    let dynamics = Dynamics::new(config.with_hmc(true), potential, networks, &mut rng)?;

    // energy violation of leapfrog goes as eps^2 at fixed trajectory length
    let mut coarse = 0_f64;
    let mut fine = 0_f64;
    for _ in 0_u32..5_u32 {
        let state = dynamics.random_state(1_f64, &mut rng)?;
        let h_init = dynamics.hamiltonian(&state)?;
        let (a, _) = dynamics.transition_kernel_hmc(&state, Direction::Forward, Some(0.05_f64), Some(10))?;
        let (b, _) = dynamics.transition_kernel_hmc(&state, Direction::Forward, Some(0.025_f64), Some(20))?;
        coarse += (dynamics.hamiltonian(&a)? - h_init).abs();
        fine += (dynamics.hamiltonian(&b)? - h_init).abs();
        assert!(fine > 0_f64);

        let (dx, dv) = dynamics.test_reversibility(&state)?;
        assert!(dx < EPSILON, "dx = {dx}");
        assert!(dv < EPSILON, "dv = {dv}");
    }
    let ratio = coarse / fine;
    assert!((3_f64..5_f64).contains(&ratio), "ratio = {ratio}");
    assert!(coarse < 5E-2_f64, "coarse = {coarse}");

    let mut x = dynamics.random_state(1_f64, &mut rng)?.into_x();
    for _ in 0_u32..5_u32 {
        let transition = dynamics.apply_transition(&x, 1_f64, &mut rng)?;
        assert!(transition.metrics().acc() > 0.9_f64);
        assert_eq!(transition.metrics().sumlogdet(), 0_f64);
        x = transition.into_x();
        for link in x.as_slice().chunks(MATRIX_REAL_SIZE) {
            assert!(is_matrix_su3(&matrix_from_reals(link), 1E-8_f64));
        }
    }
    Ok(())
}

#[test]
fn hmc_overrides() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 4, 3, 0.1_f64)?;
    let dynamics = identity_dynamics(config)?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let x = DVector::from_element(4, 0.3_f64);

    let transition = dynamics.apply_transition_hmc(&x, 1_f64, Some(0.01_f64), Some(7), &mut rng)?;
    assert_eq!(transition.metrics().direction(), Direction::Forward);
    assert_eq!(
        dynamics.apply_transition_hmc(&x, 1_f64, Some(-1_f64), None, &mut rng),
        Err(DynamicsError::Config(ConfigError::NonPositiveStepSize(-1_f64)))
    );
    assert_eq!(
        dynamics.apply_transition_hmc(&x, 1_f64, None, Some(0), &mut rng),
        Err(DynamicsError::Config(ConfigError::ZeroLeapfrog))
    );
    Ok(())
}

#[test]
fn fixed_step_sizes() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 4, 3, 0.1_f64)?.with_eps_fixed(true);
    let mut dynamics = identity_dynamics(config.clone())?;
    assert!(dynamics.step_sizes().is_fixed());
    assert_eq!(
        dynamics.step_sizes_mut().set_xeps(0, 0.2_f64),
        Err(ConfigError::FixedStepSize)
    );
    assert_eq!(
        dynamics.step_sizes_mut().set_veps(2, 0.2_f64),
        Err(ConfigError::FixedStepSize)
    );
    assert_eq!(dynamics.step_sizes().get(0)?, (0.1_f64, 0.1_f64));

    let trainable = identity_dynamics(config.with_eps_fixed(false))?;
    assert!(!trainable.step_sizes().is_fixed());
    Ok(())
}

#[test]
fn shape_and_config_errors() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::Euclidean, 4, 3, 0.1_f64)?;
    let dynamics = identity_dynamics(config.clone())?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);

    match dynamics.apply_transition(&DVector::zeros(5), 1_f64, &mut rng) {
        Err(DynamicsError::Shape(error)) => assert_eq!(error.kind(), ShapeKind::Position),
        other => panic!("unexpected result {other:?}"),
    }
    let x = vec![DVector::zeros(4); 3];
    let mut rngs = chain_rngs(0, 2);
    match dynamics.apply_transition_batch(&x, &Beta::Scalar(1_f64), &mut rngs) {
        Err(DynamicsError::Shape(error)) => assert_eq!(error.kind(), ShapeKind::Rng),
        other => panic!("unexpected result {other:?}"),
    }
    let mut rngs = chain_rngs(0, 3);
    match dynamics.apply_transition_batch(&x, &Beta::PerSample(vec![1_f64; 2]), &mut rngs) {
        Err(DynamicsError::Shape(error)) => assert_eq!(error.kind(), ShapeKind::Beta),
        other => panic!("unexpected result {other:?}"),
    }
    let state = State::new(DVector::zeros(3), DVector::zeros(3), 1_f64)?;
    assert!(dynamics.transition_kernel(&state, Direction::Forward).is_err());

    let separate = config.clone().with_separate_networks(true);
    let shared = CouplingNetworks::shared(IdentityCoupling::new(), IdentityCoupling::new());
    assert!(matches!(
        Dynamics::new(separate, Harmonic::new(1_f64), shared, &mut rng),
        Err(ConfigError::NetworkCount { expected: 3, found: _ })
    ));
    let ncp = config.with_ncp(true);
    let networks = CouplingNetworks::build(&ncp, |_| IdentityCoupling::new());
    assert_eq!(
        Dynamics::new(ncp, Harmonic::new(1_f64), networks, &mut rng).unwrap_err(),
        ConfigError::NcpRequiresAngularGroup(GroupKind::Euclidean)
    );
    Ok(())
}

#[test]
fn sampler() -> Result<(), Box<dyn Error>> {
    let config = DynamicsConfig::new(GroupKind::U1, 4, 2, 0.2_f64)?;
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;
    let mut sampler = L2hmcSampler::new(dynamics, Beta::Scalar(1_f64), chain_rngs(SEED_RNG, 5))?;
    assert!(sampler.last_transition().is_none());
    assert!(sampler.prob_replace_last().is_empty());

    let mut x = sampler.random_positions()?;
    assert_eq!(x.len(), 5);
    for _ in 0_u32..5_u32 {
        x = sampler.next_element(x)?;
        assert_eq!(sampler.prob_replace_last().len(), 5);
        assert_eq!(sampler.has_replace_last().len(), 5);
        let accepted = sampler.has_replace_last().iter().filter(|el| **el).count();
        #[allow(clippy::cast_precision_loss)]
        let rate = accepted as f64 / 5_f64;
        assert_abs_diff_eq!(sampler.acceptance_rate_last(), rate, epsilon = EPSILON);
    }
    assert!(L2hmcSampler::new(
        sampler.dynamics().clone(),
        Beta::PerSample(vec![1_f64; 2]),
        chain_rngs(0, 3)
    )
    .is_err());
    Ok(())
}

#[cfg(feature = "serde-serialize")]
#[test]
fn persistence() -> Result<(), Box<dyn Error>> {
    use crate::dynamics::DynamicsParameters;
    use crate::error::PersistError;

    let config = DynamicsConfig::new(GroupKind::U1, 4, 3, 0.1_f64)?
        .with_ncp(true)
        .with_separate_networks(true)
        .with_split_xnets(true);
    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    let networks = affine_networks(&config, 8, &mut rng)?;
    let mut dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng)?;
    dynamics.step_sizes_mut().set_xeps(1, 0.05_f64)?;

    let mut buffer = Vec::new();
    dynamics.save_parameters(&mut buffer)?;
    let restored =
        Dynamics::<_, AffineCoupling>::load_parameters(&buffer[..], CosineAction::new())?;
    assert_eq!(restored.parameters(), dynamics.parameters());
    assert_eq!(restored.step_sizes().xeps(1), Some(0.05_f64));

    let x = dynamics.random_state(1_f64, &mut rng)?.into_x();
    let mut rng_a = StdRng::seed_from_u64(1);
    let mut rng_b = StdRng::seed_from_u64(1);
    assert_eq!(
        dynamics.apply_transition(&x, 1_f64, &mut rng_a)?,
        restored.apply_transition(&x, 1_f64, &mut rng_b)?
    );

    let truncated = DynamicsParameters::<AffineCoupling>::load(&buffer[..buffer.len() / 2]);
    assert!(matches!(truncated, Err(PersistError::Serialization(_))));

    // a mis-sized bias is refused when loading instead of failing inside the kernel
    if let Some(net) = dynamics.networks_mut().iter_mut().next() {
        net.biases_mut()[2] = RVector::zeros(5);
    }
    let mut buffer = Vec::new();
    dynamics.save_parameters(&mut buffer)?;
    let mismatch = DynamicsParameters::<AffineCoupling>::load(&buffer[..]);
    assert!(matches!(
        mismatch,
        Err(PersistError::Config(ConfigError::ParameterMismatch(error))) if error.kind() == ShapeKind::CouplingParameter
    ));
    assert_eq!(
        dynamics.apply_transition(&x, 1_f64, &mut rng_a),
        Err(DynamicsError::Shape(ShapeError::new(ShapeKind::CouplingParameter, 4, 5)))
    );
    Ok(())
}
