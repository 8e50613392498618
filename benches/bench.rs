use criterion::{criterion_group, criterion_main, Criterion};
use lattice_l2hmc::{
    coupling::{AffineCoupling, CouplingNetworks, IdentityCoupling},
    dynamics::{Beta, Dynamics, DynamicsConfig},
    field::Su3Adjoint,
    group::GroupKind,
    potential::CosineAction,
    rng::chain_rngs,
    su3::su3_exp_i,
    Real,
};
use rand::SeedableRng;

fn matrix_exp_i(rng: &mut rand_xoshiro::Xoshiro256PlusPlus, d: &impl rand_distr::Distribution<Real>) {
    let _m = su3_exp_i(&Su3Adjoint::random(rng, d));
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(0);
    let d = rand::distributions::Uniform::from(-std::f64::consts::PI..std::f64::consts::PI);
    c.bench_function("matrix exp i", |b| b.iter(|| matrix_exp_i(&mut rng, &d)));

    let xdim = 64;
    let batch = 16;
    let config = DynamicsConfig::new(GroupKind::U1, xdim, 10, 0.05_f64)
        .unwrap()
        .with_ncp(true)
        .with_separate_networks(true);

    let networks = CouplingNetworks::build(&config, |_| IdentityCoupling::new());
    let dynamics = Dynamics::new(config.clone(), CosineAction::new(), networks, &mut rng).unwrap();
    let x = vec![nalgebra::DVector::zeros(xdim); batch];
    let mut rngs = chain_rngs(1, batch);
    c.bench_function("batched transition identity u1 64x16", |b| {
        b.iter(|| {
            dynamics
                .apply_transition_batch(&x, &Beta::Scalar(1_f64), &mut rngs)
                .unwrap()
        })
    });

    let mut networks =
        CouplingNetworks::build(&config, |_| AffineCoupling::zeros(2 * xdim, xdim, xdim));
    for net in networks.iter_mut() {
        *net = AffineCoupling::random(2 * xdim, xdim, xdim, 0.01_f64, &mut rng).unwrap();
    }
    let dynamics = Dynamics::new(config, CosineAction::new(), networks, &mut rng).unwrap();
    c.bench_function("batched transition affine u1 64x16", |b| {
        b.iter(|| {
            dynamics
                .apply_transition_batch(&x, &Beta::Scalar(1_f64), &mut rngs)
                .unwrap()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
