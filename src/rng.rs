//! Independent random number generators for the chains of a batch.
//!
//! Each chain owns its generator, see [`crate::dynamics::Dynamics::apply_transition_batch`].
//! The streams are obtained with [`Xoshiro256PlusPlus::jump`], each jump advancing the state by
//! `2^128` draws, so the streams never overlap in practice.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Create `n` generators: the first is seeded with `seed`, each following one is the previous
/// one jumped.
///
/// # Example
/// ```
/// use lattice_l2hmc::rng::chain_rngs;
/// use rand::Rng;
///
/// let mut rngs = chain_rngs(42, 3);
/// assert_eq!(rngs.len(), 3);
/// let draws: Vec<u64> = rngs.iter_mut().map(|rng| rng.gen()).collect();
/// assert_ne!(draws[0], draws[1]);
/// // reproducible
/// let mut again = chain_rngs(42, 3);
/// assert_eq!(again[2].gen::<u64>(), draws[2]);
/// ```
#[must_use]
pub fn chain_rngs(seed: u64, n: usize) -> Vec<Xoshiro256PlusPlus> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..n).map(|_| fork_rng(&mut rng)).collect()
}

/// Return a copy of `rng` and jump `rng` ahead, the two streams are independent.
#[must_use]
pub fn fork_rng(rng: &mut Xoshiro256PlusPlus) -> Xoshiro256PlusPlus {
    let fork = rng.clone();
    rng.jump();
    fork
}
