//! Metropolis acceptance behaviour at the temperature extremes.

use ising::config::StartMode;
use ising::energy::chain_energy;
use ising::lattice::SpinChain;
use ising::metropolis::MetropolisSampler;
use ising::sampler::{LatticeSampler, StepInfo};
use ising::SimError;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn test_near_zero_temperature_rejects_uphill_moves() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xDEADBEEF);
    let chain = SpinChain::new(2, StartMode::Cold, &mut rng);
    let mut sampler = MetropolisSampler::new(chain, 1.0e-9).unwrap();

    for _ in 0..100 {
        let StepInfo { accepted, delta_energy, .. } = sampler.step(&mut rng).unwrap();
        if accepted {
            assert!(delta_energy <= 0, "accepted an unfavourable flip ΔE = {delta_energy}");
        }
    }
    // Every flip out of the ground state costs energy, so nothing moved.
    assert_eq!(sampler.accepted(), 0);
    assert_eq!(sampler.magnetization(), 2);
    assert_eq!(sampler.steps(), 100);
}

#[test]
fn test_high_temperature_accepts_almost_everything() {
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let chain = SpinChain::new(64, StartMode::Hot, &mut rng);
    let mut sampler = MetropolisSampler::new(chain, 1.0e9).unwrap();
    for _ in 0..2_000 {
        sampler.step(&mut rng).unwrap();
    }
    let rate = sampler.acceptance_rate();
    assert!(rate > 0.95, "acceptance rate {rate:.3} too low at very high T");
}

#[test]
fn test_rejected_step_leaves_chain_untouched() {
    let mut rng = ChaCha20Rng::seed_from_u64(17);
    let chain = SpinChain::new(10, StartMode::Cold, &mut rng);
    let mut sampler = MetropolisSampler::new(chain.clone(), 1.0e-9).unwrap();
    for _ in 0..50 {
        let info = sampler.step(&mut rng).unwrap();
        assert!(!info.accepted);
        assert_eq!(sampler.chain(), &chain);
    }
}

#[test]
fn test_energy_tracks_chain() {
    let mut rng = ChaCha20Rng::seed_from_u64(23);
    let chain = SpinChain::new(30, StartMode::Hot, &mut rng);
    let mut sampler = MetropolisSampler::new(chain, 150.0).unwrap();
    let mut energy = sampler.energy();
    for _ in 0..1_000 {
        let info = sampler.step(&mut rng).unwrap();
        if info.accepted {
            energy += info.delta_energy;
        }
        assert_eq!(energy, chain_energy(sampler.chain()));
    }
}

#[test]
fn test_rejects_non_positive_temperature() {
    let chain = SpinChain::from_spins(vec![1, 1, 1]);
    assert!(matches!(
        MetropolisSampler::new(chain.clone(), 0.0),
        Err(SimError::InvalidConfig(_))
    ));
    assert!(matches!(
        MetropolisSampler::new(chain, f64::NAN),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn test_rejects_empty_chain() {
    let chain = SpinChain::from_spins(Vec::new());
    assert!(MetropolisSampler::new(chain, 10.0).is_err());
}
