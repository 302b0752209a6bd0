// metropolis.rs - Canonical single-spin-flip sampling on a periodic chain

use rand::Rng;
use tracing::trace;

use crate::config::{validate_temperature, BOLTZMANN_K, EXCHANGE_J};
use crate::energy::chain_energy;
use crate::error::{Result, SimError};
use crate::lattice::{SpinChain, SpinCoordinates};
use crate::sampler::{LatticeSampler, StepInfo};

/// Fixed-temperature sampler for a 1-D ring.
#[derive(Debug, Clone)]
pub struct MetropolisSampler {
    chain: SpinChain,
    temperature: f64,
    steps: u64,
    accepted: u64,
}

impl MetropolisSampler {
    pub fn new(chain: SpinChain, temperature: f64) -> Result<Self> {
        validate_temperature(temperature)?;
        if chain.is_empty() {
            return Err(SimError::InvalidConfig("chain must hold at least one spin".into()));
        }
        Ok(Self {
            chain,
            temperature,
            steps: 0,
            accepted: 0,
        })
    }

    pub fn chain(&self) -> &SpinChain {
        &self.chain
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        validate_temperature(temperature)?;
        self.temperature = temperature;
        Ok(())
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.accepted as f64 / self.steps as f64
        }
    }

    /// R = exp(-ΔE / k_B T) for a physical energy change.
    #[inline]
    fn boltzmann_ratio(&self, delta_e: f64) -> f64 {
        (-delta_e / (BOLTZMANN_K * self.temperature)).exp()
    }
}

impl LatticeSampler for MetropolisSampler {
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepInfo> {
        self.steps += 1;
        let site = rng.gen_range(0..self.chain.len());

        // Flip in place, recompute from scratch, revert on rejection.
        let e_before = chain_energy(&self.chain);
        self.chain.flip(site);
        let e_after = chain_energy(&self.chain);
        let delta = e_after - e_before;

        let accept = if delta <= 0 {
            true
        } else {
            let ratio = self.boltzmann_ratio(EXCHANGE_J * delta as f64);
            let r: f64 = rng.gen();
            ratio >= r
        };

        if accept {
            self.accepted += 1;
        } else {
            self.chain.flip(site);
        }
        trace!(site, delta, accept, "metropolis step");

        Ok(StepInfo {
            accepted: accept,
            site,
            delta_energy: delta,
            flatness: None,
        })
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn energy(&self) -> i64 {
        chain_energy(&self.chain)
    }

    fn magnetization(&self) -> i64 {
        self.chain.magnetization()
    }

    fn sites(&self) -> usize {
        self.chain.len()
    }

    fn coordinates(&self, time: usize) -> SpinCoordinates {
        self.chain.coordinates_by_sign(time)
    }
}
