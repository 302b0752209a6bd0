// sampler.rs - Capability shared by the Metropolis and Wang-Landau samplers

use rand::Rng;

use crate::error::Result;
use crate::lattice::SpinCoordinates;
use crate::wang_landau::FlatnessReport;

/// Returned by every `step`, allows O(1) book-keeping in the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    pub accepted: bool,
    /// Flat index of the proposed site.
    pub site: usize,
    /// Energy change of the proposal in units of J (applied only if accepted).
    pub delta_energy: i64,
    /// Set on steps that ran a histogram flatness check.
    pub flatness: Option<FlatnessReport>,
}

/// A single-spin-flip Monte Carlo sampler owning one lattice.
pub trait LatticeSampler {
    /// Propose and accept or reject one spin flip.
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepInfo>;

    /// Steps taken since the lattice was initialized.
    fn steps(&self) -> u64;

    /// Current energy in units of J.
    fn energy(&self) -> i64;

    /// Current Σ s.
    fn magnetization(&self) -> i64;

    /// Number of spins.
    fn sites(&self) -> usize;

    /// Up/down partition of the current lattice; `time` is the snapshot
    /// index, used as the x axis where the lattice has no second dimension.
    fn coordinates(&self, time: usize) -> SpinCoordinates;
}
