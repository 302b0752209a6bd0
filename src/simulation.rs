// simulation.rs - Drives either sampler and collects coordinate snapshots
//
// A `Simulation` owns the configuration, one seedable RNG and at most one
// sampler. No sampler means no lattice: the first `iterate` or `run`
// initializes one, `reset` (or a side-length change) drops it again.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use tracing::{info, warn};

use crate::config::{Algorithm, SimConfig};
use crate::error::{Result, SimError};
use crate::lattice::{SpinChain, SpinCoordinates, SpinGrid};
use crate::metropolis::MetropolisSampler;
use crate::sampler::{LatticeSampler, StepInfo};
use crate::thermo::{compute_averages, ThermoProperties, ThermoReport};
use crate::utils::rng::stream_rng;
use crate::wang_landau::{DensityOfStates, WangLandauParams, WangLandauSampler};

/// The sampler selected by [`Algorithm`].
#[derive(Debug, Clone)]
pub enum Sampler {
    Metropolis(MetropolisSampler),
    WangLandau(WangLandauSampler),
}

impl LatticeSampler for Sampler {
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepInfo> {
        match self {
            Sampler::Metropolis(s) => s.step(rng),
            Sampler::WangLandau(s) => s.step(rng),
        }
    }

    fn steps(&self) -> u64 {
        match self {
            Sampler::Metropolis(s) => s.steps(),
            Sampler::WangLandau(s) => s.steps(),
        }
    }

    fn energy(&self) -> i64 {
        match self {
            Sampler::Metropolis(s) => s.energy(),
            Sampler::WangLandau(s) => s.energy(),
        }
    }

    fn magnetization(&self) -> i64 {
        match self {
            Sampler::Metropolis(s) => s.magnetization(),
            Sampler::WangLandau(s) => s.magnetization(),
        }
    }

    fn sites(&self) -> usize {
        match self {
            Sampler::Metropolis(s) => s.sites(),
            Sampler::WangLandau(s) => s.sites(),
        }
    }

    fn coordinates(&self, time: usize) -> SpinCoordinates {
        match self {
            Sampler::Metropolis(s) => s.coordinates(time),
            Sampler::WangLandau(s) => s.coordinates(time),
        }
    }
}

/// One captured lattice picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Sampler step count when captured.
    pub step: u64,
    pub coordinates: SpinCoordinates,
}

/// Passed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub step: u64,
    pub energy: i64,
    pub info: StepInfo,
}

/// What a completed `run` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub algorithm: Algorithm,
    pub steps: u64,
    pub energy: i64,
    pub magnetization: i64,
    /// Metropolis only.
    pub acceptance_rate: Option<f64>,
    /// Wang-Landau only.
    pub modification_factor: Option<f64>,
    pub flat_events: Option<u32>,
}

/// Owned simulation state with an explicit step / run API.
#[derive(Debug)]
pub struct Simulation<R = ChaCha20Rng> {
    config: SimConfig,
    rng: R,
    sampler: Option<Sampler>,
    snapshots: Vec<Snapshot>,
}

impl Simulation<ChaCha20Rng> {
    /// Reproducible simulation driven by a ChaCha20 stream.
    pub fn seeded(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new(config, stream_rng(seed, 0))
    }
}

impl<R: Rng> Simulation<R> {
    /// Validate `config`; no lattice is allocated yet.
    pub fn new(config: SimConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            sampler: None,
            snapshots: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// `None` until the lattice has been initialized.
    pub fn sampler(&self) -> Option<&Sampler> {
        self.sampler.as_ref()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn take_snapshots(&mut self) -> Vec<Snapshot> {
        std::mem::take(&mut self.snapshots)
    }

    /// Drop the lattice, g, h, energy, factor and captured snapshots.
    pub fn reset(&mut self) {
        if self.sampler.take().is_some() {
            info!("lattice cleared");
        }
        self.snapshots.clear();
    }

    /// Change N; the lattice is cleared only if N actually changed.
    pub fn set_side_length(&mut self, side_length: usize) -> Result<()> {
        let cfg = SimConfig { side_length, ..self.config.clone() };
        cfg.validate()?;
        if side_length != self.config.side_length {
            self.config = cfg;
            self.reset();
        }
        Ok(())
    }

    /// Applies to the next Metropolis step and to property evaluation.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        let cfg = SimConfig { temperature, ..self.config.clone() };
        cfg.validate()?;
        if let Some(Sampler::Metropolis(s)) = self.sampler.as_mut() {
            s.set_temperature(temperature)?;
        }
        self.config = cfg;
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        let cfg = &self.config;
        let sampler = match cfg.algorithm {
            Algorithm::Metropolis => {
                let chain = SpinChain::new(cfg.side_length, cfg.start_mode, &mut self.rng);
                Sampler::Metropolis(MetropolisSampler::new(chain, cfg.temperature)?)
            }
            Algorithm::WangLandau => {
                let grid = SpinGrid::new(cfg.side_length, cfg.start_mode, &mut self.rng);
                Sampler::WangLandau(WangLandauSampler::new(grid, WangLandauParams::from(cfg))?)
            }
        };
        info!(
            algorithm = ?cfg.algorithm,
            side = cfg.side_length,
            start = ?cfg.start_mode,
            "lattice initialized"
        );
        self.sampler = Some(sampler);
        Ok(())
    }

    fn capture(&mut self, time: usize) {
        if let Some(s) = &self.sampler {
            self.snapshots.push(Snapshot {
                step: s.steps(),
                coordinates: s.coordinates(time),
            });
        }
    }

    /// One step, initializing the lattice first if there is none.
    pub fn iterate(&mut self) -> Result<&Snapshot> {
        if self.sampler.is_none() {
            self.initialize()?;
            self.capture(0);
        }
        let Self { sampler, rng, .. } = &mut *self;
        let sampler = sampler
            .as_mut()
            .ok_or(SimError::InvalidState("no lattice has been initialized"))?;
        sampler.step(rng)?;
        let time = sampler.steps() as usize;
        self.capture(time);
        self.snapshots
            .last()
            .ok_or(SimError::InvalidState("no snapshot captured"))
    }

    /// Run to completion without progress reporting.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_with_progress(|_| {})
    }

    /// Metropolis: continues from the current chain if `iterate` already
    /// built one. Snapshots are tagged with the sampler's step count, so the
    /// first one shows the chain the run starts from (time 0 on a fresh
    /// lattice) followed by one per step for `iterations` steps. Wang-Landau: step until |f - 1| <= tol (or the step cap), then
    /// one final snapshot. The callback fires after every Metropolis step and
    /// after every Wang-Landau flatness check.
    pub fn run_with_progress<F>(&mut self, mut progress: F) -> Result<RunSummary>
    where
        F: FnMut(&Progress),
    {
        self.snapshots.clear();
        match self.config.algorithm {
            Algorithm::Metropolis => self.run_metropolis(&mut progress),
            Algorithm::WangLandau => self.run_wang_landau(&mut progress),
        }
    }

    fn run_metropolis(&mut self, progress: &mut dyn FnMut(&Progress)) -> Result<RunSummary> {
        if self.sampler.is_none() {
            self.initialize()?;
        }
        let start = self.sampler.as_ref().map_or(0, |s| s.steps() as usize);
        self.capture(start);
        let iterations = self.config.iterations;
        info!(iterations, start, temperature = self.config.temperature, "Metropolis run started");

        for time in start + 1..=start + iterations {
            let Self { sampler, rng, .. } = &mut *self;
            let sampler = sampler
                .as_mut()
                .ok_or(SimError::InvalidState("no lattice has been initialized"))?;
            let info = sampler.step(rng)?;
            progress(&Progress {
                step: sampler.steps(),
                energy: sampler.energy(),
                info,
            });
            self.capture(time);
        }

        let summary = self.summary()?;
        info!(?summary, "Metropolis run finished");
        Ok(summary)
    }

    fn run_wang_landau(&mut self, progress: &mut dyn FnMut(&Progress)) -> Result<RunSummary> {
        let converged = matches!(&self.sampler, Some(Sampler::WangLandau(s)) if s.is_converged());
        if self.sampler.is_none() || converged {
            self.initialize()?;
        }
        let cap = self.config.max_steps;
        info!(tolerance = self.config.tolerance, ?cap, "Wang-Landau run started");

        let Self { sampler, rng, .. } = &mut *self;
        let wl = match sampler.as_mut() {
            Some(Sampler::WangLandau(wl)) => wl,
            _ => return Err(SimError::InvalidState("lattice was not set up for Wang-Landau")),
        };

        while !wl.is_converged() {
            if let Some(cap) = cap {
                if wl.steps() >= cap {
                    let factor = wl.modification_factor();
                    warn!(steps = wl.steps(), factor, "step cap reached before convergence");
                    return Err(SimError::NotConverged { steps: wl.steps(), factor });
                }
            }
            let info = wl.step(rng)?;
            if info.flatness.is_some() {
                progress(&Progress {
                    step: wl.steps(),
                    energy: wl.energy(),
                    info,
                });
            }
        }

        let time = wl.steps() as usize;
        self.capture(time);
        let summary = self.summary()?;
        info!(?summary, "Wang-Landau run converged");
        Ok(summary)
    }

    fn summary(&self) -> Result<RunSummary> {
        let sampler = self
            .sampler
            .as_ref()
            .ok_or(SimError::InvalidState("no lattice has been initialized"))?;
        let (acceptance_rate, modification_factor, flat_events) = match sampler {
            Sampler::Metropolis(s) => (Some(s.acceptance_rate()), None, None),
            Sampler::WangLandau(s) => (None, Some(s.modification_factor()), Some(s.flat_events())),
        };
        Ok(RunSummary {
            algorithm: self.config.algorithm,
            steps: sampler.steps(),
            energy: sampler.energy(),
            magnetization: sampler.magnetization(),
            acceptance_rate,
            modification_factor,
            flat_events,
        })
    }

    /// Density of states of a converged Wang-Landau run.
    pub fn density_of_states(&self) -> Result<DensityOfStates> {
        match &self.sampler {
            Some(Sampler::WangLandau(wl)) if wl.is_converged() => Ok(wl.density_of_states()),
            Some(Sampler::WangLandau(_)) => {
                Err(SimError::InvalidState("Wang-Landau run has not converged yet"))
            }
            _ => Err(SimError::InvalidState("no Wang-Landau density of states available")),
        }
    }

    /// Averages at the configured temperature.
    pub fn properties(&self) -> Result<ThermoProperties> {
        self.properties_at(self.config.temperature)
    }

    pub fn properties_at(&self, temperature: f64) -> Result<ThermoProperties> {
        let dos = self.density_of_states()?;
        compute_averages(&dos, temperature, self.config.energy_axis)
    }

    /// Energy, magnetization and specific heat as display strings.
    pub fn recompute_properties(&self) -> Result<ThermoReport> {
        Ok(self.properties()?.report())
    }
}
