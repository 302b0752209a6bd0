// wang_landau.rs - Density-of-states estimation on a periodic square grid
//
// Bucket k holds energy E = 4k - 2M (units of J), k in 0..=M. g is kept as
// ln g so that multiplying by the modification factor f is adding ln f.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::energy::{grid_energy, grid_energy_delta};
use crate::error::{Result, SimError};
use crate::lattice::{SpinCoordinates, SpinGrid};
use crate::sampler::{LatticeSampler, StepInfo};
use crate::thermo::normalize_visited;

/// Knobs of the flatness control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WangLandauParams {
    pub initial_factor: f64,
    pub tolerance: f64,
    pub flatness_threshold: f64,
    pub flatness_interval: u64,
}

impl Default for WangLandauParams {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

impl From<&SimConfig> for WangLandauParams {
    fn from(cfg: &SimConfig) -> Self {
        Self {
            initial_factor: cfg.initial_factor,
            tolerance: cfg.tolerance,
            flatness_threshold: cfg.flatness_threshold,
            flatness_interval: cfg.flatness_interval,
        }
    }
}

impl WangLandauParams {
    fn validate(&self) -> Result<()> {
        let cfg = SimConfig {
            initial_factor: self.initial_factor,
            tolerance: self.tolerance,
            flatness_threshold: self.flatness_threshold,
            flatness_interval: self.flatness_interval,
            ..SimConfig::default()
        };
        cfg.validate()
    }
}

/// Outcome of one histogram flatness check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatnessReport {
    /// Step count at which the check ran.
    pub step: u64,
    /// Smallest and largest non-zero bucket counts.
    pub h_min: u64,
    pub h_max: u64,
    /// (Hmax - Hmin) / (Hmax + Hmin).
    pub hist_percent: f64,
    pub flat: bool,
    /// Modification factor after the check.
    pub factor: f64,
}

/// Converged (or in-progress) estimate handed to the post-processor.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityOfStates {
    sites: usize,
    ln_g: Vec<f64>,
    magnetization: Vec<Option<i64>>,
    visited: Vec<bool>,
}

impl DensityOfStates {
    /// Every bucket counts as visited. `ln_g` and `magnetization` must both
    /// hold `sites + 1` buckets.
    pub fn new(sites: usize, ln_g: Vec<f64>, magnetization: Vec<Option<i64>>) -> Result<Self> {
        let visited = vec![true; ln_g.len()];
        Self::with_visited(sites, ln_g, magnetization, visited)
    }

    /// Buckets with `visited[k] == false` lie outside the support: they get
    /// gNorm = 0 and take no part in the averages.
    pub fn with_visited(
        sites: usize,
        ln_g: Vec<f64>,
        magnetization: Vec<Option<i64>>,
        visited: Vec<bool>,
    ) -> Result<Self> {
        if ln_g.len() != sites + 1 || magnetization.len() != sites + 1 || visited.len() != sites + 1 {
            return Err(SimError::InvalidConfig(format!(
                "expected {} energy buckets for {} sites, got {} ln g, {} magnetization and {} visited entries",
                sites + 1,
                sites,
                ln_g.len(),
                magnetization.len(),
                visited.len()
            )));
        }
        Ok(Self { sites, ln_g, magnetization, visited })
    }

    /// M, the number of spins.
    pub fn sites(&self) -> usize {
        self.sites
    }

    pub fn buckets(&self) -> usize {
        self.ln_g.len()
    }

    pub fn ln_g(&self) -> &[f64] {
        &self.ln_g
    }

    /// Magnetization of the lattice when each bucket was first visited.
    pub fn magnetization_samples(&self) -> &[Option<i64>] {
        &self.magnetization
    }

    /// Whether the walk ever landed in each bucket.
    pub fn visited(&self) -> &[bool] {
        &self.visited
    }

    /// gNorm over the visited buckets, zero elsewhere.
    pub fn normalized(&self) -> Result<Vec<f64>> {
        normalize_visited(&self.ln_g, &self.visited, self.sites)
    }

    /// E = 4k - 2M in units of J.
    pub fn bucket_energy(&self, k: usize) -> i64 {
        4 * k as i64 - 2 * self.sites as i64
    }
}

/// Wang-Landau random walk in energy space.
#[derive(Debug, Clone)]
pub struct WangLandauSampler {
    grid: SpinGrid,
    params: WangLandauParams,
    ln_g: Vec<f64>,
    hist: Vec<u64>,
    mag_samples: Vec<Option<i64>>,
    energy: i64,
    magnetization: i64,
    ln_f: f64,
    steps: u64,
    flat_events: u32,
}

impl WangLandauSampler {
    /// Start a run on an initialized grid: g = 1, h = 0, f = initial factor,
    /// E = energy of `grid` (−2M for a cold start).
    pub fn new(grid: SpinGrid, params: WangLandauParams) -> Result<Self> {
        params.validate()?;
        let m = grid.sites();
        if m == 0 {
            return Err(SimError::InvalidConfig("grid must hold at least one spin".into()));
        }

        let energy = grid_energy(&grid);
        let magnetization = grid.magnetization();
        let sampler = Self {
            grid,
            params,
            ln_g: vec![0.0; m + 1],
            hist: vec![0; m + 1],
            mag_samples: vec![None; m + 1],
            energy,
            magnetization,
            ln_f: params.initial_factor.ln(),
            steps: 0,
            flat_events: 0,
        };
        sampler.bucket(energy)?;
        info!(
            side = sampler.grid.side(),
            energy,
            factor = params.initial_factor,
            tolerance = params.tolerance,
            "Wang-Landau run initialized"
        );
        Ok(sampler)
    }

    /// k = (E + 2M) / 4.
    fn bucket(&self, energy: i64) -> Result<usize> {
        let m = self.grid.sites() as i64;
        let shifted = energy + 2 * m;
        if shifted < 0 || shifted % 4 != 0 || shifted / 4 > m {
            return Err(SimError::Numerical(format!(
                "energy {energy} does not map onto a bucket in [-{0}, {0}]",
                2 * m
            )));
        }
        Ok((shifted / 4) as usize)
    }

    /// Scan non-zero buckets; shrink f and clear h when flat.
    fn check_flatness(&mut self) -> FlatnessReport {
        let mut h_min = u64::MAX;
        let mut h_max = 0u64;
        for &h in self.hist.iter().filter(|&&h| h > 0) {
            h_min = h_min.min(h);
            h_max = h_max.max(h);
        }

        let hist_percent = if h_max == 0 {
            h_min = 0;
            1.0
        } else {
            (h_max - h_min) as f64 / (h_max + h_min) as f64
        };
        let flat = hist_percent < self.params.flatness_threshold;

        if flat {
            self.ln_f *= 0.5;
            self.hist.fill(0);
            self.flat_events += 1;
            info!(
                step = self.steps,
                factor = self.modification_factor(),
                hist_percent,
                "histogram flat, modification factor reduced"
            );
        } else {
            debug!(step = self.steps, hist_percent, h_min, h_max, "histogram not yet flat");
        }

        FlatnessReport {
            step: self.steps,
            h_min,
            h_max,
            hist_percent,
            flat,
            factor: self.modification_factor(),
        }
    }

    pub fn grid(&self) -> &SpinGrid {
        &self.grid
    }

    pub fn params(&self) -> &WangLandauParams {
        &self.params
    }

    /// Current f.
    pub fn modification_factor(&self) -> f64 {
        self.ln_f.exp()
    }

    pub fn ln_factor(&self) -> f64 {
        self.ln_f
    }

    /// |f - 1| <= tol.
    pub fn is_converged(&self) -> bool {
        self.ln_f.exp_m1().abs() <= self.params.tolerance
    }

    /// Number of flatness checks that found the histogram flat.
    pub fn flat_events(&self) -> u32 {
        self.flat_events
    }

    pub fn histogram(&self) -> &[u64] {
        &self.hist
    }

    pub fn ln_g(&self) -> &[f64] {
        &self.ln_g
    }

    /// Bucket of the current energy.
    pub fn active_bucket(&self) -> Result<usize> {
        self.bucket(self.energy)
    }

    pub fn density_of_states(&self) -> DensityOfStates {
        DensityOfStates {
            sites: self.grid.sites(),
            ln_g: self.ln_g.clone(),
            magnetization: self.mag_samples.clone(),
            visited: self.mag_samples.iter().map(Option::is_some).collect(),
        }
    }
}

impl LatticeSampler for WangLandauSampler {
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepInfo> {
        let site = rng.gen_range(0..self.grid.sites());
        let (row, col) = self.grid.position(site);

        let delta = grid_energy_delta(&self.grid, row, col);
        let current = self.bucket(self.energy)?;
        let trial = self.bucket(self.energy + delta)?;

        // min(1, g[k] / g[k']).
        let log_ratio = self.ln_g[current] - self.ln_g[trial];
        let accept = log_ratio >= 0.0 || log_ratio.exp() >= rng.gen::<f64>();

        let active = if accept { trial } else { current };
        let updated = self.ln_g[active] + self.ln_f;
        if !updated.is_finite() {
            warn!(bucket = active, ln_g = updated, "density of states left the finite range");
            return Err(SimError::Numerical(format!(
                "ln g[{active}] became {updated} at step {}",
                self.steps + 1
            )));
        }

        self.steps += 1;
        if accept {
            let old = i64::from(self.grid.spin(row, col));
            self.grid.flip(row, col);
            self.energy += delta;
            self.magnetization -= 2 * old;
        }

        self.ln_g[active] = updated;
        self.hist[active] += 1;
        if self.mag_samples[active].is_none() {
            self.mag_samples[active] = Some(self.magnetization);
        }

        let flatness = if self.steps % self.params.flatness_interval == 0 {
            Some(self.check_flatness())
        } else {
            None
        };

        Ok(StepInfo {
            accepted: accept,
            site,
            delta_energy: delta,
            flatness,
        })
    }

    fn steps(&self) -> u64 {
        self.steps
    }

    fn energy(&self) -> i64 {
        self.energy
    }

    fn magnetization(&self) -> i64 {
        self.magnetization
    }

    fn sites(&self) -> usize {
        self.grid.sites()
    }

    fn coordinates(&self, _time: usize) -> SpinCoordinates {
        self.grid.coordinates_by_sign()
    }
}
