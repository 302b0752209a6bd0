// config.rs - Run parameters and physical constants

use std::str::FromStr;

use clap::ValueEnum;

use crate::error::{Result, SimError};

/// Exchange energy J in units of 1e-21 J.
pub const EXCHANGE_J: f64 = 1.0;

/// Boltzmann constant in units of 1e-21 J/K.
pub const BOLTZMANN_K: f64 = 0.01380649;

/// How the lattice is populated before the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StartMode {
    /// Every spin up.
    Cold,
    /// Every spin independently up or down with equal probability.
    #[default]
    Hot,
}

impl FromStr for StartMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cold" => Ok(Self::Cold),
            "hot" => Ok(Self::Hot),
            other => Err(SimError::InvalidConfig(format!(
                "unknown start mode '{other}', expected 'cold' or 'hot'"
            ))),
        }
    }
}

/// Which sampler drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Algorithm {
    /// Canonical single-spin-flip sampling on a periodic chain.
    Metropolis,
    /// Density-of-states estimation on a periodic square grid.
    #[default]
    WangLandau,
}

impl FromStr for Algorithm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metropolis" => Ok(Self::Metropolis),
            "wang-landau" | "wang_landau" | "wanglandau" => Ok(Self::WangLandau),
            other => Err(SimError::InvalidConfig(format!(
                "unknown algorithm '{other}', expected 'metropolis' or 'wang-landau'"
            ))),
        }
    }
}

/// Energy assigned to bucket `k` when reweighting the density of states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyAxis {
    /// The bucket index itself stands in for the energy.
    #[default]
    BucketIndex,
    /// E = J (4k - 2M).
    Physical,
}

/// Run-time configuration (single source of truth).
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub algorithm: Algorithm,
    /// Chain length (Metropolis) or grid side (Wang-Landau).
    pub side_length: usize,
    /// Kelvin.
    pub temperature: f64,
    /// Run stops once |f - 1| <= tolerance.
    pub tolerance: f64,
    pub start_mode: StartMode,
    /// Metropolis steps per run.
    pub iterations: usize,
    pub initial_factor: f64,
    /// Histogram counts as flat when (Hmax - Hmin) / (Hmax + Hmin) is below this.
    pub flatness_threshold: f64,
    /// Steps between flatness checks.
    pub flatness_interval: u64,
    /// Wang-Landau step cap; `None` runs until converged.
    pub max_steps: Option<u64>,
    pub energy_axis: EnergyAxis,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            algorithm:          Algorithm::WangLandau,
            side_length:        20,
            temperature:        273.15,
            tolerance:          1.0e-8,
            start_mode:         StartMode::Hot,
            iterations:         1000,
            initial_factor:     std::f64::consts::E,
            flatness_threshold: 0.2,
            flatness_interval:  10_000,
            max_steps:          None,
            energy_axis:        EnergyAxis::BucketIndex,
        }
    }
}

impl SimConfig {
    /// Check every field the samplers rely on.
    pub fn validate(&self) -> Result<()> {
        if self.side_length == 0 {
            return Err(invalid("side length must be a positive integer"));
        }
        validate_temperature(self.temperature)?;
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if self.algorithm == Algorithm::Metropolis && self.iterations == 0 {
            return Err(invalid("iteration count must be at least 1"));
        }
        if !(self.initial_factor.is_finite() && self.initial_factor > 1.0) {
            return Err(invalid(format!(
                "initial modification factor must exceed 1, got {}",
                self.initial_factor
            )));
        }
        if !(self.flatness_threshold > 0.0 && self.flatness_threshold < 1.0) {
            return Err(invalid(format!(
                "flatness threshold must lie in (0, 1), got {}",
                self.flatness_threshold
            )));
        }
        if self.flatness_interval == 0 {
            return Err(invalid("flatness check interval must be at least 1"));
        }
        if self.max_steps == Some(0) {
            return Err(invalid("step cap must be at least 1 when given"));
        }
        if self.algorithm == Algorithm::WangLandau
            && self.side_length.checked_mul(self.side_length).is_none()
        {
            return Err(invalid("side length too large for an N x N grid"));
        }
        Ok(())
    }
}

pub(crate) fn validate_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!(
            "temperature must be a positive number of kelvin, got {temperature}"
        )))
    }
}

fn invalid(msg: impl Into<String>) -> SimError {
    SimError::InvalidConfig(msg.into())
}
