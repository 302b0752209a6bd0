// thermo.rs - Thermodynamic averages reweighted from a density of states

use std::fmt;

use rayon::prelude::*;
use tracing::warn;

use crate::config::{validate_temperature, EnergyAxis, BOLTZMANN_K, EXCHANGE_J};
use crate::error::{Result, SimError};
use crate::wang_landau::DensityOfStates;

/// Rescale a density of states so that Σ g = 2^M.
pub fn normalize(g: &[f64], sites: usize) -> Result<Vec<f64>> {
    if let Some((k, &v)) = g.iter().enumerate().find(|(_, v)| !(v.is_finite() && **v > 0.0)) {
        return Err(SimError::Numerical(format!("g[{k}] = {v} is not a positive finite number")));
    }
    let ln_g: Vec<f64> = g.iter().map(|v| v.ln()).collect();
    normalize_ln(&ln_g, sites)
}

/// Same as [`normalize`] for an input given as ln g.
pub fn normalize_ln(ln_g: &[f64], sites: usize) -> Result<Vec<f64>> {
    normalize_visited(ln_g, &vec![true; ln_g.len()], sites)
}

/// Rescale the visited part of ln g so that its Σ g = 2^M. Buckets outside
/// the support come back as 0. A visited bucket may underflow to 0 when its
/// ln g sits far below the largest one; only overflow is an error.
pub fn normalize_visited(ln_g: &[f64], visited: &[bool], sites: usize) -> Result<Vec<f64>> {
    if ln_g.len() != visited.len() {
        return Err(SimError::InvalidConfig(format!(
            "{} ln g entries but {} visited flags",
            ln_g.len(),
            visited.len()
        )));
    }
    let support = || ln_g.iter().zip(visited).filter(|(_, seen)| **seen).map(|(v, _)| *v);
    if let Some(v) = support().find(|v| !v.is_finite()) {
        return Err(SimError::Numerical(format!("ln g holds a non-finite entry {v}")));
    }
    let max = support().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(SimError::Numerical("density of states has no visited buckets".into()));
    }

    // ln Σ g over the support, shifted by the largest entry.
    let ln_sum = max + support().map(|v| (v - max).exp()).sum::<f64>().ln();
    let ln_total = sites as f64 * std::f64::consts::LN_2;

    let g_norm: Vec<f64> = ln_g
        .iter()
        .zip(visited)
        .map(|(&v, &seen)| if seen { (v - ln_sum + ln_total).exp() } else { 0.0 })
        .collect();
    if let Some((k, v)) = g_norm.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(SimError::Numerical(format!(
            "normalized g[{k}] = {v}: 2^{sites} microstates overflow f64"
        )));
    }
    Ok(g_norm)
}

/// Ensemble averages at one temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoProperties {
    pub temperature: f64,
    /// U = <E>.
    pub internal_energy: f64,
    pub mean_energy_sq: f64,
    /// C = (<E²> - U²) / T².
    pub specific_heat: f64,
    pub magnetization: f64,
}

/// The three results as display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermoReport {
    pub energy: String,
    pub magnetization: String,
    pub specific_heat: String,
}

impl ThermoProperties {
    pub fn report(&self) -> ThermoReport {
        ThermoReport {
            energy: format!("{:.6}", self.internal_energy),
            magnetization: format!("{:.6}", self.magnetization),
            specific_heat: format!("{:.6}", self.specific_heat),
        }
    }
}

impl fmt::Display for ThermoProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report();
        write!(
            f,
            "T = {} K: U = {}, M = {}, C = {}",
            self.temperature, r.energy, r.magnetization, r.specific_heat
        )
    }
}

/// Energy of bucket `k` on the chosen axis.
fn axis_energy(dos: &DensityOfStates, k: usize, axis: EnergyAxis) -> f64 {
    match axis {
        EnergyAxis::BucketIndex => k as f64,
        EnergyAxis::Physical => EXCHANGE_J * dos.bucket_energy(k) as f64,
    }
}

/// Boltzmann-reweight the normalized density of states at `temperature`.
///
/// Weights are gNorm[i] exp(-E_i / k_B T) over the visited buckets, summed
/// as they are without a max-exponent shift, so extreme temperatures
/// overflow or underflow. Both are reported as [`SimError::Numerical`].
pub fn compute_averages(
    dos: &DensityOfStates,
    temperature: f64,
    axis: EnergyAxis,
) -> Result<ThermoProperties> {
    validate_temperature(temperature)?;
    let g_norm = dos.normalized()?;
    let kt = BOLTZMANN_K * temperature;

    let mut z = 0.0;
    let mut sum_e = 0.0;
    let mut sum_e2 = 0.0;
    let mut sum_m = 0.0;
    let buckets = g_norm.iter().zip(dos.magnetization_samples()).zip(dos.visited());
    for (k, ((&g, m), &seen)) in buckets.enumerate() {
        if !seen {
            continue;
        }
        let e = axis_energy(dos, k, axis);
        let w = g * (-e / kt).exp();
        if !w.is_finite() {
            warn!(bucket = k, temperature, "Boltzmann weight overflowed");
            return Err(SimError::Numerical(format!(
                "weight of bucket {k} overflowed at T = {temperature} K"
            )));
        }
        z += w;
        sum_e += e * w;
        sum_e2 += e * e * w;
        sum_m += m.map_or(0.0, |m| m as f64) * w;
    }

    if !(z.is_finite() && z > 0.0) {
        warn!(temperature, z, "partition sum is not a positive finite number");
        return Err(SimError::Numerical(format!(
            "partition sum {z} at T = {temperature} K"
        )));
    }

    let internal_energy = sum_e / z;
    let mean_energy_sq = sum_e2 / z;
    let specific_heat = (mean_energy_sq - internal_energy * internal_energy)
        / (temperature * temperature);
    let magnetization = sum_m / z;

    let props = ThermoProperties {
        temperature,
        internal_energy,
        mean_energy_sq,
        specific_heat,
        magnetization,
    };
    if [internal_energy, mean_energy_sq, specific_heat, magnetization]
        .iter()
        .any(|v| !v.is_finite())
    {
        return Err(SimError::Numerical(format!("non-finite averages {props:?}")));
    }
    Ok(props)
}

/// [`compute_averages`] over a list of temperatures, in parallel.
pub fn sweep(
    dos: &DensityOfStates,
    temperatures: &[f64],
    axis: EnergyAxis,
) -> Vec<Result<ThermoProperties>> {
    temperatures
        .par_iter()
        .map(|&t| compute_averages(dos, t, axis))
        .collect()
}
