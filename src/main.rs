//! Command-line driver for the Metropolis and Wang-Landau samplers.
//!
//! Run:  `cargo run --release -- wang-landau --side 8 --tolerance 1e-6`

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use csv::WriterBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use ising::config::{Algorithm, EnergyAxis, SimConfig, StartMode};
use ising::lattice::Spin;
use ising::simulation::{Sampler, Simulation};
use ising::thermo;
use ising::utils::rng::run_rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ising", version, about = "Monte Carlo sampling of the Ising model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fixed-temperature sampling of a periodic chain.
    Metropolis {
        #[command(flatten)]
        common: CommonArgs,
        /// Number of single-spin-flip steps.
        #[arg(long, default_value_t = 1000)]
        iterations: usize,
    },
    /// Estimate the density of states of an N x N grid, then report U, M and C.
    WangLandau(WangLandauArgs),
    /// Wang-Landau run followed by a temperature sweep written to CSV.
    Sweep {
        #[command(flatten)]
        wl: WangLandauArgs,
        #[arg(long, default_value_t = 10.0)]
        t_min: f64,
        #[arg(long, default_value_t = 500.0)]
        t_max: f64,
        #[arg(long, default_value_t = 50)]
        points: usize,
        #[arg(long, default_value = "sweep_results.csv")]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Chain length or grid side.
    #[arg(long, default_value_t = 20)]
    side: usize,
    /// Kelvin.
    #[arg(long, default_value_t = 273.15)]
    temperature: f64,
    #[arg(long, value_enum, default_value_t = StartMode::Hot)]
    start: StartMode,
    /// Seed for a reproducible run; OS entropy otherwise.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct WangLandauArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Stop once |f - 1| <= tolerance.
    #[arg(long, default_value_t = 1.0e-8)]
    tolerance: f64,
    /// Give up after this many steps.
    #[arg(long)]
    max_steps: Option<u64>,
    #[arg(long, default_value_t = std::f64::consts::E)]
    initial_factor: f64,
    /// Flatness threshold on (Hmax - Hmin) / (Hmax + Hmin).
    #[arg(long, default_value_t = 0.2)]
    flatness: f64,
    /// Steps between flatness checks.
    #[arg(long, default_value_t = 10_000)]
    check_every: u64,
    /// Reweight with E = J (4k - 2M) instead of the bucket index.
    #[arg(long)]
    physical_energy: bool,
}

impl WangLandauArgs {
    fn config(&self) -> SimConfig {
        SimConfig {
            algorithm: Algorithm::WangLandau,
            side_length: self.common.side,
            temperature: self.common.temperature,
            tolerance: self.tolerance,
            start_mode: self.common.start,
            initial_factor: self.initial_factor,
            flatness_threshold: self.flatness,
            flatness_interval: self.check_every,
            max_steps: self.max_steps,
            energy_axis: if self.physical_energy {
                EnergyAxis::Physical
            } else {
                EnergyAxis::BucketIndex
            },
            ..SimConfig::default()
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Metropolis { common, iterations } => run_metropolis(&common, iterations),
        Command::WangLandau(wl) => {
            let sim = run_wang_landau(&wl)?;
            let report = sim.recompute_properties()?;
            println!("Internal energy: {}", report.energy);
            println!("Magnetization:   {}", report.magnetization);
            println!("Specific heat:   {}", report.specific_heat);
            Ok(())
        }
        Command::Sweep { wl, t_min, t_max, points, output } => {
            let sim = run_wang_landau(&wl)?;
            write_sweep(&sim, t_min, t_max, points, &output)
        }
    }
}

/// `+` for up, `-` for down.
fn render(spins: &[Spin]) -> String {
    spins.iter().map(|&s| if s < 0 { '-' } else { '+' }).collect()
}

fn run_metropolis(common: &CommonArgs, iterations: usize) -> color_eyre::Result<()> {
    let cfg = SimConfig {
        algorithm: Algorithm::Metropolis,
        side_length: common.side,
        temperature: common.temperature,
        start_mode: common.start,
        iterations,
        ..SimConfig::default()
    };
    println!("Configuration:\n{cfg:#?}");

    let mut sim = Simulation::new(cfg, run_rng(common.seed))?;
    let bar = ProgressBar::new(iterations as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )?);
    let summary = sim.run_with_progress(|_| bar.inc(1))?;
    bar.finish();

    if let Some(Sampler::Metropolis(m)) = sim.sampler() {
        println!("{}", render(m.chain().spins()));
    }
    let down = sim
        .snapshots()
        .last()
        .map_or(0, |s| s.coordinates.down.len());
    println!(
        "steps = {}, energy = {}, magnetization = {}, down spins = {down}, acceptance = {:.3}",
        summary.steps,
        summary.energy,
        summary.magnetization,
        summary.acceptance_rate.unwrap_or_default(),
    );
    Ok(())
}

fn run_wang_landau(args: &WangLandauArgs) -> color_eyre::Result<Simulation> {
    let cfg = args.config();
    println!("Configuration:\n{cfg:#?}");

    let mut sim = Simulation::new(cfg, run_rng(args.common.seed))?;
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let summary = sim
        .run_with_progress(|p| {
            if let Some(flat) = p.info.flatness {
                spinner.set_message(format!(
                    "step {}  f = {:.3e}  hist = {:.3}",
                    flat.step, flat.factor, flat.hist_percent
                ));
            }
        })
        .wrap_err("Wang-Landau run failed")?;
    spinner.finish_and_clear();

    info!(
        steps = summary.steps,
        flat_events = summary.flat_events.unwrap_or_default(),
        "density of states converged"
    );
    Ok(sim)
}

fn write_sweep(
    sim: &Simulation,
    t_min: f64,
    t_max: f64,
    points: usize,
    output: &PathBuf,
) -> color_eyre::Result<()> {
    if points < 2 || !(t_min > 0.0 && t_max > t_min) {
        return Err(eyre!("need 0 < t_min < t_max and at least two points"));
    }
    let temps: Vec<f64> = (0..points)
        .map(|i| t_min + (t_max - t_min) * i as f64 / (points - 1) as f64)
        .collect();

    let dos = sim.density_of_states()?;
    let results = thermo::sweep(&dos, &temps, sim.config().energy_axis);

    let mut wtr = WriterBuilder::new()
        .from_path(output)
        .wrap_err_with(|| format!("cannot create {}", output.display()))?;
    wtr.write_record(["temperature", "internal_energy", "magnetization", "specific_heat"])?;
    for (t, res) in temps.iter().zip(results) {
        match res {
            Ok(p) => wtr.write_record(&[
                p.temperature.to_string(),
                p.internal_energy.to_string(),
                p.magnetization.to_string(),
                p.specific_heat.to_string(),
            ])?,
            Err(e) => warn!(temperature = t, error = %e, "skipping temperature"),
        }
    }
    wtr.flush()?;
    println!("Sweep complete → {}", output.display());
    Ok(())
}
