//! Monte Carlo estimation of Ising-model thermodynamics: Metropolis
//! sampling on a periodic chain and Wang-Landau density-of-states sampling
//! on a periodic square grid.

pub mod config;
pub mod energy;
pub mod error;
pub mod lattice;
pub mod metropolis;
pub mod sampler;
pub mod simulation;
pub mod thermo;
pub mod utils;
pub mod wang_landau;

pub use config::{Algorithm, EnergyAxis, SimConfig, StartMode};
pub use error::{Result, SimError};
pub use simulation::{Simulation, Snapshot};
